/// Application configuration: load, save and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Content shown the very first time, before anything was ever saved.
pub const DEFAULT_CONTENT: &str =
    "<p>This is an AI-generated sample content that you can edit by clicking the \"Edit\" button.</p>";

/// Largest row or column count a table may be created with.
pub const MAX_TABLE_DIMENSION: u32 = 20;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Markup used when neither a saved document nor a history exists.
    pub default_content: String,
    /// Directory holding the databases. Empty = resolved automatically.
    pub data_dir: String,
    /// Slot holding the full version history.
    pub history_storage_key: String,
    /// Slot holding the latest saved document.
    pub document_storage_key: String,
    /// Id of the version that seeds a fresh history.
    pub initial_version_id: String,
    /// Whether confirming a restore also updates the saved document slot.
    pub notify_on_restore: bool,
    /// Group and print history timestamps in UTC instead of local time.
    pub history_in_utc: bool,
    /// Shape of the table inserted by the toolbar's "Insert Table".
    pub default_table_rows: u32,
    pub default_table_cols: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_content: DEFAULT_CONTENT.to_string(),
            data_dir: String::new(),
            history_storage_key: "editor-versions".to_string(),
            document_storage_key: "editor-content".to_string(),
            initial_version_id: "initial".to_string(),
            notify_on_restore: false,
            history_in_utc: false,
            default_table_rows: 3,
            default_table_cols: 3,
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `rich-pad.json`,
    /// falling back to the user's config directory.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("rich-pad.json")))
            .or_else(|| dirs::config_dir().map(|d| d.join("rich-pad").join("rich-pad.json")))
            .unwrap_or_else(|| PathBuf::from("rich-pad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// The configured data directory, if one was set.
    pub fn data_dir_override(&self) -> Option<PathBuf> {
        let trimmed = self.data_dir.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Path of the document slot database inside `data_dir`.
    pub fn document_db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("document.redb")
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if self.default_content.trim().is_empty() {
            self.default_content = defaults.default_content;
        }
        if self.history_storage_key.trim().is_empty() {
            self.history_storage_key = defaults.history_storage_key;
        }
        if self.document_storage_key.trim().is_empty() {
            self.document_storage_key = defaults.document_storage_key;
        }
        if self.initial_version_id.trim().is_empty() {
            self.initial_version_id = defaults.initial_version_id;
        }
        self.default_table_rows = self.default_table_rows.clamp(1, MAX_TABLE_DIMENSION);
        self.default_table_cols = self.default_table_cols.clamp(1, MAX_TABLE_DIMENSION);
    }
}
