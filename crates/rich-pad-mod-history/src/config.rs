/// Configuration and utility functions for the history system.
use std::path::{Path, PathBuf};

/// Storage key under which the version list blob is kept.
pub const DEFAULT_STORAGE_KEY: &str = "editor-versions";

/// Id given to the synthetic version that seeds a fresh history.
pub const DEFAULT_INITIAL_VERSION_ID: &str = "initial";

/// Configuration for the history system.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Key of the version list slot in the store.
    pub storage_key: String,
    /// Id assigned to the seed version when no history exists yet.
    pub initial_version_id: String,
    /// Whether a confirmed restore also fires the save callback.
    pub notify_on_restore: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            initial_version_id: DEFAULT_INITIAL_VERSION_ID.to_string(),
            notify_on_restore: false,
        }
    }
}

/// Resolves the data directory path.
///
/// Resolution order:
/// 1. `RICH_PAD_DATA_DIR` environment variable
/// 2. `.data/` directory next to the executable
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RICH_PAD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe.parent().unwrap_or(Path::new(".")).join(".data")
}

/// Generates a fresh opaque version id.
pub fn generate_version_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
