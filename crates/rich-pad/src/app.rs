//! Command implementations for the rich-pad binary.
//!
//! `App` opens both stores, hydrates the editor shell and runs one command
//! against it. Output goes to the writer passed in so commands can be
//! exercised in tests.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone, Utc};
use rich_pad_config::{AppConfig, DocumentStore};
use rich_pad_core::{
    ContentSurface, EditorShell, HistoryConfig, MemorySurface, ToolbarAction, Version,
    VersionHistory, VersionStore,
};

/// What `edit` should do between starting and ending the session.
#[derive(Debug, Default)]
pub struct EditRequest {
    pub content: Option<String>,
    pub actions: Vec<String>,
    pub cancel: bool,
}

pub struct App {
    config: AppConfig,
    shell: EditorShell<MemorySurface>,
    versions: Option<Arc<VersionStore>>,
    documents: Option<Arc<DocumentStore>>,
}

impl App {
    /// Opens the stores under `data_dir` and loads the editor.
    ///
    /// A store that fails to open is logged and replaced by in-memory state.
    pub fn open(config: AppConfig, data_dir: &Path) -> Self {
        let versions = match VersionStore::open(data_dir) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!("Failed to open version history, falling back to in-memory: {e:#}");
                None
            }
        };
        let documents = match DocumentStore::open(&AppConfig::document_db_path(data_dir)) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!("Failed to open document store: {e:#}");
                None
            }
        };

        let initial = EditorShell::<MemorySurface>::initial_content(
            documents.as_deref(),
            &config.document_storage_key,
            &config.default_content,
        );
        let history_config = HistoryConfig {
            storage_key: config.history_storage_key.clone(),
            initial_version_id: config.initial_version_id.clone(),
            notify_on_restore: config.notify_on_restore,
        };
        let history = VersionHistory::load_or_seed(&initial, history_config, versions.clone());

        let mut shell = EditorShell::new(MemorySurface::default(), history);
        if let Some(store) = &documents {
            shell.attach_document(Arc::clone(store), config.document_storage_key.clone());
        }

        Self {
            config,
            shell,
            versions,
            documents,
        }
    }

    pub fn show(&self, out: &mut impl Write) -> Result<()> {
        let content = self.shell.surface().content().unwrap_or_default();
        writeln!(out, "{content}")?;
        Ok(())
    }

    /// Runs one edit session: replace content, apply toolbar actions, then
    /// save or cancel.
    pub fn edit(&mut self, request: &EditRequest, out: &mut impl Write) -> Result<()> {
        let actions = request
            .actions
            .iter()
            .map(|token| self.parse_action(token))
            .collect::<Result<Vec<_>>>()?;

        self.shell.start_edit()?;
        if let Err(e) = self.apply_edit(request.content.as_deref(), &actions) {
            self.shell.cancel()?;
            return Err(e);
        }

        if request.cancel {
            self.shell.cancel()?;
            writeln!(out, "Edit cancelled, nothing saved")?;
            return Ok(());
        }

        match self.shell.save() {
            Ok(version) => {
                writeln!(out, "Saved version {}", version.id)?;
                Ok(())
            }
            Err(e) => {
                self.shell.cancel()?;
                Err(e).context("Failed to save")
            }
        }
    }

    fn apply_edit(&mut self, content: Option<&str>, actions: &[ToolbarAction]) -> Result<()> {
        if let Some(content) = content {
            if !self.shell.surface_mut().replace_all(content) {
                bail!("Editor refused the new content");
            }
        }
        for &action in actions {
            self.shell
                .dispatch(action)
                .with_context(|| format!("Toolbar action '{action}' failed"))?;
        }
        Ok(())
    }

    /// Parses a toolbar token. A bare `table` uses the configured shape.
    fn parse_action(&self, token: &str) -> Result<ToolbarAction> {
        if token.trim().eq_ignore_ascii_case("table") {
            return Ok(ToolbarAction::InsertTable {
                rows: self.config.default_table_rows,
                cols: self.config.default_table_cols,
            });
        }
        token.parse().map_err(anyhow::Error::msg)
    }

    pub fn history(&self, utc: bool, out: &mut impl Write) -> Result<()> {
        if utc || self.config.history_in_utc {
            self.write_history(&Utc, out)
        } else {
            self.write_history(&Local, out)
        }
    }

    fn write_history<Tz>(&self, tz: &Tz, out: &mut impl Write) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let history = self.shell.history();
        for group in history.group_by_day(tz) {
            writeln!(out, "{}", group.date.format("%Y-%m-%d"))?;
            for version in group.versions {
                let time = version.created_at().with_timezone(tz).format("%H:%M:%S");
                write!(out, "  {time}  {}", version.id)?;
                if let Some(origin) = &version.restored_from {
                    write!(out, "  (restored from {})", origin.id)?;
                }
                if version.id == history.current_id() {
                    write!(out, "  *")?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }

    pub fn view(&mut self, id: &str, out: &mut impl Write) -> Result<()> {
        self.shell.load_version(id)?;
        self.show(out)
    }

    /// Restores `id` after `confirm` agrees; otherwise leaves everything as is.
    pub fn restore(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&Version) -> Result<bool>,
        out: &mut impl Write,
    ) -> Result<()> {
        if !self.shell.history().can_restore(id) {
            bail!("Version {id} cannot be restored");
        }
        self.shell.request_restore(id)?;
        let Some(target) = self.shell.history().pending_restore().cloned() else {
            bail!("Restore of {id} could not be started");
        };

        if !confirm(&target)? {
            self.shell.cancel_restore();
            writeln!(out, "Restore cancelled")?;
            return Ok(());
        }

        match self.shell.confirm_restore()? {
            Some(version) => writeln!(out, "Restored {} as version {}", target.id, version.id)?,
            None => writeln!(out, "Nothing to restore")?,
        }
        Ok(())
    }

    /// Deletes the saved document and the version history.
    pub fn reset(self, out: &mut impl Write) -> Result<()> {
        if let Some(store) = &self.versions {
            store
                .delete(&self.config.history_storage_key)
                .context("Failed to delete version history")?;
        }
        if let Some(store) = &self.documents {
            store
                .delete(&self.config.document_storage_key)
                .context("Failed to delete saved document")?;
        }
        tracing::info!("History and saved document cleared");
        writeln!(out, "History and saved document cleared")?;
        Ok(())
    }
}
