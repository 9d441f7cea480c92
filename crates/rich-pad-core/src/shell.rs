/// Editor shell: wires a rich-text surface to the version history.
///
/// The shell owns the surface, the history and the live edit session. It
/// keeps no document state of its own; the surface shows whatever version
/// the history points at, and the toolbar is only offered while editing.
use std::sync::Arc;

use rich_pad_config::DocumentStore;
use rich_pad_mod_history::{EditSession, HistoryError, Version, VersionHistory};

use crate::surface::RichTextSurface;
use crate::toolbar::{self, ButtonState, ToolbarAction, ToolbarError};

pub struct EditorShell<S: RichTextSurface> {
    surface: S,
    history: VersionHistory,
    session: Option<EditSession>,
}

impl<S: RichTextSurface + std::fmt::Debug> std::fmt::Debug for EditorShell<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorShell")
            .field("surface", &self.surface)
            .field("history", &self.history)
            .field("editing", &self.session.is_some())
            .finish()
    }
}

impl<S: RichTextSurface> EditorShell<S> {
    /// Picks the content a fresh history is seeded with: the saved document
    /// when one exists, otherwise `fallback`.
    pub fn initial_content(store: Option<&DocumentStore>, key: &str, fallback: &str) -> String {
        let Some(store) = store else {
            return fallback.to_string();
        };
        match store.load(key) {
            Ok(Some(content)) if !content.trim().is_empty() => content,
            Ok(_) => fallback.to_string(),
            Err(e) => {
                tracing::warn!("Failed to read saved document '{key}': {e:#}");
                fallback.to_string()
            }
        }
    }

    /// Creates the shell and shows the history's current version read-only.
    pub fn new(surface: S, history: VersionHistory) -> Self {
        let mut shell = Self {
            surface,
            history,
            session: None,
        };
        shell.sync_surface();
        shell
    }

    /// Writes every saved document to `key` in `store`.
    pub fn attach_document(&mut self, store: Arc<DocumentStore>, key: impl Into<String>) {
        let key = key.into();
        self.history.set_on_save(move |content| {
            if let Err(e) = store.save(&key, content) {
                tracing::warn!("Failed to write saved document '{key}': {e:#}");
            }
        });
    }

    /// Pushes the current version into the surface, read-only.
    ///
    /// Does nothing while editing or before the surface is ready.
    pub fn sync_surface(&mut self) {
        if self.session.is_some() || !self.surface.is_ready() {
            return;
        }
        let content = self.history.current().content.clone();
        self.surface.set_content(&content);
        self.surface.set_editable(false);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for typing into the surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Edit/Save button: starts editing, or saves when already editing.
    ///
    /// Returns the new version when a save happened.
    pub fn toggle_edit(&mut self) -> Result<Option<Version>, HistoryError> {
        if self.is_editing() {
            self.save().map(Some)
        } else {
            self.start_edit().map(|()| None)
        }
    }

    pub fn start_edit(&mut self) -> Result<(), HistoryError> {
        let session = self.history.start_edit(&mut self.surface)?;
        self.session = Some(session);
        Ok(())
    }

    /// Saves the surface content as a new version.
    ///
    /// On error the session stays live so the user can fix and retry.
    pub fn save(&mut self) -> Result<Version, HistoryError> {
        let session = self.session.as_ref().ok_or(HistoryError::NoActiveEdit)?;
        let version = self.history.save_edit(session, &mut self.surface)?;
        self.session = None;
        Ok(version)
    }

    pub fn cancel(&mut self) -> Result<(), HistoryError> {
        let session = self.session.as_ref().ok_or(HistoryError::NoActiveEdit)?;
        self.history.cancel_edit(session, &mut self.surface)?;
        self.session = None;
        Ok(())
    }

    /// Runs a toolbar action. Only possible while editing.
    pub fn dispatch(&mut self, action: ToolbarAction) -> Result<(), ToolbarError> {
        if self.session.is_none() {
            return Err(ToolbarError::ReadOnly);
        }
        toolbar::dispatch(&mut self.surface, action)
    }

    /// Toolbar button states, or `None` when not editing.
    pub fn toolbar(&self) -> Option<Vec<ButtonState>> {
        self.session
            .as_ref()
            .map(|_| toolbar::button_states(&self.surface))
    }

    pub fn load_version(&mut self, id: &str) -> Result<(), HistoryError> {
        self.history.load_version(id, &mut self.surface)
    }

    pub fn request_restore(&mut self, id: &str) -> Result<(), HistoryError> {
        self.history.request_restore(id)
    }

    pub fn confirm_restore(&mut self) -> Result<Option<Version>, HistoryError> {
        self.history.confirm_restore(&mut self.surface)
    }

    pub fn cancel_restore(&mut self) {
        self.history.cancel_restore();
    }
}
