/// Version history manager: save, cancel, view and restore workflows.
///
/// Owns the version list, the current-version pointer and two independent
/// state axes (edit and restore). Every mutation is written to the store in
/// full before in-memory state changes, so a failed write leaves the session
/// exactly as it was.
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::config::{generate_version_id, HistoryConfig};
use crate::error::HistoryError;
use crate::persistence::VersionStore;
use crate::surface::ContentSurface;
use crate::version::{DayGroup, Version, VersionList};

/// Callback fired with the saved markup after a successful save.
pub type SaveCallback = Box<dyn FnMut(&str)>;

/// Rollback point captured when editing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    serial: u64,
    snapshot: String,
    base_version: String,
}

impl EditSession {
    /// Markup the surface held when editing started.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Id of the version that was current when editing started.
    pub fn base_version(&self) -> &str {
        &self.base_version
    }
}

/// Edit axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
}

/// Restore axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    /// Waiting for the user to confirm restoring the version with this id.
    PendingConfirmation(String),
}

/// Manages the version history of a single document.
///
/// The manager can optionally persist the list via a shared `VersionStore`;
/// without one it keeps everything in memory.
pub struct VersionHistory {
    /// Append-only list, oldest first.
    versions: VersionList,
    /// Version currently loaded into the surface.
    current_id: String,
    /// Serial of the live edit session, if any.
    active_edit: Option<u64>,
    next_edit_serial: u64,
    restore: RestoreState,
    config: HistoryConfig,
    /// Optional disk persistence (None = in-memory only).
    store: Option<Arc<VersionStore>>,
    on_save: Option<SaveCallback>,
}

impl std::fmt::Debug for VersionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionHistory")
            .field("len", &self.versions.len())
            .field("current_id", &self.current_id)
            .field("latest_id", &self.versions.latest().id)
            .field("editing", &self.active_edit.is_some())
            .field("restore", &self.restore)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn ensure_ready<S: ContentSurface + ?Sized>(surface: &S) -> Result<(), HistoryError> {
    if surface.is_ready() {
        Ok(())
    } else {
        tracing::debug!("Surface not ready, ignoring history operation");
        Err(HistoryError::SurfaceUnavailable)
    }
}

impl VersionHistory {
    /// Creates a history seeded with one version wrapping `initial_content`.
    ///
    /// Nothing is read from or written to the store.
    pub fn seeded(
        initial_content: &str,
        config: HistoryConfig,
        store: Option<Arc<VersionStore>>,
    ) -> Self {
        let seed = Version::new(
            config.initial_version_id.clone(),
            initial_content,
            now_ms(),
        );
        Self::from_list(VersionList::seeded(seed), config, store)
    }

    /// Creates an in-memory-only history with default config.
    ///
    /// Convenience constructor for tests and simple usage.
    pub fn in_memory(initial_content: &str) -> Self {
        Self::seeded(initial_content, HistoryConfig::default(), None)
    }

    /// Loads the stored history, or seeds a fresh one.
    ///
    /// A missing, unreadable or invalid stored list falls back to a single
    /// seed version wrapping `initial_content`, which is then persisted so
    /// its id and timestamp stay stable across sessions. Storage failures
    /// are logged and never fatal.
    pub fn load_or_seed(
        initial_content: &str,
        config: HistoryConfig,
        store: Option<Arc<VersionStore>>,
    ) -> Self {
        let stored = store.as_ref().and_then(|s| s.load(&config.storage_key));
        match stored {
            Some(list) => {
                tracing::info!(
                    key = %config.storage_key,
                    versions = list.len(),
                    "Loaded version history"
                );
                Self::from_list(list, config, store)
            }
            None => {
                let history = Self::seeded(initial_content, config, store);
                if let Some(s) = &history.store {
                    if let Err(e) = s.save(&history.config.storage_key, &history.versions) {
                        tracing::warn!("Failed to persist seed version: {e:#}");
                    }
                }
                tracing::info!(key = %history.config.storage_key, "Seeded new version history");
                history
            }
        }
    }

    fn from_list(
        versions: VersionList,
        config: HistoryConfig,
        store: Option<Arc<VersionStore>>,
    ) -> Self {
        let current_id = versions.latest().id.clone();
        Self {
            versions,
            current_id,
            active_edit: None,
            next_edit_serial: 0,
            restore: RestoreState::Idle,
            config,
            store,
            on_save: None,
        }
    }

    /// Registers the callback fired with the new content after each save.
    pub fn set_on_save(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_save = Some(Box::new(callback));
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn versions(&self) -> &VersionList {
        &self.versions
    }

    /// The last appended version, independent of the current pointer.
    pub fn latest(&self) -> &Version {
        self.versions.latest()
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    /// The version currently loaded into the surface.
    pub fn current(&self) -> &Version {
        self.versions
            .get(&self.current_id)
            .unwrap_or_else(|| self.versions.latest())
    }

    pub fn get(&self, id: &str) -> Option<&Version> {
        self.versions.get(id)
    }

    pub fn edit_state(&self) -> EditState {
        if self.active_edit.is_some() {
            EditState::Editing
        } else {
            EditState::Viewing
        }
    }

    pub fn is_editing(&self) -> bool {
        self.active_edit.is_some()
    }

    pub fn restore_state(&self) -> &RestoreState {
        &self.restore
    }

    /// Target of the pending restore, if one is waiting for confirmation
    /// and still exists.
    pub fn pending_restore(&self) -> Option<&Version> {
        match &self.restore {
            RestoreState::PendingConfirmation(id) => self.versions.get(id),
            RestoreState::Idle => None,
        }
    }

    /// Whether a "view this version" control for `id` should be enabled.
    pub fn can_load(&self, id: &str) -> bool {
        !self.is_editing() && self.versions.contains(id)
    }

    /// Whether a "restore this version" control for `id` should be enabled.
    pub fn can_restore(&self, id: &str) -> bool {
        self.can_load(id)
    }

    /// Day-grouped view of the history for display.
    pub fn group_by_day<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayGroup<'_>> {
        self.versions.group_by_day(tz)
    }

    /// Captures the surface content as a rollback point and makes the
    /// surface editable.
    ///
    /// Any pending restore is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyEditing` if a session is live, or `SurfaceUnavailable`.
    pub fn start_edit<S: ContentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<EditSession, HistoryError> {
        ensure_ready(surface)?;
        if self.active_edit.is_some() {
            return Err(HistoryError::AlreadyEditing);
        }

        let snapshot = surface
            .content()
            .unwrap_or_else(|| self.current().content.clone());
        let serial = self.next_edit_serial;
        self.next_edit_serial += 1;
        self.active_edit = Some(serial);
        self.restore = RestoreState::Idle;
        surface.set_editable(true);

        tracing::debug!(base = %self.current_id, "Edit session started");
        Ok(EditSession {
            serial,
            snapshot,
            base_version: self.current_id.clone(),
        })
    }

    /// Throws away in-progress changes and puts the rollback snapshot back.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveEdit` if `session` is not the live session, or
    /// `SurfaceUnavailable`.
    pub fn cancel_edit<S: ContentSurface + ?Sized>(
        &mut self,
        session: &EditSession,
        surface: &mut S,
    ) -> Result<(), HistoryError> {
        ensure_ready(surface)?;
        self.check_session(session)?;

        surface.set_content(&session.snapshot);
        surface.set_editable(false);
        self.active_edit = None;

        tracing::debug!(base = %session.base_version, "Edit session cancelled");
        Ok(())
    }

    /// Stores the surface content as a new version and leaves edit mode.
    ///
    /// # Errors
    ///
    /// Returns `EmptyContent` if the surface yields nothing usable (the
    /// session stays live), `Storage` if the write fails (nothing changes),
    /// `NoActiveEdit` or `SurfaceUnavailable`.
    pub fn save_edit<S: ContentSurface + ?Sized>(
        &mut self,
        session: &EditSession,
        surface: &mut S,
    ) -> Result<Version, HistoryError> {
        ensure_ready(surface)?;
        self.check_session(session)?;

        let content = surface
            .content()
            .filter(|c| !c.trim().is_empty())
            .ok_or(HistoryError::EmptyContent)?;

        let version = Version::new(
            self.fresh_id(),
            content,
            self.versions.next_timestamp(now_ms()),
        );
        self.commit(version.clone())?;

        self.current_id = version.id.clone();
        self.active_edit = None;
        surface.set_editable(false);
        self.notify_saved(&version.content);

        tracing::info!(id = %version.id, versions = self.versions.len(), "Saved new version");
        Ok(version)
    }

    /// Shows version `id` read-only without touching the list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `EditInProgress` or `SurfaceUnavailable`.
    pub fn load_version<S: ContentSurface + ?Sized>(
        &mut self,
        id: &str,
        surface: &mut S,
    ) -> Result<(), HistoryError> {
        ensure_ready(surface)?;
        if self.is_editing() {
            return Err(HistoryError::EditInProgress);
        }
        let version = self
            .versions
            .get(id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;

        surface.set_content(&version.content);
        surface.set_editable(false);
        self.current_id = version.id.clone();

        tracing::debug!(id, "Loaded version for viewing");
        Ok(())
    }

    /// Opens the confirmation step for restoring `id`, replacing any
    /// previous pending target.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `EditInProgress`.
    pub fn request_restore(&mut self, id: &str) -> Result<(), HistoryError> {
        if self.is_editing() {
            return Err(HistoryError::EditInProgress);
        }
        if !self.versions.contains(id) {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        self.restore = RestoreState::PendingConfirmation(id.to_string());
        tracing::debug!(id, "Restore requested");
        Ok(())
    }

    /// Appends a copy of the pending target tagged with its provenance and
    /// loads it into the surface.
    ///
    /// Returns `Ok(None)` without changing anything when no restore is
    /// pending or the target no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the write fails (the restore stays pending) or
    /// `SurfaceUnavailable`.
    pub fn confirm_restore<S: ContentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<Option<Version>, HistoryError> {
        ensure_ready(surface)?;
        let RestoreState::PendingConfirmation(target_id) = &self.restore else {
            tracing::debug!("Confirm without pending restore ignored");
            return Ok(None);
        };
        let Some(target) = self.versions.get(target_id) else {
            tracing::debug!(id = %target_id, "Restore target vanished");
            return Ok(None);
        };

        let version = Version {
            id: self.fresh_id(),
            content: target.content.clone(),
            timestamp: self.versions.next_timestamp(now_ms()),
            restored_from: Some(target.reference()),
        };
        self.commit(version.clone())?;

        surface.set_content(&version.content);
        surface.set_editable(false);
        self.current_id = version.id.clone();
        self.restore = RestoreState::Idle;
        if self.config.notify_on_restore {
            self.notify_saved(&version.content);
        }

        tracing::info!(
            id = %version.id,
            from = ?version.restored_from.as_ref().map(|r| r.id.as_str()),
            "Restored version"
        );
        Ok(Some(version))
    }

    /// Closes the confirmation step without changing anything.
    pub fn cancel_restore(&mut self) {
        if self.restore != RestoreState::Idle {
            tracing::debug!("Restore cancelled");
        }
        self.restore = RestoreState::Idle;
    }

    fn check_session(&self, session: &EditSession) -> Result<(), HistoryError> {
        if self.active_edit == Some(session.serial) {
            Ok(())
        } else {
            Err(HistoryError::NoActiveEdit)
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_version_id();
            if !self.versions.contains(&id) {
                return id;
            }
        }
    }

    /// Persists the list with `version` appended, then adopts it.
    fn commit(&mut self, version: Version) -> Result<(), HistoryError> {
        let mut next = self.versions.clone();
        next.push(version)?;
        if let Some(store) = &self.store {
            store.save(&self.config.storage_key, &next)?;
        }
        self.versions = next;
        Ok(())
    }

    fn notify_saved(&mut self, content: &str) {
        if let Some(callback) = self.on_save.as_mut() {
            callback(content);
        }
    }
}
