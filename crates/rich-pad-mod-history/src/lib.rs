/// Version history for rich-text documents.
///
/// Provides a `VersionHistory` manager that keeps an append-only list of
/// full-document snapshots, drives the edit and restore workflows against a
/// `ContentSurface`, and persists the whole list to an embedded key-value
/// store (redb) after every change.
pub mod config;
pub mod error;
pub mod manager;
pub mod persistence;
pub mod surface;
pub mod version;

pub use config::HistoryConfig;
pub use error::HistoryError;
pub use manager::{EditSession, EditState, RestoreState, SaveCallback, VersionHistory};
pub use persistence::VersionStore;
pub use surface::ContentSurface;
pub use version::{DayGroup, Version, VersionList, VersionRef};
