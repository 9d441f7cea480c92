// Re-exports from rich-pad-mod-history so front ends only depend on core.
pub use rich_pad_mod_history::config::{generate_version_id, resolve_data_dir};
pub use rich_pad_mod_history::{
    ContentSurface, DayGroup, EditSession, EditState, HistoryConfig, HistoryError, RestoreState,
    Version, VersionHistory, VersionList, VersionRef, VersionStore,
};
