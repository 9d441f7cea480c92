/// Editor core: the rich-text surface contract, an in-memory surface,
/// the toolbar command dispatcher and the editor shell that wires them to
/// the version history.
pub mod format;
pub mod history;
pub mod markup;
pub mod memory;
pub mod shell;
pub mod surface;
pub mod toolbar;

pub use format::{
    ActiveFormatting, FontFamily, FontSize, HeadingLevel, HexColor, ListKind, Mark, TableCommand,
    TextAlign,
};
pub use memory::MemorySurface;
pub use shell::EditorShell;
pub use surface::RichTextSurface;
pub use toolbar::{ButtonState, ToolbarAction, ToolbarButton, ToolbarError, ToolbarGroup};
pub use history::{
    generate_version_id, resolve_data_dir, ContentSurface, DayGroup, EditSession, EditState,
    HistoryConfig, HistoryError, RestoreState, Version, VersionHistory, VersionList, VersionRef,
    VersionStore,
};
