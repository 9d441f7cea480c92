/// Errors raised by the version history workflows.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("version not found: {0}")]
    NotFound(String),

    #[error("an edit session is already active")]
    AlreadyEditing,

    #[error("no matching edit session is active")]
    NoActiveEdit,

    #[error("operation not allowed while editing")]
    EditInProgress,

    #[error("surface produced no usable content")]
    EmptyContent,

    #[error("surface is not ready")]
    SurfaceUnavailable,

    #[error("invalid version history: {0}")]
    InvalidHistory(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}
