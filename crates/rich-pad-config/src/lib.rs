pub mod color;
pub mod config;
pub mod document;

pub use color::HexColor;
pub use config::{AppConfig, DEFAULT_CONTENT, MAX_TABLE_DIMENSION};
pub use document::DocumentStore;
