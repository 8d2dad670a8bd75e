use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("invalid hex color {0:?}, expected RRGGBB (e.g. 1a1b26)")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, FxError>;
