use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanoError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse scene config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid scene config: {0}")]
    InvalidConfig(String),

    #[error("unknown preset `{0}` (expected static, classic, ambient or showcase)")]
    UnknownPreset(String),

    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T, E = PanoError> = std::result::Result<T, E>;
