use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitrineError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("http status {code} fetching {url}")]
    HttpStatus { url: String, code: u16 },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("no qualifying items extracted: {0}")]
    Extraction(String),

    #[error("fetched bytes are not a recognizable image; raw payload kept at {path}")]
    UnknownFormat { path: PathBuf },

    #[error("anchor markers <!-- {tag}:START --> / <!-- {tag}:END --> not found in document")]
    AnchorMissing { tag: String },

    #[error("settings error: {0}")]
    Settings(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VitrineError>;
