use exif::Error as ExifError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("EXIF error: {0}")]
    Exif(#[from] ExifError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Tokio join error: {0}")]
    Join(#[from] JoinError),

    #[error("Invalid capture timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Invalid sub-second value {0:?}")]
    InvalidSubSecond(String),

    #[error("Malformed rational {num}/{denom}")]
    MalformedRational { num: u32, denom: u32 },

    #[error("Malformed {tag} tag: {reason}")]
    MalformedTag { tag: String, reason: String },

    #[error("{layers} layers but {names} layer names")]
    LayerNameMismatch { layers: usize, names: usize },

    #[error("Remote control answered with status {0}")]
    RemoteStatus(reqwest::StatusCode),
}

impl AppError {
    pub(crate) fn malformed_tag(tag: exif::Tag, reason: impl Into<String>) -> Self {
        AppError::MalformedTag {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }
}
