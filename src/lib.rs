pub mod config;
pub mod convert;
pub mod error;
pub mod metadata;
pub mod processor;
pub mod remote;
pub mod session;
pub mod walker;

pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::metadata::{Extraction, GeoTaggedRecord, Layer, TrackReference};
pub use crate::session::{SessionDocument, SessionOptions, WriteStatus};
