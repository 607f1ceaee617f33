use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to read detections file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid detection record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("invalid detection record at {path}:{line}: {reason}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("detector configuration error: {message}")]
    Configuration { message: String },
}

impl DetectError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
