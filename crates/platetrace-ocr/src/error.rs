use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to read spans file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid span record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("backend error: {message}")]
    Backend { message: String },
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
