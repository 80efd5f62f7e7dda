// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Not enough history to train or to build model-path features.
    #[error("{0}")]
    InsufficientData(String),

    #[error("failed to fit consumption model: {0}")]
    Fit(String),

    #[error("failed to access model artifact {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode model artifact {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ModelError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ModelError::InsufficientData(_))
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
