use thiserror::Error;

use crate::store::StoreError;
use tts_client::TtsError;

#[derive(Error, Debug)]
pub enum Error {
    /// No sections survived the minimum-length filter during segmentation.
    #[error("No readable chapters found in document")]
    NoContent,

    #[error("Invalid document: {0}")]
    Document(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] TtsError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
