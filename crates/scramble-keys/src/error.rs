//! Key error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while generating, encoding or persisting keys.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("seed too short: need at least {min} bytes, got {got}")]
    InvalidSeedLength { min: usize, got: usize },

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address mismatch: stored {stored}, derived {derived}")]
    AddressMismatch { stored: String, derived: String },

    #[error("invalid signature")]
    InvalidSignature,
}

impl From<serde_json::Error> for KeyError {
    fn from(err: serde_json::Error) -> Self {
        KeyError::Encoding(err.to_string())
    }
}

impl KeyError {
    /// True when a persistence attempt was refused because the target exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, KeyError::AlreadyExists { .. })
    }
}
