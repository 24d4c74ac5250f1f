//! Error types for the BIOS asset manager

use thiserror::Error;

/// The main error type for BIOS asset operations
#[derive(Debug, Error)]
pub enum BiosError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity mismatch for {name}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid asset name: {0:?}")]
    InvalidName(String),

    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl BiosError {
    /// True when the error is an I/O failure rather than a lookup or validation problem
    pub fn is_io(&self) -> bool {
        matches!(self, BiosError::Io(_))
    }
}

/// Result type alias for BIOS asset operations
pub type Result<T> = std::result::Result<T, BiosError>;

impl From<toml::de::Error> for BiosError {
    fn from(err: toml::de::Error) -> Self {
        BiosError::CatalogParse(err.to_string())
    }
}

impl From<serde_json::Error> for BiosError {
    fn from(err: serde_json::Error) -> Self {
        BiosError::CatalogParse(err.to_string())
    }
}
