//! Error types for PPI

use thiserror::Error;

/// Result type alias for PPI operations
pub type Result<T> = std::result::Result<T, PpiError>;

/// Main error type for PPI
#[derive(Error, Debug)]
pub enum PpiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gene not found in catalog: {0}")]
    GeneNotFound(i64),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
