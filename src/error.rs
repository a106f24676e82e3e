use thiserror::Error;

/// Main error type for kgctx
#[derive(Error, Debug)]
pub enum KgError {
    /// Rejected triple input or embedding failure while adding a triple
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unsupported context formatting style
    #[error("Format error: unsupported format style '{0}'")]
    Format(String),

    /// Embedding provider errors outside of `add` (query embedding, HTTP)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Triple file parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type using KgError
pub type Result<T> = std::result::Result<T, KgError>;
