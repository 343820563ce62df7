//! Error types for the pdfsec security handler.

use thiserror::Error;

/// Primary error type for security handler operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdfError {
    /// Unsupported `/Filter`, `/V`, `/R` or crypt filter method. The document cannot be opened.
    #[error("unsupported encryption: {0}")]
    ConfigError(String),

    /// Malformed entry in the encryption dictionary or trailer.
    #[error("malformed encryption dictionary: {0}")]
    FormatError(String),

    /// Neither the user nor the owner password check succeeded.
    #[error("incorrect password")]
    AuthenticationError,

    /// The `/Perms` confirmation did not decrypt to the expected marker.
    #[error("integrity check failed: {0}")]
    IntegrityError(String),

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("SASLprep: {0}")]
    SaslPrepError(String),

    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
