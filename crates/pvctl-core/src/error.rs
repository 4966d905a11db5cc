//! Unified error types for the pvctl ecosystem
//!
//! This module provides a common error type [`PvError`] that can represent
//! errors from any part of the system. Domain-specific error types can be
//! converted to `PvError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all pvctl operations.
///
/// The controllers themselves never fail at runtime (every numeric edge case
/// saturates or clamps); errors arise from construction and configuration:
/// invalid parameter sets, malformed curves, unreadable scenario files.
#[derive(Error, Debug)]
pub enum PvError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Parameter and curve validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario description errors
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using PvError.
pub type PvResult<T> = Result<T, PvError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for PvError {
    fn from(err: anyhow::Error) -> Self {
        PvError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for PvError {
    fn from(s: String) -> Self {
        PvError::Other(s)
    }
}

impl From<&str> for PvError {
    fn from(s: &str) -> Self {
        PvError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PvError::Validation("v_min must be below v_max".into());
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("v_min must be below v_max"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let pv_err: PvError = io_err.into();
        assert!(matches!(pv_err, PvError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> PvResult<()> {
            Err(PvError::Config("bad".into()))
        }

        fn outer() -> PvResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
