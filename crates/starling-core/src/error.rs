//! Core error types for the starling response layer.
//!
//! This module provides [`StarlingError`], the single error enum surfaced by
//! every response variant. Nothing in the response layer retries or recovers:
//! errors are returned to the host server, which decides what to do with the
//! exchange.

use thiserror::Error;

/// The primary error type for starling.
///
/// Each variant maps to an HTTP status code via [`StarlingError::status_code`],
/// which a host can use when the failure happens before any response event was
/// sent.
#[derive(Error, Debug)]
pub enum StarlingError {
    // ── Configuration ────────────────────────────────────────────────

    /// A capability required by the chosen response variant is unavailable,
    /// or a required collaborator (e.g. a template renderer) is missing.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Files ────────────────────────────────────────────────────────

    /// The file backing a file response does not exist.
    #[error("File at path {0} does not exist.")]
    NotFound(String),

    /// The path exists but is not a regular file.
    #[error("File at path {0} is not a file.")]
    InvalidTarget(String),

    // ── Encoding ─────────────────────────────────────────────────────

    /// Content could not be encoded as requested (e.g. NaN in strict JSON,
    /// or text outside the response charset).
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A header name or value cannot be encoded as latin-1.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    // ── Templates ────────────────────────────────────────────────────

    /// The template context has the wrong shape.
    #[error("Invalid template context: {0}")]
    InvalidContext(String),

    /// The template engine failed to load or render a template.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── Emission ─────────────────────────────────────────────────────

    /// The host closed the send channel (e.g. client disconnect).
    #[error("Send channel closed: {0}")]
    Disconnected(String),

    /// A synchronous body producer panicked or was aborted mid-stream.
    #[error("Body producer failed: {0}")]
    ProducerFailed(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StarlingError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `NotFound` -> 404
    /// - `Disconnected` -> 499 (client closed request)
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Disconnected(_) => 499,
            Self::ConfigurationError(_)
            | Self::InvalidTarget(_)
            | Self::SerializationError(_)
            | Self::InvalidHeader(_)
            | Self::InvalidContext(_)
            | Self::TemplateError(_)
            | Self::ProducerFailed(_)
            | Self::IoError(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, StarlingError>`.
pub type StarlingResult<T> = Result<T, StarlingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StarlingError::NotFound("x".into()).status_code(), 404);
        assert_eq!(StarlingError::Disconnected("x".into()).status_code(), 499);
        assert_eq!(StarlingError::InvalidTarget("x".into()).status_code(), 500);
        assert_eq!(
            StarlingError::ConfigurationError("x".into()).status_code(),
            500
        );
        assert_eq!(
            StarlingError::SerializationError("x".into()).status_code(),
            500
        );
        assert_eq!(StarlingError::TemplateError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_file_error_display() {
        let err = StarlingError::NotFound("/tmp/missing.txt".into());
        assert_eq!(err.to_string(), "File at path /tmp/missing.txt does not exist.");

        let err = StarlingError::InvalidTarget("/tmp".into());
        assert_eq!(err.to_string(), "File at path /tmp is not a file.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err: StarlingError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("locked"));
    }
}
