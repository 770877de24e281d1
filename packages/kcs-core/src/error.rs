//! Centralized error types for the KCS codec core.
//!
//! This module provides the single error taxonomy named in the protocol
//! specification: each variant corresponds exactly to one of the error
//! kinds a caller needs to distinguish (no lead-in, parity mismatch,
//! underlying I/O failure, malformed input, cancellation).

use thiserror::Error;

/// Errors produced by the KCS codec core.
#[derive(Debug, Error)]
pub enum KcsError {
    /// The requested configuration violates a protocol invariant (e.g. the
    /// Nyquist margin between `frame_rate` and `base_freq`).
    #[error("invalid KCS configuration: {0}")]
    InvalidConfig(String),

    /// The lead-in detector reached end-of-stream without ever observing a
    /// steady base-frequency tone. No bytes are ever emitted in this case.
    #[error("no lead-in tone detected before end of stream")]
    NoLeadIn,

    /// A framed byte's parity bit did not match the configured parity mode.
    /// Decoding stops at the failed byte; the core does not attempt
    /// bit-level resynchronization.
    #[error("parity mismatch while decoding a framed byte")]
    Parity,

    /// The underlying sample source failed.
    #[error("sample source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The underlying sample sink failed.
    #[error("sample sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The audio source could not be interpreted as PCM (e.g. an
    /// unreadable WAV header or zero channels).
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The caller cancelled an in-progress streaming operation.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenient `Result` alias for codec operations.
pub type KcsResult<T> = Result<T, KcsError>;

impl KcsError {
    /// Wraps an arbitrary source-side I/O error as [`KcsError::Source`].
    pub fn source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }

    /// Wraps an arbitrary sink-side I/O error as [`KcsError::Sink`].
    pub fn sink<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Sink(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_error_has_stable_message() {
        let err = KcsError::Parity;
        assert_eq!(err.to_string(), "parity mismatch while decoding a framed byte");
    }

    #[test]
    fn source_wraps_underlying_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = KcsError::source(io_err);
        assert!(err.to_string().contains("pipe closed"));
    }
}
