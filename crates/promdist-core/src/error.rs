//! Shared error type across promdist crates.

use thiserror::Error;

/// Stable error codes (safe to match on, log, or expose to scrapers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No store configuration was established before first use.
    NotConfigured,
    /// The shared store could not be reached or timed out.
    StoreUnavailable,
    /// A mutation carried a value the metric type forbids.
    InvalidValue,
    /// A stored label key could not be decoded.
    Decode,
    /// Label values did not match the declared label names.
    InvalidLabels,
    /// A metric definition failed validation.
    InvalidDefinition,
    /// Configuration file could not be read or validated.
    Config,
}

impl ErrorCode {
    /// String representation used in logs and HTTP error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotConfigured => "NOT_CONFIGURED",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::Decode => "DECODE",
            ErrorCode::InvalidLabels => "INVALID_LABELS",
            ErrorCode::InvalidDefinition => "INVALID_DEFINITION",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromDistError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum PromDistError {
    #[error("metrics store is not configured")]
    NotConfigured,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("malformed label key: {0}")]
    Decode(String),
    #[error("invalid labels: {0}")]
    InvalidLabels(String),
    #[error("invalid metric definition: {0}")]
    InvalidDefinition(String),
    #[error("config: {0}")]
    Config(String),
}

impl PromDistError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PromDistError::NotConfigured => ErrorCode::NotConfigured,
            PromDistError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            PromDistError::InvalidValue(_) => ErrorCode::InvalidValue,
            PromDistError::Decode(_) => ErrorCode::Decode,
            PromDistError::InvalidLabels(_) => ErrorCode::InvalidLabels,
            PromDistError::InvalidDefinition(_) => ErrorCode::InvalidDefinition,
            PromDistError::Config(_) => ErrorCode::Config,
        }
    }
}
