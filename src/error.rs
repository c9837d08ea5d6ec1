//! Unified error hierarchy for powercurve
//!
//! Decode failures are scoped to a single activity and carry the byte offset
//! where they were detected. Request-level errors are caller contract
//! violations and are raised before any decoding starts.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for powercurve operations
#[derive(Debug, Error)]
pub enum PowerCurveError {
    /// FIT decoding errors
    #[error("FIT decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Requested date range is inverted
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Duration grid violates its ordering rules
    #[error("Invalid duration grid: {reason}")]
    InvalidGrid { reason: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Owner id that would escape the store root
    #[error("Invalid athlete id '{0}': must be a single path component")]
    InvalidOwner(String),

    /// Activity store errors
    #[error("Store error at {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// FIT decoding errors, each tagged with the byte offset where detection occurred
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// File header is missing, too short, or carries a bad signature
    #[error("Malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },

    /// Header or file CRC does not match the computed value
    #[error("Checksum mismatch at byte {offset}: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch {
        offset: usize,
        expected: u16,
        actual: u16,
    },

    /// Data record uses a local type with no preceding definition
    #[error("Undefined local message type {local_type} at byte {offset}")]
    UndefinedLocalType { offset: usize, local_type: u8 },

    /// Record stream ends before the declared bytes
    #[error("Truncated stream at byte {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    /// Byte offset where the failure was detected
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::MalformedHeader { offset, .. }
            | DecodeError::ChecksumMismatch { offset, .. }
            | DecodeError::UndefinedLocalType { offset, .. }
            | DecodeError::Truncated { offset, .. } => *offset,
        }
    }

    /// Short machine-friendly label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::MalformedHeader { .. } => "malformed_header",
            DecodeError::ChecksumMismatch { .. } => "checksum_mismatch",
            DecodeError::UndefinedLocalType { .. } => "undefined_local_type",
            DecodeError::Truncated { .. } => "truncated",
        }
    }
}

/// Result type alias for powercurve operations
pub type Result<T> = std::result::Result<T, PowerCurveError>;

impl PowerCurveError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // A bad file only costs that file its contribution.
            PowerCurveError::Decode(_) => ErrorSeverity::Warning,
            PowerCurveError::InvalidRange { .. } | PowerCurveError::InvalidGrid { .. } => {
                ErrorSeverity::Error
            }
            PowerCurveError::Configuration(_) => ErrorSeverity::Error,
            PowerCurveError::InvalidOwner(_) | PowerCurveError::Store { .. } => ErrorSeverity::Error,
            PowerCurveError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PowerCurveError::Decode(e) => {
                format!("Activity file could not be read ({}): {}", e.kind(), e)
            }
            PowerCurveError::InvalidRange { .. } => {
                "Start date cannot be after end date.".to_string()
            }
            PowerCurveError::Store { path, .. } => {
                format!("Could not read activities from {}", path.display())
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents the request
    Error,
    /// Warning that doesn't prevent the request
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
