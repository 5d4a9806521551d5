//! Error types for AI Sentinel

use thiserror::Error;

/// AI Sentinel error type
#[derive(Error, Debug)]
pub enum SentinelError {
    /// No sensitive-data patterns configured
    #[error("sensitive-data pattern table is empty")]
    EmptyPatternTable,

    /// A sensitive-data pattern failed to compile
    #[error("invalid pattern for '{label}': {reason}")]
    InvalidPattern {
        /// Data-type label of the pattern
        label: String,
        /// Compiler message
        reason: String,
    },

    /// Invalid policy
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// Configuration error
    #[error("config error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for AI Sentinel
pub type SentinelResult<T> = Result<T, SentinelError>;
