//! Sensitive Data Scanner
//!
//! Structural (regular-expression) detection of sensitive data in request
//! payloads. Patterns come from the policy store; every pattern is matched
//! case-insensitively and the scanner reports which data-type labels hit.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Payload Scan                        │
//! │                                                     │
//! │  ┌─────────────┐        ┌──────────────────┐        │
//! │  │  RegexSet   │──hit──▶│ Per-label Regex  │        │
//! │  │ single pass │        │ (detailed spans) │        │
//! │  └──────┬──────┘        └────────┬─────────┘        │
//! │         │                        │                  │
//! │   ┌─────▼─────┐           ┌──────▼──────┐           │
//! │   │  Labels   │           │   Matches   │           │
//! │   └───────────┘           └─────────────┘           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Patterns are purely structural, so false positives are expected: any
//! 8-12 digit number is reported as `account_number`.

#![warn(missing_docs)]

pub mod patterns;
pub mod scanner;

pub use patterns::PatternSet;
pub use scanner::{Match, ScanReport, SensitiveDataScanner};

use thiserror::Error;

/// Scanner construction error
#[derive(Error, Debug)]
pub enum ScanError {
    /// No patterns supplied
    #[error("no sensitive-data patterns supplied")]
    NoPatterns,

    /// Pattern failed to compile
    #[error("pattern '{label}' failed to compile: {reason}")]
    Compile {
        /// Data-type label
        label: String,
        /// Compiler message
        reason: String,
    },
}
