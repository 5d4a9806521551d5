//! AI Sentinel Common - Shared types for the Ghost AI triage pipeline
//!
//! This crate provides the pieces every other sentinel crate agrees on:
//! - The request log record and its pre-screen fact sheet
//! - Risk categories and their score bands
//! - The immutable policy store (domain lists, patterns, departments)
//! - Error handling
//!
//! # Data Flow
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ LogEntry │──▶│ Pre-Screen │──▶│ Risk Decision │──▶│ AnalysisResult │
//! └──────────┘   └─────┬──────┘   └───────┬───────┘   └────────────────┘
//!                      │                  │
//!               ┌──────▼──────┐    ┌──────▼──────┐
//!               │ PolicyStore │    │  Workflow   │
//!               └─────────────┘    └─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod log;
pub mod policy;
pub mod result;
pub mod risk;

pub use error::*;
pub use log::{LogEntry, PreAnalysis, LARGE_PAYLOAD_KB};
pub use policy::{DomainList, PatternDef, PolicyConfig, PolicyStore, SensitivityTier};
pub use result::{AnalysisMethod, AnalysisResult, THREAT_SCORE_THRESHOLD};
pub use risk::{RiskCategory, ScoreBand};

/// Placeholder used when a log entry carries no user identifier.
pub const UNKNOWN_USER: &str = "Unknown";

/// Placeholder used when a log entry carries no department.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Sentinel IP used for mitigation when the source IP is absent.
pub const UNSPECIFIED_IP: &str = "0.0.0.0";
