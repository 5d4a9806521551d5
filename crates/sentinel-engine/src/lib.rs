//! AI Sentinel Engine - Ghost AI risk-decision pipeline
//!
//! Combines deterministic policy rules, sensitive-data detection, optional
//! threat intelligence and model-based reasoning into one verdict per
//! request, with automated mitigation for high-risk verdicts.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │ LogEntry │──▶│ PreScreener│──▶│ RiskEngine  │
//! └──────────┘   └────────────┘   └──────┬──────┘
//!                                        │
//!          ┌───────────────┬─────────────┼──────────────┐
//!          ▼               ▼             ▼              ▼
//!    ┌───────────┐  ┌────────────┐ ┌───────────┐ ┌────────────┐
//!    │Fast-track │  │  Agentic   │ │Rule-based │ │   Model    │
//!    │ APPROVED  │  │  Workflow  │ │ CRITICAL/ │ │  Analysis  │
//!    └───────────┘  │analyze →   │ │ LOW_RISK  │ └────────────┘
//!                   │  mitigate  │ └───────────┘
//!                   └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sentinel_engine::{RiskEngine, SentinelConfig};
//!
//! let mut config = SentinelConfig::default();
//! config.apply_env();
//! let engine = RiskEngine::from_config(&config)?;
//! let result = engine.analyze(entry, true).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod batch;
pub mod config;
pub mod decision;
pub mod memory;
pub mod prescreen;
pub mod prompt;
pub mod verdict;
pub mod workflow;

pub use backend::{
    build_backend, BackendConfig, BackendError, OllamaBackend, OpenAiBackend, Provider,
    ReasoningBackend, ScriptedBackend, UnavailableBackend,
};
pub use batch::{analytics, BatchAnalytics};
pub use config::{EngineConfig, SentinelConfig};
pub use decision::RiskEngine;
pub use memory::{InMemoryStore, MemoryStore};
pub use prescreen::PreScreener;
pub use verdict::{parse_verdict, ModelVerdict, VerdictError};
pub use workflow::{WorkflowError, WorkflowState};

use thiserror::Error;

/// Engine construction error
#[derive(Error, Debug)]
pub enum EngineError {
    /// Policy store rejected
    #[error(transparent)]
    Policy(#[from] sentinel_common::SentinelError),

    /// Scanner could not be built
    #[error(transparent)]
    Scan(#[from] sentinel_dlp::ScanError),

    /// Backend could not be built
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Threat intelligence client could not be built
    #[error(transparent)]
    Intel(#[from] sentinel_intel::IntelError),

    /// Mitigation or alert client could not be built
    #[error(transparent)]
    Dispatch(#[from] sentinel_soc::DispatchError),
}
