//! CLI command handlers

pub mod analyze;
pub mod config;
pub mod policy;
pub mod scan;
pub mod search;
