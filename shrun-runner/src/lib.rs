//! Shrun Runner
//!
//! Executes batches of stored shell scripts.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Repository: stored scripts, looked up by id
//! - Services: materialization, job building, process launching, batch execution
//! - Orchestrator: the entry point tying a batch submission to all of the above
//!
//! A batch is resolved and materialized up front (failing fast if any script
//! is missing or cannot be written), then every job runs to a terminal state
//! under the requested concurrency policy. Materialized files are always
//! removed before the call returns.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::BatchError;
pub use orchestrator::BatchOrchestrator;
