//! Service layer
//!
//! Services contain the moving parts of batch execution: writing scripts to
//! disk, turning them into job descriptors, launching processes and running
//! whole batches under a concurrency policy.
//!
//! All services are trait-based to enable testing and dependency injection.

mod engine;
mod job_builder;
mod materializer;
mod process;

// Re-export traits
pub use engine::ExecutionEngine;
pub use materializer::Materializer;
pub use process::ProcessRunner;

// Re-export implementations
pub use engine::StandardExecutionEngine;
pub use job_builder::JobBuilder;
pub use materializer::{MaterializeError, MaterializedSet, MaterializedUnit, TempFileMaterializer};
pub use process::ShellProcessRunner;
