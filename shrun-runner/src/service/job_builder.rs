//! Job builder
//!
//! Pairs a resolved script and its materialized file with the requested
//! timeout to produce the engine's input.

use shrun_core::domain::job::JobDescriptor;
use shrun_core::domain::script::ScriptRecord;
use shrun_core::dto::batch::ExecScript;
use std::time::Duration;

use crate::service::materializer::MaterializedUnit;

/// Builds job descriptors
#[derive(Debug, Clone, Copy)]
pub struct JobBuilder {
    default_timeout: Duration,
}

impl JobBuilder {
    /// Creates a builder
    ///
    /// # Arguments
    /// * `default_timeout` - Bound used for requests with a zero timeout
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn build(
        &self,
        record: &ScriptRecord,
        unit: &MaterializedUnit,
        request: &ExecScript,
    ) -> JobDescriptor {
        JobDescriptor {
            title: record.job_title(),
            path: unit.path().to_path_buf(),
            timeout: self.timeout_for(request),
        }
    }

    fn timeout_for(&self, request: &ExecScript) -> Duration {
        match request.timeout_seconds {
            0 => self.default_timeout,
            secs => Duration::from_secs(secs),
        }
    }
}
