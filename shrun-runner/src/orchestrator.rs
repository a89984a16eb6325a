//! Batch orchestrator
//!
//! Public entry point for running a batch of stored scripts:
//! 1. Resolve every script, failing the whole batch if one is missing
//! 2. Materialize every script, releasing partial work if one cannot be written
//! 3. Build job descriptors in submission order
//! 4. Run them through the execution engine
//!
//! Materialized files are owned by a `MaterializedSet` for the duration of the
//! call and released on every exit path.

use shrun_core::domain::batch::{BatchReport, ExecutionMode};
use shrun_core::domain::script::ScriptRecord;
use shrun_core::dto::batch::{ExecBatch, ExecScript};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::BatchError;
use crate::repository::ScriptRepository;
use crate::service::{
    ExecutionEngine, JobBuilder, MaterializedSet, Materializer, ShellProcessRunner,
    StandardExecutionEngine, TempFileMaterializer,
};

/// Runs batches of stored scripts
pub struct BatchOrchestrator {
    scripts: Arc<dyn ScriptRepository>,
    materializer: Arc<dyn Materializer>,
    engine: Arc<dyn ExecutionEngine>,
    job_builder: JobBuilder,
}

impl BatchOrchestrator {
    /// Creates an orchestrator from explicit collaborators
    pub fn new(
        scripts: Arc<dyn ScriptRepository>,
        materializer: Arc<dyn Materializer>,
        engine: Arc<dyn ExecutionEngine>,
        job_builder: JobBuilder,
    ) -> Self {
        Self {
            scripts,
            materializer,
            engine,
            job_builder,
        }
    }

    /// Creates an orchestrator wired with the standard services
    pub fn from_config(config: &Config, scripts: Arc<dyn ScriptRepository>) -> Self {
        let runner = ShellProcessRunner::new(config.shell.clone(), config.max_output_bytes);
        Self::new(
            scripts,
            Arc::new(TempFileMaterializer::new(config.temp_dir.clone())),
            Arc::new(StandardExecutionEngine::new(Arc::new(runner))),
            JobBuilder::new(config.default_timeout),
        )
    }

    /// Runs a batch submission
    pub async fn exec_batch(&self, batch: ExecBatch) -> Result<BatchReport, BatchError> {
        self.exec_scripts(batch.mode, &batch.scripts).await
    }

    /// Runs `requests` in `mode`
    ///
    /// Fails only if the batch cannot be set up. Once jobs start, every job
    /// runs to a terminal state and the outcome is in the returned report.
    pub async fn exec_scripts(
        &self,
        mode: ExecutionMode,
        requests: &[ExecScript],
    ) -> Result<BatchReport, BatchError> {
        if let ExecutionMode::Bounded { max_parallel: 0 } = mode {
            return Err(BatchError::InvalidRequest(
                "max_parallel must be greater than 0".to_string(),
            ));
        }

        info!("Submitting batch of {} script(s) in {} mode", requests.len(), mode);

        let records = self.resolve(requests).await?;

        let mut units = MaterializedSet::new(Arc::clone(&self.materializer));
        let mut jobs = Vec::with_capacity(records.len());

        for (record, request) in records.iter().zip(requests) {
            let unit = self
                .materializer
                .materialize(&record.body)
                .map_err(|source| BatchError::Materialization {
                    id: record.id,
                    source,
                })?;

            jobs.push(self.job_builder.build(record, &unit, request));
            units.push(unit);
        }

        debug!("Materialized {} script(s)", units.len());

        let report = self.engine.run(mode, jobs).await;
        units.release_all();

        let summary = report.summary();
        info!(
            "Batch finished: {} succeeded, {} failed, {} timed out, {} launch error(s)",
            summary.succeeded, summary.failed, summary.timed_out, summary.launch_errors
        );

        Ok(report)
    }

    /// Looks up every requested script in order, stopping at the first miss
    async fn resolve(&self, requests: &[ExecScript]) -> Result<Vec<ScriptRecord>, BatchError> {
        let mut records = Vec::with_capacity(requests.len());

        for request in requests {
            let record = self.scripts.get_by_id(request.id).await?;
            debug!("Resolved script {} ({})", record.id, record.title);
            records.push(record);
        }

        Ok(records)
    }
}
