//! Execution engine
//!
//! Runs a batch of job descriptors under a concurrency policy:
//! - Sequential: one job at a time, in submission order
//! - Concurrent: every job at once
//! - Bounded: at most N jobs at once
//!
//! A job's failure never affects its siblings, and `run` only returns once
//! every job has reached a terminal state. Every job runs in its own task, so
//! a panicking job is reported in its own slot, and dropping `run` aborts
//! whatever is still running.

use async_trait::async_trait;
use shrun_core::domain::batch::{BatchReport, ExecutionMode};
use shrun_core::domain::job::{JobDescriptor, JobReport, JobState};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::service::process::ProcessRunner;

/// Service trait for executing a batch of jobs
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Runs every job and reports their outcomes in submission order
    ///
    /// # Arguments
    /// * `mode` - Concurrency policy for this batch
    /// * `jobs` - Job descriptors, in submission order
    async fn run(&self, mode: ExecutionMode, jobs: Vec<JobDescriptor>) -> BatchReport;
}

/// Standard implementation of ExecutionEngine
pub struct StandardExecutionEngine {
    runner: Arc<dyn ProcessRunner>,
}

impl StandardExecutionEngine {
    /// Creates an engine that launches jobs through `runner`
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    async fn run_sequential(&self, jobs: Vec<JobDescriptor>) -> Vec<JobReport> {
        let total = jobs.len();
        let mut reports = Vec::with_capacity(total);

        for (idx, job) in jobs.into_iter().enumerate() {
            info!("Executing job {}/{}: {}", idx + 1, total, job.title);
            let title = job.title.clone();

            let mut tasks = JoinSet::new();
            tasks.spawn(launch_job(Arc::clone(&self.runner), job, None));

            let report = match tasks.join_next().await {
                Some(Ok(report)) => report,
                Some(Err(e)) => task_failed(title, e),
                None => JobReport::launch_error(title, "job task was not started".to_string()),
            };
            reports.push(report);
        }

        reports
    }

    async fn run_concurrent(
        &self,
        jobs: Vec<JobDescriptor>,
        limit: Option<Arc<Semaphore>>,
    ) -> Vec<JobReport> {
        let titles: Vec<String> = jobs.iter().map(|job| job.title.clone()).collect();

        // Dropping the set aborts every job still running
        let mut tasks = JoinSet::new();
        for (idx, job) in jobs.into_iter().enumerate() {
            let job = launch_job(Arc::clone(&self.runner), job, limit.clone());
            tasks.spawn(async move { (idx, job.await) });
        }

        info!("Launched {} job(s), waiting for all to finish", titles.len());

        // One slot per job, in submission order
        let mut slots: Vec<Option<JobReport>> = titles.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, report)) => slots[idx] = Some(report),
                Err(e) => warn!("Job task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(titles)
            .map(|(slot, title)| {
                slot.unwrap_or_else(|| {
                    JobReport::launch_error(title, "job task panicked".to_string())
                })
            })
            .collect()
    }
}

/// Runs one job, waiting for a slot first when a limit is set
async fn launch_job(
    runner: Arc<dyn ProcessRunner>,
    job: JobDescriptor,
    limit: Option<Arc<Semaphore>>,
) -> JobReport {
    // Permit is released when dropped at the end of the job
    let _permit = match limit {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                return JobReport::launch_error(
                    job.title.clone(),
                    format!("concurrency limiter closed: {}", e),
                );
            }
        },
        None => None,
    };

    debug!("Job {} acquired a slot", job.title);
    let report = runner.launch(&job).await;
    log_outcome(&report);
    report
}

fn task_failed(title: String, err: JoinError) -> JobReport {
    warn!("Job task {} failed: {}", title, err);
    JobReport::launch_error(title, format!("job task failed: {}", err))
}

#[async_trait]
impl ExecutionEngine for StandardExecutionEngine {
    async fn run(&self, mode: ExecutionMode, jobs: Vec<JobDescriptor>) -> BatchReport {
        info!("Running {} job(s) in {} mode", jobs.len(), mode);

        let reports = match mode {
            ExecutionMode::Sequential => self.run_sequential(jobs).await,
            ExecutionMode::Concurrent => self.run_concurrent(jobs, None).await,
            ExecutionMode::Bounded { max_parallel } => {
                let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
                self.run_concurrent(jobs, Some(semaphore)).await
            }
        };

        BatchReport {
            mode,
            jobs: reports,
        }
    }
}

fn log_outcome(report: &JobReport) {
    match &report.state {
        JobState::Succeeded => info!("Job {} succeeded", report.title),
        JobState::Failed { exit_code } => {
            warn!("Job {} failed with exit code {}", report.title, exit_code)
        }
        JobState::TimedOut => warn!("Job {} timed out", report.title),
        JobState::LaunchError { message } => {
            warn!("Job {} could not be launched: {}", report.title, message)
        }
        JobState::Pending | JobState::Running => {
            warn!("Job {} returned without a terminal state", report.title)
        }
    }
}
