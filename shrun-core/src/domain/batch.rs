//! Batch domain types

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobReport, JobState};

/// Concurrency policy for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One job at a time, in submission order
    #[default]
    Sequential,
    /// Every job launched at once
    Concurrent,
    /// At most `max_parallel` jobs running at once
    Bounded { max_parallel: usize },
}

impl ExecutionMode {
    /// Maps the legacy `is_sync` flag onto a mode
    pub fn from_sync_flag(is_sync: bool) -> Self {
        if is_sync {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Concurrent => write!(f, "concurrent"),
            ExecutionMode::Bounded { max_parallel } => write!(f, "bounded({})", max_parallel),
        }
    }
}

/// Aggregated outcome of a batch, one report per job in submission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub mode: ExecutionMode,
    pub jobs: Vec<JobReport>,
}

/// Per-state job counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub launch_errors: usize,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.jobs.iter().all(|job| job.state.is_success())
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.jobs.len(),
            ..Default::default()
        };

        for job in &self.jobs {
            match job.state {
                JobState::Succeeded => summary.succeeded += 1,
                JobState::Failed { .. } => summary.failed += 1,
                JobState::TimedOut => summary.timed_out += 1,
                JobState::LaunchError { .. } => summary.launch_errors += 1,
                JobState::Pending | JobState::Running => {}
            }
        }

        summary
    }
}
