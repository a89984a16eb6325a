//! Job domain types
//!
//! A job is one materialized script bound to a timeout. Jobs only exist for
//! the lifetime of a batch and are never persisted.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Immutable input to the execution engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Diagnostic identity of the job (the script id)
    pub title: String,
    /// Path of the materialized script
    pub path: PathBuf,
    /// Relative bound on the job's runtime
    pub timeout: Duration,
}

/// Job execution state
///
/// `Pending -> Running -> {Succeeded, Failed, TimedOut, LaunchError}`.
/// Terminal states are final: jobs are never retried within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed { exit_code: i32 },
    TimedOut,
    LaunchError { message: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending | JobState::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobState::Succeeded)
    }

    /// Short human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed { .. } => "failed",
            JobState::TimedOut => "timed out",
            JobState::LaunchError { .. } => "launch error",
        }
    }
}

/// Outcome of a single job within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub title: String,
    #[serde(flatten)]
    pub state: JobState,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stdout: String,
    pub stderr: String,
}

impl JobReport {
    /// A report for a job that has not been launched yet
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: JobState::Pending,
            started_at: None,
            finished_at: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// A terminal report for a job whose process never started
    pub fn launch_error(title: impl Into<String>, message: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            state: JobState::LaunchError {
                message: message.into(),
            },
            started_at: Some(now),
            finished_at: Some(now),
            ..Self::pending(title)
        }
    }

    /// Wall-clock runtime, if the job both started and finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed { exit_code: 2 }.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
        assert!(
            JobState::LaunchError {
                message: "no shell".to_string()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_only_succeeded_is_success() {
        assert!(JobState::Succeeded.is_success());
        assert!(!JobState::TimedOut.is_success());
        assert!(!JobState::Failed { exit_code: 0 }.is_success());
    }

    #[test]
    fn test_launch_error_report_is_terminal_with_zero_duration() {
        let report = JobReport::launch_error("job", "spawn failed");
        assert!(report.state.is_terminal());
        assert_eq!(report.duration(), Some(chrono::Duration::zero()));
    }

    #[test]
    fn test_report_serializes_state_inline() {
        let mut report = JobReport::pending("job");
        report.state = JobState::Failed { exit_code: 3 };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["exit_code"], 3);
        assert_eq!(json["title"], "job");
    }
}
