//! Error types for batch submission

use thiserror::Error;
use uuid::Uuid;

use crate::repository::RepositoryError;
use crate::service::MaterializeError;

/// Errors that abort a batch before any job runs
///
/// Job-level failures (non-zero exit, timeout, launch failure) are never
/// reported here; they live in the batch report.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A referenced script does not exist
    #[error("script {id} does not exist")]
    ScriptNotFound { id: Uuid },

    /// A script could not be written to disk
    #[error("failed to materialize script {id}: {source}")]
    Materialization {
        id: Uuid,
        #[source]
        source: MaterializeError,
    },

    /// The script repository failed for another reason
    #[error("script repository error: {0}")]
    Repository(#[source] RepositoryError),

    /// The request itself is malformed
    #[error("invalid batch request: {0}")]
    InvalidRequest(String),
}

impl From<RepositoryError> for BatchError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => BatchError::ScriptNotFound { id },
            other => BatchError::Repository(other),
        }
    }
}

impl BatchError {
    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ScriptNotFound { .. })
    }
}
