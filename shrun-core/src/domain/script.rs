//! Script domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored script
///
/// Immutable once created. Owned by the script repository and read-only to
/// the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ScriptRecord {
    /// Creates a new record with a fresh id
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Stable textual identity used as the job title in logs and reports
    pub fn job_title(&self) -> String {
        self.id.to_string()
    }
}
