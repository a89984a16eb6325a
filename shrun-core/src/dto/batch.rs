//! Batch submission DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::batch::ExecutionMode;

/// One entry of a batch: a stored script and its timeout
///
/// A `timeout_seconds` of zero (or an absent field) means the runner's
/// configured default bound applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecScript {
    pub id: Uuid,
    #[serde(default)]
    pub timeout_seconds: u64,
}

/// Request to execute an ordered list of stored scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecBatch {
    #[serde(default)]
    pub mode: ExecutionMode,
    pub scripts: Vec<ExecScript>,
}
