//! Script DTOs

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::script::ScriptRecord;

/// File extension accepted for uploaded scripts
pub const SCRIPT_EXTENSION: &str = "sh";

/// Request to store a new script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScript {
    pub title: String,
    pub body: String,
}

/// Reasons a script upload is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptValidationError {
    #[error("unsupported script extension '{0}', expected '.sh'")]
    Extension(String),

    #[error("script title must not be empty")]
    EmptyTitle,

    #[error("script body must not be empty")]
    EmptyBody,
}

impl CreateScript {
    /// Builds a creation request from an uploaded file
    ///
    /// The title is the file stem. The extension must be `sh`, and neither
    /// the title nor the body may be empty.
    pub fn from_file(
        file_name: &str,
        body: impl Into<String>,
    ) -> Result<Self, ScriptValidationError> {
        let path = Path::new(file_name);

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if extension != SCRIPT_EXTENSION {
            return Err(ScriptValidationError::Extension(extension.to_string()));
        }

        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();

        let request = Self {
            title,
            body: body.into(),
        };
        request.validate()?;

        Ok(request)
    }

    /// Checks that title and body are non-empty
    pub fn validate(&self) -> Result<(), ScriptValidationError> {
        if self.title.trim().is_empty() {
            return Err(ScriptValidationError::EmptyTitle);
        }
        if self.body.is_empty() {
            return Err(ScriptValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// A stored script packaged for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFile {
    /// `<title>.sh`
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ScriptFile {
    pub fn from_record(record: &ScriptRecord) -> Self {
        Self {
            file_name: format!("{}.{}", record.title, SCRIPT_EXTENSION),
            content: record.body.clone().into_bytes(),
        }
    }
}
