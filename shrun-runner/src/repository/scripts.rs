//! Scripts repository
//!
//! Handles storage of scripts:
//! - Creating scripts from validated uploads
//! - Looking scripts up by id
//! - Paging through stored scripts
//! - Packaging scripts as files for download
//! - Removing scripts

use async_trait::async_trait;
use shrun_core::domain::script::ScriptRecord;
use shrun_core::dto::page::{LimitOffset, Page};
use shrun_core::dto::script::{CreateScript, ScriptFile, ScriptValidationError};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors returned by script repositories
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("script {0} does not exist")]
    NotFound(Uuid),

    #[error("invalid script: {0}")]
    Validation(#[from] ScriptValidationError),

    #[error("script storage unavailable: {0}")]
    Unavailable(String),
}

/// Repository trait for stored scripts
#[async_trait]
pub trait ScriptRepository: Send + Sync {
    /// Stores a new script
    ///
    /// # Arguments
    /// * `req` - Title and body of the script; both must be non-empty
    async fn create(&self, req: CreateScript) -> Result<ScriptRecord, RepositoryError>;

    /// Fetches a script by id
    ///
    /// Fails with `RepositoryError::NotFound` when no such script exists.
    async fn get_by_id(&self, id: Uuid) -> Result<ScriptRecord, RepositoryError>;

    /// Fetches a script as a `<title>.sh` file
    async fn get_file_by_id(&self, id: Uuid) -> Result<ScriptFile, RepositoryError> {
        let record = self.get_by_id(id).await?;
        Ok(ScriptFile::from_record(&record))
    }

    /// Returns one page of scripts, oldest first
    async fn list_page(&self, params: LimitOffset) -> Result<Page<ScriptRecord>, RepositoryError>;

    /// Removes a script and returns it
    async fn remove_by_id(&self, id: Uuid) -> Result<ScriptRecord, RepositoryError>;
}

/// In-memory implementation of ScriptRepository
///
/// Scripts are kept in creation order.
#[derive(Default)]
pub struct InMemoryScriptRepository {
    scripts: RwLock<Vec<ScriptRecord>>,
}

impl InMemoryScriptRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScriptRepository for InMemoryScriptRepository {
    async fn create(&self, req: CreateScript) -> Result<ScriptRecord, RepositoryError> {
        req.validate()?;

        let record = ScriptRecord::new(req.title, req.body);
        self.scripts.write().await.push(record.clone());

        info!("Script created: {} ({})", record.id, record.title);
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<ScriptRecord, RepositoryError> {
        self.scripts
            .read()
            .await
            .iter()
            .find(|script| script.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn list_page(&self, params: LimitOffset) -> Result<Page<ScriptRecord>, RepositoryError> {
        let scripts = self.scripts.read().await.clone();
        debug!(
            "Listing scripts (limit: {}, offset: {}, total: {})",
            params.limit,
            params.offset,
            scripts.len()
        );
        Ok(Page::from_ordered(scripts, params))
    }

    async fn remove_by_id(&self, id: Uuid) -> Result<ScriptRecord, RepositoryError> {
        let mut scripts = self.scripts.write().await;
        let idx = scripts
            .iter()
            .position(|script| script.id == id)
            .ok_or(RepositoryError::NotFound(id))?;

        let removed = scripts.remove(idx);
        info!("Script removed: {}", id);
        Ok(removed)
    }
}
