//! Script materialization
//!
//! Turns a script body into a uniquely named temp file that a shell can run,
//! and removes it again when the batch is done. Removal never fails loudly:
//! problems are logged and the batch carries on.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Temp file name prefix for materialized scripts
const FILE_PREFIX: &str = "shrun-";

/// Temp file name suffix for materialized scripts
const FILE_SUFFIX: &str = ".sh";

/// Failure to write a script to disk
#[derive(Debug, Error)]
#[error("failed to write script to a temp file: {0}")]
pub struct MaterializeError(#[from] pub std::io::Error);

/// A script body written to disk
///
/// Owns the temp file handle. Hand it back to the materializer that created it
/// via `release`; dropping it without release still removes the file.
#[derive(Debug)]
pub struct MaterializedUnit {
    file: NamedTempFile,
}

impl MaterializedUnit {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Service trait for writing scripts to disk and reclaiming them
pub trait Materializer: Send + Sync {
    /// Writes `body` to a freshly created temp file
    fn materialize(&self, body: &str) -> Result<MaterializedUnit, MaterializeError>;

    /// Removes the unit's file
    ///
    /// Must tolerate a file that is already gone. Failures are logged.
    fn release(&self, unit: MaterializedUnit);
}

/// Materializer backed by `tempfile`
pub struct TempFileMaterializer {
    dir: Option<PathBuf>,
}

impl TempFileMaterializer {
    /// Creates a materializer writing into `dir`, or the system temp dir
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl Materializer for TempFileMaterializer {
    fn materialize(&self, body: &str) -> Result<MaterializedUnit, MaterializeError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(FILE_PREFIX).suffix(FILE_SUFFIX);

        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(body.as_bytes())?;
        file.flush()?;

        debug!("Materialized script at {}", file.path().display());
        Ok(MaterializedUnit { file })
    }

    fn release(&self, unit: MaterializedUnit) {
        let path = unit.path().to_path_buf();

        match unit.file.close() {
            Ok(()) => debug!("Removed materialized script {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Materialized script {} was already removed", path.display())
            }
            Err(e) => warn!(
                "Failed to remove materialized script {}: {}",
                path.display(),
                e
            ),
        }
    }
}

/// Scoped ownership of every unit materialized for one batch
///
/// Releases each unit exactly once when dropped, whichever way the batch
/// exits: normal return, early error return or unwinding.
pub struct MaterializedSet {
    materializer: Arc<dyn Materializer>,
    units: Vec<MaterializedUnit>,
}

impl MaterializedSet {
    pub fn new(materializer: Arc<dyn Materializer>) -> Self {
        Self {
            materializer,
            units: Vec::new(),
        }
    }

    pub fn push(&mut self, unit: MaterializedUnit) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Releases every unit held so far
    pub fn release_all(&mut self) {
        if self.units.is_empty() {
            return;
        }

        debug!("Releasing {} materialized script(s)", self.units.len());
        for unit in self.units.drain(..) {
            self.materializer.release(unit);
        }
    }
}

impl Drop for MaterializedSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
