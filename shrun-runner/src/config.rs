//! Runner configuration
//!
//! Defines the configurable parameters for batch execution: which shell runs
//! the scripts, where they are materialized, and the default bounds applied to
//! jobs that do not carry their own.

use anyhow::Context;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default bound applied to jobs submitted with a zero timeout
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// Default per-stream output capture limit (1 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interpreter used to run materialized scripts (e.g., "bash")
    pub shell: String,

    /// Bound applied when a request's timeout is zero
    pub default_timeout: Duration,

    /// Directory for materialized scripts (None = system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Maximum bytes captured per output stream; the rest is discarded
    pub max_output_bytes: usize,

    /// Default parallelism bound for concurrent batches (None = unbounded)
    pub max_parallel: Option<usize>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(shell: String) -> Self {
        Self {
            shell,
            default_timeout: DEFAULT_JOB_TIMEOUT,
            temp_dir: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            max_parallel: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SHRUN_SHELL (optional, default: bash)
    /// - SHRUN_DEFAULT_TIMEOUT (optional, seconds, default: 300)
    /// - SHRUN_TEMP_DIR (optional, default: system temp dir)
    /// - SHRUN_MAX_OUTPUT_BYTES (optional, default: 1048576)
    /// - SHRUN_MAX_PARALLEL (optional, default: unbounded)
    pub fn from_env() -> anyhow::Result<Self> {
        let shell = std::env::var("SHRUN_SHELL").unwrap_or_else(|_| "bash".to_string());

        let default_timeout = parse_var::<u64>("SHRUN_DEFAULT_TIMEOUT")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_JOB_TIMEOUT);

        let temp_dir = std::env::var_os("SHRUN_TEMP_DIR").map(PathBuf::from);

        let max_output_bytes =
            parse_var::<usize>("SHRUN_MAX_OUTPUT_BYTES")?.unwrap_or(DEFAULT_MAX_OUTPUT_BYTES);

        let max_parallel = parse_var::<usize>("SHRUN_MAX_PARALLEL")?;

        Ok(Self {
            shell,
            default_timeout,
            temp_dir,
            max_output_bytes,
            max_parallel,
        })
    }

    /// Overrides the materialization directory
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.shell.trim().is_empty() {
            anyhow::bail!("shell cannot be empty");
        }

        if self.default_timeout.is_zero() {
            anyhow::bail!("default_timeout must be greater than 0");
        }

        if self.max_output_bytes == 0 {
            anyhow::bail!("max_output_bytes must be greater than 0");
        }

        if self.max_parallel == Some(0) {
            anyhow::bail!("max_parallel must be greater than 0");
        }

        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                anyhow::bail!("temp_dir {} is not a directory", dir.display());
            }
        }

        Ok(())
    }
}

/// Reads an optional numeric environment variable
///
/// Unset means `None`; a value that does not parse is an error.
fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr<Err = ParseIntError>,
{
    parse_value(name, std::env::var(name).ok())
}

fn parse_value<T>(name: &str, raw: Option<String>) -> anyhow::Result<Option<T>>
where
    T: FromStr<Err = ParseIntError>,
{
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value))
    })
    .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self::new("bash".to_string())
    }
}
