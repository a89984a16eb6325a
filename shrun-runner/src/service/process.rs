//! Process runner
//!
//! Launches one materialized script under the configured shell and drives it
//! to a terminal state:
//! - Spawns the shell in its own process group (unix)
//! - Drains stdout/stderr concurrently so the child never blocks on a full pipe
//! - Kills the whole process group when the job's timeout expires, and again
//!   once the shell exits so no background process outlives the job

use async_trait::async_trait;
use shrun_core::domain::job::{JobDescriptor, JobReport, JobState};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// How long to wait for output pipes to close after the process has ended
///
/// Background processes the script left behind may keep the pipes open.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Read chunk size for output streams
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Service trait for running a single job to a terminal state
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the job and reports its terminal state
    ///
    /// Never fails: problems starting the process are reported as
    /// `JobState::LaunchError`.
    async fn launch(&self, job: &JobDescriptor) -> JobReport;
}

/// Runs scripts as `<shell> <path>`
pub struct ShellProcessRunner {
    shell: String,
    max_output_bytes: usize,
}

impl ShellProcessRunner {
    /// Creates a new shell runner
    ///
    /// # Arguments
    /// * `shell` - Interpreter to invoke (e.g., "bash")
    /// * `max_output_bytes` - Bytes kept per output stream; the rest is read and discarded
    pub fn new(shell: impl Into<String>, max_output_bytes: usize) -> Self {
        Self {
            shell: shell.into(),
            max_output_bytes,
        }
    }

    fn command(&self, job: &JobDescriptor) -> Command {
        let mut std_cmd = std::process::Command::new(&self.shell);
        std_cmd
            .arg(&job.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can take down everything the script spawned
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ProcessRunner for ShellProcessRunner {
    async fn launch(&self, job: &JobDescriptor) -> JobReport {
        let mut report = JobReport::pending(job.title.clone());

        let mut child = match self.command(job).spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to launch job {}: {}", job.title, e);
                return JobReport::launch_error(
                    job.title.clone(),
                    format!("failed to start '{}': {}", self.shell, e),
                );
            }
        };

        // Held until the job is done, or dropped with this future on cancellation
        let group = ProcessGroup::new(child.id(), &job.title);

        report.state = JobState::Running;
        report.started_at = Some(chrono::Utc::now());
        debug!(
            "Job {} running as pid {:?} (timeout: {:?})",
            job.title,
            child.id(),
            job.timeout
        );

        let stdout = OutputBuffer::default();
        let stderr = OutputBuffer::default();
        let mut stdout_task = tokio::spawn(read_stream(
            child.stdout.take(),
            self.max_output_bytes,
            Arc::clone(&stdout),
        ));
        let mut stderr_task = tokio::spawn(read_stream(
            child.stderr.take(),
            self.max_output_bytes,
            Arc::clone(&stderr),
        ));

        report.state = match tokio::time::timeout(job.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => JobState::Succeeded,
            Ok(Ok(status)) => JobState::Failed {
                exit_code: status.code().unwrap_or(-1),
            },
            Ok(Err(e)) => {
                error!("Failed to wait for job {}: {}", job.title, e);
                terminate(&mut child, &group).await;
                JobState::LaunchError {
                    message: format!("failed to wait for process: {}", e),
                }
            }
            Err(_elapsed) => {
                warn!("Job {} timed out after {:?}", job.title, job.timeout);
                terminate(&mut child, &group).await;
                JobState::TimedOut
            }
        };
        report.finished_at = Some(chrono::Utc::now());

        // Nothing the script left in its group outlives the job
        drop(group);

        drain_readers(
            &mut stdout_task,
            &mut stderr_task,
            OUTPUT_DRAIN_GRACE,
            &job.title,
        )
        .await;
        report.stdout = decode(&stdout).await;
        report.stderr = decode(&stderr).await;

        report
    }
}

/// Bytes captured from one output stream
type OutputBuffer = Arc<Mutex<Vec<u8>>>;

/// The process group a job's shell leads
///
/// Dropping it sends SIGKILL to every process still in the group.
struct ProcessGroup {
    pid: Option<u32>,
    title: String,
}

impl ProcessGroup {
    fn new(pid: Option<u32>, title: &str) -> Self {
        Self {
            pid,
            title: title.to_string(),
        }
    }

    fn kill(&self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, killpg};
            use nix::unistd::Pid;

            if let Some(pid) = self.pid {
                match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) => debug!("Killed process group of job {}", self.title),
                    Err(nix::errno::Errno::ESRCH) => {}
                    Err(e) => debug!("Failed to kill process group of job {}: {}", self.title, e),
                }
            }
        }
        #[cfg(not(unix))]
        let _ = (self.pid, &self.title);
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Kills the child's process group and reaps the child
async fn terminate(child: &mut Child, group: &ProcessGroup) {
    group.kill();

    if let Err(e) = child.kill().await {
        warn!("Failed to kill job {}: {}", group.title, e);
    }
}

/// Reads a stream to EOF, keeping at most `limit` bytes in `kept`
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize, kept: OutputBuffer) {
    let Some(mut reader) = handle else {
        return;
    };

    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let mut kept = kept.lock().await;
                let room = limit.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
}

/// Waits for both readers under one deadline, aborting them when it passes
///
/// Whatever was read before the deadline stays in the buffers.
async fn drain_readers(
    stdout: &mut JoinHandle<()>,
    stderr: &mut JoinHandle<()>,
    grace: Duration,
    title: &str,
) {
    let drained =
        tokio::time::timeout(grace, async { tokio::join!(&mut *stdout, &mut *stderr) }).await;

    match drained {
        Ok((out, err)) => {
            for result in [out, err] {
                if let Err(e) = result {
                    warn!("Output reader for job {} failed: {}", title, e);
                }
            }
        }
        Err(_) => {
            debug!("Output of job {} still open after exit, keeping what was read", title);
            stdout.abort();
            stderr.abort();
        }
    }
}

async fn decode(buffer: &OutputBuffer) -> String {
    String::from_utf8_lossy(&buffer.lock().await).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_script(body: &str) -> NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    fn job_for(file: &NamedTempFile, timeout: Duration) -> JobDescriptor {
        JobDescriptor {
            title: "test-job".to_string(),
            path: file.path().to_path_buf(),
            timeout,
        }
    }

    /// True while the process exists and is not a zombie
    #[cfg(target_os = "linux")]
    fn is_alive(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => {
                let state = stat
                    .rsplit_once(')')
                    .and_then(|(_, rest)| rest.trim_start().chars().next());
                !matches!(state, Some('Z') | Some('X') | None)
            }
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    fn read_pid(path: &std::path::Path) -> u32 {
        std::fs::read_to_string(path).unwrap().trim().parse().unwrap()
    }

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let script = write_script("echo hello\necho oops >&2\n");
        let runner = ShellProcessRunner::new("bash", 1024);

        let report = runner.launch(&job_for(&script, Duration::from_secs(5))).await;

        assert_eq!(report.state, JobState::Succeeded);
        assert_eq!(report.stdout, "hello\n");
        assert_eq!(report.stderr, "oops\n");
        assert!(report.started_at.is_some());
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let script = write_script("exit 42\n");
        let runner = ShellProcessRunner::new("bash", 1024);

        let report = runner.launch(&job_for(&script, Duration::from_secs(5))).await;

        assert_eq!(report.state, JobState::Failed { exit_code: 42 });
    }

    #[tokio::test]
    async fn test_missing_shell_is_launch_error() {
        let script = write_script("exit 0\n");
        let runner = ShellProcessRunner::new("/nonexistent/shrun-shell", 1024);

        let report = runner.launch(&job_for(&script, Duration::from_secs(5))).await;

        assert!(matches!(report.state, JobState::LaunchError { .. }));
        assert!(report.state.is_terminal());
    }

    #[tokio::test]
    async fn test_output_is_capped_without_blocking() {
        // Far more than a pipe buffer; the child must not stall on a full pipe
        let script = write_script("head -c 1000000 /dev/zero | tr '\\0' 'x'\n");
        let runner = ShellProcessRunner::new("bash", 16);

        let report = runner.launch(&job_for(&script, Duration::from_secs(10))).await;

        assert_eq!(report.state, JobState::Succeeded);
        assert_eq!(report.stdout, "x".repeat(16));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_process_tree() {
        let dir = tempfile::tempdir().unwrap();
        let shell_pid = dir.path().join("shell.pid");
        let child_pid = dir.path().join("child.pid");
        let script = write_script(&format!(
            "echo $$ > {}\nsleep 30 &\necho $! > {}\nwait\n",
            shell_pid.display(),
            child_pid.display()
        ));
        let runner = ShellProcessRunner::new("bash", 1024);

        let started = std::time::Instant::now();
        let report = runner
            .launch(&job_for(&script, Duration::from_millis(500)))
            .await;

        assert_eq!(report.state, JobState::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(10));

        let shell = read_pid(&shell_pid);
        let child = read_pid(&child_pid);
        assert!(!is_alive(shell), "shell process {} still running", shell);

        // The orphaned sleep is reaped asynchronously by init
        for _ in 0..50 {
            if !is_alive(child) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!is_alive(child), "background process {} still running", child);
    }

    #[tokio::test]
    async fn test_background_child_does_not_hold_output() {
        let dir = tempfile::tempdir().unwrap();
        let child_pid = dir.path().join("child.pid");
        let script = write_script(&format!(
            "sleep 8 &\necho $! > {}\necho hi\nexit 0\n",
            child_pid.display()
        ));
        let runner = ShellProcessRunner::new("bash", 1024);

        let started = std::time::Instant::now();
        let report = runner.launch(&job_for(&script, Duration::from_secs(5))).await;

        assert_eq!(report.state, JobState::Succeeded);
        assert_eq!(report.stdout, "hi\n");
        assert!(started.elapsed() < OUTPUT_DRAIN_GRACE);

        #[cfg(target_os = "linux")]
        {
            let child = read_pid(&child_pid);
            for _ in 0..50 {
                if !is_alive(child) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            assert!(!is_alive(child), "background process {} outlived the job", child);
        }
    }

    #[tokio::test]
    async fn test_drain_deadline_keeps_captured_bytes() {
        let stdout = OutputBuffer::default();
        let stderr = OutputBuffer::default();

        let held = Arc::clone(&stdout);
        let mut stdout_task = tokio::spawn(async move {
            held.lock().await.extend_from_slice(b"partial");
            std::future::pending::<()>().await;
        });
        let mut stderr_task = tokio::spawn(async {});

        let started = std::time::Instant::now();
        drain_readers(
            &mut stdout_task,
            &mut stderr_task,
            Duration::from_millis(100),
            "test-job",
        )
        .await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(decode(&stdout).await, "partial");
        assert_eq!(decode(&stderr).await, "");
        assert!(stdout_task.await.unwrap_err().is_cancelled());
    }
}
