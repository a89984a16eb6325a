//! Shrun CLI
//!
//! Loads shell scripts from disk and runs them as one batch.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use shrun_core::domain::batch::{BatchReport, ExecutionMode};
use shrun_core::domain::job::{JobReport, JobState};
use shrun_core::dto::batch::ExecScript;
use shrun_core::dto::script::CreateScript;
use shrun_runner::repository::{InMemoryScriptRepository, ScriptRepository};
use shrun_runner::{BatchOrchestrator, Config};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shrun")]
#[command(about = "Run shell scripts as a time-bounded batch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scripts as one batch
    Run(RunArgs),
    /// Validate script files without running them
    Check {
        /// Script files (*.sh)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Launch all scripts at once instead of one after another
    #[arg(short, long)]
    concurrent: bool,

    /// Run at most N scripts at once (implies --concurrent)
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Per-script timeout in seconds (0 = configured default)
    #[arg(short, long, default_value_t = 0)]
    timeout: u64,

    /// Interpreter used to run the scripts (overrides SHRUN_SHELL)
    #[arg(long)]
    shell: Option<String>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Script files (*.sh), run in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shrun=info,shrun_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Run(args) => {
            let config = Config::from_env().context("Failed to load configuration")?;
            run_batch(args, config).await?
        }
        Commands::Check { files } => check_files(&files).await,
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

/// Loads the files, runs them and prints the report
///
/// Returns whether every job succeeded.
async fn run_batch(args: RunArgs, mut config: Config) -> Result<bool> {
    if let Some(shell) = args.shell {
        config.shell = shell;
    }
    config.validate()?;

    let repo = Arc::new(InMemoryScriptRepository::new());
    let mut requests = Vec::with_capacity(args.files.len());
    let mut labels = HashMap::new();

    for path in &args.files {
        let script = load_script(path).await?;
        let record = repo
            .create(script)
            .await
            .with_context(|| format!("Failed to store {}", path.display()))?;

        labels.insert(record.id.to_string(), path.display().to_string());
        requests.push(ExecScript {
            id: record.id,
            timeout_seconds: args.timeout,
        });
    }

    let mode = resolve_mode(args.concurrent, args.max_parallel, &config);
    info!("Loaded {} script(s), running in {} mode", requests.len(), mode);

    let orchestrator = BatchOrchestrator::from_config(&config, repo);
    let report = orchestrator
        .exec_scripts(mode, &requests)
        .await
        .context("Batch could not be started")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &labels);
    }

    Ok(report.all_succeeded())
}

/// Validates each file and prints one line per file
///
/// Returns whether every file is a valid script.
async fn check_files(files: &[PathBuf]) -> bool {
    let mut all_valid = true;

    for path in files {
        match load_script(path).await {
            Ok(script) => println!("  {} {} ({})", "✓".green(), path.display(), script.title),
            Err(e) => {
                all_valid = false;
                println!("  {} {}: {:#}", "✗".red(), path.display(), e);
            }
        }
    }

    all_valid
}

async fn load_script(path: &Path) -> Result<CreateScript> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    CreateScript::from_file(&file_name, body)
        .with_context(|| format!("Invalid script {}", path.display()))
}

/// Picks the execution mode from flags and configuration
///
/// An explicit `--max-parallel` wins; otherwise `--concurrent` uses the
/// configured bound, if any.
fn resolve_mode(concurrent: bool, max_parallel: Option<usize>, config: &Config) -> ExecutionMode {
    match (max_parallel, concurrent) {
        (Some(max_parallel), _) => ExecutionMode::Bounded { max_parallel },
        (None, true) => config
            .max_parallel
            .map_or(ExecutionMode::Concurrent, |max_parallel| {
                ExecutionMode::Bounded { max_parallel }
            }),
        (None, false) => ExecutionMode::Sequential,
    }
}

fn print_report(report: &BatchReport, labels: &HashMap<String, String>) {
    let summary = report.summary();

    println!(
        "{}",
        format!("Ran {} script(s) ({} mode):", summary.total, report.mode).bold()
    );
    println!();

    for job in &report.jobs {
        print_job(job, labels.get(&job.title).map(String::as_str));
    }

    println!(
        "{} succeeded, {} failed, {} timed out, {} launch error(s)",
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red(),
        summary.timed_out.to_string().red(),
        summary.launch_errors.to_string().red()
    );
}

fn print_job(job: &JobReport, label: Option<&str>) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        label.unwrap_or(&job.title),
        job.title.dimmed()
    );
    println!("    Status:   {}", colorize_state(&job.state));

    if let Some(duration) = job.duration() {
        println!("    Duration: {} ms", duration.num_milliseconds());
    }

    if let JobState::LaunchError { message } = &job.state {
        println!("    Error:    {}", message.red());
    }

    print_output("Stdout", &job.stdout);
    print_output("Stderr", &job.stderr);
    println!();
}

fn print_output(name: &str, output: &str) {
    let trimmed = output.trim_end();
    if trimmed.is_empty() {
        return;
    }

    println!("    {}:", name);
    for line in trimmed.lines() {
        println!("      {}", line.dimmed());
    }
}

fn colorize_state(state: &JobState) -> ColoredString {
    match state {
        JobState::Pending => state.label().yellow(),
        JobState::Running => state.label().cyan(),
        JobState::Succeeded => state.label().green(),
        JobState::Failed { exit_code } => {
            format!("{} (exit code {})", state.label(), exit_code).red()
        }
        JobState::TimedOut => state.label().red(),
        JobState::LaunchError { .. } => state.label().red(),
    }
}
