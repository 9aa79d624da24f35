//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use stale_file_sweeper::core::config::{FileConfig, Overrides, ScanConfig};
use stale_file_sweeper::logger::activity::{ScanEvent, ScanLoggerHandle, spawn_logger};
use stale_file_sweeper::scanner::filter::{
    CandidateFile, CandidateFilter, CandidateObserver, ScanResult, format_size, format_total_gb,
};
use stale_file_sweeper::scanner::mover::{MoveReport, TrashMover};
use stale_file_sweeper::scanner::walker::{FileWalker, WalkerConfig};

/// Stale File Sweeper — finds old, large files and moves them to a trash directory.
#[derive(Debug, Parser)]
#[command(
    name = "sfs",
    author,
    version,
    about = "Stale File Sweeper - moves old large files to trash",
    long_about = None
)]
pub struct Cli {
    /// Directory to scan (defaults to the home directory).
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,
    /// Size threshold in megabytes; only strictly larger files qualify.
    #[arg(long, value_name = "MB")]
    size: Option<u64>,
    /// Age threshold in days; only strictly older files qualify.
    #[arg(long, value_name = "DAYS")]
    days: Option<u64>,
    /// Extension to exclude, with or without the leading dot. Repeatable.
    #[arg(long, value_name = "EXT", value_delimiter = ',', action = clap::ArgAction::Append)]
    exclude: Vec<String>,
    /// Trash directory (defaults to `<home>/trash`).
    #[arg(long, value_name = "PATH")]
    trash: Option<PathBuf>,
    /// Filter worker count; 0 means auto.
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Scan and report only; move nothing.
    #[arg(long)]
    dry_run: bool,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
    /// Force JSON output mode.
    #[arg(long)]
    json: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Generate shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<CompletionShell>,
}

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    /// Rich terminal-oriented output.
    Human,
    /// Machine-readable JSON lines.
    Json,
}

/// CLI error taxonomy mapped to process exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Some candidates could not be moved.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

/// Parse flags, run the scan pipeline, and map outcomes to exit codes.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        let binary_name = command.get_name().to_string();
        generate(shell, &mut command, binary_name, &mut io::stdout());
        return Ok(());
    }

    if cli.no_color {
        control::set_override(false);
    }

    let config = load_config(cli)?;

    let (logger, logger_thread) = spawn_logger(&config.log_path())
        .map_err(|e| CliError::Runtime(format!("cannot open log: {e}")))?;
    logger.send(ScanEvent::Initialized {
        config_summary: config.summary(),
    });

    let outcome = run_pipeline(cli, &config, &logger);

    logger.shutdown();
    let _ = logger_thread.join();
    outcome
}

fn load_config(cli: &Cli) -> Result<ScanConfig, CliError> {
    let overrides = Overrides {
        dir: cli.dir.clone(),
        size_mb: cli.size,
        days: cli.days,
        exclude: if cli.exclude.is_empty() {
            None
        } else {
            Some(cli.exclude.clone())
        },
        trash: cli.trash.clone(),
        parallelism: cli.jobs,
    };

    let file = FileConfig::load(cli.config.as_deref()).map_err(|e| CliError::User(e.to_string()))?;
    ScanConfig::resolve(file, &overrides).map_err(|e| CliError::User(e.to_string()))
}

fn run_pipeline(
    cli: &Cli,
    config: &ScanConfig,
    logger: &ScanLoggerHandle,
) -> Result<(), CliError> {
    let mode = output_mode(cli);
    let result = scan(config, logger, mode)?;

    emit_scan_summary(&result, config, mode)?;
    if result.candidates.is_empty() {
        return Ok(());
    }

    if cli.dry_run {
        if mode == OutputMode::Human {
            println!(
                "Dry run: {} files ({}) left in place.",
                result.candidates.len(),
                format_size(result.total_bytes),
            );
        }
        return Ok(());
    }

    if !confirmed(cli, &result, config)? {
        if mode == OutputMode::Human {
            println!("Aborted.");
        }
        return Ok(());
    }

    let report = TrashMover::new(&config.trash_dir, Some(logger.clone()))
        .execute(&result.candidates)
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    emit_move_report(&report, config, mode)?;
    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::Partial(format!(
            "{} of {} files could not be moved",
            report.items_failed,
            result.candidates.len(),
        )))
    }
}

fn scan(
    config: &ScanConfig,
    logger: &ScanLoggerHandle,
    mode: OutputMode,
) -> Result<ScanResult, CliError> {
    let walker = FileWalker::new(WalkerConfig {
        root: config.root.clone(),
        parallelism: config.parallelism,
        excluded_paths: [config.trash_dir.clone()].into_iter().collect(),
    });
    let files = walker
        .stream()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let filter = CandidateFilter::new(config.clone(), Some(logger.clone()));
    let result = match mode {
        OutputMode::Human => filter.collect(&files, &ConsoleObserver),
        OutputMode::Json => filter.collect(&files, &JsonObserver),
    };
    Ok(result)
}

/// Prints each find the moment a worker qualifies it.
struct ConsoleObserver;

impl CandidateObserver for ConsoleObserver {
    fn report(&self, candidate: &CandidateFile) {
        println!(
            "Old, large file: {} Size: {}",
            candidate.path.display().to_string().cyan(),
            format_size(candidate.size_bytes).yellow(),
        );
    }
}

/// Emits one JSON object per find on stdout.
struct JsonObserver;

impl CandidateObserver for JsonObserver {
    fn report(&self, candidate: &CandidateFile) {
        let payload = json!({
            "event": "candidate",
            "path": candidate.path,
            "size_bytes": candidate.size_bytes,
        });
        // Observer callbacks cannot propagate; a broken stdout surfaces at
        // the summary write instead.
        let _ = write_json_line(&payload);
    }
}

fn emit_scan_summary(
    result: &ScanResult,
    config: &ScanConfig,
    mode: OutputMode,
) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            println!(
                "Total size to be moved to trash: {}",
                format_total_gb(result.total_bytes).yellow().bold(),
            );
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "event": "scan_summary",
                "files_seen": result.files_seen,
                "candidates": result.candidates.len(),
                "total_bytes": result.total_bytes,
                "trash_dir": config.trash_dir,
            }))?;
        }
    }
    Ok(())
}

/// Confirmation gate ahead of the move phase.
///
/// `--yes` always proceeds. Without it, a non-terminal stdin is an error
/// rather than silent consent; only an interactive `y`/`yes` proceeds.
fn confirmed(cli: &Cli, result: &ScanResult, config: &ScanConfig) -> Result<bool, CliError> {
    if cli.yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::User(
            "stdin is not a terminal; pass --yes to move files without confirmation".to_string(),
        ));
    }

    eprint!(
        "Move {} files ({}) to {}? [y/N] ",
        result.candidates.len(),
        format_size(result.total_bytes),
        config.trash_dir.display(),
    );
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn emit_move_report(
    report: &MoveReport,
    config: &ScanConfig,
    mode: OutputMode,
) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            println!(
                "Moved {} files ({}) to {}.",
                report.items_moved.to_string().green(),
                format_size(report.bytes_moved).yellow(),
                config.trash_dir.display(),
            );
            for failure in &report.errors {
                eprintln!(
                    "  {} {} ({})",
                    "failed:".red(),
                    failure.path.display(),
                    failure.error
                );
            }
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "event": "move_report",
                "moved": report.items_moved,
                "failed": report.items_failed,
                "bytes_moved": report.bytes_moved,
                "duration_ms": u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
                "errors": report
                    .errors
                    .iter()
                    .map(|e| {
                        json!({
                            "path": e.path,
                            "code": e.error_code,
                            "message": e.error.to_string(),
                            "recoverable": e.recoverable,
                        })
                    })
                    .collect::<Vec<_>>(),
            }))?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("SFS_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}
