//! Binary entry point for the pkgshift CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Preview a migration, printing diffs of every file it would write
//! pkgshift run plans/damose-mvc.toml --dry-run --diff
//!
//! # Run one phase for real
//! pkgshift run plans/damose-mvc.toml --phase copy-ui-to-view
//!
//! # Validate a plan, list its phases, find leftover references
//! pkgshift check plans/damose-mvc.toml
//! pkgshift phases plans/damose-mvc.toml
//! pkgshift scan plans/damose-mvc.toml --format json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pkgshift::cli::{check_plan, list_phases, load_plan, run_plan, scan_plan, RunOptions};
use pkgshift::report::{write_check, write_phases, write_run_footer, write_scan, TextReporter};
use pkgshift_core::error::{OutputErrorCode, ShiftError};
use pkgshift_core::orchestrator::CollectingReporter;
use pkgshift_core::output::{emit_response, ErrorResponse, RunResponse, ScanResponse};
use pkgshift_core::scan::DEFAULT_INCLUDE;

// ============================================================================
// CLI Structure
// ============================================================================

/// Phased package reorganization for Java source trees.
///
/// A plan file lists phases of ordered literal rewrite rules, files to copy
/// into new package directories, and files whose imports need fixing.
#[derive(Parser, Debug)]
#[command(
    name = "pkgshift",
    version,
    about = "Phased package reorganization for Java source trees"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Tree root (default: the plan's `root`, relative to the plan file).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: Format,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for all commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// JSON response on stdout; logs on stderr are JSON too.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the phases of a plan.
    Run {
        /// Plan file.
        plan: PathBuf,
        /// Run only this phase (repeatable; plan order is kept).
        #[arg(long = "phase")]
        phases: Vec<String>,
        /// Report what would happen without writing any file.
        #[arg(long)]
        dry_run: bool,
        /// Show a unified diff of every file a dry run would write.
        #[arg(long, requires = "dry_run")]
        diff: bool,
        /// Exit with code 3 if any entry's source was missing.
        #[arg(long)]
        strict: bool,
    },
    /// Validate a plan without running it.
    Check {
        /// Plan file.
        plan: PathBuf,
    },
    /// List files that still contain text matched by the plan's rules.
    Scan {
        /// Plan file.
        plan: PathBuf,
        /// Use only the rules of this phase (repeatable).
        #[arg(long = "phase")]
        phases: Vec<String>,
        /// Glob selecting the files to scan, relative to the tree root.
        #[arg(long, default_value = DEFAULT_INCLUDE)]
        include: String,
    },
    /// List the phases of a plan.
    Phases {
        /// Plan file.
        plan: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.format);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON in both formats so scripts can
            // always parse a failure.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: Format) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        Format::Text => builder.init(),
        Format::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, ShiftError> {
    let global = cli.global;
    match cli.command {
        Command::Run {
            plan,
            phases,
            dry_run,
            diff,
            strict,
        } => {
            let options = RunOptions {
                phases,
                dry_run,
                diff,
            };
            execute_run(&global, &plan, &options, strict)
        }
        Command::Check { plan } => execute_check(&global, &plan),
        Command::Scan {
            plan,
            phases,
            include,
        } => execute_scan(&global, &plan, &phases, &include),
        Command::Phases { plan } => execute_phases(&global, &plan),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_run(
    global: &GlobalArgs,
    plan_path: &std::path::Path,
    options: &RunOptions,
    strict: bool,
) -> Result<ExitCode, ShiftError> {
    let plan = load_plan(plan_path, global.root.as_deref())?;
    let mut stdout = io::stdout();

    let outcome = match global.format {
        Format::Text => {
            let mut reporter = TextReporter::new(io::stdout());
            let outcome = run_plan(&plan, options, &mut reporter)?;
            reporter.finish().map_err(output_error)?;
            write_run_footer(
                &mut stdout,
                outcome.report.passes.len(),
                &outcome.report.summary,
                options.dry_run,
                &outcome.diffs,
            )
            .map_err(output_error)?;
            outcome
        }
        Format::Json => {
            let mut collecting = CollectingReporter::new();
            let outcome = match run_plan(&plan, options, &mut collecting) {
                Ok(outcome) => outcome,
                Err(err) => {
                    // Entries before an abort are already on disk.
                    let response =
                        ErrorResponse::from_error(&err).with_completed(collecting.into_passes());
                    emit_response(&response, &mut stdout).map_err(output_error)?;
                    return Ok(ExitCode::from(err.error_code().code()));
                }
            };
            let response = RunResponse::new(
                outcome.report.clone(),
                options.dry_run,
                outcome.diffs.clone(),
            );
            emit_response(&response, &mut stdout).map_err(output_error)?;
            outcome
        }
    };

    if strict && !outcome.report.summary.is_complete() {
        return Ok(ExitCode::from(OutputErrorCode::Incomplete.code()));
    }
    Ok(ExitCode::SUCCESS)
}

fn execute_check(
    global: &GlobalArgs,
    plan_path: &std::path::Path,
) -> Result<ExitCode, ShiftError> {
    let plan = load_plan(plan_path, global.root.as_deref())?;
    let response = check_plan(&plan);
    let mut stdout = io::stdout();

    match global.format {
        Format::Text => write_check(&mut stdout, &response).map_err(output_error)?,
        Format::Json => emit_response(&response, &mut stdout).map_err(output_error)?,
    }

    if response.status == "error" {
        return Ok(ExitCode::from(OutputErrorCode::InvalidArguments.code()));
    }
    Ok(ExitCode::SUCCESS)
}

fn execute_scan(
    global: &GlobalArgs,
    plan_path: &std::path::Path,
    phases: &[String],
    include: &str,
) -> Result<ExitCode, ShiftError> {
    let plan = load_plan(plan_path, global.root.as_deref())?;
    let files = scan_plan(&plan, phases, include)?;
    let mut stdout = io::stdout();

    match global.format {
        Format::Text => write_scan(&mut stdout, &files).map_err(output_error)?,
        Format::Json => {
            emit_response(&ScanResponse::new(files), &mut stdout).map_err(output_error)?
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn execute_phases(
    global: &GlobalArgs,
    plan_path: &std::path::Path,
) -> Result<ExitCode, ShiftError> {
    let plan = load_plan(plan_path, global.root.as_deref())?;
    let response = list_phases(&plan);
    let mut stdout = io::stdout();

    match global.format {
        Format::Text => write_phases(&mut stdout, &response).map_err(output_error)?,
        Format::Json => emit_response(&response, &mut stdout).map_err(output_error)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn output_error(e: io::Error) -> ShiftError {
    ShiftError::internal(format!("failed to write output: {}", e))
}

// ============================================================================
// Tests
// ============================================================================
