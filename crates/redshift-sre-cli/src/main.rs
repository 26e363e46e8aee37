// crates/redshift-sre-cli/src/main.rs
// ============================================================================
// Module: Redshift SRE CLI Entry Point
// Description: Command dispatcher for monitoring invocations and config checks.
// Purpose: Run one monitoring invocation and report its outcome as JSON.
// Dependencies: clap, redshift-sre-aws, redshift-sre-config, redshift-sre-core, serde, tokio.
// ============================================================================

//! ## Overview
//! `redshift-sre run` loads configuration, runs one monitoring invocation
//! against the Redshift Data API, and writes the invocation report to stdout.
//! Job events go to stderr as JSON lines. `redshift-sre config check`
//! validates configuration and prints it with secrets redacted.
//!
//! Exit codes: `0` when the invocation reaches the emitted state, `1` when it
//! fails or cannot start.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use redshift_sre_aws::AwsClientConfig;
use redshift_sre_aws::AwsClients;
use redshift_sre_config::MonitorConfig;
use redshift_sre_core::InvocationReport;
use redshift_sre_core::JobError;
use redshift_sre_core::JobEventSink;
use redshift_sre_core::JobSettings;
use redshift_sre_core::JobState;
use redshift_sre_core::MetricsSink;
use redshift_sre_core::MonitorJob;
use redshift_sre_core::NoopJobEventSink;
use redshift_sre_core::RecordSink;
use redshift_sre_core::StatementId;
use redshift_sre_core::StderrJobEventSink;
use redshift_sre_core::SystemClock;
use redshift_sre_core::WarehouseClient;
use redshift_sre_core::WriterMetricsSink;
use redshift_sre_core::WriterRecordSink;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "redshift-sre", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected command.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one monitoring invocation.
    Run(RunCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Threshold override in milliseconds for this invocation.
    #[arg(long, value_name = "MS")]
    elapsed_time_ms: Option<u64>,
    /// Write record lines and metrics to stderr instead of CloudWatch.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    local: bool,
    /// Suppress job events on stderr.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    quiet: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and print it with secrets redacted.
    Check(ConfigCheckCommand),
}

/// Arguments for `config check`.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Output Documents
// ============================================================================

/// Report written for a completed invocation.
#[derive(Serialize)]
struct RunDocument<'a> {
    /// Invocation report.
    #[serde(flatten)]
    report: &'a InvocationReport,
    /// Whether a breach metric was written.
    metric_emitted: bool,
}

/// Report written for a failed invocation.
#[derive(Serialize)]
struct FailureDocument<'a> {
    /// Final state; always failed.
    state: JobState,
    /// Stable failure class.
    kind: &'static str,
    /// Failure description.
    message: String,
    /// Statement identifier, when one was assigned.
    statement_id: Option<&'a StatementId>,
}

/// Output of `config check`.
#[derive(Serialize)]
struct ConfigCheckDocument {
    /// Validated configuration with secrets redacted.
    config: MonitorConfig,
    /// Non-fatal configuration findings.
    warnings: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for startup and output failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::Config {
            command: ConfigCommand::Check(command),
        } => command_config_check(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Runs one monitoring invocation and writes its report.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = MonitorConfig::resolve(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let settings = resolve_settings(&config, command.elapsed_time_ms)?;
    let aws = AwsClientConfig {
        region: config.warehouse.region.clone(),
        endpoint: config.warehouse.endpoint.clone(),
        operation_timeout: Some(settings.poll.timeout),
    };
    let create_if_missing = config.logs.create_if_missing;
    let local = command.local;
    let quiet = command.quiet;

    let outcome = tokio::task::spawn_blocking(move || {
        execute_invocation(settings, &aws, create_if_missing, local, quiet)
    })
    .await
    .map_err(|err| CliError::new(format!("invocation task failed: {err}")))?;

    let document = outcome_document(&outcome)?;
    write_stdout_line(&document)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(exit_code_for(&outcome))
}

/// Builds job settings from configuration and the optional threshold override.
fn resolve_settings(config: &MonitorConfig, elapsed_time_ms: Option<u64>) -> CliResult<JobSettings> {
    let settings = config
        .to_settings()
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    Ok(match elapsed_time_ms {
        Some(ms) => settings.with_threshold(Duration::from_millis(ms)),
        None => settings,
    })
}

/// Connects the AWS backends and runs the job on the current thread.
fn execute_invocation(
    settings: JobSettings,
    aws: &AwsClientConfig,
    create_if_missing: bool,
    local: bool,
    quiet: bool,
) -> Result<InvocationReport, JobError> {
    let clients = AwsClients::connect(aws)
        .map_err(|err| JobError::Connectivity(format!("aws setup failed: {err}")))?;
    let warehouse = clients.warehouse();
    if local {
        return run_job(
            settings,
            warehouse,
            WriterRecordSink::new(std::io::stderr()),
            WriterMetricsSink::new(std::io::stderr()),
            quiet,
        );
    }
    let records = clients.record_sink(settings.log_destination.clone(), create_if_missing);
    let metrics = clients.metrics_sink();
    run_job(settings, warehouse, records, metrics, quiet)
}

/// Runs the job with the selected event sink.
fn run_job<W, L, M>(
    settings: JobSettings,
    warehouse: W,
    records: L,
    metrics: M,
    quiet: bool,
) -> Result<InvocationReport, JobError>
where
    W: WarehouseClient,
    L: RecordSink,
    M: MetricsSink,
{
    if quiet {
        run_with_events(settings, warehouse, records, metrics, NoopJobEventSink)
    } else {
        run_with_events(settings, warehouse, records, metrics, StderrJobEventSink)
    }
}

/// Runs the job against the system clock.
fn run_with_events<W, L, M, E>(
    settings: JobSettings,
    warehouse: W,
    records: L,
    metrics: M,
    events: E,
) -> Result<InvocationReport, JobError>
where
    W: WarehouseClient,
    L: RecordSink,
    M: MetricsSink,
    E: JobEventSink,
{
    MonitorJob::new(settings, warehouse, records, metrics, events, SystemClock).run()
}

/// Renders the stdout document for an invocation outcome.
fn outcome_document(outcome: &Result<InvocationReport, JobError>) -> CliResult<String> {
    let rendered = match outcome {
        Ok(report) => serde_json::to_string(&RunDocument {
            report,
            metric_emitted: report.metric_emitted(),
        }),
        Err(err) => serde_json::to_string(&FailureDocument {
            state: JobState::Failed,
            kind: err.kind(),
            message: err.to_string(),
            statement_id: err.statement_id(),
        }),
    };
    rendered.map_err(|err| CliError::new(format!("report serialization failed: {err}")))
}

/// Maps an invocation outcome onto the process exit code.
fn exit_code_for(outcome: &Result<InvocationReport, JobError>) -> ExitCode {
    match outcome {
        Ok(report) if report.state == JobState::Emitted => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Validates configuration and prints it redacted.
fn command_config_check(command: &ConfigCheckCommand) -> CliResult<ExitCode> {
    let config = MonitorConfig::resolve(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let document = config_check_document(&config)?;
    write_stdout_line(&document)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the `config check` document.
fn config_check_document(config: &MonitorConfig) -> CliResult<String> {
    let mut warnings = Vec::new();
    if !config.monitor.template_uses_threshold() {
        warnings.push(
            "monitor.sql_template does not reference the threshold placeholder; \
             --elapsed-time-ms has no effect on the query"
                .to_string(),
        );
    }
    let document = ConfigCheckDocument {
        config: config.redacted(),
        warnings,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|err| CliError::new(format!("config serialization failed: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
