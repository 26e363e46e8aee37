// crates/redshift-sre-core/src/runtime/job.rs
// ============================================================================
// Module: Monitoring Job
// Description: Single-invocation orchestration of run, evaluate, and emit.
// Purpose: Provide the stateless, synchronously callable job entry point.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`MonitorJob::run`] is the only entry point an external scheduler needs.
//! It runs `Running -> Evaluated -> Emitted`, failing fast while the query is
//! in flight and downgrading observability failures to warnings afterwards.
//! Each call is independent: no state is carried between invocations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::JobEvent;
use crate::core::JobSettings;
use crate::core::JobState;
use crate::core::MetricDatum;
use crate::core::QueryExecutionRecord;
use crate::core::RecordError;
use crate::core::ResultSet;
use crate::core::StatementId;
use crate::core::TimingUnit;
use crate::interfaces::Clock;
use crate::interfaces::JobEventSink;
use crate::interfaces::MetricsSink;
use crate::interfaces::RecordSink;
use crate::interfaces::WarehouseClient;
use crate::runtime::emitter::MetricsEmitter;
use crate::runtime::evaluator::EvaluatedRecord;
use crate::runtime::evaluator::breach_count;
use crate::runtime::evaluator::evaluate_records;
use crate::runtime::runner::QueryRunner;
use crate::runtime::runner::StatementSummary;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal invocation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any of these ends the invocation in [`JobState::Failed`] with nothing emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Query text was empty; nothing was submitted.
    #[error("query text is empty")]
    InvalidQuery,
    /// Warehouse unreachable or caller not authorized.
    #[error("warehouse connectivity failure: {0}")]
    Connectivity(String),
    /// Statement failed, was aborted, or its result was unusable.
    #[error("statement execution failure: {message}")]
    Execution {
        /// Statement identifier when one was assigned.
        statement_id: Option<StatementId>,
        /// Failure description.
        message: String,
    },
    /// Statement did not reach a terminal state within the wait budget.
    #[error("statement {statement_id} did not finish within {waited_ms} ms")]
    Timeout {
        /// Statement identifier.
        statement_id: StatementId,
        /// Time waited in milliseconds.
        waited_ms: u64,
        /// Cancel request failure, if the cancel did not go through.
        cancel_error: Option<String>,
    },
}

impl JobError {
    /// Returns a stable label for the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid_query",
            Self::Connectivity(_) => "connectivity",
            Self::Execution {
                ..
            } => "execution",
            Self::Timeout {
                ..
            } => "timeout",
        }
    }

    /// Returns the statement identifier associated with the failure.
    #[must_use]
    pub const fn statement_id(&self) -> Option<&StatementId> {
        match self {
            Self::InvalidQuery | Self::Connectivity(_) => None,
            Self::Execution {
                statement_id, ..
            } => statement_id.as_ref(),
            Self::Timeout {
                statement_id, ..
            } => Some(statement_id),
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Summary of a completed invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationReport {
    /// Final state; always [`JobState::Emitted`] for a returned report.
    pub state: JobState,
    /// Monitoring statement metadata.
    pub statement: StatementSummary,
    /// Threshold in milliseconds.
    pub threshold_ms: u64,
    /// Evaluated records in warehouse order.
    pub records: Vec<EvaluatedRecord>,
    /// Number of records over the threshold.
    pub breach_count: usize,
    /// Log lines accepted by the record sink.
    pub lines_written: usize,
    /// Data point accepted by the metrics sink.
    pub metric: Option<MetricDatum>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl InvocationReport {
    /// Returns true when a breach metric was written.
    #[must_use]
    pub const fn metric_emitted(&self) -> bool {
        self.metric.is_some()
    }
}

// ============================================================================
// SECTION: Job
// ============================================================================

/// Monitoring job bound to its backends.
pub struct MonitorJob<W, L, M, E, C> {
    /// Invocation settings.
    settings: JobSettings,
    /// Warehouse client.
    warehouse: W,
    /// Record line destination.
    records: L,
    /// Metric destination.
    metrics: M,
    /// Job event destination.
    events: E,
    /// Time source.
    clock: C,
}

impl<W, L, M, E, C> MonitorJob<W, L, M, E, C>
where
    W: WarehouseClient,
    L: RecordSink,
    M: MetricsSink,
    E: JobEventSink,
    C: Clock,
{
    /// Creates a job.
    #[must_use]
    pub const fn new(
        settings: JobSettings,
        warehouse: W,
        records: L,
        metrics: M,
        events: E,
        clock: C,
    ) -> Self {
        Self {
            settings,
            warehouse,
            records,
            metrics,
            events,
            clock,
        }
    }

    /// Runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] when the query cannot be run or its rows cannot be
    /// decoded. Observability failures never produce an error.
    pub fn run(&self) -> Result<InvocationReport, JobError> {
        self.events.record(&JobEvent::state(JobState::Running, None, None));
        match self.execute() {
            Ok(report) => Ok(report),
            Err(err) => {
                if let JobError::Timeout {
                    statement_id,
                    cancel_error: Some(cancel_error),
                    ..
                } = &err
                {
                    self.events.record(&JobEvent::warning(
                        Some(statement_id),
                        format!("cancel request failed: {cancel_error}"),
                    ));
                }
                self.events.record(&JobEvent::state(
                    JobState::Failed,
                    err.statement_id(),
                    Some(err.to_string()),
                ));
                Err(err)
            }
        }
    }

    /// Executes the invocation steps after the running state is recorded.
    fn execute(&self) -> Result<InvocationReport, JobError> {
        let request = self.settings.statement_request();
        let runner = QueryRunner::new(&self.warehouse, &self.clock, self.settings.poll);
        let outcome = runner.run(&request)?;
        let statement_id = outcome.statement.id.clone();

        let produced_at = self.clock.wall_clock();
        let records = decode_records(&outcome.result, self.settings.timing_unit, produced_at)
            .map_err(|err| JobError::Execution {
                statement_id: Some(statement_id.clone()),
                message: format!("result decode failed: {err}"),
            })?;
        let evaluated = evaluate_records(records, self.settings.threshold);
        let breaches = breach_count(&evaluated);
        self.events.record(&JobEvent::state(
            JobState::Evaluated,
            Some(&statement_id),
            Some(format!("{} records, {breaches} over threshold", evaluated.len())),
        ));

        let emitter = MetricsEmitter::new(&self.records, &self.metrics, &self.settings.metric);
        let emission = emitter.emit(&evaluated, produced_at);
        let warnings: Vec<String> = emission.warnings.iter().map(ToString::to_string).collect();
        for warning in &warnings {
            self.events.record(&JobEvent::warning(Some(&statement_id), warning.clone()));
        }
        if let Some(datum) = &emission.metric {
            self.events.record(&JobEvent::metric(Some(&statement_id), datum.clone()));
        }
        self.events.record(&JobEvent::state(JobState::Emitted, Some(&statement_id), None));

        Ok(InvocationReport {
            state: JobState::Emitted,
            statement: outcome.statement,
            threshold_ms: u64::try_from(self.settings.threshold.as_millis()).unwrap_or(u64::MAX),
            records: evaluated,
            breach_count: breaches,
            lines_written: emission.lines_written,
            metric: emission.metric,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes every row of the result set, failing on the first bad row.
fn decode_records(
    result: &ResultSet,
    unit: TimingUnit,
    produced_at: OffsetDateTime,
) -> Result<Vec<QueryExecutionRecord>, RecordError> {
    result.rows.iter().map(|row| QueryExecutionRecord::from_row(row, unit, produced_at)).collect()
}
