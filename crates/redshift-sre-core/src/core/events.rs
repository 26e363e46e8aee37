// crates/redshift-sre-core/src/core/events.rs
// ============================================================================
// Module: Job Events
// Description: Invocation state machine labels and structured job events.
// Purpose: Give operators a JSON-line trail of each invocation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An invocation moves `Running -> Evaluated -> Emitted`, or ends in `Failed`.
//! Every transition and every non-fatal warning is reported as a [`JobEvent`]
//! to a [`crate::JobEventSink`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::settings::MetricDatum;
use crate::core::statement::StatementId;

// ============================================================================
// SECTION: State
// ============================================================================

/// Invocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Query submitted and being awaited.
    Running,
    /// Records decoded and compared with the threshold.
    Evaluated,
    /// Log lines and optional metric written.
    Emitted,
    /// Invocation aborted.
    Failed,
}

impl JobState {
    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Evaluated => "evaluated",
            Self::Emitted => "emitted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Structured job event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// State entered, for state events.
    pub state: Option<JobState>,
    /// Statement identifier when known.
    pub statement_id: Option<StatementId>,
    /// Human-readable detail.
    pub message: Option<String>,
    /// Metric data point, for metric events.
    pub metric: Option<MetricDatum>,
}

impl JobEvent {
    /// Creates a state transition event.
    #[must_use]
    pub fn state(
        state: JobState,
        statement_id: Option<&StatementId>,
        message: Option<String>,
    ) -> Self {
        Self::build("job_state", Some(state), statement_id, message, None)
    }

    /// Creates a non-fatal warning event.
    #[must_use]
    pub fn warning(statement_id: Option<&StatementId>, message: impl Into<String>) -> Self {
        Self::build("job_warning", None, statement_id, Some(message.into()), None)
    }

    /// Creates a metric emission event.
    #[must_use]
    pub fn metric(statement_id: Option<&StatementId>, datum: MetricDatum) -> Self {
        Self::build("job_metric", None, statement_id, None, Some(datum))
    }

    /// Builds an event with a consistent timestamp.
    fn build(
        event: &'static str,
        state: Option<JobState>,
        statement_id: Option<&StatementId>,
        message: Option<String>,
        metric: Option<MetricDatum>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            state,
            statement_id: statement_id.cloned(),
            message,
            metric,
        }
    }
}
