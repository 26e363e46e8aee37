// crates/redshift-sre-core/src/runtime/runner.rs
// ============================================================================
// Module: Query Runner
// Description: Submit, poll, and fetch a single warehouse statement.
// Purpose: Drive one statement to a terminal state within a bounded wait.
// Dependencies: crate::{core, interfaces, runtime::job}
// ============================================================================

//! ## Overview
//! The runner submits the statement, polls its status on a fixed interval and
//! fetches the result set once the statement finishes. The whole run, warehouse
//! calls included, is bounded by [`PollPolicy::timeout`]: the budget is checked
//! after every status call and after the fetch. On expiry the runner reports
//! [`JobError::Timeout`], sending a best-effort cancel when the statement is
//! still running. Failed or aborted statements are reported, never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use serde::Serialize;

use crate::core::PollPolicy;
use crate::core::ResultSet;
use crate::core::StatementDescription;
use crate::core::StatementId;
use crate::core::StatementRequest;
use crate::core::StatementStatus;
use crate::interfaces::Clock;
use crate::interfaces::WarehouseClient;
use crate::interfaces::WarehouseError;
use crate::runtime::job::JobError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Execution metadata for the monitoring statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementSummary {
    /// Statement identifier.
    pub id: StatementId,
    /// Warehouse session identifier, when reported.
    pub session_id: Option<String>,
    /// Terminal status.
    pub status: StatementStatus,
    /// Warehouse-reported execution duration in milliseconds.
    pub warehouse_duration_ms: Option<u64>,
    /// Wall-clock wait from submission to terminal state in milliseconds.
    pub waited_ms: u64,
    /// Number of status polls issued.
    pub polls: u32,
}

/// Finished statement and its result set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Statement metadata.
    pub statement: StatementSummary,
    /// Result rows.
    pub result: ResultSet,
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs one statement to completion against a warehouse client.
pub struct QueryRunner<'a, W, C> {
    /// Warehouse client.
    warehouse: &'a W,
    /// Clock used for polling.
    clock: &'a C,
    /// Polling policy.
    poll: PollPolicy,
}

impl<'a, W, C> QueryRunner<'a, W, C>
where
    W: WarehouseClient,
    C: Clock,
{
    /// Creates a runner.
    #[must_use]
    pub const fn new(warehouse: &'a W, clock: &'a C, poll: PollPolicy) -> Self {
        Self {
            warehouse,
            clock,
            poll,
        }
    }

    /// Submits `request`, waits for a terminal state and fetches the result.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidQuery`] for empty SQL,
    /// [`JobError::Connectivity`] when the warehouse cannot be reached,
    /// [`JobError::Execution`] when the statement fails or its result cannot be
    /// fetched, and [`JobError::Timeout`] when the wait budget is exhausted.
    pub fn run(&self, request: &StatementRequest) -> Result<QueryOutcome, JobError> {
        if request.sql.trim().is_empty() {
            return Err(JobError::InvalidQuery);
        }
        let started = self.clock.now();
        let submitted = self.warehouse.submit(request).map_err(|err| warehouse_error(err, None))?;
        let id = submitted.id;
        let (description, polls) = self.await_terminal(&id, started)?;
        let waited = self.clock.now().saturating_duration_since(started);
        if description.status != StatementStatus::Finished {
            let detail = description.error.as_deref().unwrap_or("no error reported");
            return Err(JobError::Execution {
                statement_id: Some(id),
                message: format!("statement {}: {detail}", description.status),
            });
        }
        let result = self.warehouse.fetch(&id).map_err(|err| JobError::Execution {
            statement_id: Some(id.clone()),
            message: format!("result fetch failed: {err}"),
        })?;
        let total = self.clock.now().saturating_duration_since(started);
        if total >= self.poll.timeout {
            return Err(JobError::Timeout {
                statement_id: id,
                waited_ms: millis(total),
                cancel_error: None,
            });
        }
        Ok(QueryOutcome {
            statement: StatementSummary {
                id,
                session_id: submitted.session_id,
                status: description.status,
                warehouse_duration_ms: description.duration.map(millis),
                waited_ms: millis(waited),
                polls,
            },
            result,
        })
    }

    /// Polls until the statement reaches a terminal state or the budget runs out.
    fn await_terminal(
        &self,
        id: &StatementId,
        started: Instant,
    ) -> Result<(StatementDescription, u32), JobError> {
        let mut polls = 0u32;
        loop {
            let description =
                self.warehouse.describe(id).map_err(|err| warehouse_error(err, Some(id)))?;
            polls = polls.saturating_add(1);
            let terminal = description.status.is_terminal();
            let waited = self.clock.now().saturating_duration_since(started);
            if waited >= self.poll.timeout {
                let cancel_error = if terminal {
                    None
                } else {
                    self.warehouse.cancel(id).err().map(|err| err.to_string())
                };
                return Err(JobError::Timeout {
                    statement_id: id.clone(),
                    waited_ms: millis(waited),
                    cancel_error,
                });
            }
            if terminal {
                return Ok((description, polls));
            }
            let remaining = self.poll.timeout.saturating_sub(waited);
            self.clock.sleep(self.poll.interval.min(remaining));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a warehouse error onto the job taxonomy.
fn warehouse_error(err: WarehouseError, statement_id: Option<&StatementId>) -> JobError {
    match err {
        WarehouseError::Connectivity(message) => JobError::Connectivity(message),
        WarehouseError::Execution(message) => JobError::Execution {
            statement_id: statement_id.cloned(),
            message,
        },
    }
}

/// Converts a duration to whole milliseconds, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
