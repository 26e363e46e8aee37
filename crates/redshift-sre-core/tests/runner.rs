// crates/redshift-sre-core/tests/runner.rs
// ============================================================================
// Module: Query Runner Tests
// Description: Polling, timeout, and cancellation behavior.
// ============================================================================
//! ## Overview
//! Drives the runner with a scripted warehouse and a manual clock so polling
//! and timeout behavior is deterministic.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::time::Duration;

use common::ManualClock;
use common::RecordingEvents;
use common::RecordingMetrics;
use common::RecordingRecords;
use common::ScriptedWarehouse;
use common::result_set;
use common::row;
use common::settings;
use redshift_sre_core::JobError;
use redshift_sre_core::MonitorJob;
use redshift_sre_core::PollPolicy;
use redshift_sre_core::QueryRunner;
use redshift_sre_core::StatementId;
use redshift_sre_core::StatementStatus;
use redshift_sre_core::WarehouseError;

/// Short polling policy used throughout.
const POLL: PollPolicy = PollPolicy {
    interval: Duration::from_secs(1),
    timeout: Duration::from_secs(5),
};

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Tests the runner polls until the statement finishes and then fetches.
#[test]
fn polls_until_finished() {
    let warehouse = ScriptedWarehouse::with_statuses(
        &[
            StatementStatus::Submitted,
            StatementStatus::Picked,
            StatementStatus::Started,
            StatementStatus::Finished,
        ],
        result_set(vec![row(7, 1_000_000)]),
    );
    let clock = ManualClock::new();
    let runner = QueryRunner::new(&warehouse, &clock, POLL);
    let request = settings(5_000).statement_request();

    let outcome = runner.run(&request).unwrap();

    assert_eq!(outcome.statement.id, StatementId::new("stmt-1"));
    assert_eq!(outcome.statement.status, StatementStatus::Finished);
    assert_eq!(outcome.statement.polls, 4);
    assert_eq!(outcome.statement.waited_ms, 3_000);
    assert_eq!(outcome.statement.session_id.as_deref(), Some("42"));
    assert_eq!(outcome.result.rows.len(), 1);
    assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(1); 3]);
    assert!(warehouse.cancelled.lock().unwrap().is_empty());
}

/// Tests a statement that never finishes is cancelled and reported as a timeout.
#[test]
fn timeout_cancels_statement() {
    let warehouse = ScriptedWarehouse::with_statuses(&[StatementStatus::Started], result_set(Vec::new()));
    let clock = ManualClock::new();
    let runner = QueryRunner::new(&warehouse, &clock, POLL);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(
        err,
        JobError::Timeout {
            statement_id: StatementId::new("stmt-1"),
            waited_ms: 5_000,
            cancel_error: None,
        }
    );
    assert_eq!(*warehouse.describes.lock().unwrap(), 6);
    assert_eq!(*warehouse.cancelled.lock().unwrap(), vec![StatementId::new("stmt-1")]);
    assert_eq!(*clock.elapsed.lock().unwrap(), Duration::from_secs(5));
}

/// Tests the final sleep is clipped to the remaining budget.
#[test]
fn last_sleep_is_clipped_to_budget() {
    let warehouse = ScriptedWarehouse::with_statuses(&[StatementStatus::Started], result_set(Vec::new()));
    let clock = ManualClock::new();
    let poll = PollPolicy {
        interval: Duration::from_secs(2),
        timeout: Duration::from_secs(5),
    };
    let runner = QueryRunner::new(&warehouse, &clock, poll);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(err.kind(), "timeout");
    assert_eq!(
        *clock.sleeps.lock().unwrap(),
        vec![Duration::from_secs(2), Duration::from_secs(2), Duration::from_secs(1)]
    );
}

/// Tests a failed cancel is carried on the timeout and surfaced as a warning.
#[test]
fn failed_cancel_is_reported() {
    let warehouse = ScriptedWarehouse::with_statuses(&[StatementStatus::Started], result_set(Vec::new()))
        .with_cancel_error(WarehouseError::Execution("statement already finished".to_string()));
    let events = RecordingEvents::default();
    let job = MonitorJob::new(
        settings(5_000),
        warehouse,
        RecordingRecords::default(),
        RecordingMetrics::default(),
        events.clone(),
        ManualClock::new(),
    );

    let err = job.run().unwrap_err();

    match err {
        JobError::Timeout {
            cancel_error, ..
        } => assert!(cancel_error.unwrap().contains("already finished")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(events.warnings(), 1);
    assert_eq!(events.states(), vec!["running", "failed"]);
}

/// Tests empty SQL is rejected without contacting the warehouse.
#[test]
fn empty_sql_is_rejected() {
    let warehouse = ScriptedWarehouse::finished(result_set(Vec::new()));
    let clock = ManualClock::new();
    let runner = QueryRunner::new(&warehouse, &clock, POLL);
    let mut request = settings(5_000).statement_request();
    request.sql = "   ".to_string();

    assert_eq!(runner.run(&request).unwrap_err(), JobError::InvalidQuery);
    assert!(warehouse.submitted.lock().unwrap().is_empty());
}

/// Tests a result fetch failure is an execution failure for the statement.
#[test]
fn fetch_failure_is_execution_failure() {
    let warehouse = ScriptedWarehouse::finished(result_set(Vec::new()))
        .with_fetch_error(WarehouseError::Execution("result expired".to_string()));
    let clock = ManualClock::new();
    let runner = QueryRunner::new(&warehouse, &clock, POLL);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(err.statement_id(), Some(&StatementId::new("stmt-1")));
    assert!(err.to_string().contains("result expired"));
}

/// Tests time spent inside a slow fetch counts against the budget.
#[test]
fn slow_fetch_exhausts_budget() {
    let clock = ManualClock::new();
    let warehouse = ScriptedWarehouse::finished(result_set(vec![row(7, 1_000_000)])).with_latency(
        &clock,
        Duration::from_secs(3),
        Duration::from_secs(3),
    );
    let runner = QueryRunner::new(&warehouse, &clock, POLL);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(
        err,
        JobError::Timeout {
            statement_id: StatementId::new("stmt-1"),
            waited_ms: 6_000,
            cancel_error: None,
        }
    );
    assert!(warehouse.cancelled.lock().unwrap().is_empty());
    assert!(clock.sleeps.lock().unwrap().is_empty());
}

/// Tests a slow status call on a running statement times out and cancels.
#[test]
fn slow_describe_on_running_statement_cancels() {
    let clock = ManualClock::new();
    let warehouse =
        ScriptedWarehouse::with_statuses(&[StatementStatus::Started], result_set(Vec::new()))
            .with_latency(&clock, Duration::from_secs(6), Duration::ZERO);
    let runner = QueryRunner::new(&warehouse, &clock, POLL);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(err.kind(), "timeout");
    assert_eq!(*warehouse.describes.lock().unwrap(), 1);
    assert_eq!(*warehouse.cancelled.lock().unwrap(), vec![StatementId::new("stmt-1")]);
    assert!(clock.sleeps.lock().unwrap().is_empty());
}

/// Tests a statement reported finished after the budget is spent is not fetched.
#[test]
fn finished_after_budget_is_timeout() {
    let clock = ManualClock::new();
    let warehouse = ScriptedWarehouse::finished(result_set(Vec::new()))
        .with_latency(&clock, Duration::from_secs(5), Duration::from_secs(60))
        .with_fetch_error(WarehouseError::Execution("fetch must not run".to_string()));
    let runner = QueryRunner::new(&warehouse, &clock, POLL);

    let err = runner.run(&settings(5_000).statement_request()).unwrap_err();

    assert_eq!(err.kind(), "timeout");
    assert!(warehouse.cancelled.lock().unwrap().is_empty());
    assert_eq!(*clock.elapsed.lock().unwrap(), Duration::from_secs(5));
}
