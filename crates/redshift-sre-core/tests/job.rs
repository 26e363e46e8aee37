// crates/redshift-sre-core/tests/job.rs
// ============================================================================
// Module: Monitoring Job Tests
// Description: End-to-end invocation behavior against in-memory backends.
// ============================================================================
//! ## Overview
//! Validates state transitions, breach metrics, and warning downgrades.

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

use common::ManualClock;
use common::RecordingEvents;
use common::RecordingMetrics;
use common::RecordingRecords;
use common::ScriptedWarehouse;
use common::result_set;
use common::row;
use common::settings;
use redshift_sre_core::FieldValue;
use redshift_sre_core::JobError;
use redshift_sre_core::JobSettings;
use redshift_sre_core::JobState;
use redshift_sre_core::METRIC_NAME;
use redshift_sre_core::METRIC_NAMESPACE;
use redshift_sre_core::MonitorJob;
use redshift_sre_core::StatementId;
use redshift_sre_core::StatementStatus;
use redshift_sre_core::WarehouseError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Backends captured for assertions after a run.
struct Harness {
    warehouse: ScriptedWarehouse,
    records: RecordingRecords,
    metrics: RecordingMetrics,
    events: RecordingEvents,
}

impl Harness {
    fn new(warehouse: ScriptedWarehouse) -> Self {
        Self {
            warehouse,
            records: RecordingRecords::default(),
            metrics: RecordingMetrics::default(),
            events: RecordingEvents::default(),
        }
    }

    fn job(
        &self,
        settings: JobSettings,
    ) -> MonitorJob<ScriptedWarehouse, RecordingRecords, RecordingMetrics, RecordingEvents, ManualClock>
    {
        MonitorJob::new(
            settings,
            self.warehouse.clone(),
            self.records.clone(),
            self.metrics.clone(),
            self.events.clone(),
            ManualClock::new(),
        )
    }

    fn lines(&self) -> usize {
        self.records.lines.lock().unwrap().len()
    }

    fn data(&self) -> Vec<f64> {
        self.metrics.data.lock().unwrap().iter().map(|datum| datum.value).collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Tests a record over the threshold produces one log line and a count of one.
#[test]
fn breach_emits_line_and_metric() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 7_200_000)])));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.state, JobState::Emitted);
    assert_eq!(report.breach_count, 1);
    assert!(report.records[0].exceeds_threshold);
    assert_eq!(report.lines_written, 1);
    assert!(report.metric_emitted());
    assert!(report.warnings.is_empty());
    assert_eq!(harness.lines(), 1);
    assert_eq!(harness.data(), vec![1.0]);

    let datum = harness.metrics.data.lock().unwrap()[0].clone();
    assert_eq!(datum.namespace, METRIC_NAMESPACE);
    assert_eq!(datum.metric_name, METRIC_NAME);
    assert_eq!(datum.dimensions[0].name, "LogGroupName");
    assert_eq!(datum.dimensions[0].value, "/redshift/sre");
    assert_eq!(datum.dimensions[1].name, "LogStreamName");
    assert_eq!(datum.dimensions[1].value, "query-monitor");
    assert_eq!(harness.events.states(), vec!["running", "evaluated", "emitted"]);
}

/// Tests a record under the threshold is logged without a metric.
#[test]
fn record_under_threshold_logs_without_metric() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 3_000_000)])));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.breach_count, 0);
    assert!(!report.records[0].exceeds_threshold);
    assert_eq!(report.metric, None);
    assert_eq!(harness.lines(), 1);
    assert!(harness.data().is_empty());
}

/// Tests elapsed time equal to the threshold is not a breach.
#[test]
fn equal_elapsed_time_is_not_a_breach() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 5_000_000)])));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.breach_count, 0);
    assert!(harness.data().is_empty());
    assert_eq!(harness.lines(), 1);
}

/// Tests a sub-millisecond excess that logs as the threshold is not a breach.
#[test]
fn sub_millisecond_excess_is_not_a_breach() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 5_000_500)])));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.breach_count, 0);
    assert!(harness.data().is_empty());
    let lines = harness.records.lines.lock().unwrap();
    assert!(lines[0].message.ends_with("{\"longValue\": 5000}, {\"longValue\": 0}, {\"longValue\": 0}]"));
}

/// Tests one whole millisecond over the threshold is a breach.
#[test]
fn one_millisecond_over_is_a_breach() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 5_001_000)])));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.breach_count, 1);
    assert_eq!(harness.data(), vec![1.0]);
}

/// Tests the metric value counts every breaching record.
#[test]
fn metric_value_counts_breaching_records() {
    let rows = vec![row(1, 9_000_000), row(2, 1_000_000), row(3, 6_000_000)];
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(rows)));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.breach_count, 2);
    assert_eq!(report.lines_written, 3);
    assert_eq!(harness.data(), vec![2.0]);
    let sessions: Vec<Option<i64>> =
        report.records.iter().map(|entry| entry.record.session_id).collect();
    assert_eq!(sessions, vec![Some(1), Some(2), Some(3)]);
}

/// Tests an empty result set writes nothing and skips destination setup.
#[test]
fn empty_result_emits_nothing() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(Vec::new())));
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.state, JobState::Emitted);
    assert!(report.records.is_empty());
    assert_eq!(harness.lines(), 0);
    assert_eq!(*harness.records.prepares.lock().unwrap(), 0);
    assert!(harness.data().is_empty());
}

/// Tests a failed statement ends the invocation with nothing emitted.
#[test]
fn failed_statement_emits_nothing() {
    let harness = Harness::new(ScriptedWarehouse::failing_statement("relation does not exist"));
    let err = harness.job(settings(5_000)).run().unwrap_err();

    match &err {
        JobError::Execution {
            statement_id,
            message,
        } => {
            assert_eq!(statement_id.as_ref(), Some(&StatementId::new("stmt-1")));
            assert!(message.contains("relation does not exist"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), "execution");
    assert_eq!(harness.lines(), 0);
    assert!(harness.data().is_empty());
    assert_eq!(harness.events.states(), vec!["running", "failed"]);
}

/// Tests an aborted statement is reported as an execution failure.
#[test]
fn aborted_statement_is_execution_failure() {
    let warehouse = ScriptedWarehouse::with_statuses(
        &[StatementStatus::Started, StatementStatus::Aborted],
        result_set(vec![row(1, 9_000_000)]),
    );
    let harness = Harness::new(warehouse);
    let err = harness.job(settings(5_000)).run().unwrap_err();

    assert_eq!(err.kind(), "execution");
    assert!(err.to_string().contains("aborted"));
    assert_eq!(harness.lines(), 0);
}

/// Tests an unreachable warehouse is a connectivity failure.
#[test]
fn submit_failure_is_connectivity_failure() {
    let warehouse = ScriptedWarehouse::finished(result_set(Vec::new()))
        .with_submit_error(WarehouseError::Connectivity("no route to host".to_string()));
    let harness = Harness::new(warehouse);
    let err = harness.job(settings(5_000)).run().unwrap_err();

    assert_eq!(err, JobError::Connectivity("no route to host".to_string()));
    assert_eq!(err.statement_id(), None);
    assert_eq!(harness.events.states(), vec!["running", "failed"]);
}

/// Tests an undecodable row fails the invocation before any emission.
#[test]
fn malformed_row_fails_before_emission() {
    let mut bad = row(1, 9_000_000);
    bad[8] = FieldValue::String("slow".to_string());
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(2, 9_000_000), bad])));
    let err = harness.job(settings(5_000)).run().unwrap_err();

    assert_eq!(err.kind(), "execution");
    assert!(err.to_string().contains("elapsed_time"));
    assert_eq!(harness.lines(), 0);
    assert!(harness.data().is_empty());
}

/// Tests a metrics backend failure is downgraded to a warning.
#[test]
fn metric_failure_is_a_warning() {
    let mut harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 7_200_000)])));
    harness.metrics = RecordingMetrics::failing();
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.state, JobState::Emitted);
    assert_eq!(report.breach_count, 1);
    assert_eq!(report.metric, None);
    assert_eq!(report.lines_written, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("metrics backend unavailable"));
    assert_eq!(harness.events.warnings(), 1);
}

/// Tests a log backend failure still lets the metric through.
#[test]
fn log_failure_still_emits_metric() {
    let mut harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 7_200_000)])));
    harness.records = RecordingRecords::failing();
    let report = harness.job(settings(5_000)).run().unwrap();

    assert_eq!(report.lines_written, 0);
    assert_eq!(harness.data(), vec![1.0]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("log backend unavailable"));
}

/// Tests a disabled metric suppresses the data point but keeps the lines.
#[test]
fn disabled_metric_is_not_emitted() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 7_200_000)])));
    let mut job_settings = settings(5_000);
    job_settings.metric.enabled = false;
    let report = harness.job(job_settings).run().unwrap();

    assert_eq!(report.breach_count, 1);
    assert_eq!(report.metric, None);
    assert!(harness.data().is_empty());
    assert_eq!(harness.lines(), 1);
}

/// Tests the threshold is substituted into the SQL in warehouse units.
#[test]
fn threshold_is_rendered_in_timing_unit() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(Vec::new())));
    harness.job(settings(5_000)).run().unwrap();

    let submitted = harness.warehouse.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].sql.contains("h.elapsed_time > 5000000"));
    assert!(!submitted[0].sql.contains("{elapsed_time}"));
    assert_eq!(submitted[0].statement_name.as_deref(), Some("redshift-sre-monitor"));
}

/// Tests consecutive invocations do not share state.
#[test]
fn invocations_are_independent() {
    let harness = Harness::new(ScriptedWarehouse::finished(result_set(vec![row(42, 7_200_000)])));
    let job = harness.job(settings(5_000));
    let first = job.run().unwrap();
    let second = job.run().unwrap();

    assert_eq!(first.breach_count, second.breach_count);
    assert_eq!(harness.data(), vec![1.0, 1.0]);
    assert_eq!(harness.lines(), 2);
}
