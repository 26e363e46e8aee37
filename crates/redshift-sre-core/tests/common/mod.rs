// crates/redshift-sre-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fakes
// Description: Scripted warehouse, manual clock, and recording sinks.
// ============================================================================
//! ## Overview
//! Deterministic backends shared by the core integration tests.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use redshift_sre_core::Clock;
use redshift_sre_core::ConnectionParams;
use redshift_sre_core::FieldValue;
use redshift_sre_core::JobEvent;
use redshift_sre_core::JobEventSink;
use redshift_sre_core::JobSettings;
use redshift_sre_core::LogDestination;
use redshift_sre_core::LogLine;
use redshift_sre_core::MetricDatum;
use redshift_sre_core::MetricSpec;
use redshift_sre_core::MetricsSink;
use redshift_sre_core::ObservabilityError;
use redshift_sre_core::PollPolicy;
use redshift_sre_core::RecordSink;
use redshift_sre_core::ResultSet;
use redshift_sre_core::StatementDescription;
use redshift_sre_core::StatementId;
use redshift_sre_core::StatementRequest;
use redshift_sre_core::StatementStatus;
use redshift_sre_core::SubmittedStatement;
use redshift_sre_core::TimingUnit;
use redshift_sre_core::WarehouseClient;
use redshift_sre_core::WarehouseError;
use redshift_sre_core::WarehouseTarget;
use time::OffsetDateTime;
use time::macros::datetime;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed wall-clock instant used by the manual clock.
pub const PRODUCED_AT: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

/// Builds a monitoring row with microsecond timings.
pub fn row(session_id: i64, elapsed_us: i64) -> Vec<FieldValue> {
    vec![
        FieldValue::String("2024-05-01 11:58:00.250000".to_string()),
        FieldValue::Null,
        FieldValue::Long(session_id),
        FieldValue::String("analyst".to_string()),
        FieldValue::String("prod".to_string()),
        FieldValue::Long(elapsed_us - 1_000),
        FieldValue::String("SELECT".to_string()),
        FieldValue::String("select * from sales".to_string()),
        FieldValue::Long(elapsed_us),
        FieldValue::Long(500),
        FieldValue::Long(0),
    ]
}

/// Builds a result set from rows.
pub fn result_set(rows: Vec<Vec<FieldValue>>) -> ResultSet {
    ResultSet {
        rows,
    }
}

/// Builds job settings with a millisecond threshold and a short poll budget.
pub fn settings(threshold_ms: u64) -> JobSettings {
    let log_destination = LogDestination {
        group: "/redshift/sre".to_string(),
        stream: "query-monitor".to_string(),
    };
    JobSettings {
        connection: ConnectionParams {
            database: "dev".to_string(),
            user: Some("monitor".to_string()),
            host: None,
            port: Some(5439),
            target: WarehouseTarget::Serverless {
                workgroup: "analytics".to_string(),
            },
            secret_arn: None,
        },
        sql_template: redshift_sre_core::DEFAULT_SQL_TEMPLATE.to_string(),
        threshold: Duration::from_millis(threshold_ms),
        timing_unit: TimingUnit::Microseconds,
        poll: PollPolicy {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        },
        metric: MetricSpec::for_destination(&log_destination),
        log_destination,
        statement_name: Some("redshift-sre-monitor".to_string()),
    }
}

// ============================================================================
// SECTION: Warehouse
// ============================================================================

/// Scripted warehouse client.
#[derive(Clone, Default)]
pub struct ScriptedWarehouse {
    /// Status sequence; the last entry repeats.
    statuses: Arc<Mutex<VecDeque<StatementDescription>>>,
    /// Result returned by fetch.
    result: Arc<Mutex<ResultSet>>,
    /// Error returned by submit.
    submit_error: Option<WarehouseError>,
    /// Error returned by fetch.
    fetch_error: Option<WarehouseError>,
    /// Error returned by cancel.
    cancel_error: Option<WarehouseError>,
    /// Submitted requests.
    pub submitted: Arc<Mutex<Vec<StatementRequest>>>,
    /// Cancelled statement identifiers.
    pub cancelled: Arc<Mutex<Vec<StatementId>>>,
    /// Number of describe calls.
    pub describes: Arc<Mutex<u32>>,
    /// Clock advanced by describe and fetch calls.
    latency_clock: Option<ManualClock>,
    /// Time each describe call takes.
    describe_latency: Duration,
    /// Time each fetch call takes.
    fetch_latency: Duration,
}

impl ScriptedWarehouse {
    /// Warehouse that finishes immediately with `result`.
    pub fn finished(result: ResultSet) -> Self {
        Self::with_statuses(&[StatementStatus::Finished], result)
    }

    /// Warehouse that walks through `statuses` before returning `result`.
    pub fn with_statuses(statuses: &[StatementStatus], result: ResultSet) -> Self {
        let descriptions =
            statuses.iter().map(|status| StatementDescription::with_status(*status)).collect();
        Self {
            statuses: Arc::new(Mutex::new(descriptions)),
            result: Arc::new(Mutex::new(result)),
            ..Self::default()
        }
    }

    /// Warehouse whose statement fails with `error`.
    pub fn failing_statement(error: &str) -> Self {
        let description = StatementDescription {
            status: StatementStatus::Failed,
            error: Some(error.to_string()),
            duration: None,
        };
        Self {
            statuses: Arc::new(Mutex::new(VecDeque::from([description]))),
            ..Self::default()
        }
    }

    /// Sets the submit error.
    pub fn with_submit_error(mut self, error: WarehouseError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Sets the fetch error.
    pub fn with_fetch_error(mut self, error: WarehouseError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Sets the cancel error.
    pub fn with_cancel_error(mut self, error: WarehouseError) -> Self {
        self.cancel_error = Some(error);
        self
    }

    /// Makes describe and fetch calls advance `clock` by the given latencies.
    pub fn with_latency(mut self, clock: &ManualClock, describe: Duration, fetch: Duration) -> Self {
        self.latency_clock = Some(clock.clone());
        self.describe_latency = describe;
        self.fetch_latency = fetch;
        self
    }

    /// Advances the latency clock, when configured.
    fn spend(&self, duration: Duration) {
        if let Some(clock) = &self.latency_clock {
            clock.advance(duration);
        }
    }
}

impl WarehouseClient for ScriptedWarehouse {
    fn submit(&self, request: &StatementRequest) -> Result<SubmittedStatement, WarehouseError> {
        if let Some(err) = &self.submit_error {
            return Err(err.clone());
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(SubmittedStatement {
            id: StatementId::new("stmt-1"),
            session_id: Some("42".to_string()),
        })
    }

    fn describe(&self, _id: &StatementId) -> Result<StatementDescription, WarehouseError> {
        *self.describes.lock().unwrap() += 1;
        self.spend(self.describe_latency);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return Ok(statuses.pop_front().unwrap());
        }
        Ok(statuses
            .front()
            .cloned()
            .unwrap_or_else(|| StatementDescription::with_status(StatementStatus::Started)))
    }

    fn fetch(&self, _id: &StatementId) -> Result<ResultSet, WarehouseError> {
        self.spend(self.fetch_latency);
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        Ok(self.result.lock().unwrap().clone())
    }

    fn cancel(&self, id: &StatementId) -> Result<(), WarehouseError> {
        self.cancelled.lock().unwrap().push(id.clone());
        self.cancel_error.clone().map_or(Ok(()), Err)
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Clock that only advances when slept.
#[derive(Clone)]
pub struct ManualClock {
    /// Monotonic origin.
    origin: Instant,
    /// Time advanced by sleeps.
    pub elapsed: Arc<Mutex<Duration>>,
    /// Individual sleep durations.
    pub sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    /// Creates a clock at the origin.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advances time without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap()
    }

    fn wall_clock(&self) -> OffsetDateTime {
        PRODUCED_AT + *self.elapsed.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Record sink capturing lines in memory.
#[derive(Clone, Default)]
pub struct RecordingRecords {
    /// Captured lines.
    pub lines: Arc<Mutex<Vec<LogLine>>>,
    /// Number of prepare calls.
    pub prepares: Arc<Mutex<u32>>,
    /// Fail every write when set.
    pub fail: bool,
}

impl RecordingRecords {
    /// Sink whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl RecordSink for RecordingRecords {
    fn prepare(&self) -> Result<(), ObservabilityError> {
        *self.prepares.lock().unwrap() += 1;
        Ok(())
    }

    fn write(&self, lines: &[LogLine]) -> Result<(), ObservabilityError> {
        if self.fail {
            return Err(ObservabilityError::LogWrite("log backend unavailable".to_string()));
        }
        self.lines.lock().unwrap().extend_from_slice(lines);
        Ok(())
    }
}

/// Metrics sink capturing data points in memory.
#[derive(Clone, Default)]
pub struct RecordingMetrics {
    /// Captured data points.
    pub data: Arc<Mutex<Vec<MetricDatum>>>,
    /// Fail every put when set.
    pub fail: bool,
}

impl RecordingMetrics {
    /// Sink whose puts always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl MetricsSink for RecordingMetrics {
    fn put(&self, datum: &MetricDatum) -> Result<(), ObservabilityError> {
        if self.fail {
            return Err(ObservabilityError::MetricWrite("metrics backend unavailable".to_string()));
        }
        self.data.lock().unwrap().push(datum.clone());
        Ok(())
    }
}

/// Job event sink capturing events in memory.
#[derive(Clone, Default)]
pub struct RecordingEvents {
    /// Captured events.
    pub events: Arc<Mutex<Vec<JobEvent>>>,
}

impl RecordingEvents {
    /// Returns the labels of captured state events in order.
    pub fn states(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| event.state.map(|state| state.as_str()))
            .collect()
    }

    /// Returns the number of warning events.
    pub fn warnings(&self) -> usize {
        self.events.lock().unwrap().iter().filter(|event| event.event == "job_warning").count()
    }
}

impl JobEventSink for RecordingEvents {
    fn record(&self, event: &JobEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
