// crates/redshift-sre-core/src/runtime/sinks.rs
// ============================================================================
// Module: Reference Sinks
// Description: JSON-line sinks for records, metrics, and job events.
// Purpose: Provide local destinations for dry runs, tests, and operators.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! Writer-backed sinks serialize each line, data point, or event as one JSON
//! object per line. Job event sinks swallow write failures so that event
//! reporting can never fail an invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use crate::core::JobEvent;
use crate::core::LogLine;
use crate::core::MetricDatum;
use crate::interfaces::JobEventSink;
use crate::interfaces::MetricsSink;
use crate::interfaces::ObservabilityError;
use crate::interfaces::RecordSink;

// ============================================================================
// SECTION: Record Sink
// ============================================================================

/// Record sink writing one JSON object per [`LogLine`].
pub struct WriterRecordSink<W: Write + Send> {
    /// Underlying writer.
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterRecordSink<W> {
    /// Creates a record sink over `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> RecordSink for WriterRecordSink<W> {
    fn write(&self, lines: &[LogLine]) -> Result<(), ObservabilityError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| ObservabilityError::LogWrite("record writer poisoned".to_string()))?;
        for line in lines {
            let payload = serde_json::to_string(line)
                .map_err(|err| ObservabilityError::LogWrite(err.to_string()))?;
            writeln!(guard, "{payload}").map_err(|err| ObservabilityError::LogWrite(err.to_string()))?;
        }
        guard.flush().map_err(|err| ObservabilityError::LogWrite(err.to_string()))
    }
}

// ============================================================================
// SECTION: Metrics Sink
// ============================================================================

/// Metrics sink writing one JSON object per [`MetricDatum`].
pub struct WriterMetricsSink<W: Write + Send> {
    /// Underlying writer.
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterMetricsSink<W> {
    /// Creates a metrics sink over `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> MetricsSink for WriterMetricsSink<W> {
    fn put(&self, datum: &MetricDatum) -> Result<(), ObservabilityError> {
        let payload = serde_json::to_string(datum)
            .map_err(|err| ObservabilityError::MetricWrite(err.to_string()))?;
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| ObservabilityError::MetricWrite("metric writer poisoned".to_string()))?;
        writeln!(guard, "{payload}").map_err(|err| ObservabilityError::MetricWrite(err.to_string()))?;
        guard.flush().map_err(|err| ObservabilityError::MetricWrite(err.to_string()))
    }
}

// ============================================================================
// SECTION: Job Event Sinks
// ============================================================================

/// Job event sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrJobEventSink;

impl JobEventSink for StderrJobEventSink {
    fn record(&self, event: &JobEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Job event sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJobEventSink;

impl JobEventSink for NoopJobEventSink {
    fn record(&self, _event: &JobEvent) {}
}
