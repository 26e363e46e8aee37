// crates/redshift-sre-core/src/runtime/emitter.rs
// ============================================================================
// Module: Metrics Emitter
// Description: Record log lines and the breach counter data point.
// Purpose: Publish evaluated records without failing the invocation.
// Dependencies: crate::{core, interfaces, runtime::evaluator}, time
// ============================================================================

//! ## Overview
//! Every evaluated record becomes one log line. When at least one record
//! breaches the threshold, a single counter data point is emitted whose value
//! is the number of breaching records. Backend failures are collected as
//! warnings; the query result has already been obtained at this point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

use crate::core::LogLine;
use crate::core::MetricDatum;
use crate::core::MetricSpec;
use crate::interfaces::MetricsSink;
use crate::interfaces::ObservabilityError;
use crate::interfaces::RecordSink;
use crate::runtime::evaluator::EvaluatedRecord;
use crate::runtime::evaluator::breach_count;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of the emission step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionOutcome {
    /// Log lines accepted by the record sink.
    pub lines_written: usize,
    /// Data point accepted by the metrics sink, if any.
    pub metric: Option<MetricDatum>,
    /// Non-fatal backend failures.
    pub warnings: Vec<ObservabilityError>,
}

// ============================================================================
// SECTION: Emitter
// ============================================================================

/// Writes record lines and the breach metric.
pub struct MetricsEmitter<'a, L, M> {
    /// Record line destination.
    records: &'a L,
    /// Metric destination.
    metrics: &'a M,
    /// Breach metric definition.
    spec: &'a MetricSpec,
}

impl<'a, L, M> MetricsEmitter<'a, L, M>
where
    L: RecordSink,
    M: MetricsSink,
{
    /// Creates an emitter.
    #[must_use]
    pub const fn new(records: &'a L, metrics: &'a M, spec: &'a MetricSpec) -> Self {
        Self {
            records,
            metrics,
            spec,
        }
    }

    /// Emits log lines for all records and the breach metric when warranted.
    #[must_use]
    pub fn emit(&self, evaluated: &[EvaluatedRecord], produced_at: OffsetDateTime) -> EmissionOutcome {
        let mut outcome = EmissionOutcome::default();
        self.write_lines(evaluated, produced_at, &mut outcome);
        let breaches = breach_count(evaluated);
        if breaches > 0 && self.spec.enabled {
            let value = f64::from(u32::try_from(breaches).unwrap_or(u32::MAX));
            let datum = self.spec.datum(value);
            match self.metrics.put(&datum) {
                Ok(()) => outcome.metric = Some(datum),
                Err(err) => outcome.warnings.push(err),
            }
        }
        outcome
    }

    /// Renders and writes one line per record.
    fn write_lines(
        &self,
        evaluated: &[EvaluatedRecord],
        produced_at: OffsetDateTime,
        outcome: &mut EmissionOutcome,
    ) {
        if evaluated.is_empty() {
            return;
        }
        let mut lines = Vec::with_capacity(evaluated.len());
        for entry in evaluated {
            match LogLine::from_record(&entry.record, produced_at) {
                Ok(line) => lines.push(line),
                Err(err) => outcome.warnings.push(ObservabilityError::LogWrite(err.to_string())),
            }
        }
        if let Err(err) = self.records.prepare() {
            outcome.warnings.push(err);
        }
        if lines.is_empty() {
            return;
        }
        match self.records.write(&lines) {
            Ok(()) => outcome.lines_written = lines.len(),
            Err(err) => outcome.warnings.push(err),
        }
    }
}
