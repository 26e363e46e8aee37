// crates/redshift-sre-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Elapsed-Time Evaluator
// Description: Threshold comparison for decoded records.
// Purpose: Decide which records breach the configured elapsed-time threshold.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The evaluator is a total, side-effect-free function: a record breaches
//! when its elapsed time is strictly greater than the threshold. Equality is
//! not a breach. Both sides are compared in whole milliseconds, the
//! granularity the log line reports, so a logged value equal to the threshold
//! is never counted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

use crate::core::QueryExecutionRecord;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Record paired with its threshold verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedRecord {
    /// Decoded record.
    #[serde(flatten)]
    pub record: QueryExecutionRecord,
    /// True when `elapsed_time` is strictly greater than the threshold.
    pub exceeds_threshold: bool,
}

/// Returns true when the record's elapsed time, in whole milliseconds, is
/// strictly greater than `threshold`.
#[must_use]
pub fn exceeds_threshold(record: &QueryExecutionRecord, threshold: Duration) -> bool {
    record.elapsed_time.as_millis() > threshold.as_millis()
}

/// Evaluates every record against `threshold`, preserving order.
#[must_use]
pub fn evaluate_records(
    records: Vec<QueryExecutionRecord>,
    threshold: Duration,
) -> Vec<EvaluatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let exceeds_threshold = exceeds_threshold(&record, threshold);
            EvaluatedRecord {
                record,
                exceeds_threshold,
            }
        })
        .collect()
}

/// Counts records that breach the threshold.
#[must_use]
pub fn breach_count(evaluated: &[EvaluatedRecord]) -> usize {
    evaluated.iter().filter(|entry| entry.exceeds_threshold).count()
}
