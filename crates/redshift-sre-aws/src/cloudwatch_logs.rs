// crates/redshift-sre-aws/src/cloudwatch_logs.rs
// ============================================================================
// Module: CloudWatch Logs Record Sink
// Description: RecordSink writing record lines to a CloudWatch log stream.
// Purpose: Publish one log event per evaluated record.
// Dependencies: aws-sdk-cloudwatchlogs, redshift-sre-core
// ============================================================================

//! ## Overview
//! Lines are written with `PutLogEvents` in batches that respect the service
//! limits on event count and payload size. When enabled, [`RecordSink::prepare`]
//! creates the log group and stream first; an existing group or stream counts
//! as success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::operation::create_log_group::CreateLogGroupError;
use aws_sdk_cloudwatchlogs::operation::create_log_stream::CreateLogStreamError;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::types::RejectedLogEventsInfo;
use redshift_sre_core::LogDestination;
use redshift_sre_core::LogLine;
use redshift_sre_core::ObservabilityError;
use redshift_sre_core::RecordSink;

use crate::error::AwsAdapterError;
use crate::error::from_sdk;
use crate::runtime::AwsRuntime;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum events per `PutLogEvents` call.
const MAX_EVENTS_PER_BATCH: usize = 10_000;
/// Maximum batch payload in bytes, counting per-event overhead.
const MAX_BATCH_BYTES: usize = 1_048_576;
/// Per-event overhead counted against the batch payload.
const EVENT_OVERHEAD_BYTES: usize = 26;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// CloudWatch Logs record sink.
pub struct CloudWatchLogsSink {
    /// SDK client.
    client: Client,
    /// Runtime driving SDK futures.
    runtime: AwsRuntime,
    /// Target group and stream.
    destination: LogDestination,
    /// Create the group and stream in `prepare`.
    create_if_missing: bool,
}

impl CloudWatchLogsSink {
    /// Creates a sink for `destination`.
    #[must_use]
    pub const fn new(
        client: Client,
        runtime: AwsRuntime,
        destination: LogDestination,
        create_if_missing: bool,
    ) -> Self {
        Self {
            client,
            runtime,
            destination,
            create_if_missing,
        }
    }
}

impl RecordSink for CloudWatchLogsSink {
    fn prepare(&self) -> Result<(), ObservabilityError> {
        if !self.create_if_missing {
            return Ok(());
        }
        let client = self.client.clone();
        let group = self.destination.group.clone();
        let stream = self.destination.stream.clone();
        self.runtime
            .block_on(async move {
                match client.create_log_group().log_group_name(group.clone()).send().await {
                    Ok(_) => {}
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(CreateLogGroupError::is_resource_already_exists_exception) => {}
                    Err(err) => return Err(from_sdk(&err)),
                }
                match client
                    .create_log_stream()
                    .log_group_name(group)
                    .log_stream_name(stream)
                    .send()
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(CreateLogStreamError::is_resource_already_exists_exception) =>
                    {
                        Ok(())
                    }
                    Err(err) => Err(from_sdk(&err)),
                }
            })
            .map_err(|err| ObservabilityError::LogWrite(err.to_string()))
    }

    fn write(&self, lines: &[LogLine]) -> Result<(), ObservabilityError> {
        let events = lines
            .iter()
            .map(to_input_event)
            .collect::<Result<Vec<InputLogEvent>, AwsAdapterError>>()
            .map_err(|err| ObservabilityError::LogWrite(err.to_string()))?;
        for batch in batch_ranges(lines) {
            let chunk = events[batch].to_vec();
            let client = self.client.clone();
            let group = self.destination.group.clone();
            let stream = self.destination.stream.clone();
            self.runtime
                .block_on(async move {
                    let output = client
                        .put_log_events()
                        .log_group_name(group)
                        .log_stream_name(stream)
                        .set_log_events(Some(chunk))
                        .send()
                        .await
                        .map_err(|err| from_sdk(&err))?;
                    match output.rejected_log_events_info() {
                        Some(rejected) => Err(AwsAdapterError::Response(describe_rejection(rejected))),
                        None => Ok(()),
                    }
                })
                .map_err(|err| ObservabilityError::LogWrite(err.to_string()))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a log line into an SDK log event.
fn to_input_event(line: &LogLine) -> Result<InputLogEvent, AwsAdapterError> {
    InputLogEvent::builder()
        .timestamp(line.timestamp_ms)
        .message(line.message.clone())
        .build()
        .map_err(|err| AwsAdapterError::Response(err.to_string()))
}

/// Splits lines into index ranges that fit the batch limits.
fn batch_ranges(lines: &[LogLine]) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut bytes = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let size = line.message.len().saturating_add(EVENT_OVERHEAD_BYTES);
        let full = index - start >= MAX_EVENTS_PER_BATCH
            || bytes.saturating_add(size) > MAX_BATCH_BYTES;
        if full && index > start {
            ranges.push(start .. index);
            start = index;
            bytes = 0;
        }
        bytes = bytes.saturating_add(size);
    }
    if start < lines.len() {
        ranges.push(start .. lines.len());
    }
    ranges
}

/// Summarizes rejected event indexes.
fn describe_rejection(rejected: &RejectedLogEventsInfo) -> String {
    let mut parts = Vec::new();
    if let Some(index) = rejected.too_new_log_event_start_index() {
        parts.push(format!("too new from index {index}"));
    }
    if let Some(index) = rejected.too_old_log_event_end_index() {
        parts.push(format!("too old up to index {index}"));
    }
    if let Some(index) = rejected.expired_log_event_end_index() {
        parts.push(format!("expired up to index {index}"));
    }
    if parts.is_empty() {
        "log events rejected".to_string()
    } else {
        format!("log events rejected: {}", parts.join(", "))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
