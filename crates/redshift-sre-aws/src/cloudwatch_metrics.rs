// crates/redshift-sre-aws/src/cloudwatch_metrics.rs
// ============================================================================
// Module: CloudWatch Metrics Sink
// Description: MetricsSink writing data points with PutMetricData.
// Dependencies: aws-sdk-cloudwatch, redshift-sre-core
// ============================================================================

//! CloudWatch [`MetricsSink`] for the breach counter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::types::Dimension;
use aws_sdk_cloudwatch::types::MetricDatum as CloudWatchDatum;
use aws_sdk_cloudwatch::types::StandardUnit;
use redshift_sre_core::MetricDatum;
use redshift_sre_core::MetricUnit;
use redshift_sre_core::MetricsSink;
use redshift_sre_core::ObservabilityError;

use crate::error::AwsAdapterError;
use crate::error::from_sdk;
use crate::runtime::AwsRuntime;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// CloudWatch metrics sink.
pub struct CloudWatchMetricsSink {
    /// SDK client.
    client: Client,
    /// Runtime driving SDK futures.
    runtime: AwsRuntime,
}

impl CloudWatchMetricsSink {
    /// Creates a sink.
    #[must_use]
    pub const fn new(client: Client, runtime: AwsRuntime) -> Self {
        Self {
            client,
            runtime,
        }
    }
}

impl MetricsSink for CloudWatchMetricsSink {
    fn put(&self, datum: &MetricDatum) -> Result<(), ObservabilityError> {
        let converted =
            to_cloudwatch(datum).map_err(|err| ObservabilityError::MetricWrite(err.to_string()))?;
        let client = self.client.clone();
        let namespace = datum.namespace.clone();
        self.runtime
            .block_on(async move {
                client
                    .put_metric_data()
                    .namespace(namespace)
                    .metric_data(converted)
                    .send()
                    .await
                    .map_err(|err| from_sdk(&err))?;
                Ok(())
            })
            .map_err(|err| ObservabilityError::MetricWrite(err.to_string()))
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Converts a core data point into the SDK representation.
fn to_cloudwatch(datum: &MetricDatum) -> Result<CloudWatchDatum, AwsAdapterError> {
    let mut builder = CloudWatchDatum::builder()
        .metric_name(datum.metric_name.clone())
        .value(datum.value)
        .unit(standard_unit(datum.unit));
    for dimension in &datum.dimensions {
        let converted = Dimension::builder()
            .name(dimension.name.clone())
            .value(dimension.value.clone())
            .build();
        builder = builder.dimensions(converted);
    }
    Ok(builder.build())
}

/// Maps the core unit onto the SDK unit.
const fn standard_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Count => StandardUnit::Count,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
