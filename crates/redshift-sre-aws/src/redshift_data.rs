// crates/redshift-sre-aws/src/redshift_data.rs
// ============================================================================
// Module: Redshift Data API Client
// Description: WarehouseClient backed by the Redshift Data API.
// Purpose: Submit, poll, fetch, and cancel monitoring statements.
// Dependencies: aws-sdk-redshiftdata, redshift-sre-core
// ============================================================================

//! ## Overview
//! The Data API runs statements asynchronously, which maps one-to-one onto
//! [`WarehouseClient`]. Serverless workgroups authenticate with the caller's
//! IAM identity; provisioned clusters use temporary credentials for the
//! configured database user unless a Secrets Manager ARN is supplied.
//! Result pages are followed until no continuation token remains.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use aws_sdk_redshiftdata::Client;
use aws_sdk_redshiftdata::types::Field;
use aws_sdk_redshiftdata::types::StatusString;
use redshift_sre_core::FieldValue;
use redshift_sre_core::ResultSet;
use redshift_sre_core::StatementDescription;
use redshift_sre_core::StatementId;
use redshift_sre_core::StatementRequest;
use redshift_sre_core::StatementStatus;
use redshift_sre_core::SubmittedStatement;
use redshift_sre_core::WarehouseClient;
use redshift_sre_core::WarehouseError;
use redshift_sre_core::WarehouseTarget;

use crate::error::AwsAdapterError;
use crate::error::from_sdk;
use crate::runtime::AwsRuntime;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Redshift Data API warehouse client.
pub struct RedshiftDataClient {
    /// SDK client.
    client: Client,
    /// Runtime driving SDK futures.
    runtime: AwsRuntime,
}

impl RedshiftDataClient {
    /// Creates a client from an SDK client and runtime.
    #[must_use]
    pub const fn new(client: Client, runtime: AwsRuntime) -> Self {
        Self {
            client,
            runtime,
        }
    }
}

impl WarehouseClient for RedshiftDataClient {
    fn submit(&self, request: &StatementRequest) -> Result<SubmittedStatement, WarehouseError> {
        let client = self.client.clone();
        let request = request.clone();
        let submitted = self.runtime.block_on(async move {
            let connection = &request.connection;
            let mut call = client
                .execute_statement()
                .database(connection.database.clone())
                .sql(request.sql.clone())
                .set_statement_name(request.statement_name.clone())
                .set_secret_arn(connection.secret_arn.clone());
            match &connection.target {
                WarehouseTarget::Serverless {
                    workgroup,
                } => {
                    call = call.workgroup_name(workgroup.clone());
                }
                WarehouseTarget::Provisioned {
                    cluster_identifier,
                    db_user,
                } => {
                    call = call.cluster_identifier(cluster_identifier.clone());
                    if connection.secret_arn.is_none() {
                        call = call.db_user(db_user.clone());
                    }
                }
            }
            let output = call.send().await.map_err(|err| from_sdk(&err))?;
            let id = output
                .id()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AwsAdapterError::Response("statement id missing".to_string()))?;
            Ok(SubmittedStatement {
                id: StatementId::new(id),
                session_id: output.session_id().map(str::to_string),
            })
        })?;
        Ok(submitted)
    }

    fn describe(&self, id: &StatementId) -> Result<StatementDescription, WarehouseError> {
        let client = self.client.clone();
        let id = id.as_str().to_string();
        let description = self.runtime.block_on(async move {
            let output =
                client.describe_statement().id(id).send().await.map_err(|err| from_sdk(&err))?;
            let status = output
                .status()
                .ok_or_else(|| AwsAdapterError::Response("statement status missing".to_string()))
                .and_then(map_status)?;
            Ok(StatementDescription {
                status,
                error: output.error().filter(|error| !error.is_empty()).map(str::to_string),
                duration: duration_from_nanos(output.duration()),
            })
        })?;
        Ok(description)
    }

    fn fetch(&self, id: &StatementId) -> Result<ResultSet, WarehouseError> {
        let client = self.client.clone();
        let id = id.as_str().to_string();
        let result = self.runtime.block_on(async move {
            let mut result = ResultSet::default();
            let mut next_token: Option<String> = None;
            loop {
                let page = client
                    .get_statement_result()
                    .id(id.clone())
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|err| from_sdk(&err))?;
                for record in page.records() {
                    let row = record
                        .iter()
                        .map(convert_field)
                        .collect::<Result<Vec<FieldValue>, AwsAdapterError>>()?;
                    result.rows.push(row);
                }
                match page.next_token() {
                    Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                    _ => break,
                }
            }
            Ok(result)
        })?;
        Ok(result)
    }

    fn cancel(&self, id: &StatementId) -> Result<(), WarehouseError> {
        let client = self.client.clone();
        let id = id.as_str().to_string();
        self.runtime.block_on(async move {
            client.cancel_statement().id(id).send().await.map_err(|err| from_sdk(&err))?;
            Ok(())
        })?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Maps a Data API status onto the core status.
fn map_status(status: &StatusString) -> Result<StatementStatus, AwsAdapterError> {
    match status {
        StatusString::Submitted => Ok(StatementStatus::Submitted),
        StatusString::Picked => Ok(StatementStatus::Picked),
        StatusString::Started => Ok(StatementStatus::Started),
        StatusString::Finished => Ok(StatementStatus::Finished),
        StatusString::Failed => Ok(StatementStatus::Failed),
        StatusString::Aborted => Ok(StatementStatus::Aborted),
        other => Err(AwsAdapterError::Response(format!(
            "unexpected statement status {}",
            other.as_str()
        ))),
    }
}

/// Converts a Data API field into a core field value.
fn convert_field(field: &Field) -> Result<FieldValue, AwsAdapterError> {
    match field {
        Field::IsNull(_) => Ok(FieldValue::Null),
        Field::LongValue(value) => Ok(FieldValue::Long(*value)),
        Field::DoubleValue(value) => Ok(FieldValue::Double(*value)),
        Field::StringValue(value) => Ok(FieldValue::String(value.clone())),
        Field::BooleanValue(value) => Ok(FieldValue::Boolean(*value)),
        Field::BlobValue(value) => Ok(FieldValue::Blob(value.as_ref().to_vec())),
        _ => Err(AwsAdapterError::Response("unsupported result field type".to_string())),
    }
}

/// Converts a reported duration in nanoseconds; negative means unknown.
fn duration_from_nanos(nanos: i64) -> Option<Duration> {
    u64::try_from(nanos).ok().map(Duration::from_nanos)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
