// crates/redshift-sre-aws/src/error.rs
// ============================================================================
// Module: AWS Adapter Errors
// Description: SDK error classification for the AWS adapters.
// Purpose: Map SDK failures onto connectivity and service error classes.
// Dependencies: aws-sdk-redshiftdata, redshift-sre-core, thiserror
// ============================================================================

//! ## Overview
//! SDK failures split into two classes. Anything that never reached a
//! service response, and any authorization rejection, is a connectivity
//! failure. Every other service response is a service failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::fmt::Debug;

use aws_sdk_redshiftdata::error::DisplayErrorContext;
use aws_sdk_redshiftdata::error::ProvideErrorMetadata;
use aws_sdk_redshiftdata::error::SdkError;
use redshift_sre_core::WarehouseError;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service error codes that indicate the caller could not be authorized.
const AUTHORIZATION_ERROR_CODES: [&str; 7] = [
    "AccessDenied",
    "AccessDeniedException",
    "UnrecognizedClientException",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "InvalidSignatureException",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// AWS adapter errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwsAdapterError {
    /// Adapter runtime unavailable.
    #[error("aws runtime error: {0}")]
    Runtime(String),
    /// Endpoint unreachable or caller not authorized.
    #[error("aws connectivity error: {0}")]
    Connectivity(String),
    /// Service rejected the request.
    #[error("aws service error: {0}")]
    Service(String),
    /// Service response could not be interpreted.
    #[error("aws response error: {0}")]
    Response(String),
}

impl From<AwsAdapterError> for WarehouseError {
    fn from(err: AwsAdapterError) -> Self {
        match err {
            AwsAdapterError::Runtime(_) | AwsAdapterError::Connectivity(_) => {
                Self::Connectivity(err.to_string())
            }
            AwsAdapterError::Service(_) | AwsAdapterError::Response(_) => {
                Self::Execution(err.to_string())
            }
        }
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies an SDK error from any of the AWS service clients.
pub(crate) fn from_sdk<E, R>(err: &SdkError<E, R>) -> AwsAdapterError
where
    E: ProvideErrorMetadata + StdError + 'static,
    R: Debug + 'static,
{
    let is_service = matches!(err, SdkError::ServiceError(_));
    let code = err.as_service_error().and_then(ProvideErrorMetadata::code);
    classify(is_service, code, DisplayErrorContext(err).to_string())
}

/// Classifies a failure from its origin and service error code.
#[must_use]
pub fn classify(is_service: bool, code: Option<&str>, message: String) -> AwsAdapterError {
    if !is_service {
        return AwsAdapterError::Connectivity(message);
    }
    match code {
        Some(code) if AUTHORIZATION_ERROR_CODES.contains(&code) => {
            AwsAdapterError::Connectivity(message)
        }
        _ => AwsAdapterError::Service(message),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests transport failures are connectivity errors.
    #[test]
    fn non_service_failures_are_connectivity() {
        assert_eq!(
            classify(false, None, "dispatch failure".to_string()),
            AwsAdapterError::Connectivity("dispatch failure".to_string())
        );
    }

    /// Tests authorization rejections are connectivity errors.
    #[test]
    fn authorization_codes_are_connectivity() {
        for code in ["AccessDeniedException", "ExpiredTokenException", "UnrecognizedClientException"]
        {
            assert!(matches!(
                classify(true, Some(code), code.to_string()),
                AwsAdapterError::Connectivity(_)
            ));
        }
    }

    /// Tests other service errors are service errors.
    #[test]
    fn other_service_errors_are_service() {
        assert!(matches!(
            classify(true, Some("ValidationException"), "bad sql".to_string()),
            AwsAdapterError::Service(_)
        ));
        assert!(matches!(classify(true, None, "unknown".to_string()), AwsAdapterError::Service(_)));
    }

    /// Tests adapter errors map onto the warehouse taxonomy.
    #[test]
    fn adapter_errors_map_to_warehouse_errors() {
        assert!(matches!(
            WarehouseError::from(AwsAdapterError::Runtime("closed".to_string())),
            WarehouseError::Connectivity(_)
        ));
        assert!(matches!(
            WarehouseError::from(AwsAdapterError::Response("missing id".to_string())),
            WarehouseError::Execution(_)
        ));
    }
}
