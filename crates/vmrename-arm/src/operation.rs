//! Long-running operation bookkeeping.
//!
//! ARM reports asynchronous completion either through an `Azure-AsyncOperation`
//! status URL or through a `Location` URL that answers 202 until done.

use crate::{ArmError, ArmResult};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use serde::Deserialize;
use std::time::Duration;

pub const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    AsyncOperation(String),
    Location(String),
    /// A 202 to DELETE without a status URL: poll the resource until it 404s.
    ResourceDeletion(String),
}

impl PendingOperation {
    /// `Azure-AsyncOperation` takes precedence over `Location`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };

        header(AZURE_ASYNC_OPERATION)
            .map(Self::AsyncOperation)
            .or_else(|| header(LOCATION.as_str()).map(Self::Location))
    }

    pub fn url(&self) -> &str {
        match self {
            Self::AsyncOperation(url) | Self::Location(url) | Self::ResourceDeletion(url) => url,
        }
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are ignored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ArmErrorEnvelope {
    error: ArmErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatusBody {
    pub status: String,
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
}

impl OperationStatusBody {
    /// Terminal failures become errors; anything not terminal is still running.
    pub fn state(&self) -> ArmResult<OperationState> {
        match self.status.as_str() {
            "Succeeded" => Ok(OperationState::Succeeded),
            "Failed" | "Canceled" | "Cancelled" => Err(ArmError::OperationFailed {
                status: self.status.clone(),
                message: self
                    .error
                    .as_ref()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "no error details".to_string()),
            }),
            _ => Ok(OperationState::InProgress),
        }
    }
}

/// Turn a non-success response body into an [`ArmError::Api`].
pub fn api_error(status: u16, body: &str) -> ArmError {
    match serde_json::from_str::<ArmErrorEnvelope>(body) {
        Ok(envelope) => ArmError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ArmError::Api {
            status,
            code: "Unknown".to_string(),
            message: body.chars().take(512).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_async_operation_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AZURE_ASYNC_OPERATION,
            HeaderValue::from_static("https://op/async"),
        );
        headers.insert(LOCATION, HeaderValue::from_static("https://op/location"));

        assert_eq!(
            PendingOperation::from_headers(&headers),
            Some(PendingOperation::AsyncOperation("https://op/async".to_string()))
        );
    }

    #[test]
    fn test_location_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://op/location"));

        let pending = PendingOperation::from_headers(&headers).unwrap();
        assert_eq!(pending, PendingOperation::Location("https://op/location".to_string()));
        assert_eq!(pending.url(), "https://op/location");
    }

    #[test]
    fn test_no_pending_operation_without_headers() {
        assert!(PendingOperation::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("15"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(15)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_operation_states() {
        let body = |status: &str| OperationStatusBody {
            status: status.to_string(),
            error: None,
        };

        assert_eq!(body("InProgress").state().unwrap(), OperationState::InProgress);
        assert_eq!(body("Succeeded").state().unwrap(), OperationState::Succeeded);
        assert!(matches!(
            body("Canceled").state(),
            Err(ArmError::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_failed_operation_carries_error_detail() {
        let body: OperationStatusBody = serde_json::from_str(
            r#"{"status":"Failed","error":{"code":"DiskInUse","message":"disk is attached"}}"#,
        )
        .unwrap();

        match body.state() {
            Err(ArmError::OperationFailed { status, message }) => {
                assert_eq!(status, "Failed");
                assert_eq!(message, "DiskInUse: disk is attached");
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_api_error_parses_envelope() {
        let err = api_error(
            404,
            r#"{"error":{"code":"ResourceNotFound","message":"missing"}}"#,
        );
        match err {
            ArmError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "ResourceNotFound");
                assert_eq!(message, "missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_api_error_keeps_unstructured_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "ARM API error (502) Unknown: Bad Gateway");
    }
}
