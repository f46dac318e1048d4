use crate::identity::RequestContext;
use crate::manager::{DbError, StoreError};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

pub const INVALID_INPUT: &str = "error_invalid_input";
pub const JSON_ERROR: &str = "json_error";
pub const UNKNOWN_AVAILABILITY_ERROR: &str = "unknown_availability_error";
pub const DB_NOT_FOUND: &str = "error_not_found";
pub const DB_CONFLICT: &str = "error_conflict";
pub const DB_ERROR: &str = "error_database";

/// Everything a request can fail with.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Identity or required id missing. Raised before the manager is called.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The payload could not be decoded. Raised before the manager is called.
    #[error("could not decode payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedPayload(err.to_string())
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorBody {
    pub fn new(token: impl Into<String>, ctx: &RequestContext) -> Self {
        ErrorBody {
            error: token.into(),
            request_id: ctx.request_id.clone(),
        }
    }
}

/// Translates any request failure into a status code and a stable error token.
pub fn map_error(err: &ApiError) -> (StatusCode, String) {
    match err {
        ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, INVALID_INPUT.to_string()),
        ApiError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, JSON_ERROR.to_string()),
        ApiError::Store(store_err) => match store_err {
            StoreError::InvalidRule(message) => (StatusCode::BAD_REQUEST, message.clone()),
            StoreError::Database(db_err) => classify_db_error(db_err),
            StoreError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, message.clone())
            }
            StoreError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            StoreError::Unknown(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                UNKNOWN_AVAILABILITY_ERROR.to_string(),
            ),
        },
    }
}

/// Database failures are unavailability unless the database itself said otherwise.
pub fn classify_db_error(err: &DbError) -> (StatusCode, String) {
    match err.status {
        Some(404) => (StatusCode::NOT_FOUND, DB_NOT_FOUND.to_string()),
        Some(409) => (StatusCode::CONFLICT, DB_CONFLICT.to_string()),
        _ => (StatusCode::SERVICE_UNAVAILABLE, DB_ERROR.to_string()),
    }
}

/// Logs a failed request. Validation failures are the caller's fault and are
/// only warnings.
pub fn log_error(err: &ApiError, ctx: &RequestContext) {
    let tenant_id = ctx.tenant_id();
    let request_id = ctx.request_id();

    match err {
        ApiError::InvalidInput(_) => {
            tracing::warn!(error = %err, tenant_id, request_id, "Invalid input")
        }
        ApiError::MalformedPayload(_) => {
            tracing::warn!(error = %err, tenant_id, request_id, "Could not parse JSON")
        }
        ApiError::Store(StoreError::InvalidRule(_)) => {
            tracing::error!(error = %err, tenant_id, request_id, "Bad request")
        }
        ApiError::Store(StoreError::Database(_)) => {
            tracing::error!(error = %err, tenant_id, request_id, "Database error occurred")
        }
        ApiError::Store(StoreError::ServiceUnavailable(_)) => {
            tracing::error!(error = %err, tenant_id, request_id, "Service unavailable")
        }
        ApiError::Store(StoreError::NotFound(_)) => {
            tracing::error!(error = %err, tenant_id, request_id, "Record not found")
        }
        ApiError::Store(StoreError::Unknown(_)) => tracing::error!(
            error = %err,
            tenant_id,
            request_id,
            "Unknown availability error occurred"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("connection reset by a plugin nobody knows about")]
    struct ForeignError;

    #[test]
    fn test_map_every_kind() {
        let cases = vec![
            (
                ApiError::InvalidInput("missing tenant identity"),
                StatusCode::BAD_REQUEST,
                INVALID_INPUT,
            ),
            (
                ApiError::MalformedPayload("expected value".into()),
                StatusCode::BAD_REQUEST,
                JSON_ERROR,
            ),
            (
                StoreError::InvalidRule("error_invalid_port".into()).into(),
                StatusCode::BAD_REQUEST,
                "error_invalid_port",
            ),
            (
                StoreError::Database(DbError::new(None, "connection refused")).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                DB_ERROR,
            ),
            (
                StoreError::ServiceUnavailable("error_rules_engine_down".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                "error_rules_engine_down",
            ),
            (
                StoreError::NotFound("error_tenant_not_found".into()).into(),
                StatusCode::NOT_FOUND,
                "error_tenant_not_found",
            ),
            (
                StoreError::unknown(ForeignError).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                UNKNOWN_AVAILABILITY_ERROR,
            ),
        ];

        for (err, status, token) in cases {
            assert_eq!(map_error(&err), (status, token.to_string()), "{err:?}");
            // Logging must never fail the request
            log_error(&err, &RequestContext::default());
        }
    }

    #[test]
    fn test_classify_db_error() {
        assert_eq!(
            classify_db_error(&DbError::new(Some(404), "missing")),
            (StatusCode::NOT_FOUND, DB_NOT_FOUND.to_string())
        );
        assert_eq!(
            classify_db_error(&DbError::new(Some(409), "document update conflict")),
            (StatusCode::CONFLICT, DB_CONFLICT.to_string())
        );
        assert_eq!(
            classify_db_error(&DbError::new(Some(500), "internal")),
            (StatusCode::SERVICE_UNAVAILABLE, DB_ERROR.to_string())
        );
    }

    #[test]
    fn test_json_errors_are_malformed_payloads() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::MalformedPayload(_)));
    }

    #[test]
    fn test_error_body_carries_request_id() {
        let ctx = RequestContext {
            tenant: None,
            request_id: Some("req-1".into()),
        };
        let body = serde_json::to_value(ErrorBody::new(JSON_ERROR, &ctx)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "json_error", "request_id": "req-1"})
        );

        let body = serde_json::to_value(ErrorBody::new(JSON_ERROR, &RequestContext::default()))
            .unwrap();
        assert_eq!(body, serde_json::json!({"error": "json_error"}));
    }
}
