//! Error types for Hypercloud operations.
//!
//! This module provides the crate-wide error enum and the classifier that turns a
//! terminal HTTP status plus response body into a structured [`ApiError`].

use crate::dispatch::RequestOutcome;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for Hypercloud operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint or request path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to decode a response into a typed model
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The remote API answered with a non-success status
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Specialized result type for Hypercloud operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::Api(err) => err.kind.error_code(),
        }
    }

    /// Returns the API error if this error came from a remote response.
    #[must_use]
    pub const fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

/// Semantic category of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401: credentials were missing, expired or rejected
    Authentication,
    /// 403: the credentials may not perform this operation
    Authorization,
    /// 400 or 404: malformed request or unknown resource
    InvalidRequest,
    /// 422: the payload was understood but rejected
    Validation,
    /// Any other non-2xx status
    Api(StatusCode),
}

impl ErrorKind {
    /// Classify a terminal status. Returns `None` for 2xx.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }

        let kind = match status {
            StatusCode::UNAUTHORIZED => Self::Authentication,
            StatusCode::FORBIDDEN => Self::Authorization,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Self::InvalidRequest,
            StatusCode::UNPROCESSABLE_ENTITY => Self::Validation,
            other => Self::Api(other),
        };
        Some(kind)
    }

    /// Human-readable label, e.g. `Validation error` or `API Error: 500`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Authentication => "Authentication error".to_string(),
            Self::Authorization => "Unauthorized error".to_string(),
            Self::InvalidRequest => "Invalid request error".to_string(),
            Self::Validation => "Validation error".to_string(),
            Self::Api(status) => format!("API Error: {}", status.as_u16()),
        }
    }

    /// Stable code for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Validation => "VALIDATION_ERROR",
            Self::Api(_) => "API_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Structured error for a non-success API response.
///
/// Carries the raw body and the decoded JSON so callers can recover the remote
/// side's error detail.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}: {body}")]
pub struct ApiError {
    /// Error category
    pub kind: ErrorKind,
    /// Kind label
    pub message: String,
    /// Raw response body
    pub body: String,
    /// Decoded response body (or the synthetic payload for local failures)
    pub json: Value,
    /// Terminal HTTP status
    pub status: StatusCode,
}

impl ApiError {
    /// Build an error from an outcome known to be unsuccessful.
    #[must_use]
    pub fn new(kind: ErrorKind, outcome: RequestOutcome) -> Self {
        Self {
            message: kind.label(),
            kind,
            body: outcome.body,
            json: outcome.json,
            status: outcome.status,
        }
    }

    /// Value of the remote `error_description` or `message` field, if any.
    #[must_use]
    pub fn remote_description(&self) -> Option<&str> {
        self.json
            .get("error_description")
            .or_else(|| self.json.get("message"))
            .and_then(Value::as_str)
    }
}

/// Map a terminal outcome to the public `request` result.
///
/// # Errors
///
/// Returns an [`ApiError`] whenever the status is outside `200..300`.
pub fn classify(outcome: RequestOutcome) -> std::result::Result<Value, ApiError> {
    match ErrorKind::from_status(outcome.status) {
        None => Ok(outcome.json),
        Some(kind) => Err(ApiError::new(kind, outcome)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: u16, body: &str) -> RequestOutcome {
        RequestOutcome {
            json: serde_json::from_str(body).unwrap_or(Value::Null),
            body: body.to_string(),
            status: StatusCode::from_u16(status).unwrap(),
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (200, None),
            (400, Some(ErrorKind::InvalidRequest)),
            (401, Some(ErrorKind::Authentication)),
            (403, Some(ErrorKind::Authorization)),
            (404, Some(ErrorKind::InvalidRequest)),
            (422, Some(ErrorKind::Validation)),
            (500, Some(ErrorKind::Api(StatusCode::INTERNAL_SERVER_ERROR))),
        ];

        for (status, expected) in cases {
            let status = StatusCode::from_u16(status).unwrap();
            assert_eq!(ErrorKind::from_status(status), expected, "status {status}");
        }
    }

    #[test]
    fn test_all_success_codes_classify_as_ok() {
        for code in [200, 201, 202, 204, 299] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(ErrorKind::from_status(status).is_none());
        }
        assert!(ErrorKind::from_status(StatusCode::MULTIPLE_CHOICES).is_some());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ErrorKind::Authentication.label(), "Authentication error");
        assert_eq!(ErrorKind::Authorization.label(), "Unauthorized error");
        assert_eq!(ErrorKind::InvalidRequest.label(), "Invalid request error");
        assert_eq!(ErrorKind::Validation.label(), "Validation error");
        assert_eq!(
            ErrorKind::Api(StatusCode::BAD_GATEWAY).label(),
            "API Error: 502"
        );
    }

    #[test]
    fn test_classify_success_returns_json() {
        let value = classify(outcome(200, r#"{"id":"abc"}"#)).unwrap();
        assert_eq!(value, json!({"id": "abc"}));
    }

    #[test]
    fn test_classify_failure_keeps_body_and_json() {
        let body = r#"{"error":"invalid_request","error_description":"name is required"}"#;
        let err = classify(outcome(422, body)).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Validation error");
        assert_eq!(err.body, body);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.remote_description(), Some("name is required"));
        assert_eq!(err.to_string(), format!("Validation error: {body}"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::InvalidEndpoint("test".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );

        let api = classify(outcome(403, "{}")).unwrap_err();
        assert_eq!(Error::Api(api).error_code(), "AUTHORIZATION_ERROR");
    }

    #[test]
    fn test_api_error_conversion() {
        let api = classify(outcome(500, r#"{"error":"boom"}"#)).unwrap_err();
        let err: Error = api.clone().into();
        assert_eq!(err.as_api_error(), Some(&api));
        assert_eq!(err.to_string(), r#"API Error: 500: {"error":"boom"}"#);
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let hc_err: Error = err.into();
        assert!(matches!(hc_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<Value>("{invalid json}").unwrap_err();
        let hc_err: Error = err.into();
        assert!(matches!(hc_err, Error::ParseError(_)));
    }
}
