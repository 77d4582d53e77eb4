//! Error types and API response envelopes

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type of the directory service, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (field-level errors, context)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create a token invalid error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Create a rate limited error
    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::RateLimited)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut err = AppError::validation("Request validation failed");
        for (field, field_errors) in errors.field_errors() {
            let reason = field_errors
                .first()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .unwrap_or_else(|| "invalid".to_string());
            err = err.with_detail(field.to_string(), reason);
        }
        err
    }
}

/// Success envelope: `{ "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    /// Response status (200 unless set by [`ApiResponse::created`])
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl<T> ApiResponse<T> {
    /// 200 response with data
    pub fn success(data: T) -> Self {
        Self { data, status: None }
    }

    /// 201 response with data
    pub fn created(data: T) -> Self {
        Self {
            data,
            status: Some(StatusCode::CREATED),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}

/// Body of the failure envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

/// Failure envelope: `{ "error": { code, message, details } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl From<&AppError> for ErrorEnvelope {
    fn from(err: &AppError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code,
                message: err.message.clone(),
                details: err.details.clone(),
            },
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ErrorEnvelope::from(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::AgencyNotFound);
        assert_eq!(err.code, ErrorCode::AgencyNotFound);
        assert_eq!(err.message, "Agency not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "email")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "email");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_app_error_http_status() {
        assert_eq!(
            AppError::new(ErrorCode::NotFound).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::not_authenticated().http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::rate_limited().http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_not_found_constructor() {
        let err = AppError::not_found("Agency");
        assert_eq!(err.message, "Agency not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = AppError::with_message(ErrorCode::ClaimNotPending, "Already approved")
            .with_detail("claim_id", 7);
        let json = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(json["error"]["code"], "CLAIM_NOT_PENDING");
        assert_eq!(json["error"]["message"], "Already approved");
        assert_eq!(json["error"]["details"]["claim_id"], 7);
    }

    #[test]
    fn test_error_envelope_omits_empty_details() {
        let json = serde_json::to_value(ErrorEnvelope::from(&AppError::not_authenticated())).unwrap();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_string(&ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(json, r#"{"data":[1,2]}"#);
    }

    #[test]
    fn test_created_status() {
        assert_eq!(ApiResponse::created(1).status(), StatusCode::CREATED);
        assert_eq!(ApiResponse::success(1).status(), StatusCode::OK);
    }

    #[derive(Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 2, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_from_validation_errors() {
        let signup = Signup {
            email: "nope".into(),
            name: "x".into(),
        };
        let err: AppError = signup.validate().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("email").unwrap(), "email");
        assert_eq!(details.get("name").unwrap(), "too short");
    }
}
