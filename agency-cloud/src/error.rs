//! Unified service-layer error type for agency-cloud
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`) so handlers can propagate with `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, AWS SDK, serde, etc.)
    Db(BoxError),
    /// Business-rule error
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        ServiceError::App(AppError::new(code))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_is_masked() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: ServiceError = ErrorCode::AgencyNotFound.into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::AgencyNotFound);
    }
}
