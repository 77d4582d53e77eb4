//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::UserNotFound
            | Self::AgencyNotFound
            | Self::TradeNotFound
            | Self::RegionNotFound
            | Self::LaborRequestNotFound
            | Self::ClaimNotFound
            | Self::ComplianceItemNotFound
            | Self::ConversationNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::AgencySlugExists
            | Self::AgencyAlreadyClaimed
            | Self::ClaimAlreadyPending
            | Self::ClaimNotPending => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::NotAgencyOwner
            | Self::CannotModifySelf
            | Self::EmailNotVerified
            | Self::AgencyInactive => StatusCode::FORBIDDEN,

            // 413 / 415 uploads
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedFileFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 429 Too Many Requests
            Self::RateLimited | Self::TooManyAttempts | Self::ConnectionLimitExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }

            // 502 upstream identity provider
            Self::OauthExchangeFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient or unconfigured dependencies)
            Self::NetworkError | Self::ServiceUnavailable | Self::OauthNotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::FileStorageFailed
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::AgencyNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::ConversationNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::AgencyAlreadyClaimed.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ClaimAlreadyPending.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(
            ErrorCode::NotAgencyOwner.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::AdminRequired.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::EmailNotVerified.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rate_limited_status() {
        assert_eq!(
            ErrorCode::RateLimited.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::TooManyAttempts.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_upload_status() {
        assert_eq!(
            ErrorCode::FileTooLarge.http_status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorCode::UnsupportedFileFormat.http_status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_service_unavailable_status() {
        assert_eq!(
            ErrorCode::OauthNotConfigured.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::OauthExchangeFailed.http_status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TradeMultiplePrimary.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ImportMissingColumn.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
