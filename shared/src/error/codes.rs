//! Unified error codes for the agency directory
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Agency errors (profiles, trades, regions, labor requests)
//! - 4xxx: Claim errors
//! - 5xxx: Compliance errors
//! - 6xxx: Messaging errors
//! - 7xxx: Upload / import errors
//! - 9xxx: System errors
//!
//! On the wire a code travels as its SCREAMING_SNAKE string (`"AGENCY_NOT_FOUND"`);
//! the numeric value only drives categorisation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests from this client
    RateLimited = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Email not verified
    EmailNotVerified = 1008,
    /// Verification code expired
    VerificationCodeExpired = 1009,
    /// Verification code invalid
    VerificationCodeInvalid = 1010,
    /// Too many verification attempts
    TooManyAttempts = 1011,
    /// Password too short
    PasswordTooShort = 1012,
    /// OAuth provider is not configured
    OauthNotConfigured = 1013,
    /// OAuth state missing, expired or already used
    OauthStateInvalid = 1014,
    /// OAuth code exchange failed
    OauthExchangeFailed = 1015,
    /// User not found
    UserNotFound = 1016,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Caller does not own the agency
    NotAgencyOwner = 2006,
    /// Admins cannot demote or suspend themselves
    CannotModifySelf = 2007,

    // ==================== 3xxx: Agency ====================
    /// Agency not found
    AgencyNotFound = 3001,
    /// Agency slug already taken
    AgencySlugExists = 3002,
    /// Agency is deactivated
    AgencyInactive = 3003,
    /// Trade not found
    TradeNotFound = 3101,
    /// More than one primary trade submitted
    TradeMultiplePrimary = 3102,
    /// Region not found
    RegionNotFound = 3201,
    /// Labor request not found
    LaborRequestNotFound = 3301,

    // ==================== 4xxx: Claim ====================
    /// Claim not found
    ClaimNotFound = 4001,
    /// Agency already has an owner
    AgencyAlreadyClaimed = 4002,
    /// Caller already has a pending claim for this agency
    ClaimAlreadyPending = 4003,
    /// Claim has already been decided
    ClaimNotPending = 4004,

    // ==================== 5xxx: Compliance ====================
    /// Compliance item not found
    ComplianceItemNotFound = 5001,
    /// Expiration date precedes issue date
    ComplianceDatesInvalid = 5002,

    // ==================== 6xxx: Messaging ====================
    /// Conversation not found
    ConversationNotFound = 6001,
    /// Agency cannot receive messages (unclaimed)
    AgencyNotMessageable = 6002,
    /// Message body empty
    MessageEmpty = 6003,
    /// Too many realtime connections
    ConnectionLimitExceeded = 6004,

    // ==================== 7xxx: Upload / Import ====================
    /// File too large
    FileTooLarge = 7001,
    /// Unsupported file format
    UnsupportedFileFormat = 7002,
    /// Invalid/corrupted image file
    InvalidImageFile = 7003,
    /// No file provided in request
    NoFileProvided = 7004,
    /// Empty file provided
    EmptyFile = 7005,
    /// File storage failed
    FileStorageFailed = 7006,
    /// Import file lacks a required column
    ImportMissingColumn = 7101,
    /// Import file exceeds the row limit
    ImportTooManyRows = 7102,
    /// Import file could not be parsed
    ImportParseFailed = 7103,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Configuration error
    ConfigError = 9005,
    /// Dependent service unavailable
    ServiceUnavailable = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Wire representation (matches the serde form)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unknown => "UNKNOWN",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::RateLimited => "RATE_LIMITED",

            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::VerificationCodeExpired => "VERIFICATION_CODE_EXPIRED",
            Self::VerificationCodeInvalid => "VERIFICATION_CODE_INVALID",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Self::OauthNotConfigured => "OAUTH_NOT_CONFIGURED",
            Self::OauthStateInvalid => "OAUTH_STATE_INVALID",
            Self::OauthExchangeFailed => "OAUTH_EXCHANGE_FAILED",
            Self::UserNotFound => "USER_NOT_FOUND",

            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AdminRequired => "ADMIN_REQUIRED",
            Self::NotAgencyOwner => "NOT_AGENCY_OWNER",
            Self::CannotModifySelf => "CANNOT_MODIFY_SELF",

            Self::AgencyNotFound => "AGENCY_NOT_FOUND",
            Self::AgencySlugExists => "AGENCY_SLUG_EXISTS",
            Self::AgencyInactive => "AGENCY_INACTIVE",
            Self::TradeNotFound => "TRADE_NOT_FOUND",
            Self::TradeMultiplePrimary => "TRADE_MULTIPLE_PRIMARY",
            Self::RegionNotFound => "REGION_NOT_FOUND",
            Self::LaborRequestNotFound => "LABOR_REQUEST_NOT_FOUND",

            Self::ClaimNotFound => "CLAIM_NOT_FOUND",
            Self::AgencyAlreadyClaimed => "AGENCY_ALREADY_CLAIMED",
            Self::ClaimAlreadyPending => "CLAIM_ALREADY_PENDING",
            Self::ClaimNotPending => "CLAIM_NOT_PENDING",

            Self::ComplianceItemNotFound => "COMPLIANCE_ITEM_NOT_FOUND",
            Self::ComplianceDatesInvalid => "COMPLIANCE_DATES_INVALID",

            Self::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            Self::AgencyNotMessageable => "AGENCY_NOT_MESSAGEABLE",
            Self::MessageEmpty => "MESSAGE_EMPTY",
            Self::ConnectionLimitExceeded => "CONNECTION_LIMIT_EXCEEDED",

            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::UnsupportedFileFormat => "UNSUPPORTED_FILE_FORMAT",
            Self::InvalidImageFile => "INVALID_IMAGE_FILE",
            Self::NoFileProvided => "NO_FILE_PROVIDED",
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileStorageFailed => "FILE_STORAGE_FAILED",
            Self::ImportMissingColumn => "IMPORT_MISSING_COLUMN",
            Self::ImportTooManyRows => "IMPORT_TOO_MANY_ROWS",
            Self::ImportParseFailed => "IMPORT_PARSE_FAILED",

            Self::InternalError => "INTERNAL_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",
            Self::RateLimited => "Too many requests, try again later",

            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid email or password",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Invalid token",
            Self::AccountDisabled => "Account is disabled",
            Self::EmailNotVerified => "Email has not been verified",
            Self::VerificationCodeExpired => "Verification code has expired",
            Self::VerificationCodeInvalid => "Verification code is invalid",
            Self::TooManyAttempts => "Too many attempts",
            Self::PasswordTooShort => "Password must be at least 8 characters",
            Self::OauthNotConfigured => "Social sign-in is not available",
            Self::OauthStateInvalid => "Sign-in session expired, please try again",
            Self::OauthExchangeFailed => "Sign-in with the provider failed",
            Self::UserNotFound => "User not found",

            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin role required",
            Self::NotAgencyOwner => "You do not manage this agency",
            Self::CannotModifySelf => "You cannot change your own role or status",

            Self::AgencyNotFound => "Agency not found",
            Self::AgencySlugExists => "Agency slug already exists",
            Self::AgencyInactive => "Agency is not active",
            Self::TradeNotFound => "Trade not found",
            Self::TradeMultiplePrimary => "Only one trade can be primary",
            Self::RegionNotFound => "Region not found",
            Self::LaborRequestNotFound => "Labor request not found",

            Self::ClaimNotFound => "Claim not found",
            Self::AgencyAlreadyClaimed => "Agency has already been claimed",
            Self::ClaimAlreadyPending => "A claim for this agency is already pending",
            Self::ClaimNotPending => "Claim has already been reviewed",

            Self::ComplianceItemNotFound => "Compliance item not found",
            Self::ComplianceDatesInvalid => "Expiration date cannot precede issue date",

            Self::ConversationNotFound => "Conversation not found",
            Self::AgencyNotMessageable => "This agency cannot receive messages yet",
            Self::MessageEmpty => "Message cannot be empty",
            Self::ConnectionLimitExceeded => "Too many open connections",

            Self::FileTooLarge => "File too large",
            Self::UnsupportedFileFormat => "Unsupported file format",
            Self::InvalidImageFile => "Invalid image file",
            Self::NoFileProvided => "No file provided",
            Self::EmptyFile => "Empty file",
            Self::FileStorageFailed => "File storage failed",
            Self::ImportMissingColumn => "Import file is missing a required column",
            Self::ImportTooManyRows => "Import file has too many rows",
            Self::ImportParseFailed => "Import file could not be parsed",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::NetworkError => "Network error",
            Self::ConfigError => "Configuration error",
            Self::ServiceUnavailable => "Service unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::RateLimited.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::AgencyNotFound.code(), 3001);
        assert_eq!(ErrorCode::ClaimNotFound.code(), 4001);
        assert_eq!(ErrorCode::ComplianceItemNotFound.code(), 5001);
        assert_eq!(ErrorCode::ConversationNotFound.code(), 6001);
        assert_eq!(ErrorCode::FileTooLarge.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }

    #[test]
    fn test_serialize_matches_as_str() {
        for code in [
            ErrorCode::AgencyNotFound,
            ErrorCode::OauthStateInvalid,
            ErrorCode::ImportMissingColumn,
            ErrorCode::TradeMultiplePrimary,
            ErrorCode::InternalError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("\"CLAIM_NOT_PENDING\"").unwrap();
        assert_eq!(code, ErrorCode::ClaimNotPending);
        assert!(serde_json::from_str::<ErrorCode>("\"NOPE\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::AgencyNotFound), "AGENCY_NOT_FOUND");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::AgencyNotFound.message(), "Agency not found");
        assert_eq!(
            ErrorCode::PasswordTooShort.message(),
            "Password must be at least 8 characters"
        );
    }
}
