//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Agency errors
/// - 4xxx: Claim errors
/// - 5xxx: Compliance errors
/// - 6xxx: Messaging errors
/// - 7xxx: Upload / import errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Agency errors (3xxx)
    Agency,
    /// Claim errors (4xxx)
    Claim,
    /// Compliance errors (5xxx)
    Compliance,
    /// Messaging errors (6xxx)
    Messaging,
    /// Upload / import errors (7xxx)
    Import,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Agency,
            4000..5000 => Self::Claim,
            5000..6000 => Self::Compliance,
            6000..7000 => Self::Messaging,
            7000..8000 => Self::Import,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Agency => "agency",
            Self::Claim => "claim",
            Self::Compliance => "compliance",
            Self::Messaging => "messaging",
            Self::Import => "import",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3101), ErrorCategory::Agency);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Claim);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Compliance);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Messaging);
        assert_eq!(ErrorCategory::from_code(7101), ErrorCategory::Import);
        assert_eq!(ErrorCategory::from_code(8000), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::RateLimited.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::NotAgencyOwner.category(), ErrorCategory::Permission);
        assert_eq!(ErrorCode::TradeNotFound.category(), ErrorCategory::Agency);
        assert_eq!(ErrorCode::ClaimNotPending.category(), ErrorCategory::Claim);
        assert_eq!(
            ErrorCode::ComplianceDatesInvalid.category(),
            ErrorCategory::Compliance
        );
        assert_eq!(ErrorCode::MessageEmpty.category(), ErrorCategory::Messaging);
        assert_eq!(ErrorCode::ImportParseFailed.category(), ErrorCategory::Import);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_name() {
        assert_eq!(ErrorCategory::Agency.name(), "agency");
        assert_eq!(ErrorCategory::System.name(), "system");
    }
}
