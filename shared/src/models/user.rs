//! User / account models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role stored on the user row, compared as a plain string by the guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    AgencyOwner,
    Admin,
}

impl UserRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "agency_owner" => Some(Self::AgencyOwner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::AgencyOwner => "agency_owner",
            Self::Admin => "admin",
        }
    }
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered, awaiting email verification
    Pending,
    Active,
    Suspended,
}

impl UserStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

/// Public account view (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub email_verified_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountUpdate {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
}

/// Login / verification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Admin: change role and/or status of a user
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserUpdate {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserQuery {
    pub q: Option<String>,
    pub role: Option<UserRole>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_db_roundtrip() {
        for role in [UserRole::User, UserRole::AgencyOwner, UserRole::Admin] {
            assert_eq!(UserRole::from_db(role.as_db()), Some(role));
        }
        assert_eq!(UserRole::from_db("superuser"), None);
    }

    #[test]
    fn test_role_serde_matches_db() {
        let json = serde_json::to_string(&UserRole::AgencyOwner).unwrap();
        assert_eq!(json, "\"agency_owner\"");
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "jane@acme.com".into(),
            password: "correct horse".into(),
            full_name: "Jane".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "jane".into(),
            password: "short".into(),
            full_name: "".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("full_name"));
    }

    #[test]
    fn test_verify_code_length() {
        let req = VerifyEmailRequest {
            email: "jane@acme.com".into(),
            code: "12345".into(),
        };
        assert!(req.validate().is_err());
    }
}
