//! Agency ownership claims

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl ClaimStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Claim {
    pub id: i64,
    pub agency_id: i64,
    pub user_id: String,
    pub status: String,
    pub business_email: String,
    pub position_title: Option<String>,
    pub notes: Option<String>,
    pub email_domain_verified: bool,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<i64>,
    pub rejection_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Claim {
    pub fn is_pending(&self) -> bool {
        self.status == ClaimStatus::Pending.as_db()
    }
}

/// Claim joined with agency and claimant for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClaimListItem {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub claim: Claim,
    pub agency_name: String,
    pub agency_slug: String,
    pub user_email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClaimCreate {
    #[validate(email)]
    pub business_email: String,
    #[validate(length(min = 1, max = 120))]
    pub position_title: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClaimReject {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in [
            ClaimStatus::Pending,
            ClaimStatus::Approved,
            ClaimStatus::Rejected,
            ClaimStatus::Withdrawn,
        ] {
            assert_eq!(ClaimStatus::from_db(s.as_db()), Some(s));
        }
    }

    #[test]
    fn test_claim_create_validation() {
        let req = ClaimCreate {
            business_email: "owner@acme".into(),
            position_title: Some("".into()),
            notes: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("position_title"));
    }

    #[test]
    fn test_reject_requires_reason() {
        let req: ClaimReject = serde_json::from_str(r#"{"reason": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
