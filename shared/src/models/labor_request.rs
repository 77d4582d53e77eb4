//! Labor requests submitted to agencies by prospective clients

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborRequestStatus {
    New,
    Reviewed,
    Accepted,
    Declined,
}

impl LaborRequestStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "reviewed" => Some(Self::Reviewed),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Still awaiting an agency decision
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::Reviewed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LaborRequest {
    pub id: i64,
    pub agency_id: i64,
    pub requester_id: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub trade_id: Option<i64>,
    pub headcount: i32,
    pub start_date: Option<NaiveDate>,
    pub duration_weeks: Option<i32>,
    pub location: Option<String>,
    pub pay_rate: Option<Decimal>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LaborRequestCreate {
    #[validate(length(min = 1, max = 120))]
    pub contact_name: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(max = 40))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
    pub trade_id: Option<i64>,
    #[validate(range(min = 1, max = 10000))]
    pub headcount: i32,
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 520))]
    pub duration_weeks: Option<i32>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub pay_rate: Option<Decimal>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl LaborRequestCreate {
    /// Non-negative with at most two decimal places (`NUMERIC(10,2)`)
    pub fn pay_rate_valid(&self) -> bool {
        match self.pay_rate {
            Some(rate) => {
                !rate.is_sign_negative()
                    && rate.scale() <= 2
                    && rate < Decimal::from(100_000_000i64)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaborRequestStatusUpdate {
    pub status: LaborRequestStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaborRequestQuery {
    pub status: Option<LaborRequestStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create(headcount: i32, pay_rate: Option<&str>) -> LaborRequestCreate {
        LaborRequestCreate {
            contact_name: "Pat".into(),
            contact_email: "pat@builder.com".into(),
            contact_phone: None,
            company_name: None,
            trade_id: None,
            headcount,
            start_date: None,
            duration_weeks: None,
            location: None,
            pay_rate: pay_rate.map(|r| Decimal::from_str(r).unwrap()),
            description: None,
        }
    }

    #[test]
    fn test_headcount_bounds() {
        assert!(create(1, None).validate().is_ok());
        assert!(create(10000, None).validate().is_ok());
        assert!(create(0, None).validate().is_err());
        assert!(create(10001, None).validate().is_err());
    }

    #[test]
    fn test_pay_rate_valid() {
        assert!(create(1, Some("42.50")).pay_rate_valid());
        assert!(create(1, None).pay_rate_valid());
        assert!(!create(1, Some("-1")).pay_rate_valid());
        assert!(!create(1, Some("12.345")).pay_rate_valid());
    }

    #[test]
    fn test_status_is_open() {
        assert!(LaborRequestStatus::New.is_open());
        assert!(LaborRequestStatus::Reviewed.is_open());
        assert!(!LaborRequestStatus::Declined.is_open());
        assert_eq!(LaborRequestStatus::from_db("accepted"), Some(LaborRequestStatus::Accepted));
    }
}
