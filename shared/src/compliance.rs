//! Certification expiry arithmetic
//!
//! An item is valid through its expiration date (0 days left is still valid)
//! and expired from the day after.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Window, in days, in which an item counts as expiring soon
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    NoExpiration,
    Valid,
    ExpiringSoon,
    Expired,
}

/// Reminder thresholds, least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Days30,
    Days14,
    Days7,
    Days1,
    Expired,
}

impl AlertLevel {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Days30 => "days_30",
            Self::Days14 => "days_14",
            Self::Days7 => "days_7",
            Self::Days1 => "days_1",
            Self::Expired => "expired",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "days_30" => Some(Self::Days30),
            "days_14" => Some(Self::Days14),
            "days_7" => Some(Self::Days7),
            "days_1" => Some(Self::Days1),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Days from `today` until `expiration` (negative once expired)
pub fn days_until(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

pub fn expiry_status(expiration: Option<NaiveDate>, today: NaiveDate) -> ExpiryStatus {
    let Some(expiration) = expiration else {
        return ExpiryStatus::NoExpiration;
    };
    match days_until(expiration, today) {
        d if d < 0 => ExpiryStatus::Expired,
        d if d <= EXPIRING_SOON_DAYS => ExpiryStatus::ExpiringSoon,
        _ => ExpiryStatus::Valid,
    }
}

/// Most urgent reminder threshold reached, if any
pub fn alert_level(expiration: Option<NaiveDate>, today: NaiveDate) -> Option<AlertLevel> {
    let days = days_until(expiration?, today);
    match days {
        d if d < 0 => Some(AlertLevel::Expired),
        d if d <= 1 => Some(AlertLevel::Days1),
        d if d <= 7 => Some(AlertLevel::Days7),
        d if d <= 14 => Some(AlertLevel::Days14),
        d if d <= 30 => Some(AlertLevel::Days30),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_until() {
        assert_eq!(days_until(d(2025, 3, 1), d(2025, 2, 1)), 28);
        assert_eq!(days_until(d(2025, 2, 1), d(2025, 2, 1)), 0);
        assert_eq!(days_until(d(2025, 1, 31), d(2025, 2, 1)), -1);
    }

    #[test]
    fn test_expiry_status_boundaries() {
        let today = d(2025, 6, 1);
        assert_eq!(expiry_status(None, today), ExpiryStatus::NoExpiration);
        assert_eq!(expiry_status(Some(d(2025, 5, 31)), today), ExpiryStatus::Expired);
        assert_eq!(expiry_status(Some(today), today), ExpiryStatus::ExpiringSoon);
        assert_eq!(expiry_status(Some(d(2025, 7, 1)), today), ExpiryStatus::ExpiringSoon);
        assert_eq!(expiry_status(Some(d(2025, 7, 2)), today), ExpiryStatus::Valid);
    }

    #[test]
    fn test_alert_level() {
        let today = d(2025, 6, 1);
        assert_eq!(alert_level(None, today), None);
        assert_eq!(alert_level(Some(d(2025, 8, 1)), today), None);
        assert_eq!(alert_level(Some(d(2025, 7, 1)), today), Some(AlertLevel::Days30));
        assert_eq!(alert_level(Some(d(2025, 6, 15)), today), Some(AlertLevel::Days14));
        assert_eq!(alert_level(Some(d(2025, 6, 8)), today), Some(AlertLevel::Days7));
        assert_eq!(alert_level(Some(d(2025, 6, 2)), today), Some(AlertLevel::Days1));
        assert_eq!(alert_level(Some(today), today), Some(AlertLevel::Days1));
        assert_eq!(alert_level(Some(d(2025, 5, 1)), today), Some(AlertLevel::Expired));
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::Expired > AlertLevel::Days1);
        assert!(AlertLevel::Days7 > AlertLevel::Days14);
    }

    #[test]
    fn test_alert_level_db_roundtrip() {
        for level in [AlertLevel::Days30, AlertLevel::Days1, AlertLevel::Expired] {
            assert_eq!(AlertLevel::from_db(level.as_db()), Some(level));
        }
        assert_eq!(AlertLevel::from_db("days_2"), None);
    }
}
