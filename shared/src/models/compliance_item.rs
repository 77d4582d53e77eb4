//! Compliance certifications (licenses, insurance, bonds...)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::compliance::{AlertLevel, ExpiryStatus, alert_level, days_until, expiry_status};
use crate::models::serde_helpers::{nullable, patched};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceType {
    License,
    Insurance,
    Bond,
    SafetyCertification,
    WorkersComp,
    Other,
}

impl ComplianceType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::License => "license",
            Self::Insurance => "insurance",
            Self::Bond => "bond",
            Self::SafetyCertification => "safety_certification",
            Self::WorkersComp => "workers_comp",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ComplianceItem {
    pub id: i64,
    pub agency_id: i64,
    pub compliance_type: String,
    pub title: String,
    pub issuer: Option<String>,
    pub certificate_number: Option<String>,
    pub issued_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub document_url: Option<String>,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Item with expiry state computed against a given day
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceItemView {
    #[serde(flatten)]
    pub item: ComplianceItem,
    pub status: ExpiryStatus,
    pub days_remaining: Option<i64>,
    pub alert_level: Option<AlertLevel>,
}

impl ComplianceItemView {
    pub fn new(item: ComplianceItem, today: NaiveDate) -> Self {
        let status = expiry_status(item.expiration_date, today);
        let days_remaining = item.expiration_date.map(|d| days_until(d, today));
        let alert_level = alert_level(item.expiration_date, today);
        Self {
            item,
            status,
            days_remaining,
            alert_level,
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self.status, ExpiryStatus::Expired | ExpiryStatus::ExpiringSoon)
    }
}

/// Expired and expiring-soon items, most urgent first
pub fn compliance_alerts(items: Vec<ComplianceItem>, today: NaiveDate) -> Vec<ComplianceItemView> {
    let mut alerts: Vec<_> = items
        .into_iter()
        .map(|item| ComplianceItemView::new(item, today))
        .filter(ComplianceItemView::needs_attention)
        .collect();
    alerts.sort_by_key(|v| (v.days_remaining.unwrap_or(i64::MAX), v.item.id));
    alerts
}

fn dates_ordered(issued: Option<NaiveDate>, expiration: Option<NaiveDate>) -> bool {
    match (issued, expiration) {
        (Some(i), Some(e)) => i <= e,
        _ => true,
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComplianceItemCreate {
    pub compliance_type: ComplianceType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    pub issuer: Option<String>,
    #[validate(length(max = 100))]
    pub certificate_number: Option<String>,
    pub issued_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    #[validate(url)]
    pub document_url: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl ComplianceItemCreate {
    pub fn dates_valid(&self) -> bool {
        dates_ordered(self.issued_date, self.expiration_date)
    }
}

/// Partial update; `null` clears an optional field
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ComplianceItemUpdate {
    pub compliance_type: Option<ComplianceType>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "nullable")]
    pub issuer: Option<Option<String>>,
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "nullable")]
    pub certificate_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub issued_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub expiration_date: Option<Option<NaiveDate>>,
    #[validate(url)]
    #[serde(default, deserialize_with = "nullable")]
    pub document_url: Option<Option<String>>,
    #[validate(length(max = 2000))]
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl ComplianceItemUpdate {
    /// Checks date order after merging with the stored item
    pub fn dates_valid(&self, current: &ComplianceItem) -> bool {
        dates_ordered(
            patched(&self.issued_date, &current.issued_date),
            patched(&self.expiration_date, &current.expiration_date),
        )
    }

    /// Whether the edit invalidates an admin verification
    pub fn clears_verification(&self, current: &ComplianceItem) -> bool {
        self.issued_date.is_some_and(|d| d != current.issued_date)
            || self.expiration_date.is_some_and(|d| d != current.expiration_date)
            || self
                .certificate_number
                .as_ref()
                .is_some_and(|c| *c != current.certificate_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn item(id: i64, expiration: Option<NaiveDate>) -> ComplianceItem {
        ComplianceItem {
            id,
            agency_id: 1,
            compliance_type: "license".into(),
            title: format!("Item {id}"),
            issuer: None,
            certificate_number: Some("LIC-1".into()),
            issued_date: Some(d(2024, 1, 1)),
            expiration_date: expiration,
            document_url: None,
            is_verified: true,
            verified_by: None,
            verified_at: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_view_computes_status() {
        let today = d(2025, 6, 1);
        let view = ComplianceItemView::new(item(1, Some(d(2025, 6, 11))), today);
        assert_eq!(view.status, ExpiryStatus::ExpiringSoon);
        assert_eq!(view.days_remaining, Some(10));
        assert_eq!(view.alert_level, Some(AlertLevel::Days14));

        let view = ComplianceItemView::new(item(2, None), today);
        assert_eq!(view.status, ExpiryStatus::NoExpiration);
        assert_eq!(view.days_remaining, None);
    }

    #[test]
    fn test_alerts_most_urgent_first() {
        let today = d(2025, 6, 1);
        let items = vec![
            item(1, Some(d(2025, 6, 20))),
            item(2, Some(d(2025, 5, 1))),
            item(3, Some(d(2026, 1, 1))),
            item(4, None),
            item(5, Some(d(2025, 6, 2))),
        ];
        let ids: Vec<i64> = compliance_alerts(items, today)
            .iter()
            .map(|v| v.item.id)
            .collect();
        assert_eq!(ids, vec![2, 5, 1]);
    }

    #[test]
    fn test_dates_valid() {
        let current = item(1, Some(d(2025, 6, 1)));
        let update = ComplianceItemUpdate {
            issued_date: Some(Some(d(2025, 7, 1))),
            ..Default::default()
        };
        assert!(!update.dates_valid(&current));

        let update = ComplianceItemUpdate {
            expiration_date: Some(Some(d(2026, 6, 1))),
            ..Default::default()
        };
        assert!(update.dates_valid(&current));

        // Clearing the expiration lifts the ordering constraint
        let update = ComplianceItemUpdate {
            issued_date: Some(Some(d(2025, 7, 1))),
            expiration_date: Some(None),
            ..Default::default()
        };
        assert!(update.dates_valid(&current));
    }

    #[test]
    fn test_clears_verification() {
        let current = item(1, Some(d(2025, 6, 1)));
        let title_only = ComplianceItemUpdate {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(!title_only.clears_verification(&current));

        let same_number = ComplianceItemUpdate {
            certificate_number: Some(Some("LIC-1".into())),
            ..Default::default()
        };
        assert!(!same_number.clears_verification(&current));

        let new_expiry = ComplianceItemUpdate {
            expiration_date: Some(Some(d(2026, 6, 1))),
            ..Default::default()
        };
        assert!(new_expiry.clears_verification(&current));

        let cleared_number = ComplianceItemUpdate {
            certificate_number: Some(None),
            ..Default::default()
        };
        assert!(cleared_number.clears_verification(&current));
    }

    #[test]
    fn test_update_null_clears() {
        let update: ComplianceItemUpdate =
            serde_json::from_str(r#"{"expiration_date": null, "notes": null, "title": "Bond"}"#).unwrap();
        assert_eq!(update.expiration_date, Some(None));
        assert_eq!(update.notes, Some(None));
        assert_eq!(update.document_url, None);
        assert!(update.validate().is_ok());

        let current = item(1, Some(d(2025, 6, 1)));
        assert!(update.clears_verification(&current));
    }

    #[test]
    fn test_compliance_type_serde() {
        let t: ComplianceType = serde_json::from_str("\"safety_certification\"").unwrap();
        assert_eq!(t.as_db(), "safety_certification");
    }
}
