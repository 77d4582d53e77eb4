//! Agency Model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::completion::{CompletionInput, CompletionReport};
use crate::models::serde_helpers::nullable;
use crate::models::{AgencyTrade, ComplianceItemView, Region};

/// Agency profile row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Agency {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub logo_url: Option<String>,
    pub founded_year: Option<i32>,
    pub employee_count: Option<String>,
    pub is_union: bool,
    pub offers_per_diem: bool,
    pub is_claimed: bool,
    pub owner_id: Option<String>,
    pub is_verified: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Agency {
    pub fn completion_input(&self, trade_count: usize, region_count: usize) -> CompletionInput<'_> {
        CompletionInput {
            name: Some(&self.name),
            description: self.description.as_deref(),
            logo_url: self.logo_url.as_deref(),
            website: self.website.as_deref(),
            email: self.email.as_deref(),
            phone: self.phone.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            founded_year: self.founded_year,
            employee_count: self.employee_count.as_deref(),
            trade_count,
            region_count,
        }
    }

    /// Row-equality ownership check
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    /// Replace email/phone with their masked forms unless `reveal`
    pub fn present_contact(mut self, reveal: bool) -> Self {
        use crate::privacy::{mask_email, mask_phone, present_contact};
        self.email = present_contact(self.email.as_deref(), reveal, mask_email);
        self.phone = present_contact(self.phone.as_deref(), reveal, mask_phone);
        self
    }
}

/// Create agency payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AgencyCreate {
    #[validate(length(min = 2, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub address_line: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(range(min = 1800, max = 2100))]
    pub founded_year: Option<i32>,
    #[validate(length(max = 40))]
    pub employee_count: Option<String>,
    pub is_union: Option<bool>,
    pub offers_per_diem: Option<bool>,
}

/// Update agency payload
///
/// Absent fields stay untouched; `null` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AgencyUpdate {
    #[validate(length(min = 2, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[validate(url)]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub website: Option<Option<String>>,
    #[validate(email)]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[validate(length(max = 40))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub address_line: Option<Option<String>>,
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
    #[validate(length(max = 50))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub state: Option<Option<String>>,
    #[validate(length(max = 20))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<Option<String>>,
    #[validate(range(min = 1800, max = 2100))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<Option<i32>>,
    #[validate(length(max = 40))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<Option<String>>,
    pub is_union: Option<bool>,
    pub offers_per_diem: Option<bool>,
}

/// One audited field change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Value,
    pub new: Value,
}

impl AgencyUpdate {
    /// Fields whose submitted value differs from the current row
    pub fn changes(&self, current: &Agency) -> Vec<FieldChange> {
        let mut out = Vec::new();
        let mut push = |field: &'static str, old: Value, new: Option<Value>| {
            if let Some(new) = new
                && new != old
            {
                out.push(FieldChange { field, old, new });
            }
        };

        push(
            "name",
            current.name.clone().into(),
            self.name.as_deref().map(|n| Value::from(n.trim())),
        );
        push("description", opt(&current.description), self.description.as_ref().map(opt));
        push("website", opt(&current.website), self.website.as_ref().map(opt));
        push("email", opt(&current.email), self.email.as_ref().map(opt));
        push("phone", opt(&current.phone), self.phone.as_ref().map(opt));
        push("address_line", opt(&current.address_line), self.address_line.as_ref().map(opt));
        push("city", opt(&current.city), self.city.as_ref().map(opt));
        push("state", opt(&current.state), self.state.as_ref().map(opt));
        push("postal_code", opt(&current.postal_code), self.postal_code.as_ref().map(opt));
        push(
            "founded_year",
            current.founded_year.map(Value::from).unwrap_or(Value::Null),
            self.founded_year.map(|y| y.map(Value::from).unwrap_or(Value::Null)),
        );
        push("employee_count", opt(&current.employee_count), self.employee_count.as_ref().map(opt));
        push("is_union", current.is_union.into(), self.is_union.map(Value::from));
        push("offers_per_diem", current.offers_per_diem.into(), self.offers_per_diem.map(Value::from));
        out
    }
}

fn opt(v: &Option<String>) -> Value {
    v.clone().map(Value::from).unwrap_or(Value::Null)
}

/// Directory listing row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AgencySummary {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub logo_url: Option<String>,
    pub is_union: bool,
    pub is_claimed: bool,
    pub is_verified: bool,
    pub is_featured: bool,
    pub trades: Vec<String>,
}

/// Public profile page payload
#[derive(Debug, Clone, Serialize)]
pub struct AgencyDetail {
    pub agency: Agency,
    pub trades: Vec<AgencyTrade>,
    pub regions: Vec<Region>,
    pub compliance: Vec<ComplianceItemView>,
    pub completion: CompletionReport,
}

/// Owner dashboard row: agency plus its completion score
#[derive(Debug, Clone, Serialize)]
pub struct OwnedAgency {
    #[serde(flatten)]
    pub agency: Agency,
    pub completion: CompletionReport,
}

/// `GET /api/agencies` filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgencySearchQuery {
    pub q: Option<String>,
    /// Trade slug
    pub trade: Option<String>,
    /// Region slug
    pub region: Option<String>,
    pub state: Option<String>,
    pub union: Option<bool>,
    pub verified: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Admin agency list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminAgencyQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub claimed: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Admin moderation flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationUpdate {
    pub is_verified: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

impl ModerationUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_verified.is_none() && self.is_featured.is_none() && self.is_active.is_none()
    }
}

/// Audit trail row of `agency_profile_edits`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProfileEdit {
    pub id: i64,
    pub agency_id: i64,
    pub editor_id: Option<String>,
    pub field_name: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency() -> Agency {
        Agency {
            id: 1,
            slug: "acme".into(),
            name: "Acme".into(),
            description: None,
            website: Some("https://acme.com".into()),
            email: Some("info@acme.com".into()),
            phone: Some("555-123-4567".into()),
            address_line: None,
            city: Some("Newark".into()),
            state: Some("NJ".into()),
            postal_code: None,
            logo_url: None,
            founded_year: Some(1998),
            employee_count: None,
            is_union: false,
            offers_per_diem: false,
            is_claimed: false,
            owner_id: None,
            is_verified: false,
            is_featured: false,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_changes_only_reports_differences() {
        let update = AgencyUpdate {
            name: Some("Acme".into()),
            city: Some(Some("Trenton".into())),
            is_union: Some(true),
            founded_year: Some(Some(1998)),
            ..Default::default()
        };
        let changes = update.changes(&agency());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "city");
        assert_eq!(changes[0].old, Value::from("Newark"));
        assert_eq!(changes[0].new, Value::from("Trenton"));
        assert_eq!(changes[1].field, "is_union");
    }

    #[test]
    fn test_changes_from_null() {
        let update = AgencyUpdate {
            description: Some(Some("New description".into())),
            ..Default::default()
        };
        let changes = update.changes(&agency());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old, Value::Null);
    }

    #[test]
    fn test_null_clears_field() {
        let update: AgencyUpdate =
            serde_json::from_str(r#"{"website": null, "founded_year": null, "city": "Newark"}"#).unwrap();
        assert_eq!(update.website, Some(None));
        assert_eq!(update.phone, None);
        assert!(update.validate().is_ok());

        let changes = update.changes(&agency());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "website");
        assert_eq!(changes[0].old, Value::from("https://acme.com"));
        assert_eq!(changes[0].new, Value::Null);
        assert_eq!(changes[1].field, "founded_year");
        assert_eq!(changes[1].new, Value::Null);
    }

    #[test]
    fn test_update_validates_present_values() {
        let update: AgencyUpdate = serde_json::from_str(r#"{"website": "not a url"}"#).unwrap();
        assert!(update.validate().unwrap_err().field_errors().contains_key("website"));
    }

    #[test]
    fn test_name_change_compares_trimmed() {
        let update = AgencyUpdate {
            name: Some("  Acme ".into()),
            ..Default::default()
        };
        assert!(update.changes(&agency()).is_empty());

        let update = AgencyUpdate {
            name: Some(" Acme Labor ".into()),
            ..Default::default()
        };
        assert_eq!(update.changes(&agency())[0].new, Value::from("Acme Labor"));
    }

    #[test]
    fn test_is_owned_by() {
        let mut a = agency();
        assert!(!a.is_owned_by("u1"));
        a.owner_id = Some("u1".into());
        assert!(a.is_owned_by("u1"));
        assert!(!a.is_owned_by("u2"));
    }

    #[test]
    fn test_present_contact_masks_for_anonymous() {
        let a = agency().present_contact(false);
        assert_eq!(a.email.as_deref(), Some("in**@acme.com"));
        assert_eq!(a.phone.as_deref(), Some("***-***-4567"));

        let a = agency().present_contact(true);
        assert_eq!(a.email.as_deref(), Some("info@acme.com"));
    }

    #[test]
    fn test_create_validation() {
        let bad = AgencyCreate {
            name: "A".into(),
            website: Some("not a url".into()),
            founded_year: Some(1500),
            ..Default::default()
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("website"));
        assert!(fields.contains_key("founded_year"));
    }

    #[test]
    fn test_moderation_is_empty() {
        assert!(ModerationUpdate::default().is_empty());
        assert!(
            !ModerationUpdate {
                is_active: Some(false),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
