//! Ownership and admin guards for agency-scoped routes

use shared::error::ErrorCode;
use shared::models::Agency;
use sqlx::PgPool;

use crate::auth::UserIdentity;
use crate::db;
use crate::error::ServiceResult;

/// Owner (row equality on `owner_id`) or admin (role string)
pub fn can_manage(agency: &Agency, identity: &UserIdentity) -> bool {
    identity.is_admin() || agency.is_owned_by(&identity.user_id)
}

/// Load an agency the caller may manage
pub async fn managed_agency(pool: &PgPool, identity: &UserIdentity, agency_id: i64) -> ServiceResult<Agency> {
    let agency = db::agencies::find_by_id(pool, agency_id)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;
    if !can_manage(&agency, identity) {
        tracing::warn!(agency_id, user_id = %identity.user_id, "Agency access denied");
        return Err(ErrorCode::NotAgencyOwner.into());
    }
    Ok(agency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency(owner: Option<&str>) -> Agency {
        serde_json::from_value(serde_json::json!({
            "id": 1, "slug": "acme", "name": "Acme",
            "description": null, "website": null, "email": null, "phone": null,
            "address_line": null, "city": null, "state": null, "postal_code": null,
            "logo_url": null, "founded_year": null, "employee_count": null,
            "is_union": false, "offers_per_diem": false, "is_claimed": owner.is_some(),
            "owner_id": owner, "is_verified": false, "is_featured": false, "is_active": true,
            "created_at": 0, "updated_at": 0
        }))
        .unwrap()
    }

    fn identity(id: &str, role: &str) -> UserIdentity {
        UserIdentity {
            user_id: id.into(),
            email: format!("{id}@example.com"),
            role: role.into(),
        }
    }

    #[test]
    fn test_owner_can_manage() {
        assert!(can_manage(&agency(Some("u1")), &identity("u1", "agency_owner")));
        assert!(!can_manage(&agency(Some("u1")), &identity("u2", "agency_owner")));
        assert!(!can_manage(&agency(None), &identity("u2", "user")));
    }

    #[test]
    fn test_admin_can_manage_any() {
        assert!(can_manage(&agency(None), &identity("root", "admin")));
        assert!(can_manage(&agency(Some("u1")), &identity("root", "admin")));
    }
}
