//! Database access layer

pub mod agencies;
pub mod audit;
pub mod claims;
pub mod compliance;
pub mod email_verifications;
pub mod imports;
pub mod labor_requests;
pub mod messages;
pub mod oauth_states;
pub mod profile_edits;
pub mod regions;
pub mod stats;
pub mod trades;
pub mod users;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unique/exclusion constraint hit (duplicate slug, second pending claim, ...)
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// `%term%` for ILIKE, with LIKE metacharacters escaped; `None` when blank
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = shared::util::non_blank(term)?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

/// `(set, value)` binds for a nullable patch column: `CASE WHEN set THEN value ELSE col END`
pub fn patch_value<T>(patch: &Option<Option<T>>) -> (bool, Option<&T>) {
    (patch.is_some(), patch.as_ref().and_then(Option::as_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some(" acme ")).as_deref(), Some("%acme%"));
        assert_eq!(like_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn test_patch_value() {
        assert_eq!(patch_value::<String>(&None), (false, None));
        assert_eq!(patch_value::<String>(&Some(None)), (true, None));
        let set = Some(Some("https://acme.com".to_string()));
        assert_eq!(patch_value(&set), (true, Some(&"https://acme.com".to_string())));
    }
}
