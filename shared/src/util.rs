/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC calendar date
pub fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

/// URL slug: lowercase ASCII alphanumerics, every other run of characters
/// collapsed into a single `-`, no leading/trailing dash.
///
/// `"Acme Staffing, Inc."` → `"acme-staffing-inc"`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Trimmed, lowercased email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `Some(trimmed)` unless the value is blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Staffing, Inc."), "acme-staffing-inc");
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("Smith & Sons Labor"), "smith-sons-labor");
        assert_eq!(slugify("911 Staffing"), "911-staffing");
        assert_eq!(slugify("Électricité Pro"), "lectricit-pro");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
