//! PII masking for contact details shown to anonymous visitors

/// Mask the local part of an email, keeping its first two characters
/// (one when the local part is two characters or shorter).
///
/// `"john.doe@acme.com"` → `"jo******@acme.com"`
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return "*".repeat(email.chars().count());
    };

    let len = local.chars().count();
    let keep = if len <= 2 { 1.min(len) } else { 2 };
    let visible: String = local.chars().take(keep).collect();
    format!("{visible}{}@{domain}", "*".repeat(len - keep))
}

/// Mask every digit of a phone number except the last four, keeping separators.
///
/// `"(555) 123-4567"` → `"(***) ***-4567"`
pub fn mask_phone(phone: &str) -> String {
    let phone = phone.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let keep_from = if digits < 4 { usize::MAX } else { digits - 4 };

    let mut seen = 0usize;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                let idx = seen;
                seen += 1;
                if idx >= keep_from { c } else { '*' }
            } else {
                c
            }
        })
        .collect()
}

/// Contact details as presented to a viewer.
///
/// Unclaimed agencies carry scraped/imported contact data, so anonymous
/// viewers only get the masked form.
pub fn present_contact(value: Option<&str>, reveal: bool, mask: fn(&str) -> String) -> Option<String> {
    let value = crate::util::non_blank(value)?;
    Some(if reveal { value.to_string() } else { mask(value) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("john.doe@acme.com"), "jo******@acme.com");
        assert_eq!(mask_email("ab@x.io"), "a*@x.io");
        assert_eq!(mask_email("a@x.io"), "a@x.io");
        assert_eq!(mask_email("@x.io"), "@x.io");
        assert_eq!(mask_email("not-an-email"), "************");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("(555) 123-4567"), "(***) ***-4567");
        assert_eq!(mask_phone("+1 555 123 4567"), "+* *** *** 4567");
        assert_eq!(mask_phone("123"), "***");
        assert_eq!(mask_phone("1234"), "1234");
    }

    #[test]
    fn test_present_contact() {
        assert_eq!(
            present_contact(Some("jane@acme.com"), true, mask_email).as_deref(),
            Some("jane@acme.com")
        );
        assert_eq!(
            present_contact(Some("jane@acme.com"), false, mask_email).as_deref(),
            Some("ja**@acme.com")
        );
        assert_eq!(present_contact(Some("  "), false, mask_phone), None);
        assert_eq!(present_contact(None, true, mask_phone), None);
    }
}
