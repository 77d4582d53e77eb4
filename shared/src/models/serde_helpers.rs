//! Serde helpers for partial-update payloads

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "...")]`: absent → `None`,
/// `null` → `Some(None)`, a value → `Some(Some(v))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resolve a nullable patch against the stored value
pub fn patched<T: Clone>(patch: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match patch {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        city: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_absent_null_and_value() {
        let p: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(p.city, None);

        let p: Patch = serde_json::from_str(r#"{"city": null}"#).unwrap();
        assert_eq!(p.city, Some(None));

        let p: Patch = serde_json::from_str(r#"{"city": "Austin"}"#).unwrap();
        assert_eq!(p.city, Some(Some("Austin".to_string())));
    }

    #[test]
    fn test_patched() {
        let current = Some(3);
        assert_eq!(patched(&None, &current), Some(3));
        assert_eq!(patched(&Some(None), &current), None);
        assert_eq!(patched(&Some(Some(5)), &current), Some(5));
    }
}
