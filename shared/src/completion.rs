//! Agency profile completion percentage

use serde::Serialize;

/// Minimum description length (trimmed chars) that counts as filled in
pub const MIN_DESCRIPTION_LEN: usize = 50;

/// Profile fields that feed the completion score
#[derive(Debug, Clone, Default)]
pub struct CompletionInput<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub logo_url: Option<&'a str>,
    pub website: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub founded_year: Option<i32>,
    pub employee_count: Option<&'a str>,
    pub trade_count: usize,
    pub region_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub percent: u8,
    /// Field keys still missing, in weight order
    pub missing: Vec<&'static str>,
}

fn filled(value: Option<&str>) -> bool {
    crate::util::non_blank(value).is_some()
}

/// Weighted completion score; weights sum to 100.
pub fn profile_completion(input: &CompletionInput<'_>) -> CompletionReport {
    let description_ok = input
        .description
        .map(|d| d.trim().chars().count() >= MIN_DESCRIPTION_LEN)
        .unwrap_or(false);

    let checks: [(&'static str, u8, bool); 11] = [
        ("name", 10, filled(input.name)),
        ("description", 15, description_ok),
        ("logo", 10, filled(input.logo_url)),
        ("website", 10, filled(input.website)),
        ("email", 10, filled(input.email)),
        ("phone", 10, filled(input.phone)),
        ("location", 10, filled(input.city) && filled(input.state)),
        ("founded_year", 5, input.founded_year.is_some()),
        ("employee_count", 5, filled(input.employee_count)),
        ("trades", 10, input.trade_count > 0),
        ("regions", 5, input.region_count > 0),
    ];

    let mut percent = 0u8;
    let mut missing = Vec::new();
    for (key, weight, ok) in checks {
        if ok {
            percent += weight;
        } else {
            missing.push(key);
        }
    }

    CompletionReport { percent, missing }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> CompletionInput<'static> {
        CompletionInput {
            name: Some("Acme Staffing"),
            description: Some(
                "Union electricians and pipefitters across the tri-state area since 1998.",
            ),
            logo_url: Some("https://cdn.example.com/logos/1/abc.png"),
            website: Some("https://acme.com"),
            email: Some("info@acme.com"),
            phone: Some("555-123-4567"),
            city: Some("Newark"),
            state: Some("NJ"),
            founded_year: Some(1998),
            employee_count: Some("51-200"),
            trade_count: 3,
            region_count: 1,
        }
    }

    #[test]
    fn test_full_profile_is_100() {
        let report = profile_completion(&full());
        assert_eq!(report.percent, 100);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_empty_profile_is_0() {
        let report = profile_completion(&CompletionInput::default());
        assert_eq!(report.percent, 0);
        assert_eq!(report.missing.len(), 11);
        assert_eq!(report.missing[0], "name");
    }

    #[test]
    fn test_name_only() {
        let input = CompletionInput {
            name: Some("Acme"),
            ..Default::default()
        };
        assert_eq!(profile_completion(&input).percent, 10);
    }

    #[test]
    fn test_short_description_does_not_count() {
        let input = CompletionInput {
            description: Some("Too short"),
            ..full()
        };
        let report = profile_completion(&input);
        assert_eq!(report.percent, 85);
        assert_eq!(report.missing, vec!["description"]);
    }

    #[test]
    fn test_location_needs_city_and_state() {
        let input = CompletionInput {
            state: Some("   "),
            ..full()
        };
        let report = profile_completion(&input);
        assert_eq!(report.percent, 90);
        assert_eq!(report.missing, vec!["location"]);
    }

    #[test]
    fn test_missing_trades_and_regions() {
        let input = CompletionInput {
            trade_count: 0,
            region_count: 0,
            ..full()
        };
        let report = profile_completion(&input);
        assert_eq!(report.percent, 85);
        assert_eq!(report.missing, vec!["trades", "regions"]);
    }
}
