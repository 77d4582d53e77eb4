//! Header and cell normalization for bulk agency import

use std::collections::HashMap;

use shared::models::AgencyCreate;

/// Canonical column names understood by the importer
pub const COLUMNS: &[&str] = &[
    "name",
    "slug",
    "description",
    "website",
    "email",
    "phone",
    "address_line",
    "city",
    "state",
    "postal_code",
    "founded_year",
    "employee_count",
    "is_union",
    "offers_per_diem",
    "trades",
    "regions",
];

/// `" Zip-Code "` → `"zip_code"`
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            ' ' | '-' => out.push('_'),
            c => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Canonical column for a normalized header, if recognised
pub fn canonical_column(header: &str) -> Option<&'static str> {
    let canonical = match header {
        "company" | "agency" | "agency_name" | "company_name" => "name",
        "zip" | "zip_code" | "postcode" => "postal_code",
        "union" => "is_union",
        "per_diem" => "offers_per_diem",
        "url" | "web" | "homepage" => "website",
        "phone_number" | "telephone" => "phone",
        "employees" | "headcount" => "employee_count",
        "founded" | "year_founded" => "founded_year",
        "province" => "state",
        "address" | "street" => "address_line",
        "trade" | "specialties" => "trades",
        "region" | "service_areas" => "regions",
        other => other,
    };
    COLUMNS.iter().copied().find(|c| *c == canonical)
}

/// Header row resolved to column positions
#[derive(Debug, Default)]
pub struct ColumnMap {
    positions: HashMap<&'static str, usize>,
    /// Headers that matched no known column
    pub unknown: Vec<String>,
}

impl ColumnMap {
    /// First occurrence wins when two headers map to the same column
    pub fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (idx, raw) in headers.iter().enumerate() {
            let normalized = normalize_header(raw);
            if normalized.is_empty() {
                continue;
            }
            match canonical_column(&normalized) {
                Some(column) => {
                    map.positions.entry(column).or_insert(idx);
                }
                None => map.unknown.push(raw.trim().to_string()),
            }
        }
        map
    }

    pub fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Trimmed cell; `None` when the column is absent or the cell is blank
    pub fn cell<'a>(&self, record: &'a [String], column: &str) -> Option<&'a str> {
        let idx = *self.positions.get(column)?;
        record.get(idx).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

/// `true/yes/y/1/x` and `false/no/n/0/""`, case-insensitive
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "x" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Split on `;`, `,` or `|`; trimmed, blanks dropped, case-insensitive de-dup
/// keeping first spelling and order
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([';', ',', '|']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(part)) {
            out.push(part.to_string());
        }
    }
    out
}

/// Whole-number year within 1800..=current_year; spreadsheet floats like `1998.0` accepted
pub fn parse_founded_year(raw: &str, current_year: i32) -> Result<i32, String> {
    let raw = raw.trim();
    let year = raw
        .parse::<i32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i32)
        })
        .ok_or_else(|| format!("founded_year '{raw}' is not a year"))?;
    if !(1800..=current_year).contains(&year) {
        return Err(format!("founded_year {year} must be between 1800 and {current_year}"));
    }
    Ok(year)
}

/// Prefix bare domains with `https://`
pub fn normalize_website(raw: &str) -> String {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// One normalized data row
#[derive(Debug, Clone, Default)]
pub struct ImportRow {
    /// Explicit slug cell, slugified
    pub slug: Option<String>,
    pub agency: AgencyCreate,
    pub trades: Vec<String>,
    pub regions: Vec<String>,
}

impl ImportRow {
    /// Slug used to match existing agencies
    pub fn match_slug(&self) -> String {
        self.slug
            .clone()
            .unwrap_or_else(|| shared::util::slugify(&self.agency.name))
    }
}

/// Build a row from a record; `Err` carries the row error message
pub fn normalize_row(columns: &ColumnMap, record: &[String], current_year: i32) -> Result<ImportRow, String> {
    let text = |column: &str| columns.cell(record, column).map(str::to_string);
    let flag = |column: &str| -> Result<Option<bool>, String> {
        if !columns.has(column) {
            return Ok(None);
        }
        let raw = columns.cell(record, column).unwrap_or("");
        parse_bool(raw)
            .map(Some)
            .ok_or_else(|| format!("{column} '{raw}' is not a boolean"))
    };

    let name = text("name").ok_or_else(|| "name is required".to_string())?;

    let slug = match columns.cell(record, "slug") {
        Some(raw) => {
            let slug = shared::util::slugify(raw);
            if slug.is_empty() {
                return Err(format!("slug '{raw}' has no usable characters"));
            }
            Some(slug)
        }
        None => None,
    };
    if slug.is_none() && shared::util::slugify(&name).is_empty() {
        return Err(format!("name '{name}' cannot produce a slug"));
    }

    let founded_year = columns
        .cell(record, "founded_year")
        .map(|raw| parse_founded_year(raw, current_year))
        .transpose()?;

    let agency = AgencyCreate {
        name,
        description: text("description"),
        website: columns.cell(record, "website").map(normalize_website),
        email: columns.cell(record, "email").map(shared::util::normalize_email),
        phone: text("phone"),
        address_line: text("address_line"),
        city: text("city"),
        state: text("state"),
        postal_code: text("postal_code"),
        founded_year,
        employee_count: text("employee_count"),
        is_union: flag("is_union")?,
        offers_per_diem: flag("offers_per_diem")?,
    };

    Ok(ImportRow {
        slug,
        agency,
        trades: columns.cell(record, "trades").map(parse_list).unwrap_or_default(),
        regions: columns.cell(record, "regions").map(parse_list).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Zip-Code "), "zip_code");
        assert_eq!(normalize_header("Agency Name"), "agency_name");
        assert_eq!(normalize_header("PER DIEM"), "per_diem");
    }

    #[test]
    fn test_header_aliases() {
        assert_eq!(canonical_column("company"), Some("name"));
        assert_eq!(canonical_column("agency_name"), Some("name"));
        assert_eq!(canonical_column("zip"), Some("postal_code"));
        assert_eq!(canonical_column("union"), Some("is_union"));
        assert_eq!(canonical_column("per_diem"), Some("offers_per_diem"));
        assert_eq!(canonical_column("web"), Some("website"));
        assert_eq!(canonical_column("phone_number"), Some("phone"));
        assert_eq!(canonical_column("employees"), Some("employee_count"));
        assert_eq!(canonical_column("founded"), Some("founded_year"));
        assert_eq!(canonical_column("province"), Some("state"));
        assert_eq!(canonical_column("city"), Some("city"));
        assert_eq!(canonical_column("fax"), None);
    }

    #[test]
    fn test_column_map_first_alias_wins() {
        let map = ColumnMap::from_headers(&headers(&["Company", "Agency Name", "Fax", ""]));
        let record = headers(&["Acme", "Other", "555", ""]);
        assert_eq!(map.cell(&record, "name"), Some("Acme"));
        assert_eq!(map.unknown, vec!["Fax".to_string()]);
    }

    #[test]
    fn test_parse_bool() {
        for v in ["true", "YES", "y", "1", "x", " X "] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "No", "n", "0", ""] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" Welding; Electrical |welding, ,Pipefitting "),
            vec!["Welding", "Electrical", "Pipefitting"]
        );
        assert!(parse_list(" ; , ").is_empty());
    }

    #[test]
    fn test_parse_founded_year() {
        assert_eq!(parse_founded_year("1998", 2025), Ok(1998));
        assert_eq!(parse_founded_year("1998.0", 2025), Ok(1998));
        assert!(parse_founded_year("1799", 2025).is_err());
        assert!(parse_founded_year("2026", 2025).is_err());
        assert!(parse_founded_year("old", 2025).is_err());
    }

    #[test]
    fn test_normalize_website() {
        assert_eq!(normalize_website("acme.com"), "https://acme.com");
        assert_eq!(normalize_website("HTTP://acme.com"), "HTTP://acme.com");
    }

    #[test]
    fn test_normalize_row() {
        let map = ColumnMap::from_headers(&headers(&[
            "Company", "Web", "Union", "Per Diem", "Founded", "Trades", "Email", "Notes",
        ]));
        let record = headers(&[
            " Acme Staffing ",
            "acme.com",
            "yes",
            "",
            "2001",
            "Welding;Electrical",
            " Info@Acme.com ",
            "",
        ]);
        let row = normalize_row(&map, &record, 2025).unwrap();
        assert_eq!(row.agency.name, "Acme Staffing");
        assert_eq!(row.agency.website.as_deref(), Some("https://acme.com"));
        assert_eq!(row.agency.is_union, Some(true));
        assert_eq!(row.agency.offers_per_diem, Some(false));
        assert_eq!(row.agency.founded_year, Some(2001));
        assert_eq!(row.agency.email.as_deref(), Some("info@acme.com"));
        assert_eq!(row.agency.city, None);
        assert_eq!(row.trades, vec!["Welding", "Electrical"]);
        assert_eq!(row.match_slug(), "acme-staffing");
    }

    #[test]
    fn test_normalize_row_errors() {
        let map = ColumnMap::from_headers(&headers(&["name", "union", "slug"]));
        assert_eq!(
            normalize_row(&map, &headers(&["", "yes", ""]), 2025).unwrap_err(),
            "name is required"
        );
        assert!(
            normalize_row(&map, &headers(&["Acme", "sometimes", ""]), 2025)
                .unwrap_err()
                .contains("is_union")
        );
        let row = normalize_row(&map, &headers(&["Acme", "no", "Acme West"]), 2025).unwrap();
        assert_eq!(row.match_slug(), "acme-west");
    }

    #[test]
    fn test_absent_flag_column_stays_none() {
        let map = ColumnMap::from_headers(&headers(&["name"]));
        let row = normalize_row(&map, &headers(&["Acme"]), 2025).unwrap();
        assert_eq!(row.agency.is_union, None);
    }
}
