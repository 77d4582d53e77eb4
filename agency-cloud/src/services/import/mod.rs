//! Bulk agency import from CSV/XLSX
//!
//! Rows are matched to existing agencies by slug: unclaimed agencies are
//! updated, claimed ones are skipped (their owner manages the profile), and
//! unknown slugs create new unclaimed agencies. Each written row commits in its
//! own transaction; a failing row is reported and the import continues.

pub mod normalize;
pub mod parse;

use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use shared::error::{AppError, ErrorCode};
use shared::models::{AgencyUpdate, ImportReport, ImportRowError, TradeSelection};
use sqlx::PgPool;
use validator::Validate;

use crate::db;
use crate::error::ServiceResult;
use normalize::{ColumnMap, ImportRow};
use parse::{FileFormat, Table};

/// Upload limit
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
/// Data rows per file
pub const MAX_IMPORT_ROWS: usize = 5000;

/// Row number as shown in a spreadsheet (header is row 1)
fn sheet_row(data_index: usize) -> usize {
    data_index + 2
}

/// Case-insensitive name/slug → id lookup for trades or regions
#[derive(Debug, Default)]
pub struct Lookup {
    ids: HashMap<String, i64>,
}

impl Lookup {
    pub fn new<'a>(entries: impl IntoIterator<Item = (i64, &'a str, &'a str)>) -> Self {
        let mut ids = HashMap::new();
        for (id, name, slug) in entries {
            ids.insert(name.trim().to_lowercase(), id);
            ids.insert(slug.to_lowercase(), id);
        }
        Self { ids }
    }

    pub fn find(&self, value: &str) -> Option<i64> {
        let key = value.trim().to_lowercase();
        self.ids
            .get(&key)
            .or_else(|| self.ids.get(&shared::util::slugify(&key)))
            .copied()
    }

    /// Matched ids (first-seen order, de-duplicated) and the unmatched names
    pub fn resolve(&self, values: &[String]) -> (Vec<i64>, Vec<String>) {
        let mut ids = Vec::new();
        let mut unknown = Vec::new();
        for value in values {
            match self.find(value) {
                Some(id) if !ids.contains(&id) => ids.push(id),
                Some(_) => {}
                None => unknown.push(value.clone()),
            }
        }
        (ids, unknown)
    }
}

/// Validate the file shape and decode it
pub fn read_table(file_name: &str, bytes: &[u8]) -> Result<(Table, ColumnMap), AppError> {
    if bytes.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if bytes.len() > MAX_IMPORT_BYTES {
        return Err(AppError::new(ErrorCode::FileTooLarge)
            .with_detail("max_bytes", MAX_IMPORT_BYTES)
            .with_detail("size", bytes.len()));
    }
    let format = FileFormat::from_file_name(file_name).ok_or_else(|| {
        AppError::with_message(ErrorCode::UnsupportedFileFormat, "Expected a .csv, .xlsx or .xls file")
    })?;

    let table = parse::parse(format, bytes)?;
    if table.rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::new(ErrorCode::ImportTooManyRows)
            .with_detail("max_rows", MAX_IMPORT_ROWS)
            .with_detail("rows", table.rows.len()));
    }

    let columns = ColumnMap::from_headers(&table.headers);
    if !columns.has("name") {
        return Err(AppError::new(ErrorCode::ImportMissingColumn).with_detail("column", "name"));
    }
    Ok((table, columns))
}

/// Normalize and validate every row; rows that fail land in `report.errors`.
/// Also flags slugs repeated within the file.
pub fn prepare_rows(
    table: &Table,
    columns: &ColumnMap,
    current_year: i32,
    report: &mut ImportReport,
) -> Vec<(usize, ImportRow)> {
    for header in &columns.unknown {
        report
            .warnings
            .push(ImportRowError::new(1, format!("Unknown column '{header}' ignored")));
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::with_capacity(table.rows.len());
    for (idx, record) in table.rows.iter().enumerate() {
        let row_no = sheet_row(idx);
        let row = match normalize::normalize_row(columns, record, current_year) {
            Ok(row) => row,
            Err(message) => {
                report.errors.push(ImportRowError::new(row_no, message));
                continue;
            }
        };
        if let Err(e) = row.agency.validate() {
            report
                .errors
                .push(ImportRowError::new(row_no, format!("Invalid values: {}", field_list(&e))));
            continue;
        }
        let slug = row.match_slug();
        if !seen.insert(slug.clone()) {
            report
                .errors
                .push(ImportRowError::new(row_no, format!("Duplicate slug '{slug}' in file")));
            continue;
        }
        rows.push((row_no, row));
    }
    rows
}

fn field_list(errors: &validator::ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
    fields.sort_unstable();
    fields.join(", ")
}

/// Update payload for an existing agency: only cells that carried a value
fn as_update(row: &ImportRow) -> AgencyUpdate {
    let a = &row.agency;
    AgencyUpdate {
        name: Some(a.name.clone()),
        description: a.description.clone().map(Some),
        website: a.website.clone().map(Some),
        email: a.email.clone().map(Some),
        phone: a.phone.clone().map(Some),
        address_line: a.address_line.clone().map(Some),
        city: a.city.clone().map(Some),
        state: a.state.clone().map(Some),
        postal_code: a.postal_code.clone().map(Some),
        founded_year: a.founded_year.map(Some),
        employee_count: a.employee_count.clone().map(Some),
        is_union: a.is_union,
        offers_per_diem: a.offers_per_diem,
    }
}

#[derive(Debug, PartialEq)]
enum RowAction {
    Created,
    Updated,
    Skipped(String),
}

fn claimed_skip(slug: &str) -> RowAction {
    RowAction::Skipped(format!("Agency '{slug}' is claimed; skipped"))
}

pub async fn run_import(
    pool: &PgPool,
    admin_id: &str,
    file_name: &str,
    bytes: &[u8],
    dry_run: bool,
) -> ServiceResult<ImportReport> {
    let (table, columns) = read_table(file_name, bytes)?;
    let mut report = ImportReport::new(dry_run, table.rows.len());
    let current_year = shared::util::today().year();
    let rows = prepare_rows(&table, &columns, current_year, &mut report);

    let trades = db::trades::list_all(pool).await?;
    let trade_lookup = Lookup::new(trades.iter().map(|t| (t.id, t.name.as_str(), t.slug.as_str())));
    let regions = db::regions::list_all(pool).await?;
    let region_lookup = Lookup::new(regions.iter().map(|r| (r.id, r.name.as_str(), r.slug.as_str())));

    for (row_no, row) in rows {
        let (trade_ids, unknown_trades) = trade_lookup.resolve(&row.trades);
        for name in unknown_trades {
            report
                .warnings
                .push(ImportRowError::new(row_no, format!("Unknown trade '{name}'")));
        }
        let (region_ids, unknown_regions) = region_lookup.resolve(&row.regions);
        for name in unknown_regions {
            report
                .warnings
                .push(ImportRowError::new(row_no, format!("Unknown region '{name}'")));
        }

        match apply_row(pool, &row, &trade_ids, &region_ids, dry_run).await {
            Ok(RowAction::Created) => report.created += 1,
            Ok(RowAction::Updated) => report.updated += 1,
            Ok(RowAction::Skipped(reason)) => {
                report.skipped += 1;
                report.warnings.push(ImportRowError::new(row_no, reason));
            }
            Err(e) => {
                tracing::warn!(row = row_no, error = %e, "Import row failed");
                let message = if db::is_unique_violation(&e) {
                    "Slug already taken".to_string()
                } else {
                    "Database error".to_string()
                };
                report.errors.push(ImportRowError::new(row_no, message));
            }
        }
    }

    report.errors.sort_by_key(|e| e.row);
    report.warnings.sort_by_key(|w| w.row);

    if !dry_run {
        let now = shared::util::now_millis();
        if let Err(e) = db::imports::insert(pool, admin_id, file_name, &report, now).await {
            tracing::error!(error = %e, "Failed to record import history");
        }
    }

    tracing::info!(
        file_name,
        dry_run,
        total = report.total_rows,
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Agency import finished"
    );
    Ok(report)
}

async fn apply_row(
    pool: &PgPool,
    row: &ImportRow,
    trade_ids: &[i64],
    region_ids: &[i64],
    dry_run: bool,
) -> Result<RowAction, sqlx::Error> {
    let slug = row.match_slug();
    let existing = db::agencies::find_by_slug(pool, &slug).await?;

    if let Some(agency) = &existing
        && agency.is_claimed
    {
        return Ok(claimed_skip(&slug));
    }
    if dry_run {
        return Ok(if existing.is_some() {
            RowAction::Updated
        } else {
            RowAction::Created
        });
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let (agency_id, action) = match existing {
        Some(agency) => {
            // Claimed since the lookup: leave it to its owner
            if db::agencies::update_unclaimed(&mut *tx, agency.id, &as_update(row), now)
                .await?
                .is_none()
            {
                return Ok(claimed_skip(&slug));
            }
            (agency.id, RowAction::Updated)
        }
        None => {
            let agency = db::agencies::create(&mut *tx, &row.agency, &slug, None, now).await?;
            (agency.id, RowAction::Created)
        }
    };

    if !trade_ids.is_empty() {
        // First listed trade is primary
        let selections: Vec<TradeSelection> = trade_ids
            .iter()
            .enumerate()
            .map(|(i, id)| TradeSelection {
                trade_id: *id,
                is_primary: i == 0,
                years_experience: None,
            })
            .collect();
        db::trades::upsert(&mut *tx, agency_id, &selections).await?;
        db::trades::delete_orphans(&mut *tx, agency_id, trade_ids).await?;
    }
    if !region_ids.is_empty() {
        db::regions::insert_missing(&mut *tx, agency_id, region_ids).await?;
        db::regions::delete_orphans(&mut *tx, agency_id, region_ids).await?;
    }

    tx.commit().await?;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Result<(Table, ColumnMap), AppError> {
        read_table("agencies.csv", csv.as_bytes())
    }

    #[test]
    fn test_read_table_rejects_missing_name_column() {
        let err = table("city,state\nAustin,TX\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportMissingColumn);
    }

    #[test]
    fn test_read_table_accepts_alias() {
        let (table, columns) = table("Company Name,City\nAcme,Austin\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(columns.has("name"));
    }

    #[test]
    fn test_read_table_limits() {
        assert_eq!(read_table("a.csv", b"").unwrap_err().code, ErrorCode::EmptyFile);
        assert_eq!(
            read_table("a.pdf", b"name\nAcme\n").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );

        let mut csv = String::from("name\n");
        for i in 0..=MAX_IMPORT_ROWS {
            csv.push_str(&format!("Agency {i}\n"));
        }
        assert_eq!(
            read_table("a.csv", csv.as_bytes()).unwrap_err().code,
            ErrorCode::ImportTooManyRows
        );

        let big = vec![b'a'; MAX_IMPORT_BYTES + 1];
        assert_eq!(read_table("a.csv", &big).unwrap_err().code, ErrorCode::FileTooLarge);
    }

    #[test]
    fn test_prepare_rows_reports_errors_with_sheet_rows() {
        let csv = "name,email,union,fax\n\
                   Acme,info@acme.com,yes,1\n\
                   ,x@y.com,no,2\n\
                   Beta,not-an-email,no,3\n\
                   acme,dup@acme.com,no,4\n";
        let (table, columns) = table(csv).unwrap();
        let mut report = ImportReport::new(true, table.rows.len());
        let rows = prepare_rows(&table, &columns, 2025, &mut report);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 2);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[0], ImportRowError::new(3, "name is required"));
        assert_eq!(report.errors[1].row, 4);
        assert!(report.errors[1].message.contains("email"));
        assert_eq!(report.errors[2].row, 5);
        assert!(report.errors[2].message.contains("Duplicate slug 'acme'"));
        assert_eq!(report.warnings, vec![ImportRowError::new(1, "Unknown column 'fax' ignored")]);
    }

    #[test]
    fn test_lookup_by_name_or_slug() {
        let lookup = Lookup::new([(1, "Welding", "welding"), (2, "HVAC Technicians", "hvac-technicians")]);
        assert_eq!(lookup.find(" welding "), Some(1));
        assert_eq!(lookup.find("hvac-technicians"), Some(2));
        assert_eq!(lookup.find("HVAC technicians"), Some(2));
        assert_eq!(lookup.find("Roofing"), None);

        let (ids, unknown) = lookup.resolve(&["Welding".into(), "welding".into(), "Roofing".into()]);
        assert_eq!(ids, vec![1]);
        assert_eq!(unknown, vec!["Roofing".to_string()]);
    }

    #[test]
    fn test_as_update_keeps_blank_cells_untouched() {
        let (table, columns) = table("name,city,state\nAcme,,TX\n").unwrap();
        let mut report = ImportReport::new(true, 1);
        let rows = prepare_rows(&table, &columns, 2025, &mut report);
        let update = as_update(&rows[0].1);
        assert_eq!(update.name.as_deref(), Some("Acme"));
        assert_eq!(update.city, None);
        assert_eq!(update.state, Some(Some("TX".to_string())));
    }

    #[test]
    fn test_claimed_skip_reason() {
        assert_eq!(
            claimed_skip("acme"),
            RowAction::Skipped("Agency 'acme' is claimed; skipped".to_string())
        );
    }
}
