//! Spreadsheet decoding: CSV via `csv`, Excel via `calamine` (first sheet)

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use shared::error::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// From the uploaded file name's extension
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Header row plus data rows, all cells as text
#[derive(Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn from_rows(mut rows: impl Iterator<Item = Vec<String>>) -> Result<Self, AppError> {
        let headers = rows
            .next()
            .ok_or_else(|| AppError::with_message(ErrorCode::EmptyFile, "File has no header row"))?;
        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        Ok(Self { headers, rows })
    }
}

pub fn parse(format: FileFormat, bytes: &[u8]) -> Result<Table, AppError> {
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Excel => parse_excel(bytes),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Table, AppError> {
    // Strip a UTF-8 BOM left by spreadsheet exports
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::with_message(ErrorCode::ImportParseFailed, format!("CSV row {}: {e}", idx + 1))
        })?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Table::from_rows(rows.into_iter())
}

fn parse_excel(bytes: &[u8]) -> Result<Table, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::with_message(ErrorCode::ImportParseFailed, format!("Unreadable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::with_message(ErrorCode::EmptyFile, "Workbook has no sheets"))?
        .map_err(|e| AppError::with_message(ErrorCode::ImportParseFailed, format!("Unreadable sheet: {e}")))?;

    Table::from_rows(range.rows().map(|row| row.iter().map(cell_text).collect()))
}

/// Whole floats print without a fraction so `1998.0` reads as `1998`
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(FileFormat::from_file_name("agencies.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_file_name("a.b.xlsx"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_file_name("legacy.xls"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_file_name("agencies.json"), None);
        assert_eq!(FileFormat::from_file_name("agencies"), None);
    }

    #[test]
    fn test_parse_csv_quoted_and_ragged() {
        let data = "\u{feff}name,trades,city\n\"Acme, Inc.\",\"Welding;Electrical\",Austin\nBeta\n,,\n";
        let table = parse(FileFormat::Csv, data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["name", "trades", "city"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Acme, Inc.", "Welding;Electrical", "Austin"]);
        assert_eq!(table.rows[1], vec!["Beta"]);
    }

    #[test]
    fn test_parse_csv_empty() {
        let err = parse(FileFormat::Csv, b"").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyFile);
    }

    #[test]
    fn test_parse_garbage_workbook() {
        let err = parse(FileFormat::Excel, b"not a workbook").unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportParseFailed);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(1998.0)), "1998");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
