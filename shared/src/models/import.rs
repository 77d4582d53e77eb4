//! Bulk import report and history

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row-level problem; `row` is 1-based and counts the header as row 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

impl ImportRowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
    pub warnings: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn new(dry_run: bool, total_rows: usize) -> Self {
        Self {
            dry_run,
            total_rows,
            ..Default::default()
        }
    }
}

/// `agency_imports` history row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ImportRecord {
    pub id: i64,
    pub admin_id: Option<String>,
    pub file_name: String,
    pub dry_run: bool,
    pub total_rows: i32,
    pub created_count: i32,
    pub updated_count: i32,
    pub skipped_count: i32,
    pub error_count: i32,
    pub errors: Option<Value>,
    pub created_at: i64,
}

/// `?dry_run=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub dry_run: bool,
}
