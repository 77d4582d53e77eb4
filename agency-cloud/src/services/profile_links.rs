//! Trade and region link synchronization
//!
//! Sync runs as independent statements: upsert the submitted set, then delete
//! links that are no longer submitted, then record one audit row. Only the
//! upsert is critical; orphan cleanup and the audit row are logged and skipped
//! on failure, so a failed cleanup can leave stale links until the next sync.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{AgencyTrade, Region, TradeSelection};
use sqlx::PgPool;

use crate::db;
use crate::error::ServiceResult;

/// Collapse duplicates (last submission wins), check ids and the single-primary rule.
/// Output is sorted by trade id.
pub fn plan_trades(selections: &[TradeSelection], known: &HashSet<i64>) -> Result<Vec<TradeSelection>, AppError> {
    let mut by_id: BTreeMap<i64, TradeSelection> = BTreeMap::new();
    for selection in selections {
        by_id.insert(selection.trade_id, selection.clone());
    }

    let unknown: Vec<i64> = by_id.keys().filter(|id| !known.contains(id)).copied().collect();
    if !unknown.is_empty() {
        return Err(AppError::new(ErrorCode::TradeNotFound).with_detail("trade_ids", unknown));
    }

    let primaries = by_id.values().filter(|s| s.is_primary).count();
    if primaries > 1 {
        return Err(AppError::new(ErrorCode::TradeMultiplePrimary).with_detail("primary_count", primaries));
    }

    Ok(by_id.into_values().collect())
}

/// Sorted, de-duplicated region ids; all must exist
pub fn plan_regions(region_ids: &[i64], known: &HashSet<i64>) -> Result<Vec<i64>, AppError> {
    let mut ids = region_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let unknown: Vec<i64> = ids.iter().filter(|id| !known.contains(id)).copied().collect();
    if !unknown.is_empty() {
        return Err(AppError::new(ErrorCode::RegionNotFound).with_detail("region_ids", unknown));
    }
    Ok(ids)
}

pub async fn sync_trades(
    pool: &PgPool,
    agency_id: i64,
    editor_id: &str,
    selections: &[TradeSelection],
) -> ServiceResult<Vec<AgencyTrade>> {
    let submitted: Vec<i64> = selections.iter().map(|s| s.trade_id).collect();
    let known: HashSet<i64> = db::trades::existing_ids(pool, &submitted).await?.into_iter().collect();
    let planned = plan_trades(selections, &known)?;
    let keep: Vec<i64> = planned.iter().map(|s| s.trade_id).collect();

    let previous = db::trades::agency_trade_ids(pool, agency_id).await?;

    db::trades::upsert(pool, agency_id, &planned).await?;

    match db::trades::delete_orphans(pool, agency_id, &keep).await {
        Ok(removed) if removed > 0 => tracing::debug!(agency_id, removed, "Removed orphan trade links"),
        Ok(_) => {}
        Err(e) => tracing::warn!(agency_id, error = %e, "Orphan trade cleanup failed (non-critical)"),
    }

    record_link_change(pool, agency_id, editor_id, "trades", &previous, &keep).await;

    Ok(db::trades::list_for_agency(pool, agency_id).await?)
}

pub async fn sync_regions(
    pool: &PgPool,
    agency_id: i64,
    editor_id: &str,
    region_ids: &[i64],
) -> ServiceResult<Vec<Region>> {
    let known: HashSet<i64> = db::regions::existing_ids(pool, region_ids).await?.into_iter().collect();
    let keep = plan_regions(region_ids, &known)?;

    let previous = db::regions::agency_region_ids(pool, agency_id).await?;

    db::regions::insert_missing(pool, agency_id, &keep).await?;

    match db::regions::delete_orphans(pool, agency_id, &keep).await {
        Ok(removed) if removed > 0 => tracing::debug!(agency_id, removed, "Removed orphan region links"),
        Ok(_) => {}
        Err(e) => tracing::warn!(agency_id, error = %e, "Orphan region cleanup failed (non-critical)"),
    }

    record_link_change(pool, agency_id, editor_id, "regions", &previous, &keep).await;

    Ok(db::regions::list_for_agency(pool, agency_id).await?)
}

/// Audit row with old/new sorted id lists; skipped when unchanged
async fn record_link_change(
    pool: &PgPool,
    agency_id: i64,
    editor_id: &str,
    field: &str,
    previous: &[i64],
    current: &[i64],
) {
    if previous == current {
        return;
    }
    let now = shared::util::now_millis();
    if let Err(e) = db::profile_edits::insert(
        pool,
        agency_id,
        Some(editor_id),
        field,
        &Value::from(previous.to_vec()),
        &Value::from(current.to_vec()),
        now,
    )
    .await
    {
        tracing::warn!(agency_id, field, error = %e, "Failed to record profile edit (non-critical)");
    }
}
