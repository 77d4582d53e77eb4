//! Compliance expiry sweep
//!
//! Each item is notified at most once per alert level; `compliance_alert_log`
//! holds the (item, level) pairs already sent.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use shared::compliance::{AlertLevel, EXPIRING_SOON_DAYS, alert_level};

use crate::db;
use crate::db::compliance::AlertCandidate;
use crate::email;
use crate::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Level to notify for a candidate, unless that level was already sent
pub fn pending_level(candidate: &AlertCandidate, today: NaiveDate) -> Option<AlertLevel> {
    let level = alert_level(Some(candidate.expiration_date), today)?;
    let already_sent = candidate
        .sent_levels
        .iter()
        .any(|sent| AlertLevel::from_db(sent) == Some(level));
    (!already_sent).then_some(level)
}

#[derive(Debug, Default, PartialEq)]
pub struct SweepSummary {
    pub candidates: usize,
    pub sent: usize,
    pub failed: usize,
}

/// One pass over every item inside the alert horizon
pub async fn sweep(state: &AppState, today: NaiveDate) -> Result<SweepSummary, BoxError> {
    let horizon = today
        .checked_add_days(Days::new(EXPIRING_SOON_DAYS as u64))
        .unwrap_or(today);
    let candidates = db::compliance::alert_candidates(&state.pool, horizon).await?;

    let mut summary = SweepSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    for candidate in &candidates {
        let Some(level) = pending_level(candidate, today) else {
            continue;
        };

        let message = email::compliance_alert(
            &state.app_base_url,
            &candidate.agency_name,
            candidate.agency_id,
            &candidate.title,
            candidate.expiration_date,
            level,
        );
        if let Err(e) = state.email.send(&candidate.owner_email, message).await {
            tracing::error!(
                item_id = candidate.item_id,
                level = level.as_db(),
                error = %e,
                "Failed to send compliance alert"
            );
            summary.failed += 1;
            continue;
        }

        let now = shared::util::now_millis();
        match db::compliance::record_alert(&state.pool, candidate.item_id, level, now).await {
            Ok(_) => summary.sent += 1,
            Err(e) => {
                tracing::error!(item_id = candidate.item_id, error = %e, "Failed to record compliance alert");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Background loop; the first pass runs one interval after startup
pub async fn run_sweep_loop(state: AppState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let today = Utc::now().date_naive();
        match sweep(&state, today).await {
            Ok(summary) if summary.sent > 0 || summary.failed > 0 => tracing::info!(
                candidates = summary.candidates,
                sent = summary.sent,
                failed = summary.failed,
                "Compliance sweep finished"
            ),
            Ok(_) => tracing::debug!("Compliance sweep: nothing to send"),
            Err(e) => tracing::error!(error = %e, "Compliance sweep failed"),
        }
    }
}
