//! Trade reference data and agency trade selections

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upper bound on trades per agency
pub const MAX_TRADES_PER_AGENCY: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Trade {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
}

/// Trade attached to an agency (join of `agency_trades` and `trades`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AgencyTrade {
    pub trade_id: i64,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub is_primary: bool,
    pub years_experience: Option<i32>,
}

/// One submitted trade in a sync request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TradeSelection {
    #[validate(range(min = 1))]
    pub trade_id: i64,
    #[serde(default)]
    pub is_primary: bool,
    #[validate(range(min = 0, max = 100))]
    pub years_experience: Option<i32>,
}

/// `PUT /api/agencies/{id}/trades`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TradesSyncRequest {
    #[validate(length(max = 100), nested)]
    pub trades: Vec<TradeSelection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_defaults() {
        let sel: TradeSelection = serde_json::from_str(r#"{"trade_id": 4}"#).unwrap();
        assert!(!sel.is_primary);
        assert_eq!(sel.years_experience, None);
    }

    #[test]
    fn test_sync_request_nested_validation() {
        let req = TradesSyncRequest {
            trades: vec![TradeSelection {
                trade_id: 1,
                is_primary: true,
                years_experience: Some(150),
            }],
        };
        assert!(req.validate().is_err());

        let req = TradesSyncRequest { trades: vec![] };
        assert!(req.validate().is_ok());
    }
}
