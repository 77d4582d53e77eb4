//! Service regions

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub state_code: Option<String>,
}

/// `PUT /api/agencies/{id}/regions`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegionsSyncRequest {
    #[validate(length(max = 200))]
    pub region_ids: Vec<i64>,
}

impl RegionsSyncRequest {
    /// Sorted, de-duplicated ids
    pub fn normalized_ids(&self) -> Vec<i64> {
        let mut ids = self.region_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_ids() {
        let req = RegionsSyncRequest {
            region_ids: vec![5, 2, 5, 9, 2],
        };
        assert_eq!(req.normalized_ids(), vec![2, 5, 9]);
    }
}
