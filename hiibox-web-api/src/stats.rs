use rocket::serde::{Deserialize, Serialize};
use sea_orm::{ConnectionTrait, DbErr};
use std::collections::BTreeMap;

use crate::sql_stmt::{statement, CLAIMED_DISTRIBUTION, POOL_TOTALS};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PoolStats {
    pub total: i64,
    pub claimed: i64,
    pub available: i64,
    pub claimed_pct: f64,
    pub distribution_by_type: BTreeMap<String, i64>,
}

impl PoolStats {
    pub fn new(total: i64, claimed: i64, distribution_by_type: BTreeMap<String, i64>) -> Self {
        let claimed_pct = if total > 0 {
            (claimed as f64 * 10_000.0 / total as f64).round() / 100.0
        } else {
            0.0
        };
        PoolStats {
            total,
            claimed,
            available: total - claimed,
            claimed_pct,
            distribution_by_type,
        }
    }
}

/// Unlocked snapshot; counts may trail in-flight claims.
pub async fn pool_stats<C>(db: &C) -> Result<PoolStats, DbErr>
where
    C: ConnectionTrait,
{
    let (total, claimed) = match db.query_one(statement(POOL_TOTALS, [])).await? {
        Some(row) => (
            row.try_get::<i64>("", "total")?,
            row.try_get::<i64>("", "claimed")?,
        ),
        None => (0, 0),
    };

    let mut distribution = BTreeMap::new();
    for row in db.query_all(statement(CLAIMED_DISTRIBUTION, [])).await? {
        distribution.insert(
            row.try_get::<String>("", "reward_type")?,
            row.try_get::<i64>("", "claimed_count")?,
        );
    }

    Ok(PoolStats::new(total, claimed, distribution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[test]
    fn empty_pool_reports_zero_percent() {
        let stats = PoolStats::new(0, 0, BTreeMap::new());
        assert_eq!(stats.claimed_pct, 0.0);
        assert_eq!(stats.available, 0);
    }

    #[test]
    fn percentage_is_rounded_to_two_decimals() {
        assert_eq!(PoolStats::new(50_000, 1, BTreeMap::new()).claimed_pct, 0.0);
        assert_eq!(PoolStats::new(50_000, 3, BTreeMap::new()).claimed_pct, 0.01);
        assert_eq!(PoolStats::new(3, 1, BTreeMap::new()).claimed_pct, 33.33);
        assert_eq!(PoolStats::new(3, 2, BTreeMap::new()).claimed_pct, 66.67);
    }

    #[tokio::test]
    async fn aggregates_totals_and_distribution() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([
                ("total", Value::BigInt(Some(50_000))),
                ("claimed", Value::BigInt(Some(125))),
            ])]])
            .append_query_results(vec![vec![
                BTreeMap::from([
                    ("reward_type", Value::String(Some(Box::new("apecoin".to_owned())))),
                    ("claimed_count", Value::BigInt(Some(25))),
                ]),
                BTreeMap::from([
                    (
                        "reward_type",
                        Value::String(Some(Box::new("standard_nft".to_owned()))),
                    ),
                    ("claimed_count", Value::BigInt(Some(100))),
                ]),
            ]])
            .into_connection();

        let stats = pool_stats(&db).await.unwrap();
        assert_eq!(stats.available, 49_875);
        assert_eq!(stats.claimed_pct, 0.25);
        assert_eq!(stats.distribution_by_type["standard_nft"], 100);
        assert_eq!(stats.distribution_by_type.get("rare_nft"), None);
    }
}
