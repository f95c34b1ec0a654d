use clap::Args;
use hiibox_db_entity::db::reward_box;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait, Set,
    Statement, TransactionTrait,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::rewards::{expected_distribution, shuffled_rewards, RewardSpec, RewardTableError, DEFAULT_SEED};

const BATCH_SIZE: usize = 1_000;

const DISTRIBUTION_QUERY: &str = r#"SELECT reward_type, reward_tier, COUNT(*) AS box_count
    FROM public.reward_box
    WHERE deleted = FALSE
    GROUP BY reward_type, reward_tier"#;

#[derive(Debug, Args)]
#[clap(version = "v0.1.0", about = "Seed the reward pool with 50,000 shuffled boxes")]
pub struct PopulateBoxes {
    /// Seed for the shuffle; the same seed always yields the same box order.
    #[clap(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Delete existing boxes before seeding.
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
#[clap(version = "v0.1.0", about = "Compare seeded boxes with the prize table")]
pub struct VerifyDistribution {}

#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("{0} boxes already exist, rerun with --force to replace them")]
    AlreadySeeded(u64),
    #[error(transparent)]
    Table(#[from] RewardTableError),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

pub async fn populate_boxes(db: &DatabaseConnection, args: &PopulateBoxes) -> Result<(), PopulateError> {
    let existing = reward_box::Entity::find().count(db).await?;
    if existing > 0 && !args.force {
        return Err(PopulateError::AlreadySeeded(existing));
    }

    let rewards = shuffled_rewards(args.seed)?;
    let created_at = chrono::Utc::now().timestamp();

    let txn = db.begin().await?;
    if existing > 0 {
        warn!("Deleting {} existing boxes", existing);
        reward_box::Entity::delete_many().exec(&txn).await?;
    }
    for (batch_index, batch) in rewards.chunks(BATCH_SIZE).enumerate() {
        let first_position = batch_index * BATCH_SIZE + 1;
        let models = batch.iter().enumerate().map(|(offset, reward)| {
            active_model(reward, (first_position + offset) as i32, created_at)
        });
        reward_box::Entity::insert_many(models).exec(&txn).await?;
        info!(
            "Inserted boxes {} to {}",
            first_position,
            first_position + batch.len() - 1
        );
    }
    txn.commit().await?;

    info!("Seeded {} boxes with seed {}", rewards.len(), args.seed);
    Ok(())
}

fn active_model(reward: &RewardSpec, position: i32, created_at: i64) -> reward_box::ActiveModel {
    reward_box::ActiveModel {
        id: NotSet,
        position: Set(position),
        reward_type: Set(reward.reward_type.to_owned()),
        reward_tier: Set(reward.reward_tier.to_owned()),
        reward_data: Set(reward.reward_data.to_owned()),
        reward_description: Set(reward.reward_description.to_owned()),
        claimed: Set(false),
        claimed_by_user_id: Set(None),
        claimed_at: Set(None),
        created_at: Set(created_at),
        deleted: Set(false),
    }
}

/// Logs every `(type, tier)` whose box count differs from the prize table and
/// returns how many differ.
pub async fn verify_distribution<C>(db: &C) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    let mut actual: BTreeMap<(String, Option<String>), i64> = BTreeMap::new();
    for row in db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            DISTRIBUTION_QUERY.to_owned(),
        ))
        .await?
    {
        actual.insert(
            (
                row.try_get::<String>("", "reward_type")?,
                row.try_get::<Option<String>>("", "reward_tier")?,
            ),
            row.try_get::<i64>("", "box_count")?,
        );
    }
    Ok(compare_distribution(&expected_distribution(), &actual))
}

fn compare_distribution(
    expected: &BTreeMap<(String, Option<String>), i64>,
    actual: &BTreeMap<(String, Option<String>), i64>,
) -> usize {
    let mut mismatches = 0;
    for (key, expected_count) in expected {
        let actual_count = actual.get(key).copied().unwrap_or(0);
        let (reward_type, reward_tier) = key;
        if actual_count == *expected_count {
            info!(
                "{} {}: {} (expected {})",
                reward_type,
                reward_tier.as_deref().unwrap_or("-"),
                actual_count,
                expected_count
            );
        } else {
            error!(
                "{} {}: {} (expected {})",
                reward_type,
                reward_tier.as_deref().unwrap_or("-"),
                actual_count,
                expected_count
            );
            mismatches += 1;
        }
    }
    for ((reward_type, reward_tier), count) in actual {
        if !expected.contains_key(&(reward_type.to_owned(), reward_tier.to_owned())) {
            error!(
                "Unexpected {} {}: {}",
                reward_type,
                reward_tier.as_deref().unwrap_or("-"),
                count
            );
            mismatches += 1;
        }
    }
    mismatches
}
