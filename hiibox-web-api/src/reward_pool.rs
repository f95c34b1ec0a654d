//! The reward pool: the fixed set of boxes and the only code path that marks
//! one as claimed.
//!
//! Every claim is a single `UPDATE ... RETURNING` guarded by `claimed = FALSE`,
//! so a box can change hands at most once no matter how many processes share
//! the database. `claim_next` picks rows with `FOR UPDATE SKIP LOCKED` and
//! only falls back to waiting on a row lock when everything left is held by
//! in-flight claims. It answers either a box or exhaustion, never "busy".

use hiibox_db_entity::db::reward_box::{
    Column as RewardColumn, Entity as RewardBox, Model as RewardBoxModel,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use crate::sql_stmt::{
    statement, CLAIM_NEXT_REWARD, CLAIM_NEXT_REWARD_WAIT, CLAIM_REWARD_AT_POSITION,
    COUNT_UNCLAIMED_REWARDS, UNCLAIMED_REWARD_EXISTS,
};

#[derive(Clone, Debug, PartialEq)]
pub enum NextClaim {
    Claimed(RewardBoxModel),
    Exhausted,
}

/// Lowest closed positions plus how many boxes are still closed.
#[derive(Clone, Debug, PartialEq)]
pub struct AvailableRewards {
    pub positions: Vec<i32>,
    pub total_available: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PositionClaim {
    Claimed(RewardBoxModel),
    NotFound,
    AlreadyClaimed(RewardBoxModel),
}

pub async fn claim_next<C>(db: &C, user_id: i32, claimed_at: i64) -> Result<NextClaim, DbErr>
where
    C: ConnectionTrait,
{
    let mut round = 1;
    loop {
        if let Some(reward) = claim_with(db, CLAIM_NEXT_REWARD, user_id, claimed_at).await? {
            return Ok(NextClaim::Claimed(reward));
        }
        if !unclaimed_reward_exists(db).await? {
            return Ok(NextClaim::Exhausted);
        }
        debug!(
            "All unclaimed boxes locked, user {} waiting (round {})",
            user_id, round
        );
        // a waited-on row that got claimed meanwhile is passed over, so each
        // round either wins a box or sees the pool shrink
        if let Some(reward) = claim_with(db, CLAIM_NEXT_REWARD_WAIT, user_id, claimed_at).await? {
            return Ok(NextClaim::Claimed(reward));
        }
        round += 1;
    }
}

pub async fn claim_at_position<C>(
    db: &C,
    user_id: i32,
    position: i32,
    claimed_at: i64,
) -> Result<PositionClaim, DbErr>
where
    C: ConnectionTrait,
{
    let claimed = RewardBox::find()
        .from_raw_sql(statement(
            CLAIM_REWARD_AT_POSITION,
            [user_id.into(), claimed_at.into(), position.into()],
        ))
        .one(db)
        .await?;
    if let Some(reward) = claimed {
        return Ok(PositionClaim::Claimed(reward));
    }

    match find_by_position(db, position).await? {
        Some(reward) => Ok(PositionClaim::AlreadyClaimed(reward)),
        None => Ok(PositionClaim::NotFound),
    }
}

pub async fn find_by_position<C>(db: &C, position: i32) -> Result<Option<RewardBoxModel>, DbErr>
where
    C: ConnectionTrait,
{
    RewardBox::find()
        .filter(RewardColumn::Position.eq(position))
        .filter(RewardColumn::Deleted.eq(false))
        .one(db)
        .await
}

/// Unlocked preview; never reveals what the listed boxes hold.
pub async fn available_rewards<C>(db: &C, limit: u64) -> Result<AvailableRewards, DbErr>
where
    C: ConnectionTrait,
{
    let positions = RewardBox::find()
        .filter(RewardColumn::Claimed.eq(false))
        .filter(RewardColumn::Deleted.eq(false))
        .order_by_asc(RewardColumn::Position)
        .limit(limit)
        .all(db)
        .await?
        .iter()
        .map(|reward| reward.position)
        .collect();

    let total_available = match db
        .query_one(statement(COUNT_UNCLAIMED_REWARDS, []))
        .await?
    {
        Some(row) => row.try_get::<i64>("", "available_count")?,
        None => 0,
    };

    Ok(AvailableRewards {
        positions,
        total_available,
    })
}

pub async fn claimed_by_user<C>(db: &C, user_id: i32) -> Result<Vec<RewardBoxModel>, DbErr>
where
    C: ConnectionTrait,
{
    RewardBox::find()
        .filter(RewardColumn::ClaimedByUserId.eq(user_id))
        .filter(RewardColumn::Claimed.eq(true))
        .filter(RewardColumn::Deleted.eq(false))
        .order_by_asc(RewardColumn::ClaimedAt)
        .order_by_asc(RewardColumn::Position)
        .all(db)
        .await
}

pub async fn is_claimed_by<C>(db: &C, reward_id: i32, user_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let reward = RewardBox::find_by_id(reward_id).one(db).await?;
    Ok(matches!(
        reward,
        Some(RewardBoxModel {
            claimed: true,
            claimed_by_user_id: Some(owner),
            ..
        }) if owner == user_id
    ))
}

async fn claim_with<C>(
    db: &C,
    sql: &str,
    user_id: i32,
    claimed_at: i64,
) -> Result<Option<RewardBoxModel>, DbErr>
where
    C: ConnectionTrait,
{
    RewardBox::find()
        .from_raw_sql(statement(sql, [user_id.into(), claimed_at.into()]))
        .one(db)
        .await
}

async fn unclaimed_reward_exists<C>(db: &C) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let row = db
        .query_one(statement(UNCLAIMED_REWARD_EXISTS, []))
        .await?;
    match row {
        Some(row) => row.try_get::<bool>("", "available"),
        None => Ok(false),
    }
}
