use hiibox_db_entity::db::user_nft::{
    Column as NftColumn, Entity as UserNft, Model as UserNftModel,
};
use hiibox_db_entity::db::user_social::{
    ActiveModel as UserSocialActiveModel, Column as SocialColumn, Entity as UserSocial,
    Model as UserSocialModel,
};
use hiibox_db_entity::db::users::{Column as UserColumn, Entity as Users, Model as UserModel};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;
use tracing::info;

use crate::dto::{RESPONSE_BAD_REQUEST, RESPONSE_CONFLICT, RESPONSE_INTERNAL_ERROR};
use crate::sql_stmt::{
    statement, CONSUME_OLDEST_NFT, COUNT_UNUSED_NFTS, DECREMENT_USER_KEYS, LOCK_USER,
    USER_ACTIVITY_COUNTS,
};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(String),
    #[error("Social handle '{handle}' is already registered on {platform}")]
    HandleTaken { platform: String, handle: String },
    #[error("You have already linked a {0} account")]
    PlatformLinked(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),
}

impl AccountError {
    pub fn response_code(&self) -> u16 {
        match self {
            AccountError::Invalid(_) => RESPONSE_BAD_REQUEST,
            AccountError::HandleTaken { .. } | AccountError::PlatformLinked(_) => RESPONSE_CONFLICT,
            AccountError::Storage(_) => RESPONSE_INTERNAL_ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    pub nft_count: i64,
    pub unused_nft_count: i64,
    pub social_count: i64,
    pub boxes_opened: i64,
}

pub async fn find_user<C>(db: &C, user_id: i32) -> Result<Option<UserModel>, DbErr>
where
    C: ConnectionTrait,
{
    Users::find_by_id(user_id)
        .filter(UserColumn::Deleted.eq(false))
        .one(db)
        .await
}

/// Row-locks the user until the surrounding transaction ends.
pub async fn lock_user<C>(txn: &C, user_id: i32) -> Result<Option<UserModel>, DbErr>
where
    C: ConnectionTrait,
{
    Users::find()
        .from_raw_sql(statement(LOCK_USER, [user_id.into()]))
        .one(txn)
        .await
}

/// Returns the new `key_count`, or `None` when the user had no key left.
pub async fn decrement_keys<C>(txn: &C, user_id: i32, now: i64) -> Result<Option<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let row = txn
        .query_one(statement(DECREMENT_USER_KEYS, [user_id.into(), now.into()]))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get::<i32>("", "key_count")?)),
        None => Ok(None),
    }
}

pub async fn count_unused_nfts<C>(db: &C, user_id: i32) -> Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    let row = db
        .query_one(statement(COUNT_UNUSED_NFTS, [user_id.into()]))
        .await?;
    match row {
        Some(row) => row.try_get::<i64>("", "unused_count"),
        None => Ok(0),
    }
}

/// Marks the oldest unused NFT record as used and returns its id.
pub async fn consume_oldest_nft<C>(txn: &C, user_id: i32) -> Result<Option<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let row = txn
        .query_one(statement(CONSUME_OLDEST_NFT, [user_id.into()]))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get::<i32>("", "id")?)),
        None => Ok(None),
    }
}

pub async fn activity_counts<C>(db: &C, user_id: i32) -> Result<ActivityCounts, DbErr>
where
    C: ConnectionTrait,
{
    let row = db
        .query_one(statement(USER_ACTIVITY_COUNTS, [user_id.into()]))
        .await?;
    match row {
        Some(row) => Ok(ActivityCounts {
            nft_count: row.try_get("", "nft_count")?,
            unused_nft_count: row.try_get("", "unused_nft_count")?,
            social_count: row.try_get("", "social_count")?,
            boxes_opened: row.try_get("", "boxes_opened")?,
        }),
        None => Ok(ActivityCounts::default()),
    }
}

pub async fn list_nfts<C>(db: &C, user_id: i32) -> Result<Vec<UserNftModel>, DbErr>
where
    C: ConnectionTrait,
{
    UserNft::find()
        .filter(NftColumn::UserId.eq(user_id))
        .filter(NftColumn::Deleted.eq(false))
        .order_by_asc(NftColumn::CreatedAt)
        .order_by_asc(NftColumn::Id)
        .all(db)
        .await
}

pub async fn list_socials<C>(db: &C, user_id: i32) -> Result<Vec<UserSocialModel>, DbErr>
where
    C: ConnectionTrait,
{
    UserSocial::find()
        .filter(SocialColumn::UserId.eq(user_id))
        .filter(SocialColumn::Deleted.eq(false))
        .order_by_asc(SocialColumn::Platform)
        .all(db)
        .await
}

pub fn normalize_social(platform: &str, handle: &str) -> Result<(String, String), AccountError> {
    let platform = platform.trim().to_lowercase();
    let handle = handle.trim().to_owned();
    if platform.is_empty() {
        return Err(AccountError::Invalid("Platform must not be empty".to_owned()));
    }
    if handle.is_empty() {
        return Err(AccountError::Invalid("Handle must not be empty".to_owned()));
    }
    Ok((platform, handle))
}

pub async fn handle_available<C>(db: &C, platform: &str, handle: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let existing = UserSocial::find()
        .filter(SocialColumn::Platform.eq(platform))
        .filter(SocialColumn::Handle.eq(handle))
        .filter(SocialColumn::Deleted.eq(false))
        .one(db)
        .await?;
    Ok(existing.is_none())
}

pub async fn link_social<C>(
    db: &C,
    user_id: i32,
    platform: &str,
    handle: &str,
    now: i64,
) -> Result<UserSocialModel, AccountError>
where
    C: ConnectionTrait,
{
    let (platform, handle) = normalize_social(platform, handle)?;

    if !handle_available(db, &platform, &handle).await? {
        return Err(AccountError::HandleTaken { platform, handle });
    }

    let already_linked = UserSocial::find()
        .filter(SocialColumn::UserId.eq(user_id))
        .filter(SocialColumn::Platform.eq(platform.as_str()))
        .filter(SocialColumn::Deleted.eq(false))
        .one(db)
        .await?;
    if already_linked.is_some() {
        return Err(AccountError::PlatformLinked(platform));
    }

    let social = UserSocialActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        platform: Set(platform.to_owned()),
        handle: Set(handle),
        created_at: Set(now),
        deleted: Set(false),
    };
    match social.insert(db).await {
        Ok(social) => {
            info!("User {} linked {} as {}", user_id, social.platform, social.handle);
            Ok(social)
        }
        // a concurrent link of the same platform lost the unique index race
        Err(error) if is_unique_violation(&error) => Err(AccountError::PlatformLinked(platform)),
        Err(error) => Err(AccountError::Storage(error)),
    }
}

fn is_unique_violation(error: &DbErr) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("duplicate key") || message.contains("unique constraint")
}
