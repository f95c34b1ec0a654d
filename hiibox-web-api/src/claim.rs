//! Opening a box: spend one key, take one reward, in a single transaction.
//!
//! Lock order is always user row first, then reward row, then NFT record, so
//! two claims can never wait on each other in opposite directions. Storage
//! calls before `BEGIN` are retried on dropped connections; nothing inside the
//! transaction is re-executed. Row-lock waits inside the transaction are capped
//! by `lock_timeout`, and hitting it is reported as a retriable conflict.

use hiibox_db_entity::db::reward_box::Model as RewardBoxModel;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use strum_macros::Display;
use tracing::{error, info, warn};

use crate::accounts::{
    consume_oldest_nft, count_unused_nfts, decrement_keys, find_user, list_socials, lock_user,
};
use crate::error::ClaimError;
use crate::ledger::KeyBalance;
use crate::retry::{is_lock_timeout, is_transient, with_retry, RetryPolicy};
use crate::reward_pool::{claim_at_position, claim_next, is_claimed_by, NextClaim, PositionClaim};
use crate::sql_stmt::{statement, SET_CLAIM_LOCK_TIMEOUT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Next,
    Position(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum KeySource {
    Nft,
    Social,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClaimReceipt {
    pub reward: RewardBoxModel,
    pub key_source: KeySource,
    pub consumed_nft_id: Option<i32>,
    pub keys_remaining: i32,
    pub balance: KeyBalance,
}

pub struct ClaimCoordinator<'a> {
    db: &'a DatabaseConnection,
    retry: RetryPolicy,
}

impl<'a> ClaimCoordinator<'a> {
    pub fn new(db: &'a DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    pub async fn open_reward(
        &self,
        user_id: i32,
        selection: Selection,
    ) -> Result<ClaimReceipt, ClaimError> {
        let db = self.db;
        let user = with_retry(&self.retry, "load user", || find_user(db, user_id))
            .await?
            .ok_or_else(|| ClaimError::NotFound("User".to_owned()))?;
        if user.key_count <= 0 {
            info!("User {} has no keys left", user_id);
            return Err(ClaimError::InsufficientKeys);
        }

        let txn = with_retry(&self.retry, "begin claim", || db.begin()).await?;
        let now = chrono::Utc::now().timestamp();
        let receipt = match claim_in(&txn, user_id, selection, now).await {
            Ok(receipt) => receipt,
            Err(claim_error) => {
                if let Err(rollback_error) = txn.rollback().await {
                    warn!("Rollback for user {} failed: {}", user_id, rollback_error);
                }
                return Err(lock_wait_as_conflict(claim_error, user_id));
            }
        };

        self.settle_commit(txn.commit().await, &receipt, user_id)
            .await?;
        info!(
            "User {} opened box #{} ({}) with a {} key, {} keys left",
            user_id,
            receipt.reward.position,
            receipt.reward.reward_type,
            receipt.key_source,
            receipt.keys_remaining
        );
        Ok(receipt)
    }

    /// A commit that errored may still have landed. Re-read the reward and
    /// only report success when it is recorded against this user.
    async fn settle_commit(
        &self,
        commit: Result<(), DbErr>,
        receipt: &ClaimReceipt,
        user_id: i32,
    ) -> Result<(), ClaimError> {
        let commit_error = match commit {
            Ok(()) => return Ok(()),
            Err(commit_error) if is_transient(&commit_error) => commit_error,
            Err(commit_error) => {
                error!("Commit for user {} failed: {}", user_id, commit_error);
                return Err(ClaimError::Storage(commit_error));
            }
        };

        let db = self.db;
        let reward_id = receipt.reward.id;
        match with_retry(&self.retry, "verify claim", || {
            is_claimed_by(db, reward_id, user_id)
        })
        .await
        {
            Ok(true) => {
                warn!(
                    "Commit for user {} reported {} but box #{} is recorded as theirs",
                    user_id, commit_error, receipt.reward.position
                );
                Ok(())
            }
            Ok(false) => {
                error!(
                    "Commit for user {} failed, box #{} not claimed: {}",
                    user_id, receipt.reward.position, commit_error
                );
                Err(ClaimError::Storage(commit_error))
            }
            Err(verify_error) => {
                error!(
                    "Could not verify box #{} for user {} after commit error {}: {}",
                    receipt.reward.position, user_id, commit_error, verify_error
                );
                Err(ClaimError::Storage(commit_error))
            }
        }
    }
}

async fn claim_in(
    txn: &DatabaseTransaction,
    user_id: i32,
    selection: Selection,
    now: i64,
) -> Result<ClaimReceipt, ClaimError> {
    txn.execute(statement(SET_CLAIM_LOCK_TIMEOUT, [])).await?;
    let user = lock_user(txn, user_id)
        .await?
        .ok_or_else(|| ClaimError::NotFound("User".to_owned()))?;
    // another request of this user may have spent the last key meanwhile
    if user.key_count <= 0 {
        info!("User {} spent the last key in a concurrent request", user_id);
        return Err(ClaimError::InsufficientKeys);
    }

    let reward = take_reward(txn, user_id, selection, now).await?;

    let unused_nfts = count_unused_nfts(txn, user_id).await?;
    let (key_source, consumed_nft_id) = if unused_nfts > 0 {
        match consume_oldest_nft(txn, user_id).await? {
            Some(nft_id) => (KeySource::Nft, Some(nft_id)),
            None => {
                warn!(
                    "Unused NFT of user {} was consumed concurrently, releasing box #{}",
                    user_id, reward.position
                );
                return Err(ClaimError::Conflict { position: None });
            }
        }
    } else {
        (KeySource::Social, None)
    };

    let keys_remaining = decrement_keys(txn, user_id, now)
        .await?
        .ok_or(ClaimError::InsufficientKeys)?;

    let socials = list_socials(txn, user_id).await?;
    let unused_after = unused_nfts - i64::from(consumed_nft_id.is_some());
    let balance = KeyBalance::new(socials.iter().map(|social| &social.platform), unused_after);

    Ok(ClaimReceipt {
        reward,
        key_source,
        consumed_nft_id,
        keys_remaining,
        balance,
    })
}

fn lock_wait_as_conflict(claim_error: ClaimError, user_id: i32) -> ClaimError {
    match claim_error {
        ClaimError::Storage(db_error) if is_lock_timeout(&db_error) => {
            warn!("User {} timed out waiting on a row lock: {}", user_id, db_error);
            ClaimError::Conflict { position: None }
        }
        other => other,
    }
}

async fn take_reward<C>(
    txn: &C,
    user_id: i32,
    selection: Selection,
    now: i64,
) -> Result<RewardBoxModel, ClaimError>
where
    C: ConnectionTrait,
{
    match selection {
        Selection::Next => match claim_next(txn, user_id, now).await? {
            NextClaim::Claimed(reward) => Ok(reward),
            NextClaim::Exhausted => {
                info!("Pool exhausted, user {} keeps their key", user_id);
                Err(ClaimError::PoolExhausted)
            }
        },
        Selection::Position(position) => {
            match claim_at_position(txn, user_id, position, now).await? {
                PositionClaim::Claimed(reward) => Ok(reward),
                PositionClaim::NotFound => Err(ClaimError::NotFound(format!("Box #{}", position))),
                PositionClaim::AlreadyClaimed(_) => {
                    info!("User {} asked for box #{}, already opened", user_id, position);
                    Err(ClaimError::Conflict {
                        position: Some(position),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward_pool::tests::reward;
    use hiibox_db_entity::db::user_social::Model as UserSocialModel;
    use hiibox_db_entity::db::users::Model as UserModel;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr, Value};
    use std::collections::BTreeMap;
    use std::time::Duration;

    type Row = BTreeMap<&'static str, Value>;

    fn user(key_count: i32) -> UserModel {
        UserModel {
            id: 7,
            wallet_address: "0x7e57000000000000000000000000000000000007".to_owned(),
            key_count,
            created_at: 1_690_000_000,
            updated_at: None,
            deleted: false,
        }
    }

    fn unused(count: i64) -> Vec<Row> {
        vec![BTreeMap::from([("unused_count", Value::BigInt(Some(count)))])]
    }

    fn key_count(count: i32) -> Vec<Row> {
        vec![BTreeMap::from([("key_count", Value::Int(Some(count)))])]
    }

    fn no_socials() -> Vec<UserSocialModel> {
        Vec::new()
    }

    /// Mock store with room for `claims` transactions reaching the lock timeout setup.
    fn store(claims: usize) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(
            (0..claims)
                .map(|_| MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                })
                .collect(),
        )
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn spends_one_key_per_box_until_none_left() {
        let db = store(2)
            // first open
            .append_query_results(vec![vec![user(2)]])
            .append_query_results(vec![vec![user(2)]])
            .append_query_results(vec![vec![reward(1, 1, Some(7))]])
            .append_query_results(vec![unused(0)])
            .append_query_results(vec![key_count(1)])
            .append_query_results(vec![no_socials()])
            // second open
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![reward(2, 2, Some(7))]])
            .append_query_results(vec![unused(0)])
            .append_query_results(vec![key_count(0)])
            .append_query_results(vec![no_socials()])
            // third open stops at the key check
            .append_query_results(vec![vec![user(0)]])
            .into_connection();
        let coordinator = ClaimCoordinator::new(&db, no_wait());

        let first = coordinator.open_reward(7, Selection::Next).await.unwrap();
        assert_eq!(first.reward.position, 1);
        assert_eq!(first.keys_remaining, 1);
        assert_eq!(first.key_source, KeySource::Social);

        let second = coordinator.open_reward(7, Selection::Next).await.unwrap();
        assert_eq!(second.reward.position, 2);
        assert_eq!(second.keys_remaining, 0);

        let third = coordinator.open_reward(7, Selection::Next).await;
        assert!(matches!(third, Err(ClaimError::InsufficientKeys)));
    }

    #[tokio::test]
    async fn exhausted_pool_keeps_the_key() {
        let db = store(1)
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![Vec::<RewardBoxModel>::new()])
            .append_query_results(vec![vec![BTreeMap::from([(
                "available",
                Value::Bool(Some(false)),
            )])]])
            .into_connection();

        let result = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Next)
            .await;
        assert!(matches!(result, Err(ClaimError::PoolExhausted)));
    }

    #[tokio::test]
    async fn taken_position_is_a_conflict() {
        let db = store(1)
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![Vec::<RewardBoxModel>::new()])
            .append_query_results(vec![vec![reward(3, 3, Some(8))]])
            .into_connection();

        let result = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Position(3))
            .await;
        assert!(matches!(
            result,
            Err(ClaimError::Conflict { position: Some(3) })
        ));
    }

    #[tokio::test]
    async fn unknown_position_is_not_found() {
        let db = store(1)
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![Vec::<RewardBoxModel>::new()])
            .append_query_results(vec![Vec::<RewardBoxModel>::new()])
            .into_connection();

        let result = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Position(60_000))
            .await;
        assert!(matches!(result, Err(ClaimError::NotFound(_))));
    }

    #[tokio::test]
    async fn key_spent_concurrently_is_rechecked_under_lock() {
        let db = store(1)
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(0)]])
            .into_connection();

        let result = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Next)
            .await;
        assert!(matches!(result, Err(ClaimError::InsufficientKeys)));
    }

    #[tokio::test]
    async fn prefers_nft_backed_key() {
        let db = store(1)
            .append_query_results(vec![vec![user(3)]])
            .append_query_results(vec![vec![user(3)]])
            .append_query_results(vec![vec![reward(4, 4, Some(7))]])
            .append_query_results(vec![unused(2)])
            .append_query_results(vec![vec![BTreeMap::from([("id", Value::Int(Some(11)))])]])
            .append_query_results(vec![key_count(2)])
            .append_query_results(vec![no_socials()])
            .into_connection();

        let receipt = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Next)
            .await
            .unwrap();
        assert_eq!(receipt.key_source, KeySource::Nft);
        assert_eq!(receipt.consumed_nft_id, Some(11));
        assert_eq!(receipt.balance.detail.unused_nfts, 1);
        assert_eq!(receipt.balance.nft_keys, 2);
    }

    #[tokio::test]
    async fn lost_nft_race_rolls_back_as_conflict() {
        let db = store(1)
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![user(1)]])
            .append_query_results(vec![vec![reward(5, 5, Some(7))]])
            .append_query_results(vec![unused(1)])
            .append_query_results(vec![Vec::<Row>::new()])
            .into_connection();

        let result = ClaimCoordinator::new(&db, no_wait())
            .open_reward(7, Selection::Next)
            .await;
        assert!(matches!(
            result,
            Err(ClaimError::Conflict { position: None })
        ));
    }

    #[tokio::test]
    async fn commit_error_is_settled_by_rereading_the_reward() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![reward(6, 6, Some(7))]])
            .append_query_results(vec![vec![reward(6, 6, Some(8))]])
            .into_connection();
        let coordinator = ClaimCoordinator::new(&db, no_wait());
        let receipt = ClaimReceipt {
            reward: reward(6, 6, Some(7)),
            key_source: KeySource::Social,
            consumed_nft_id: None,
            keys_remaining: 0,
            balance: KeyBalance::new(Vec::<String>::new(), 0),
        };
        let dropped = || -> Result<(), DbErr> {
            Err(DbErr::Conn(RuntimeErr::Internal(
                "server closed the connection unexpectedly".to_owned(),
            )))
        };

        assert!(coordinator
            .settle_commit(dropped(), &receipt, 7)
            .await
            .is_ok());
        assert!(matches!(
            coordinator.settle_commit(dropped(), &receipt, 7).await,
            Err(ClaimError::Storage(_))
        ));
        // non-transient commit errors are not second-guessed
        assert!(matches!(
            coordinator
                .settle_commit(Err(DbErr::Custom("serialization failure".to_owned())), &receipt, 7)
                .await,
            Err(ClaimError::Storage(_))
        ));
    }

    #[test]
    fn lock_wait_timeout_is_a_retriable_conflict() {
        let timed_out = ClaimError::Storage(DbErr::Query(RuntimeErr::Internal(
            "error returned from database: canceling statement due to lock timeout".to_owned(),
        )));
        let conflict = lock_wait_as_conflict(timed_out, 7);
        assert!(matches!(conflict, ClaimError::Conflict { position: None }));
        assert!(conflict.is_retriable());

        let other = lock_wait_as_conflict(ClaimError::Storage(DbErr::Custom("boom".to_owned())), 7);
        assert!(matches!(other, ClaimError::Storage(_)));
        assert!(matches!(
            lock_wait_as_conflict(ClaimError::PoolExhausted, 7),
            ClaimError::PoolExhausted
        ));
    }

    mod live {
        //! These need a scratch Postgres in `DATABASE_URL`; every test recreates
        //! the schema, so they take turns on `LIVE_DB`.

        use super::super::*;
        use hiibox_db_entity::db::{reward_box, user_nft, users};
        use hiibox_db_migration::{Migrator, MigratorTrait};
        use sea_orm::{
            ActiveModelTrait, ColumnTrait, Database, EntityTrait, NotSet, PaginatorTrait,
            QueryFilter, Set,
        };
        use std::collections::HashSet;
        use std::sync::{Arc, Mutex, MutexGuard};

        static LIVE_DB: Mutex<()> = Mutex::new(());

        fn take_turn() -> MutexGuard<'static, ()> {
            LIVE_DB.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        async fn fresh_pool(boxes: i32) -> Arc<DatabaseConnection> {
            let url = std::env::var("DATABASE_URL").unwrap();
            let db = Database::connect(url).await.unwrap();
            Migrator::fresh(&db).await.unwrap();

            for position in 1..=boxes {
                reward_box::ActiveModel {
                    id: NotSet,
                    position: Set(position),
                    reward_type: Set("standard_nft".to_owned()),
                    reward_tier: Set(None),
                    reward_data: Set(
                        serde_json::json!({ "nft_id": format!("standard_{:05}", position) }),
                    ),
                    reward_description: Set("Standard NFT from Hii Box collection".to_owned()),
                    claimed: Set(false),
                    claimed_by_user_id: Set(None),
                    claimed_at: Set(None),
                    created_at: Set(1_700_000_000),
                    deleted: Set(false),
                }
                .insert(&db)
                .await
                .unwrap();
            }
            Arc::new(db)
        }

        async fn add_user(db: &DatabaseConnection, n: i32, key_count: i32) -> i32 {
            users::ActiveModel {
                id: NotSet,
                wallet_address: Set(format!("0x{:040x}", n)),
                key_count: Set(key_count),
                created_at: Set(1_700_000_000),
                updated_at: Set(None),
                deleted: Set(false),
            }
            .insert(db)
            .await
            .unwrap()
            .id
        }

        async fn add_nft(db: &DatabaseConnection, user_id: i32, n: i64) -> i32 {
            user_nft::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                nft_collection: Set("hii_genesis".to_owned()),
                nft_id: Set(format!("{}-{}", user_id, n)),
                used: Set(false),
                created_at: Set(1_700_000_000 + n),
                deleted: Set(false),
            }
            .insert(db)
            .await
            .unwrap()
            .id
        }

        async fn key_count_of(db: &DatabaseConnection, user_id: i32) -> i32 {
            users::Entity::find_by_id(user_id)
                .one(db)
                .await
                .unwrap()
                .unwrap()
                .key_count
        }

        async fn closed_boxes(db: &DatabaseConnection) -> u64 {
            reward_box::Entity::find()
                .filter(reward_box::Column::Claimed.eq(false))
                .count(db)
                .await
                .unwrap()
        }

        async fn open_concurrently(
            db: &Arc<DatabaseConnection>,
            user_ids: Vec<i32>,
        ) -> Vec<Result<ClaimReceipt, ClaimError>> {
            let mut handles = Vec::new();
            for user_id in user_ids {
                let db = Arc::clone(db);
                handles.push(tokio::spawn(async move {
                    ClaimCoordinator::new(db.as_ref(), RetryPolicy::default())
                        .open_reward(user_id, Selection::Next)
                        .await
                }));
            }
            let mut results = Vec::new();
            for handle in handles {
                results.push(handle.await.unwrap());
            }
            results
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
        #[ignore = "requires a live Postgres in DATABASE_URL"]
        async fn concurrent_openers_never_share_a_box() {
            const USERS: i32 = 24;
            const BOXES: i32 = 10;

            let _turn = take_turn();
            let db = fresh_pool(BOXES).await;
            let mut user_ids = Vec::new();
            for n in 0..USERS {
                user_ids.push(add_user(&db, n, 2).await);
            }

            let mut positions = HashSet::new();
            let mut exhausted = 0;
            for result in open_concurrently(&db, user_ids).await {
                match result {
                    Ok(receipt) => assert!(
                        positions.insert(receipt.reward.position),
                        "box #{} opened twice",
                        receipt.reward.position
                    ),
                    Err(ClaimError::PoolExhausted) => exhausted += 1,
                    Err(other) => panic!("unexpected claim error: {}", other),
                }
            }
            assert_eq!(positions.len(), BOXES as usize);
            assert_eq!(exhausted, (USERS - BOXES) as usize);

            let spent: i32 = users::Entity::find()
                .all(db.as_ref())
                .await
                .unwrap()
                .iter()
                .map(|user| 2 - user.key_count)
                .sum();
            assert_eq!(spent, BOXES);
            assert_eq!(closed_boxes(&db).await, 0);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
        #[ignore = "requires a live Postgres in DATABASE_URL"]
        async fn same_user_cannot_overspend_keys() {
            let _turn = take_turn();
            let db = fresh_pool(10).await;
            let user_id = add_user(&db, 1, 2).await;

            let results = open_concurrently(&db, vec![user_id; 6]).await;
            let opened = results.iter().filter(|result| result.is_ok()).count();
            let refused = results
                .iter()
                .filter(|result| matches!(result, Err(ClaimError::InsufficientKeys)))
                .count();
            assert_eq!(opened, 2);
            assert_eq!(refused, 4);
            assert_eq!(key_count_of(&db, user_id).await, 0);
            assert_eq!(closed_boxes(&db).await, 8);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
        #[ignore = "requires a live Postgres in DATABASE_URL"]
        async fn nft_backed_claims_use_each_record_once() {
            let _turn = take_turn();
            let db = fresh_pool(20).await;
            let mut openers = Vec::new();
            for n in 0..4 {
                let user_id = add_user(&db, n, 3).await;
                add_nft(&db, user_id, 1).await;
                add_nft(&db, user_id, 2).await;
                openers.extend([user_id; 3]);
            }

            let receipts: Vec<ClaimReceipt> = open_concurrently(&db, openers)
                .await
                .into_iter()
                .map(|result| result.unwrap())
                .collect();
            let consumed: Vec<i32> = receipts
                .iter()
                .filter(|receipt| receipt.key_source == KeySource::Nft)
                .filter_map(|receipt| receipt.consumed_nft_id)
                .collect();
            let distinct: HashSet<i32> = consumed.iter().copied().collect();
            let social_backed = receipts
                .iter()
                .filter(|receipt| receipt.key_source == KeySource::Social)
                .count();

            assert_eq!(consumed.len(), 8);
            assert_eq!(distinct.len(), consumed.len());
            assert_eq!(social_backed, 4);
            let used = user_nft::Entity::find()
                .filter(user_nft::Column::Used.eq(true))
                .count(db.as_ref())
                .await
                .unwrap();
            assert_eq!(used, consumed.len() as u64);
        }

        #[tokio::test]
        #[ignore = "requires a live Postgres in DATABASE_URL"]
        async fn two_keys_open_two_of_five_boxes() {
            let _turn = take_turn();
            let db = fresh_pool(5).await;
            let user_id = add_user(&db, 1, 2).await;
            let coordinator = ClaimCoordinator::new(db.as_ref(), RetryPolicy::default());

            let first = coordinator.open_reward(user_id, Selection::Next).await.unwrap();
            let second = coordinator.open_reward(user_id, Selection::Next).await.unwrap();
            let third = coordinator.open_reward(user_id, Selection::Next).await;

            assert_eq!(first.reward.position, 1);
            assert_eq!(second.reward.position, 2);
            assert_eq!(second.keys_remaining, 0);
            assert!(matches!(third, Err(ClaimError::InsufficientKeys)));
            assert_eq!(key_count_of(&db, user_id).await, 0);
            assert_eq!(closed_boxes(&db).await, 3);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        #[ignore = "requires a live Postgres in DATABASE_URL"]
        async fn stalled_lock_holder_yields_a_conflict() {
            let _turn = take_turn();
            let db = fresh_pool(3).await;
            let user_id = add_user(&db, 1, 1).await;

            let holder = db.begin().await.unwrap();
            crate::accounts::lock_user(&holder, user_id)
                .await
                .unwrap()
                .unwrap();
            let stalled = ClaimCoordinator::new(db.as_ref(), RetryPolicy::default())
                .open_reward(user_id, Selection::Next)
                .await;
            assert!(matches!(
                stalled,
                Err(ClaimError::Conflict { position: None })
            ));
            holder.rollback().await.unwrap();

            assert_eq!(key_count_of(&db, user_id).await, 1);
            assert_eq!(closed_boxes(&db).await, 3);
            let receipt = ClaimCoordinator::new(db.as_ref(), RetryPolicy::default())
                .open_reward(user_id, Selection::Next)
                .await
                .unwrap();
            assert_eq!(receipt.reward.position, 1);
        }
    }
}
