use crate::auth::AuthUser;
use crate::claim::{ClaimCoordinator, Selection};
use crate::dto::{
    AvailableRewardsData, ClaimReceiptData, MyRewardsData, ResponseData, RewardDetails,
    RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND, RESPONSE_OK,
};
use crate::pool::{Db, HiiBoxConfig};
use crate::reward_pool::{available_rewards, claimed_by_user, find_by_position};
use crate::stats::{pool_stats, PoolStats};
use rocket::{serde::json::Json, State};
use sea_orm_rocket::Connection;
use tracing::{error, warn};

#[post("/rewards/open")]
pub async fn open_next(
    conn: Connection<'_, Db>,
    hiibox_config: &State<HiiBoxConfig>,
    user: AuthUser,
) -> Json<ResponseData<ClaimReceiptData>> {
    open(conn, hiibox_config, user, Selection::Next).await
}

#[post("/rewards/open/<position>")]
pub async fn open_position(
    conn: Connection<'_, Db>,
    hiibox_config: &State<HiiBoxConfig>,
    user: AuthUser,
    position: i32,
) -> Json<ResponseData<ClaimReceiptData>> {
    open(conn, hiibox_config, user, Selection::Position(position)).await
}

async fn open(
    conn: Connection<'_, Db>,
    hiibox_config: &State<HiiBoxConfig>,
    user: AuthUser,
    selection: Selection,
) -> Json<ResponseData<ClaimReceiptData>> {
    let db = conn.into_inner();
    let coordinator = ClaimCoordinator::new(db, hiibox_config.retry_policy());
    match coordinator.open_reward(user.user_id, selection).await {
        Ok(receipt) => Json(ResponseData::new(
            RESPONSE_OK,
            format!("Box #{} opened.", receipt.reward.position),
            Some(ClaimReceiptData::new(receipt)),
        )),
        Err(claim_error) => {
            if claim_error.response_code() >= RESPONSE_INTERNAL_ERROR {
                error!(
                    "Opening {:?} for user {} failed: {}",
                    selection, user.user_id, claim_error
                );
            } else if claim_error.is_retriable() {
                warn!(
                    "Opening {:?} for user {} lost a race: {}",
                    selection, user.user_id, claim_error
                );
            }
            Json(ResponseData::new(
                claim_error.response_code(),
                claim_error.user_message(),
                None,
            ))
        }
    }
}

#[get("/rewards/mine")]
pub async fn mine(conn: Connection<'_, Db>, user: AuthUser) -> Json<ResponseData<MyRewardsData>> {
    let db = conn.into_inner();
    match claimed_by_user(db, user.user_id).await {
        Ok(rewards) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(MyRewardsData::new(&rewards)),
        )),
        Err(db_error) => {
            error!("Error fetching rewards of user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching rewards.".to_owned(),
                None,
            ))
        }
    }
}

/// Anyone signed in may look a box up; only its owner sees what is inside.
#[get("/rewards/position/<position>")]
pub async fn by_position(
    conn: Connection<'_, Db>,
    user: AuthUser,
    position: i32,
) -> Json<ResponseData<RewardDetails>> {
    let db = conn.into_inner();
    match find_by_position(db, position).await {
        Ok(Some(reward)) => {
            let reveal = reward.claimed && reward.claimed_by_user_id == Some(user.user_id);
            Json(ResponseData::new(
                RESPONSE_OK,
                "".to_owned(),
                Some(RewardDetails::new(&reward, reveal)),
            ))
        }
        Ok(None) => {
            warn!("Box #{} not found", position);
            Json(ResponseData::new(
                RESPONSE_NOT_FOUND,
                format!("Box #{} not found.", position),
                None,
            ))
        }
        Err(db_error) => {
            error!("Error fetching box #{}: {}", position, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching box.".to_owned(),
                None,
            ))
        }
    }
}

const DEFAULT_PREVIEW: u64 = 10;
const MAX_PREVIEW: u64 = 100;

#[get("/rewards/available?<limit>")]
pub async fn available(
    conn: Connection<'_, Db>,
    _user: AuthUser,
    limit: Option<u64>,
) -> Json<ResponseData<AvailableRewardsData>> {
    let db = conn.into_inner();
    let limit = limit.unwrap_or(DEFAULT_PREVIEW).clamp(1, MAX_PREVIEW);
    match available_rewards(db, limit).await {
        Ok(available) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(AvailableRewardsData::new(available)),
        )),
        Err(db_error) => {
            error!("Error fetching available boxes: {}", db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching available boxes.".to_owned(),
                None,
            ))
        }
    }
}

#[get("/rewards/stats")]
pub async fn stats(conn: Connection<'_, Db>) -> Json<ResponseData<PoolStats>> {
    let db = conn.into_inner();
    match pool_stats(db).await {
        Ok(stats) => Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(stats))),
        Err(db_error) => {
            error!("Error computing pool stats: {}", db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error computing pool stats.".to_owned(),
                None,
            ))
        }
    }
}
