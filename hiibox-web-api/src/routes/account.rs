use crate::accounts::{
    activity_counts, find_user, handle_available, link_social, list_nfts, list_socials,
    normalize_social,
};
use crate::auth::AuthUser;
use crate::dto::{
    CampaignStatus, HandleAvailability, LinkSocialRequest, NftRecord, ResponseData, SocialLink, UserProfile,
    RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND, RESPONSE_OK,
};
use crate::pool::Db;
use rocket::serde::json::Json;
use sea_orm_rocket::Connection;
use tracing::{error, info};

#[get("/users/me")]
pub async fn profile(conn: Connection<'_, Db>, user: AuthUser) -> Json<ResponseData<UserProfile>> {
    let db = conn.into_inner();
    match find_user(db, user.user_id).await {
        Ok(Some(account)) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(UserProfile::new(&account)),
        )),
        Ok(None) => Json(ResponseData::new(
            RESPONSE_NOT_FOUND,
            "User not found.".to_owned(),
            None,
        )),
        Err(db_error) => {
            error!("Error fetching user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching user.".to_owned(),
                None,
            ))
        }
    }
}

#[get("/users/me/status")]
pub async fn status(
    conn: Connection<'_, Db>,
    user: AuthUser,
) -> Json<ResponseData<CampaignStatus>> {
    let db = conn.into_inner();
    let account = match find_user(db, user.user_id).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return Json(ResponseData::new(
                RESPONSE_NOT_FOUND,
                "User not found.".to_owned(),
                None,
            ))
        }
        Err(db_error) => {
            error!("Error fetching user {}: {}", user.user_id, db_error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching campaign status.".to_owned(),
                None,
            ));
        }
    };

    match activity_counts(db, user.user_id).await {
        Ok(counts) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(CampaignStatus::new(&account, counts)),
        )),
        Err(db_error) => {
            error!("Error counting activity of user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching campaign status.".to_owned(),
                None,
            ))
        }
    }
}

#[get("/users/me/nfts")]
pub async fn nfts(conn: Connection<'_, Db>, user: AuthUser) -> Json<ResponseData<Vec<NftRecord>>> {
    let db = conn.into_inner();
    match list_nfts(db, user.user_id).await {
        Ok(nfts) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(nfts.iter().map(NftRecord::new).collect()),
        )),
        Err(db_error) => {
            error!("Error fetching NFTs of user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching NFTs.".to_owned(),
                None,
            ))
        }
    }
}

#[get("/users/me/socials")]
pub async fn socials(
    conn: Connection<'_, Db>,
    user: AuthUser,
) -> Json<ResponseData<Vec<SocialLink>>> {
    let db = conn.into_inner();
    match list_socials(db, user.user_id).await {
        Ok(socials) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(socials.iter().map(SocialLink::new).collect()),
        )),
        Err(db_error) => {
            error!("Error fetching socials of user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching socials.".to_owned(),
                None,
            ))
        }
    }
}

#[post("/users/me/socials", format = "json", data = "<request>")]
pub async fn link(
    conn: Connection<'_, Db>,
    user: AuthUser,
    request: Json<LinkSocialRequest>,
) -> Json<ResponseData<SocialLink>> {
    let db = conn.into_inner();
    let now = chrono::Utc::now().timestamp();
    match link_social(db, user.user_id, &request.platform, &request.handle, now).await {
        Ok(social) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(SocialLink::new(&social)),
        )),
        Err(account_error) => {
            if account_error.response_code() >= RESPONSE_INTERNAL_ERROR {
                error!("Linking social for user {} failed: {}", user.user_id, account_error);
                return Json(ResponseData::new(
                    RESPONSE_INTERNAL_ERROR,
                    "Error linking social account.".to_owned(),
                    None,
                ));
            }
            info!("User {} social link refused: {}", user.user_id, account_error);
            Json(ResponseData::new(
                account_error.response_code(),
                account_error.to_string(),
                None,
            ))
        }
    }
}

#[get("/socials/check/<platform>/<handle>")]
pub async fn check_handle(
    conn: Connection<'_, Db>,
    platform: String,
    handle: String,
) -> Json<ResponseData<HandleAvailability>> {
    let db = conn.into_inner();
    let (platform, handle) = match normalize_social(&platform, &handle) {
        Ok(normalized) => normalized,
        Err(account_error) => {
            return Json(ResponseData::new(
                account_error.response_code(),
                account_error.to_string(),
                None,
            ))
        }
    };
    match handle_available(db, &platform, &handle).await {
        Ok(available) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(HandleAvailability {
                platform,
                handle,
                available,
            }),
        )),
        Err(db_error) => {
            error!("Error checking handle {} on {}: {}", handle, platform, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error checking handle.".to_owned(),
                None,
            ))
        }
    }
}
