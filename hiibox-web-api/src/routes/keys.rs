use crate::accounts::find_user;
use crate::auth::AuthUser;
use crate::dto::{
    KeyBalanceData, ResponseData, RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND, RESPONSE_OK,
};
use crate::ledger::available_keys;
use crate::pool::Db;
use rocket::serde::json::Json;
use sea_orm_rocket::Connection;
use tracing::error;

#[get("/keys")]
pub async fn balance(conn: Connection<'_, Db>, user: AuthUser) -> Json<ResponseData<KeyBalanceData>> {
    let db = conn.into_inner();
    let key_count = match find_user(db, user.user_id).await {
        Ok(Some(account)) => account.key_count,
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
                "Error fetching keys.".to_owned(),
                None,
            ));
        }
    };

    match available_keys(db, user.user_id).await {
        Ok(balance) => Json(ResponseData::new(
            RESPONSE_OK,
            "".to_owned(),
            Some(KeyBalanceData::new(key_count, balance)),
        )),
        Err(db_error) => {
            error!("Error computing keys of user {}: {}", user.user_id, db_error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                "Error fetching keys.".to_owned(),
                None,
            ))
        }
    }
}
