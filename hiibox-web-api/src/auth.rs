use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jwt::token::verified::VerifyWithKey;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use sha2::Sha256;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::pool::HiiBoxConfig;

/// Caller identity taken from a verified bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub wallet_address: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("Server key misconfigured")]
    Key,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
        {
            Some(token) => token.trim(),
            None => return Outcome::Failure((Status::Unauthorized, AuthError::Missing)),
        };
        let config = match req.rocket().state::<HiiBoxConfig>() {
            Some(config) => config,
            None => return Outcome::Failure((Status::InternalServerError, AuthError::Key)),
        };

        match verify_token(&config.jwt_key, token, Utc::now()) {
            Ok(user) => Outcome::Success(user),
            Err(AuthError::Key) => Outcome::Failure((Status::InternalServerError, AuthError::Key)),
            Err(error) => Outcome::Failure((Status::Unauthorized, error)),
        }
    }
}

pub fn verify_token(
    jwt_key: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(jwt_key.as_bytes()).map_err(|error| {
        warn!("Faulty JWT key: {}", error);
        AuthError::Key
    })?;
    let claims: BTreeMap<String, String> = token.verify_with_key(&key).map_err(|error| {
        info!("JWT verification error: {}", error);
        AuthError::Invalid
    })?;

    let user_id = claims
        .get("user_id")
        .and_then(|user_id| user_id.parse::<i32>().ok())
        .ok_or(AuthError::Invalid)?;
    let wallet_address = claims
        .get("wallet_address")
        .cloned()
        .ok_or(AuthError::Invalid)?;
    let expiry: DateTime<Utc> = claims
        .get("expiry")
        .and_then(|expiry| DateTime::parse_from_rfc3339(expiry).ok())
        .map(|expiry| expiry.with_timezone(&Utc))
        .ok_or(AuthError::Invalid)?;

    if now > expiry {
        info!("JWT token of user {} is expired", user_id);
        return Err(AuthError::Expired);
    }
    Ok(AuthUser {
        user_id,
        wallet_address,
    })
}

#[cfg(test)]
pub(crate) fn issue_token(
    jwt_key: &str,
    user_id: i32,
    wallet_address: &str,
    expiry: DateTime<Utc>,
) -> String {
    use jwt::SignWithKey;

    let key: Hmac<Sha256> = Hmac::new_from_slice(jwt_key.as_bytes()).unwrap();
    let mut claims: BTreeMap<&str, String> = BTreeMap::new();
    claims.insert("user_id", user_id.to_string());
    claims.insert("wallet_address", wallet_address.to_owned());
    claims.insert("expiry", expiry.to_rfc3339());
    claims.sign_with_key(&key).unwrap()
}
