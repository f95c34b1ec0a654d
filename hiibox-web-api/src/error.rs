use sea_orm::DbErr;
use thiserror::Error;

use crate::dto::{
    RESPONSE_CONFLICT, RESPONSE_GONE, RESPONSE_INSUFFICIENT_KEYS, RESPONSE_INTERNAL_ERROR,
    RESPONSE_NOT_FOUND, RESPONSE_UNAVAILABLE,
};
use crate::retry::is_transient;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("No keys available. Link your socials or verify an NFT to earn keys.")]
    InsufficientKeys,
    #[error("All boxes have been opened.")]
    PoolExhausted,
    #[error("{}", conflict_message(.position))]
    Conflict { position: Option<i32> },
    #[error("{0} not found.")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),
}

fn conflict_message(position: &Option<i32>) -> String {
    match position {
        Some(position) => format!("Box #{} has already been opened.", position),
        None => "Another request got there first. Please try again.".to_owned(),
    }
}

impl ClaimError {
    pub fn response_code(&self) -> u16 {
        match self {
            ClaimError::InsufficientKeys => RESPONSE_INSUFFICIENT_KEYS,
            ClaimError::PoolExhausted => RESPONSE_GONE,
            ClaimError::Conflict { .. } => RESPONSE_CONFLICT,
            ClaimError::NotFound(_) => RESPONSE_NOT_FOUND,
            ClaimError::Storage(error) if is_transient(error) => RESPONSE_UNAVAILABLE,
            ClaimError::Storage(_) => RESPONSE_INTERNAL_ERROR,
        }
    }

    /// Message safe to hand to a client; storage details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ClaimError::Storage(error) if is_transient(error) => {
                "Database temporarily unavailable. Please try again.".to_owned()
            }
            ClaimError::Storage(_) => "System error. Please contact administrator!".to_owned(),
            other => other.to_string(),
        }
    }

    /// Whether a client may send the same request again.
    pub fn is_retriable(&self) -> bool {
        match self {
            ClaimError::Conflict { position: None } => true,
            ClaimError::Storage(error) => is_transient(error),
            _ => false,
        }
    }
}
