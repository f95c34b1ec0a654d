//! Bounded retry for storage calls that happen before a claim transaction
//! starts. Only connection-level failures are retried; anything else is
//! returned to the caller on the first attempt.

use rand::Rng;
use sea_orm::{DbErr, RuntimeErr};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

const BACKOFF_FACTOR: f64 = 1.5;

const CONNECTION_ERROR_KEYWORDS: [&str; 8] = [
    "ssl connection has been closed",
    "connection closed",
    "server closed the connection",
    "connection timeout",
    "connection refused",
    "connection lost",
    "connection reset",
    "pool timed out",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before attempt `attempt + 1`, with up to 10% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = self.base_delay.as_secs_f64() * BACKOFF_FACTOR.powi(exponent);
        let jitter = if base > 0.0 {
            rand::thread_rng().gen_range(0.0..=base * 0.1)
        } else {
            0.0
        };
        Duration::from_secs_f64(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

pub fn is_transient(error: &DbErr) -> bool {
    match error {
        DbErr::Conn(RuntimeErr::Internal(message)) => has_connection_keyword(message),
        DbErr::Conn(_) => true,
        other => has_connection_keyword(&other.to_string()),
    }
}

/// Postgres gave up waiting on a row lock (SQLSTATE 55P03).
pub fn is_lock_timeout(error: &DbErr) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("lock timeout") || message.contains("55p03")
}

fn has_connection_keyword(message: &str) -> bool {
    let message = message.to_lowercase();
    CONNECTION_ERROR_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {:?}",
                    operation, attempt, policy.max_attempts, err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if is_transient(&err) {
                    error!("{} failed after {} attempts: {}", operation, attempt, err);
                }
                return Err(err);
            }
        }
    }
}
