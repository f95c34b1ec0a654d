use async_trait::async_trait;
use rocket::serde::Deserialize;
use rocket::Config;
use sea_orm::{ConnectOptions, DbErr};
use sea_orm_rocket::{rocket::figment::Figment, Database};
use std::time::Duration;

use crate::retry::RetryPolicy;

#[derive(Database, Debug)]
#[database("sea_orm")]
pub struct Db(SeaOrmPool);

#[derive(Debug, Clone)]
pub struct SeaOrmPool {
    pub conn: sea_orm::DatabaseConnection,
}

#[async_trait]
impl sea_orm_rocket::Pool for SeaOrmPool {
    type Error = DbErr;

    type Connection = sea_orm::DatabaseConnection;

    async fn init(_figment: &Figment) -> Result<Self, Self::Error> {
        let config = Config::figment()
            .extract::<HiiBoxConfig>()
            .map_err(|error| DbErr::Custom(format!("Invalid configuration: {}", error)))?;
        let conn = sea_orm::Database::connect(config.connect_options()).await?;

        Ok(SeaOrmPool { conn })
    }

    fn borrow(&self) -> &Self::Connection {
        &self.conn
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct HiiBoxConfig {
    database_url: String,
    sqlx_max_connections: u32,
    sqlx_min_connections: Option<u32>,
    sqlx_connect_timeout: Option<u64>,
    sqlx_idle_timeout: Option<u64>,
    sqlx_max_lifetime: Option<u64>,
    sqlx_logging: Option<bool>,
    web_api_sqlx_logging_level: String,
    pub rust_log: String,
    pub web_api_log: String,
    pub cors_allowed_domains: String,
    pub jwt_key: String,
    pub enable_datadog: bool,
    pub datadog_host: String,
    pub datadog_port: String,
    pub enable_maintenance: bool,
    claim_retry_attempts: Option<u32>,
    claim_retry_base_delay_millis: Option<u64>,
}

impl HiiBoxConfig {
    fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.database_url.to_owned());
        options
            .max_connections(self.sqlx_max_connections)
            .min_connections(self.sqlx_min_connections.unwrap_or(2))
            .connect_timeout(Duration::from_secs(self.sqlx_connect_timeout.unwrap_or(8)))
            .idle_timeout(Duration::from_secs(self.sqlx_idle_timeout.unwrap_or(8)))
            .max_lifetime(Duration::from_secs(self.sqlx_max_lifetime.unwrap_or(8)))
            .sqlx_logging(self.sqlx_logging.unwrap_or(false))
            .sqlx_logging_level(
                self.web_api_sqlx_logging_level
                    .parse::<log::LevelFilter>()
                    .unwrap_or(log::LevelFilter::Info),
            );
        options
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.claim_retry_attempts.unwrap_or(3),
            Duration::from_millis(self.claim_retry_base_delay_millis.unwrap_or(1_000)),
        )
    }
}
