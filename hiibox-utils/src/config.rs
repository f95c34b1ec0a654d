use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub rust_log: Option<String>,
    pub utils_log: Option<String>,
    pub sqlx_max_connections: Option<u32>,
    pub sqlx_connect_timeout: Option<u64>,
    pub sqlx_logging: Option<bool>,
}

/// `App.toml`, overridden by `HIIBOX_*` environment variables.
pub fn load() -> Result<Config, figment::Error> {
    Figment::new()
        .merge(Toml::file("App.toml"))
        .merge(Env::prefixed("HIIBOX_"))
        .extract()
}

pub async fn get_db_connection(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.to_owned());
    options
        .max_connections(config.sqlx_max_connections.unwrap_or(2))
        .connect_timeout(Duration::from_secs(config.sqlx_connect_timeout.unwrap_or(8)))
        .sqlx_logging(config.sqlx_logging.unwrap_or(false))
        .sqlx_logging_level(log::LevelFilter::Debug);
    Database::connect(options).await
}
