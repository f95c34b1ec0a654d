mod accounts;
mod auth;
mod claim;
mod cors;
mod datadog;
mod dto;
mod error;
mod ledger;
mod maintenance;
mod pool;
mod retry;
mod reward_pool;
mod routes;
mod sql_stmt;
mod stats;

use dto::{
    ResponseData, RESPONSE_BAD_REQUEST, RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND,
    RESPONSE_UNAUTHORIZED, RESPONSE_UNAVAILABLE,
};
use pool::Db;
use rocket::{serde::json::Json, Config, Request};
use sea_orm_rocket::Database;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[macro_use]
extern crate rocket;

#[get("/")]
async fn health_ping() -> &'static str {
    ""
}

#[get("/maintenance_mode")]
async fn maintenance_mode() -> Json<ResponseData<&'static str>> {
    Json(ResponseData::new(
        RESPONSE_UNAVAILABLE,
        "Hii Box is under maintenance. Please try again later.".to_owned(),
        None,
    ))
}

#[catch(404)]
async fn not_found(req: &Request<'_>) -> Json<ResponseData<String>> {
    let message = format!("Couldn't find '{}'", req.uri());
    Json(ResponseData::new(RESPONSE_NOT_FOUND, message, None))
}

#[catch(401)]
async fn unauthorized() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_UNAUTHORIZED,
        "Missing, invalid or expired token.".to_owned(),
        None,
    ))
}

#[catch(400)]
async fn bad_request() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_BAD_REQUEST,
        "Please check request parameters.".to_owned(),
        None,
    ))
}

#[catch(422)]
async fn unprocessable() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_BAD_REQUEST,
        "Please check the request body. 'platform' and 'handle' are required.".to_owned(),
        None,
    ))
}

#[catch(500)]
async fn internal_error() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_INTERNAL_ERROR,
        "Whoops! Looks like we messed up.".to_owned(),
        None,
    ))
}

#[launch]
async fn rocket() -> _ {
    let hiibox_config = Config::figment()
        .extract::<pool::HiiBoxConfig>()
        .expect("Invalid Hii Box configuration");
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &hiibox_config.rust_log);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("hiibox_web_api={}", &hiibox_config.web_api_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let cors = cors::OriginHeader::new(&hiibox_config.cors_allowed_domains);

    let datadog_client = datadog_apm::Client::new(datadog_apm::Config {
        env: Some("prod-hiibox".to_owned()),
        service: datadog::SERVICE_NAME.to_owned(),
        host: hiibox_config.datadog_host.to_owned(),
        port: hiibox_config.datadog_port.to_owned(),
        ..Default::default()
    });

    rocket::build()
        .register(
            "/",
            catchers![not_found, unauthorized, bad_request, unprocessable, internal_error],
        )
        .attach(Db::init())
        .attach(datadog::RequestTimer)
        .attach(maintenance::MaintenanceMode)
        .manage(hiibox_config)
        .manage(datadog_client)
        .attach(cors)
        .attach(routes::mount())
        .mount("/", routes![health_ping, maintenance_mode])
}
