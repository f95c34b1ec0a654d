use datadog_apm::{ErrorInfo, HttpInfo, Span, Trace};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::Status,
    Data, Request, Response,
};
use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};
use tracing::warn;

use crate::pool::HiiBoxConfig;

pub const SERVICE_NAME: &str = "hiibox-web-api";

/// Sends one APM span per request when `enable_datadog` is set.
pub struct RequestTimer;

#[derive(Clone)]
struct TimerStart(Option<SystemTime>);

fn tracing_enabled(request: &Request<'_>) -> bool {
    request.uri().path().as_str() != "/"
        && request
            .rocket()
            .state::<HiiBoxConfig>()
            .map(|config| config.enable_datadog)
            .unwrap_or(false)
}

#[rocket::async_trait]
impl Fairing for RequestTimer {
    fn info(&self) -> Info {
        Info {
            name: "Datadog trace",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if tracing_enabled(request) {
            request.local_cache(|| TimerStart(Some(SystemTime::now())));
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if !tracing_enabled(request) || response.status() == Status::NotFound {
            return;
        }
        let started = match request.local_cache(|| TimerStart(None)).0 {
            Some(started) => started,
            None => return,
        };
        let client = match request.rocket().state::<datadog_apm::Client>() {
            Some(client) => client.clone(),
            None => return,
        };

        let method = request.method().as_str();
        let path = request.uri().path().as_str();
        let status_code = response.status().code;
        client.send_trace(Trace {
            id: 1,
            priority: 1,
            spans: vec![request_span(
                method,
                path,
                request.uri().to_string(),
                status_code,
                started,
            )],
        });
    }
}

fn request_span(
    method: &str,
    path: &str,
    url: String,
    status_code: u16,
    started: SystemTime,
) -> Span {
    let duration = SystemTime::now()
        .duration_since(started)
        .unwrap_or_else(|error| {
            warn!("Failed calculating duration: {}", error);
            Duration::from_millis(0)
        });
    let error = match status_code {
        200..=399 => None,
        500..=599 => Some(ErrorInfo {
            r#type: "server".to_owned(),
            msg: "Internal error".to_owned(),
            stack: "".to_owned(),
        }),
        _ => Some(ErrorInfo {
            r#type: "client".to_owned(),
            msg: "Rejected request".to_owned(),
            stack: "".to_owned(),
        }),
    };

    Span {
        id: 1,
        parent_id: None,
        name: "request".to_owned(),
        resource: format!("{} {}", method, path),
        r#type: "web".to_owned(),
        start: started,
        duration,
        http: Some(HttpInfo {
            url,
            method: method.to_owned(),
            status_code: status_code.to_string(),
        }),
        error,
        sql: None,
        tags: HashMap::new(),
    }
}
