use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};
use std::collections::HashSet;

const ALLOWED_METHODS: &str = "GET, POST";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type";

pub struct OriginHeader {
    pub allowed_domains: HashSet<String>,
}

impl OriginHeader {
    pub fn new(cors_allowed_domains: &str) -> Self {
        OriginHeader {
            allowed_domains: cors_allowed_domains
                .split(',')
                .map(|domain| domain.trim().to_owned())
                .filter(|domain| !domain.is_empty())
                .collect(),
        }
    }

    fn allows(&self, origin: &str) -> bool {
        self.allowed_domains.contains(origin)
    }
}

#[rocket::async_trait]
impl Fairing for OriginHeader {
    fn info(&self) -> Info {
        Info {
            name: "CORS Policy",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if response.status() == Status::NotFound {
            return;
        }

        if let Some(origin) = request.headers().get_one("Origin") {
            if self.allows(origin) {
                response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_owned()));
                response.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
                response.set_header(Header::new("Access-Control-Allow-Headers", ALLOWED_HEADERS));
            }
        }
    }
}
