use std::future::{ready, Ready};

use actix_web::cookie::Cookie;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponseBuilder};

use crate::domain::session::SessionId;
use crate::errors::AppError;

pub const SESSION_COOKIE: &str = "proxy_sid";
pub const SESSION_HEADER: &str = "X-Proxy-SID";

/// The anonymous shopper behind a request: cookie first, then header, then a
/// freshly issued id that the response must hand back as a cookie.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    issued: bool,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.issued
    }

    /// Sets the session cookie on the response when the id was issued by this
    /// request.
    pub fn attach(&self, response: &mut HttpResponseBuilder) {
        if self.issued {
            // Readable from the storefront's scripts.
            let cookie = Cookie::build(SESSION_COOKIE, self.id.as_str().to_string())
                .path("/")
                .http_only(false)
                .finish();
            response.cookie(cookie);
        }
    }

    fn resolve(req: &HttpRequest) -> Self {
        let from_cookie = req
            .cookie(SESSION_COOKIE)
            .and_then(|c| SessionId::parse(c.value()).ok());
        let from_header = || {
            req.headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| SessionId::parse(v).ok())
        };

        match from_cookie.or_else(from_header) {
            Some(id) => Session { id, issued: false },
            None => {
                let id = SessionId::generate();
                log::debug!("Issuing new session {}", id);
                Session { id, issued: true }
            }
        }
    }
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Session::resolve(req)))
    }
}
