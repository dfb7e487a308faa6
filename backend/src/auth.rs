//! Static shared-secret gate for the protected endpoints.
//!
//! One configured username/password pair, compared exactly and case-sensitively.
//! There are no sessions, tokens or lockouts.

use crate::config::AuthConfig;
use crate::error::ApiError;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::HttpRequest;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;

const USERNAME_HEADER: &str = "x-username";
const PASSWORD_HEADER: &str = "x-password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    Unauthorized,
}

pub fn check(config: &AuthConfig, submitted: Option<&Credentials>) -> AuthOutcome {
    match submitted {
        Some(c)
            if !c.username.is_empty()
                && !c.password.is_empty()
                && c.username == config.username
                && c.password == config.password =>
        {
            AuthOutcome::Authorized
        }
        _ => AuthOutcome::Unauthorized,
    }
}

/// `check`, as a `Result` for handlers.
pub fn require(config: &AuthConfig, submitted: Option<&Credentials>) -> Result<(), ApiError> {
    match check(config, submitted) {
        AuthOutcome::Authorized => Ok(()),
        AuthOutcome::Unauthorized => {
            warn!(
                "rejected credentials for user {:?}",
                submitted.map(|c| c.username.as_str()).unwrap_or("<none>")
            );
            Err(ApiError::AuthenticationFailed)
        }
    }
}

/// Credentials carried by the request headers: `Authorization: Basic ...` first, then
/// the `X-Username` / `X-Password` pair.
pub fn from_request(req: &HttpRequest) -> Option<Credentials> {
    from_headers(req.headers())
}

pub fn from_headers(headers: &HeaderMap) -> Option<Credentials> {
    basic_credentials(headers).or_else(|| {
        let username = headers.get(USERNAME_HEADER)?.to_str().ok()?;
        let password = headers.get(PASSWORD_HEADER)?.to_str().ok()?;
        Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    })
}

fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
