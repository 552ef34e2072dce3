//! HTTP Basic authentication for collection feeds.

use crate::error::ODataError;
use crate::handlers::ODataState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine;
use geofeed_core::problemdetails::Problem;
use geofeed_core::BasicCredentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const COMPARE_KEY: &[u8] = b"geofeed-basic-auth";

/// Username of a request that presented valid Basic credentials
#[derive(Debug, Clone)]
pub struct RequireBasicAuth(pub String);

impl FromRequestParts<Arc<ODataState>> for RequireBasicAuth {
    type Rejection = Problem;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ODataState>,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(decode_basic);

        match presented {
            Some((username, password))
                if credentials_match(state.config.credentials(), &username, &password) =>
            {
                Ok(RequireBasicAuth(username))
            }
            Some((username, _)) => {
                debug!("Rejected Basic credentials for user '{}'", username);
                Err(unauthorized(state))
            }
            None => {
                debug!("Request without usable Basic credentials");
                Err(unauthorized(state))
            }
        }
    }
}

fn unauthorized(state: &ODataState) -> Problem {
    ODataError::Unauthorized {
        realm: state.config.realm().to_string(),
    }
    .into()
}

/// Split an `Authorization: Basic <base64>` value into username and password
pub fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Compare both fields without short-circuiting and in constant time
pub fn credentials_match(expected: &BasicCredentials, username: &str, password: &str) -> bool {
    let username_ok = constant_time_eq(expected.username.as_bytes(), username.as_bytes());
    let password_ok = constant_time_eq(expected.password.as_bytes(), password.as_bytes());
    username_ok & password_ok
}

/// MAC both values under a fixed key and verify the tags in constant time,
/// so neither content nor length of `expected` leaks through timing.
fn constant_time_eq(expected: &[u8], presented: &[u8]) -> bool {
    let Ok(mut expected_mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    expected_mac.update(expected);
    let tag = expected_mac.finalize().into_bytes();

    let Ok(mut presented_mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    presented_mac.update(presented);
    presented_mac.verify_slice(&tag).is_ok()
}
