//! HTTP Basic Authentication gate.
//!
//! The gate is all-or-nothing: it is installed only when both a username and
//! a password are configured, and then every request behind it must present
//! exactly those credentials.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const DEFAULT_REALM: &str = "Restricted";

#[derive(Clone, Debug)]
pub struct BasicAuthCredentials {
    username: String,
    password: Secret<String>,
    realm: String,
}

impl BasicAuthCredentials {
    pub fn new(username: impl Into<String>, password: Secret<String>) -> Self {
        Self {
            username: username.into(),
            password,
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Returns `None` unless both values are present and non-empty.
    pub fn from_parts(username: Option<String>, password: Option<Secret<String>>) -> Option<Self> {
        match (username, password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.expose_secret().is_empty() => {
                Some(Self::new(user, pass))
            }
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Check an `Authorization` header set against these credentials.
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let Some((user, pass)) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(decode_basic_header)
        else {
            return false;
        };

        let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(
            pass.as_bytes(),
            self.password.expose_secret().as_bytes(),
        );

        user_ok & pass_ok
    }
}

/// Split `Basic <base64(user:password)>` into its two halves.
///
/// The scheme is matched case-insensitively. The password may itself contain
/// colons; only the first one separates it from the username.
pub fn decode_basic_header(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;

    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

pub async fn basic_auth_middleware(
    State(credentials): State<Arc<BasicAuthCredentials>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !credentials.verify(req.headers()) {
        tracing::warn!(
            method = %req.method(),
            uri = %req.uri(),
            "Rejected request with missing or invalid basic auth credentials"
        );
        return Err(AppError::Unauthorized {
            realm: credentials.realm().to_string(),
        });
    }

    Ok(next.run(req).await)
}
