//! Service-account credentials and OAuth2 access tokens.
//!
//! Tokens are minted with the JWT bearer grant: a self-signed RS256 assertion
//! is exchanged at the account's token URI for a short-lived bearer token,
//! which is cached until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

/// Scope granting access to Cloud Vision (and the rest of Cloud Platform).
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion, and assumed for tokens whose
/// response omits `expires_in`.
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Failed to read credentials file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse credentials: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported credentials type: {0}")]
    UnsupportedType(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

/// The JSON key file downloaded for a Google service account.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: Secret<String>,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;

        match key.key_type.as_deref() {
            None | Some("service_account") => Ok(key),
            Some(other) => Err(CredentialsError::UnsupportedType(other.to_string())),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&json)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Hands out bearer tokens for one service account and scope.
pub struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    client: reqwest::Client,
    cached: RwLock<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(
        key: ServiceAccountKey,
        scope: impl Into<String>,
        client: reqwest::Client,
    ) -> Result<Self, CredentialsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())?;

        Ok(Self {
            key,
            encoding_key,
            scope: scope.into(),
            client,
            cached: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A bearer token valid for at least the refresh margin.
    pub async fn access_token(&self) -> Result<String, CredentialsError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *self.cached.write().await = Some(token);

        Ok(value)
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, CredentialsError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    async fn fetch_token(&self) -> Result<AccessToken, CredentialsError> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        tracing::debug!(
            client_email = %self.key.client_email,
            token_uri = %self.key.token_uri,
            "Requesting access token"
        );

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialsError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialsError::TokenExchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            CredentialsError::TokenExchange(format!("Failed to parse token response: {}", e))
        })?;

        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        tracing::info!(expires_in = lifetime, "Obtained access token");

        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}
