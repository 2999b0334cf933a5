use crate::services::vision::google::{GoogleVisionConfig, DEFAULT_VISION_ENDPOINT};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::middleware::basic_auth::BasicAuthCredentials;
use std::env;
use std::time::Duration;

const DEFAULT_CREDENTIALS_PATH: &str = "google_credentials.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HanaConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub upload: UploadConfig,
    /// Present only when both username and password are configured.
    pub basic_auth: Option<BasicAuthCredentials>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Path to the service-account JSON key.
    pub credentials_path: String,
    pub vision_endpoint: String,
    pub request_timeout_secs: u64,
}

impl GoogleConfig {
    pub fn vision(&self) -> GoogleVisionConfig {
        GoogleVisionConfig {
            endpoint: self.vision_endpoint.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl HanaConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let basic_auth = BasicAuthCredentials::from_parts(
            env::var("BASIC_AUTH_USER").ok(),
            env::var("BASIC_AUTH_PASSWORD").ok().map(Secret::new),
        );

        Ok(HanaConfig {
            common: common_config,
            google: GoogleConfig {
                credentials_path: get_env(
                    "GOOGLE_APPLICATION_CREDENTIALS",
                    Some(DEFAULT_CREDENTIALS_PATH),
                    is_prod,
                )?,
                vision_endpoint: get_env(
                    "VISION_API_ENDPOINT",
                    Some(DEFAULT_VISION_ENDPOINT),
                    is_prod,
                )?,
                request_timeout_secs: parse_env(
                    "VISION_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            upload: UploadConfig {
                max_bytes: parse_env("HANA_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            basic_auth,
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}
