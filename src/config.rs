//! Configuration from environment variables

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";
const DEFAULT_HISTORY_FILE: &str = "chat_history.json";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Settings for the inference endpoint
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub history_file: PathBuf,
    pub bind: IpAddr,
    pub port: u16,
    pub inference: InferenceConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("TEENBUDDY_PORT") {
            Some(v) => parse(&v, "TEENBUDDY_PORT", "a port number")?,
            None => DEFAULT_PORT,
        };
        let bind = match get("TEENBUDDY_BIND") {
            Some(v) => parse(&v, "TEENBUDDY_BIND", "an IP address")?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let timeout_secs = match get("TEENBUDDY_TIMEOUT_SECS") {
            Some(v) => parse(&v, "TEENBUDDY_TIMEOUT_SECS", "a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            history_file: get("TEENBUDDY_HISTORY_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE), PathBuf::from),
            bind,
            port,
            inference: InferenceConfig {
                api_token: get("API_TOKEN"),
                base_url: get("TEENBUDDY_INFERENCE_URL")
                    .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
                model: get("TEENBUDDY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    var: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    })
}
