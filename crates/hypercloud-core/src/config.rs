//! Configuration structures for Hypercloud clients.
//!
//! Holds the credentials and endpoint a client is bound to for its whole lifetime.

use crate::client::DEFAULT_TIMEOUT_SECS;
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "HC_BASE_URL";
/// Environment variable holding the access key (OAuth2 client id).
pub const ENV_ACCESS_KEY: &str = "HC_ACCESS_KEY";
/// Environment variable holding the secret key (OAuth2 client secret).
pub const ENV_SECRET_KEY: &str = "HC_SECRET_KEY";
/// Optional environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "HC_TIMEOUT_SECS";

/// Configuration for a Hypercloud client instance.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct HypercloudConfig {
    /// API base URL, e.g. `https://api.hypercloud.example`
    #[validate(url)]
    pub base_url: String,

    /// Access key, sent as the OAuth2 `client_id`
    #[validate(length(min = 1))]
    pub access_key: String,

    /// Secret key, sent as the OAuth2 `client_secret`
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub secret_key: SecretString,

    /// Request timeout in seconds, applied to token and resource calls alike
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl HypercloudConfig {
    /// Create a new configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the access key is empty.
    pub fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            access_key: access_key.into(),
            secret_key: SecretString::from(secret_key.into()),
            request_timeout_secs: default_request_timeout_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Load the configuration from `HC_BASE_URL`, `HC_ACCESS_KEY`, `HC_SECRET_KEY`
    /// and the optional `HC_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::ConfigError(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required(ENV_BASE_URL)?,
            required(ENV_ACCESS_KEY)?,
            required(ENV_SECRET_KEY)?,
        )?;

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let seconds = raw.trim().parse::<u64>().map_err(|e| {
                Error::ConfigError(format!("{ENV_TIMEOUT_SECS} must be an integer: {e}"))
            })?;
            config = config.with_timeout(seconds);
            config.validate()?;
        }

        Ok(config)
    }

    /// Set request timeout in seconds. The range `1..=300` is checked when the
    /// client is built.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Parse and validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL: {e}")))
    }

    /// Split the configuration into the immutable credentials a client keeps.
    #[must_use]
    pub fn into_credentials(self) -> Credentials {
        Credentials {
            base_url: self.normalized_base_url().to_string(),
            access_key: self.access_key,
            secret_key: self.secret_key,
        }
    }
}

/// Credentials bound to a client for its lifetime.
#[derive(Debug)]
pub struct Credentials {
    base_url: String,
    access_key: String,
    secret_key: SecretString,
}

impl Credentials {
    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access key (OAuth2 client id).
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Secret key (OAuth2 client secret).
    #[must_use]
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}
