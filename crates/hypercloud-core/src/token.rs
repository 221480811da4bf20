//! OAuth2 client-credentials token acquisition and caching.
//!
//! [`TokenManager`] hands out a usable bearer token for every request. A refresh
//! never fails from the caller's point of view: any problem at the token endpoint
//! installs a sentinel token whose expiry is already in the past, so the next
//! request tries again instead of reusing a broken credential.

use crate::config::Credentials;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Path of the token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Required length of a valid access token, in bytes.
pub const ACCESS_TOKEN_LEN: usize = 64;

/// Seconds deducted from the advertised lifetime to absorb clock skew.
pub const EXPIRY_SKEW_SECS: i64 = 60;

const SENTINEL_ACCESS_TOKEN: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Form body sent to the token endpoint.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// Token endpoint response. Every field is optional so that a response with
/// missing fields is still decoded and then rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenResponse {
    /// Bearer token value
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type, usually `bearer`
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds. Some servers send it as a float.
    #[serde(default)]
    pub expires_in: Option<f64>,
    /// Refresh token, unused by the client-credentials grant
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
}

/// Why a token could not be obtained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    /// The token endpoint could not be reached
    #[error("token request failed: {0}")]
    Transport(String),

    /// The token endpoint answered with a non-success status
    #[error("token endpoint returned {status}: {body}")]
    Status {
        /// HTTP status
        status: StatusCode,
        /// Raw response body
        body: String,
    },

    /// The response body was not a token response
    #[error("failed to decode token response: {0}")]
    Decode(String),

    /// The response lacked a required field
    #[error("token response is missing `{0}`")]
    MissingField(&'static str),

    /// The access token did not have the expected length
    #[error("access token has length {0}, expected {ACCESS_TOKEN_LEN}")]
    InvalidLength(usize),
}

/// A bearer token with an absolute expiry.
#[derive(Clone, PartialEq)]
pub struct Token {
    access_token: String,
    token_type: String,
    scope: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Validate a token response received at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if `access_token` or `expires_in` is missing, or if the
    /// access token is not exactly [`ACCESS_TOKEN_LEN`] characters long.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Result<Self, TokenError> {
        let access_token = response
            .access_token
            .ok_or(TokenError::MissingField("access_token"))?;
        let length = access_token.len();
        if length != ACCESS_TOKEN_LEN {
            return Err(TokenError::InvalidLength(length));
        }

        let expires_in = response
            .expires_in
            .filter(|secs| secs.is_finite())
            .ok_or(TokenError::MissingField("expires_in"))?;
        let expires_at = Duration::try_milliseconds((expires_in * 1000.0) as i64)
            .and_then(|lifetime| lifetime.checked_sub(&Duration::seconds(EXPIRY_SKEW_SECS)))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(if expires_in > 0.0 {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::UNIX_EPOCH
            });

        Ok(Self {
            access_token,
            token_type: response.token_type.unwrap_or_else(|| "bearer".to_string()),
            scope: response.scope.unwrap_or_default(),
            refresh_token: response.refresh_token,
            expires_at,
        })
    }

    /// A poisoned token that is already expired.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            access_token: SENTINEL_ACCESS_TOKEN.to_string(),
            token_type: "bearer".to_string(),
            scope: String::new(),
            refresh_token: None,
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Bearer token value.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Token type reported by the server.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Granted scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Refresh token, if the server issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Absolute expiry, already reduced by the skew margin.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once `now` has reached the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// True once the current time has reached the expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of fresh token responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Request a new token from the authorization server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached, rejects the request,
    /// or answers with something other than a token response.
    async fn fetch_token(&self) -> Result<TokenResponse, TokenError>;
}

/// Client-credentials grant against `{base_url}/oauth/token`.
pub struct ClientCredentialsGrant {
    http: Client,
    credentials: Arc<Credentials>,
    token_url: String,
}

impl ClientCredentialsGrant {
    /// Create a grant that posts the given credentials with `http`.
    #[must_use]
    pub fn new(http: Client, credentials: Arc<Credentials>) -> Self {
        let token_url = format!("{}{TOKEN_PATH}", credentials.base_url());
        Self {
            http,
            credentials,
            token_url,
        }
    }

    /// Absolute URL of the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsGrant {
    async fn fetch_token(&self) -> Result<TokenResponse, TokenError> {
        let form = TokenRequest {
            grant_type: "client_credentials",
            client_id: self.credentials.access_key(),
            client_secret: self.credentials.secret_key(),
        };

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| TokenError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TokenError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(TokenError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|err| TokenError::Decode(err.to_string()))
    }
}

/// Caches the current token and refreshes it on demand.
///
/// The cache lock is held across a refresh, so concurrent callers that find
/// the cache empty or expired wait for the one in-flight refresh and share
/// its result.
pub struct TokenManager {
    source: Arc<dyn TokenSource>,
    cache: Mutex<Option<Arc<Token>>>,
}

impl TokenManager {
    /// Create a manager with an empty cache.
    #[must_use]
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(None),
        }
    }

    /// Return the cached token, refreshing it first if it is absent or expired.
    pub async fn acquire(&self) -> Arc<Token> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if !token.is_expired() {
                debug!(expires_at = %token.expires_at(), "using cached token");
                return Arc::clone(token);
            }
        }

        let token = self.fetch().await;
        *cache = Some(Arc::clone(&token));
        token
    }

    /// Unconditionally fetch a new token and replace the cache.
    pub async fn refresh(&self) -> Arc<Token> {
        let mut cache = self.cache.lock().await;
        let token = self.fetch().await;
        *cache = Some(Arc::clone(&token));
        token
    }

    /// Drop the cached token.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Drop the cached token only if it is still `token`.
    ///
    /// Returns whether the cache was cleared.
    pub async fn invalidate_if_current(&self, token: &Arc<Token>) -> bool {
        let mut cache = self.cache.lock().await;
        match cache.as_ref() {
            Some(current) if Arc::ptr_eq(current, token) => {
                *cache = None;
                true
            }
            _ => false,
        }
    }

    /// Peek at the cached token without refreshing it.
    pub async fn cached(&self) -> Option<Arc<Token>> {
        self.cache.lock().await.clone()
    }

    async fn fetch(&self) -> Arc<Token> {
        let result = self
            .source
            .fetch_token()
            .await
            .and_then(|response| Token::from_response(response, Utc::now()));

        match result {
            Ok(token) => {
                debug!(expires_at = %token.expires_at(), "acquired new token");
                Arc::new(token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, installing expired sentinel");
                Arc::new(Token::sentinel())
            }
        }
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}
