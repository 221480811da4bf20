//! HTTP client configuration and the authenticated [`HypercloudClient`].
//!
//! `HypercloudClient::request` is the single entry point every resource call goes
//! through: the token manager supplies a bearer token, the dispatcher performs the
//! exchange, the retrying client applies the reauthentication rule, and the result
//! is classified into success or a structured [`ApiError`].

use crate::config::{Credentials, HypercloudConfig};
use crate::dispatch::{RequestDispatcher, RequestOutcome};
use crate::error::{classify, ApiError, Error, Result};
use crate::retry::{InvalidTokenPolicy, ReauthPolicy, RetryingClient};
use crate::token::{ClientCredentialsGrant, TokenManager, TokenSource};
use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// User agent sent on every call.
pub const USER_AGENT: &str = concat!("hypercloud-core/", env!("CARGO_PKG_VERSION"));

/// Default timeout for token and resource requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Default TCP + TLS connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Build a `reqwest` client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn build_http_client(&self) -> Result<Client> {
        let mut builder = ClientBuilder::new()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        if !self.enable_compression {
            builder = builder.no_gzip();
        }

        builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an HTTP method name, ignoring case.
///
/// # Errors
///
/// Returns an error if the name is not a valid method token.
pub fn parse_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid HTTP method `{name}`: {err}")))
}

/// Builder for [`HypercloudClient`].
pub struct HypercloudClientBuilder {
    config: HypercloudConfig,
    http_config: ClientConfig,
    policy: Arc<dyn ReauthPolicy>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl HypercloudClientBuilder {
    /// Create a builder from a validated configuration.
    #[must_use]
    pub fn new(config: HypercloudConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
            policy: Arc::new(InvalidTokenPolicy),
            token_source: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the rule deciding when a rejected token is replaced and the call resent.
    #[must_use]
    pub fn with_reauth_policy(mut self, policy: Arc<dyn ReauthPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Obtain tokens from `source` instead of the client-credentials grant.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation (for example a
    /// timeout outside `1..=300` seconds), the base URL is invalid, or the HTTP
    /// client cannot be built.
    pub fn build(self) -> Result<HypercloudClient> {
        self.config.validate()?;
        self.config.parse_base_url()?;
        let http = self.http_config.build_http_client()?;
        let credentials = Arc::new(self.config.into_credentials());

        let source = self.token_source.unwrap_or_else(|| {
            Arc::new(ClientCredentialsGrant::new(
                http.clone(),
                Arc::clone(&credentials),
            ))
        });
        let tokens = Arc::new(TokenManager::new(source));
        let dispatcher =
            RequestDispatcher::new(http, credentials.base_url(), USER_AGENT, tokens);

        Ok(HypercloudClient {
            inner: Arc::new(Inner {
                credentials,
                retrying: RetryingClient::new(dispatcher, self.policy),
            }),
        })
    }
}

impl fmt::Debug for HypercloudClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypercloudClientBuilder")
            .field("config", &self.config)
            .field("http_config", &self.http_config)
            .finish_non_exhaustive()
    }
}

struct Inner {
    credentials: Arc<Credentials>,
    retrying: RetryingClient,
}

/// Authenticated client for the Hypercloud API.
///
/// Cloning is cheap and the clones share the same token cache.
#[derive(Clone)]
pub struct HypercloudClient {
    inner: Arc<Inner>,
}

impl HypercloudClient {
    /// Construct a client directly from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HypercloudConfig) -> Result<Self> {
        HypercloudClientBuilder::new(config).build()
    }

    /// Construct a client from `HC_BASE_URL`, `HC_ACCESS_KEY` and `HC_SECRET_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(HypercloudConfig::from_env()?)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.inner.credentials.base_url()
    }

    /// Access key this client authenticates with.
    #[must_use]
    pub fn access_key(&self) -> &str {
        self.inner.credentials.access_key()
    }

    /// Token manager backing this client.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        self.inner.retrying.dispatcher().tokens()
    }

    /// Send a request and return the raw outcome of the final attempt.
    pub async fn execute<B>(&self, method: Method, path: &str, payload: Option<&B>) -> RequestOutcome
    where
        B: Serialize + ?Sized,
    {
        self.inner.retrying.execute(method, path, payload).await
    }

    /// Send a request to `/api/v1{path}` and classify the result.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] whenever the final status is outside `200..300`.
    /// The decoded body is available in [`ApiError::json`].
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&B>,
    ) -> std::result::Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        classify(self.execute(method, path, payload).await)
    }

    /// Like [`request`](Self::request) but decodes a successful body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for non-success statuses and [`Error::ParseError`]
    /// when the body does not match `T`.
    pub async fn request_as<B, T>(&self, method: Method, path: &str, payload: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.request(method, path, payload).await?;
        serde_json::from_value(value).map_err(|err| {
            Error::ParseError(format!("Failed to parse response for `{path}`: {err}"))
        })
    }

    /// `GET {path}`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, path: &str) -> std::result::Result<Value, ApiError> {
        self.request::<Value>(Method::GET, path, None).await
    }

    /// `POST {path}` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post<B>(&self, path: &str, payload: Option<&B>) -> std::result::Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, payload).await
    }

    /// `PUT {path}` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put<B>(&self, path: &str, payload: Option<&B>) -> std::result::Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, payload).await
    }

    /// `DELETE {path}`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(&self, path: &str) -> std::result::Result<Value, ApiError> {
        self.request::<Value>(Method::DELETE, path, None).await
    }
}

impl fmt::Debug for HypercloudClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypercloudClient")
            .field("base_url", &self.base_url())
            .field("access_key", &self.access_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::token::{MockTokenSource, TokenResponse, ACCESS_TOKEN_LEN};
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> HypercloudClient {
        let mut source = MockTokenSource::new();
        source.expect_fetch_token().returning(|| {
            Ok(TokenResponse {
                access_token: Some("k".repeat(ACCESS_TOKEN_LEN)),
                expires_in: Some(3600.0),
                ..TokenResponse::default()
            })
        });

        let config = HypercloudConfig::new(server.uri(), "access", "secret").unwrap();
        HypercloudClientBuilder::new(config)
            .with_token_source(Arc::new(source))
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(25));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert!(config.enable_compression);
        assert_eq!(ClientConfig::default(), config);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(3))
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_compression(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_compression);
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method(" Post ").unwrap(), Method::POST);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert!(parse_method("bad method").is_err());
    }

    #[test]
    fn test_builder_uses_config_timeout() {
        let config = HypercloudConfig::new("https://api.example.com", "a", "s")
            .unwrap()
            .with_timeout(40);
        let builder = HypercloudClientBuilder::new(config);
        assert_eq!(builder.http_config.timeout, Duration::from_secs(40));
    }

    #[test]
    fn test_build_rejects_out_of_range_timeout() {
        for seconds in [0, 301] {
            let config = HypercloudConfig::new("https://api.example.com", "a", "s")
                .unwrap()
                .with_timeout(seconds);
            let result = HypercloudClient::new(config);
            assert!(matches!(result, Err(Error::ValidationError(_))));
        }
    }

    #[test]
    fn test_client_accessors() {
        let config = HypercloudConfig::new("https://api.example.com/", "access", "secret").unwrap();
        let client = HypercloudClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.access_key(), "access");
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_request_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "t-1"}])))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value = client.get("/templates").await.unwrap();
        assert_eq!(value, json!([{"id": "t-1"}]));
    }

    #[tokio::test]
    async fn test_request_status_kinds() {
        let cases = [
            (400, ErrorKind::InvalidRequest),
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Authorization),
            (404, ErrorKind::InvalidRequest),
            (422, ErrorKind::Validation),
            (500, ErrorKind::Api(StatusCode::INTERNAL_SERVER_ERROR)),
        ];

        for (status, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path("/api/v1/networks/n-1"))
                .respond_with(
                    ResponseTemplate::new(status).set_body_json(json!({"error": "nope"})),
                )
                .mount(&server)
                .await;

            let client = test_client(&server);
            let err = client
                .put("/networks/n-1", Some(&json!({"name": "lan"})))
                .await
                .unwrap_err();

            assert_eq!(err.kind, kind);
            assert_eq!(err.body, r#"{"error":"nope"}"#);
            assert_eq!(err.json, json!({"error": "nope"}));
        }
    }

    #[tokio::test]
    async fn test_request_as_typed() {
        #[derive(serde::Deserialize)]
        struct State {
            state: String,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/instances/i-1/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "running"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let state: State = client
            .request_as::<Value, _>(Method::GET, "/instances/i-1/state", None)
            .await
            .unwrap();
        assert_eq!(state.state, "running");

        let err = client
            .request_as::<Value, Vec<String>>(Method::GET, "/instances/i-1/state", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn test_delete_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/instances/i-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value = client.delete("/instances/i-1").await.unwrap();
        assert_eq!(value["deleted"], true);
    }

    #[tokio::test]
    async fn test_empty_body_classifies_as_api_503() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/instances/i-2"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/instances/i-2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        for err in [
            client.delete("/instances/i-2").await.unwrap_err(),
            client.get("/instances/i-2").await.unwrap_err(),
        ] {
            assert_eq!(err.kind, ErrorKind::Api(StatusCode::SERVICE_UNAVAILABLE));
            assert_eq!(err.json["error_description"], "Unable to decode json");
        }
    }

    #[tokio::test]
    async fn test_dot_segments_are_invalid_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("/instances/../../../oauth/token").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clones_share_token_cache() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let clone = client.clone();

        let token = client.tokens().acquire().await;
        let cached = clone.tokens().cached().await.unwrap();
        assert!(Arc::ptr_eq(&token, &cached));
    }
}
