//! Single authenticated HTTP exchange.
//!
//! [`RequestDispatcher::send`] never fails. Local problems (payload that cannot
//! be serialized, a request that cannot be built, transport errors, bodies that
//! are not JSON, including empty ones) are folded into a synthetic
//! [`RequestOutcome`] so the caller always gets a `(json, body, status)` triple.

use crate::token::{Token, TokenManager};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Prefix joined between the base URL and every resource path.
pub const API_PREFIX: &str = "/api/v1";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Category of a local failure, reported in the synthetic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFailure {
    /// The payload could not be serialized to JSON
    Serialize,
    /// The URL or request could not be built
    BuildRequest,
    /// The request did not complete (connect, TLS, timeout...)
    Transport,
    /// The response body could not be read or decoded
    Decode,
}

impl LocalFailure {
    /// Text placed in the synthetic payload's `error_description`.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Serialize => "data failed to be marshalled to json",
            Self::BuildRequest => "unable to create a new request",
            Self::Transport => "request failed to complete. Refer to body for details",
            Self::Decode => "Unable to decode json",
        }
    }

    /// Status reported for this failure: 400 for bad local input, 503 otherwise.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Serialize | Self::BuildRequest => StatusCode::BAD_REQUEST,
            Self::Transport | Self::Decode => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Result of one exchange: decoded JSON, raw body and status.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Decoded body, or the synthetic payload for local failures
    pub json: Value,
    /// Raw body text, or the error text for local failures
    pub body: String,
    /// HTTP status, or 400/503 for local failures
    pub status: StatusCode,
}

impl RequestOutcome {
    /// Build the synthetic outcome for a local failure.
    #[must_use]
    pub fn local_failure(failure: LocalFailure, detail: impl Into<String>) -> Self {
        Self {
            json: json!({
                "error": "Invalid data",
                "error_description": failure.description(),
            }),
            body: detail.into(),
            status: failure.status(),
        }
    }

    /// True for statuses in `200..300`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the JSON payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.json)
    }
}

/// An outcome together with the token that was sent with it.
#[derive(Debug)]
pub(crate) struct Exchange {
    pub(crate) outcome: RequestOutcome,
    pub(crate) token: Arc<Token>,
}

/// Builds and sends one authenticated API request.
pub struct RequestDispatcher {
    http: Client,
    api_base: String,
    user_agent: String,
    tokens: Arc<TokenManager>,
}

impl RequestDispatcher {
    /// Create a dispatcher for `{base_url}/api/v1`.
    #[must_use]
    pub fn new(
        http: Client,
        base_url: &str,
        user_agent: impl Into<String>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            http,
            api_base: format!("{}{API_PREFIX}", base_url.trim_end_matches('/')),
            user_agent: user_agent.into(),
            tokens,
        }
    }

    /// The token manager shared with this dispatcher.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Absolute URL for a resource path such as `/instances/42`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Perform one exchange with the current token.
    pub async fn send<B>(&self, method: Method, path: &str, payload: Option<&B>) -> RequestOutcome
    where
        B: Serialize + ?Sized,
    {
        self.exchange(method, path, payload, 0).await.outcome
    }

    pub(crate) async fn exchange<B>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&B>,
        attempt: u32,
    ) -> Exchange
    where
        B: Serialize + ?Sized,
    {
        let token = self.tokens.acquire().await;
        let outcome = self
            .send_with_token(method, path, payload, &token, attempt)
            .await;
        Exchange { outcome, token }
    }

    async fn send_with_token<B>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&B>,
        token: &Token,
        attempt: u32,
    ) -> RequestOutcome
    where
        B: Serialize + ?Sized,
    {
        let body = match payload.map(serde_json::to_vec).transpose() {
            Ok(body) => body,
            Err(err) => return RequestOutcome::local_failure(LocalFailure::Serialize, err.to_string()),
        };

        if has_dot_segment(path) {
            return RequestOutcome::local_failure(
                LocalFailure::BuildRequest,
                format!("path `{path}` contains a dot segment"),
            );
        }

        let url = match Url::parse(&self.url_for(path)) {
            Ok(url) => url,
            Err(err) => {
                return RequestOutcome::local_failure(
                    LocalFailure::BuildRequest,
                    format!("invalid request URL for `{path}`: {err}"),
                )
            }
        };

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token()))
            .header(USER_AGENT, self.user_agent.as_str())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.body(body);
        }

        let request = match request.build() {
            Ok(request) => request,
            Err(err) => {
                return RequestOutcome::local_failure(LocalFailure::BuildRequest, err.to_string())
            }
        };

        info!(%method, path, attempt, "Hypercloud request");

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%method, path, error = %err, "Hypercloud request failed to complete");
                return RequestOutcome::local_failure(LocalFailure::Transport, err.to_string());
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return RequestOutcome::local_failure(LocalFailure::Decode, err.to_string()),
        };

        decode_body(status, text)
    }
}

/// True if any path segment is `.` or `..`, literally or percent-encoded.
/// URL parsing would resolve such segments and move the request off `/api/v1`.
fn has_dot_segment(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split(['/', '\\']).any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

fn decode_body(status: StatusCode, body: String) -> RequestOutcome {
    match serde_json::from_str(&body) {
        Ok(json) => RequestOutcome { json, body, status },
        Err(err) => RequestOutcome::local_failure(LocalFailure::Decode, err.to_string()),
    }
}
