//! One-shot reauthentication retry.

use crate::dispatch::{RequestDispatcher, RequestOutcome};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Upper bound on reauthentication retries per call.
pub const MAX_REAUTH_RETRIES: u32 = 1;

/// Marker the API puts in the body of a 401 caused by a stale token.
pub const INVALID_TOKEN_MARKER: &str = "invalid_token";

/// Decides whether an outcome means the token was rejected and a fresh one
/// should be tried.
pub trait ReauthPolicy: Send + Sync {
    /// Return true to invalidate the token and resend once.
    fn should_reauthenticate(&self, outcome: &RequestOutcome) -> bool;
}

/// Retry on `401` whose body mentions `invalid_token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidTokenPolicy;

impl ReauthPolicy for InvalidTokenPolicy {
    fn should_reauthenticate(&self, outcome: &RequestOutcome) -> bool {
        outcome.status == StatusCode::UNAUTHORIZED && outcome.body.contains(INVALID_TOKEN_MARKER)
    }
}

/// Dispatcher wrapped with the reauthentication rule.
pub struct RetryingClient {
    dispatcher: RequestDispatcher,
    policy: Arc<dyn ReauthPolicy>,
}

impl RetryingClient {
    /// Wrap `dispatcher` with the given policy.
    #[must_use]
    pub fn new(dispatcher: RequestDispatcher, policy: Arc<dyn ReauthPolicy>) -> Self {
        Self { dispatcher, policy }
    }

    /// The wrapped dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Send the request, retrying once with a fresh token if the policy asks for it.
    ///
    /// The outcome of the last attempt is returned whatever its status.
    pub async fn execute<B>(&self, method: Method, path: &str, payload: Option<&B>) -> RequestOutcome
    where
        B: Serialize + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let exchange = self
                .dispatcher
                .exchange(method.clone(), path, payload, attempt)
                .await;

            if attempt >= MAX_REAUTH_RETRIES || !self.policy.should_reauthenticate(&exchange.outcome)
            {
                return exchange.outcome;
            }

            warn!(%method, path, attempt, "token rejected, reauthenticating");
            self.dispatcher
                .tokens()
                .invalidate_if_current(&exchange.token)
                .await;
            attempt += 1;
        }
    }
}

impl fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingClient").finish_non_exhaustive()
    }
}
