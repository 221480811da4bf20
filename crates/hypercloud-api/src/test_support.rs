//! Shared mock-server setup for the resource tests.

use crate::Hypercloud;
use hypercloud_core::token::ACCESS_TOKEN_LEN;
use hypercloud_core::HypercloudConfig;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) fn bearer() -> String {
    format!("Bearer {}", "t".repeat(ACCESS_TOKEN_LEN))
}

/// Start a server that hands out one long-lived token.
pub(crate) async fn server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t".repeat(ACCESS_TOKEN_LEN),
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;
    server
}

pub(crate) fn hypercloud(server: &MockServer) -> Hypercloud {
    let config = HypercloudConfig::new(server.uri(), "access-key", "secret-key").unwrap();
    Hypercloud::new(config).unwrap()
}
