//! Entry point for the resource wrappers.

use hypercloud_core::{
    Error, HypercloudClient, HypercloudConfig, Method, Result, Value,
};
use serde::Serialize;
use url::Url;

const SEGMENT_BASE: &str = "http://hypercloud.invalid/";

/// Resource-level client for the Hypercloud API.
///
/// Every operation is one call to [`HypercloudClient::request`].
#[derive(Debug, Clone)]
pub struct Hypercloud {
    client: HypercloudClient,
}

impl Hypercloud {
    /// Build a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HypercloudConfig) -> Result<Self> {
        Ok(Self::from_client(HypercloudClient::new(config)?))
    }

    /// Build a client from `HC_BASE_URL`, `HC_ACCESS_KEY` and `HC_SECRET_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or invalid.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_client(HypercloudClient::from_env()?))
    }

    /// Wrap an existing core client.
    #[must_use]
    pub const fn from_client(client: HypercloudClient) -> Self {
        Self { client }
    }

    /// The underlying authenticated client.
    #[must_use]
    pub const fn core(&self) -> &HypercloudClient {
        &self.client
    }

    pub(crate) async fn call<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        Ok(self.client.request(method, path, body).await?)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value> {
        self.call::<Value>(Method::GET, path, None).await
    }
}

/// Build `/a/b/c` from raw segments, percent-encoding each one so ids cannot
/// escape their segment.
pub(crate) fn resource_path(segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(SEGMENT_BASE)?;
    url.path_segments_mut()
        .map_err(|()| Error::InvalidEndpoint(format!("cannot build path from {segments:?}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}
