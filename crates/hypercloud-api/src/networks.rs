//! Network operations.

use crate::client::resource_path;
use crate::Hypercloud;
use hypercloud_core::{Method, Result, Value};
use serde::Serialize;

impl Hypercloud {
    /// List all networks visible to the account.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_list(&self) -> Result<Value> {
        self.get("/networks").await
    }

    /// List private networks only.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_list_private(&self) -> Result<Value> {
        self.get("/networks/private").await
    }

    /// List public networks only.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_list_public(&self) -> Result<Value> {
        self.get("/networks/public").await
    }

    /// Get one network.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_info(&self, network_id: &str) -> Result<Value> {
        self.get(&resource_path(&["networks", network_id])?).await
    }

    /// Create a private network.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_create<B>(&self, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, "/networks", Some(body)).await
    }

    /// Update a network.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_update<B>(&self, network_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["networks", network_id])?;
        self.call(Method::PUT, &path, Some(body)).await
    }

    /// Delete a network.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn network_delete(&self, network_id: &str) -> Result<Value> {
        let path = resource_path(&["networks", network_id])?;
        self.call::<Value>(Method::DELETE, &path, None).await
    }
}
