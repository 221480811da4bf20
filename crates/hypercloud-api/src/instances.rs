//! Instance operations.
//!
//! Request bodies are passed through untouched; any `Serialize` value works,
//! typically a `serde_json::json!` literal.

use crate::client::resource_path;
use crate::Hypercloud;
use hypercloud_core::{Method, Result, Value};
use serde::Serialize;

impl Hypercloud {
    /// List all instances.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_list(&self) -> Result<Value> {
        self.get("/instances").await
    }

    /// Get one instance.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_info(&self, instance_id: &str) -> Result<Value> {
        self.get(&resource_path(&["instances", instance_id])?).await
    }

    /// Create an instance.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_create<B>(&self, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, "/instances", Some(body)).await
    }

    /// Create an instance together with its disks and network adapters.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_assemble<B>(&self, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, "/instances/assemble", Some(body)).await
    }

    /// Update an instance.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_update<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["instances", instance_id])?;
        self.call(Method::PUT, &path, Some(body)).await
    }

    /// Delete an instance.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_delete(&self, instance_id: &str) -> Result<Value> {
        let path = resource_path(&["instances", instance_id])?;
        self.call::<Value>(Method::DELETE, &path, None).await
    }

    /// Current power state.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_state(&self, instance_id: &str) -> Result<Value> {
        self.get(&resource_path(&["instances", instance_id, "state"])?).await
    }

    /// Read the instance note. The API expects a JSON body on this `GET`.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_note<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["instances", instance_id, "note"])?;
        self.call(Method::GET, &path, Some(body)).await
    }

    /// Power on.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_start<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_action(instance_id, "start", body).await
    }

    /// Power off.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_stop<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_action(instance_id, "stop", body).await
    }

    /// Open a remote console session.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_remote_access<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_action(instance_id, "remote_access", body).await
    }

    /// Replace the attached disks.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_update_disks<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_replace(instance_id, "disks", body).await
    }

    /// Replace the authorised SSH public keys.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_update_public_keys<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_replace(instance_id, "public_keys", body).await
    }

    /// Replace the network adapters.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_update_networking<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_replace(instance_id, "network_adapters", body).await
    }

    /// Read the instance context (user metadata).
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_get_context(&self, instance_id: &str) -> Result<Value> {
        self.get(&resource_path(&["instances", instance_id, "context"])?).await
    }

    /// Overwrite the instance context.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_set_context<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_action(instance_id, "context", body).await
    }

    /// Merge keys into the instance context.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_update_context<B>(&self, instance_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.instance_replace(instance_id, "context", body).await
    }

    /// Remove one key from the instance context.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn instance_delete_context_key(&self, instance_id: &str, key: &str) -> Result<Value> {
        let path = resource_path(&["instances", instance_id, "context", key])?;
        self.call::<Value>(Method::DELETE, &path, None).await
    }

    async fn instance_action<B>(&self, instance_id: &str, action: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["instances", instance_id, action])?;
        self.call(Method::POST, &path, Some(body)).await
    }

    async fn instance_replace<B>(&self, instance_id: &str, part: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["instances", instance_id, part])?;
        self.call(Method::PUT, &path, Some(body)).await
    }
}
