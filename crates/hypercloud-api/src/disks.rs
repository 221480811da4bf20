//! Disk operations.

use crate::client::resource_path;
use crate::Hypercloud;
use hypercloud_core::{Method, Result, Value};
use serde::Serialize;

impl Hypercloud {
    /// List all disks.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn disk_list(&self) -> Result<Value> {
        self.get("/disks").await
    }

    /// Get one disk.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn disk_info(&self, disk_id: &str) -> Result<Value> {
        self.get(&resource_path(&["disks", disk_id])?).await
    }

    /// Create a disk.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn disk_create<B>(&self, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, "/disks", Some(body)).await
    }

    /// Resize a disk; the body carries the new `size`.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn disk_resize<B>(&self, disk_id: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = resource_path(&["disks", disk_id])?;
        self.call(Method::PUT, &path, Some(body)).await
    }

    /// Delete a disk.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn disk_delete(&self, disk_id: &str) -> Result<Value> {
        let path = resource_path(&["disks", disk_id])?;
        self.call::<Value>(Method::DELETE, &path, None).await
    }
}
