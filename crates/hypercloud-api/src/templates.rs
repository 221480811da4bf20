//! Disk template operations.

use crate::client::resource_path;
use crate::models::{in_region, Template};
use crate::Hypercloud;
use hypercloud_core::{Result, Value};
use tracing::debug;

impl Hypercloud {
    /// List all templates.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn template_list(&self) -> Result<Value> {
        self.get("/templates").await
    }

    /// Get one template.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn template_info(&self, template_id: &str) -> Result<Value> {
        self.get(&resource_path(&["templates", template_id])?).await
    }

    /// Find the template called `name` in `region_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails or the listing is not an
    /// array of templates.
    pub async fn find_template(&self, name: &str, region_id: &str) -> Result<Option<Template>> {
        let templates: Vec<Template> = serde_json::from_value(self.template_list().await?)?;
        let found = templates.into_iter().find(|template| {
            template.name.as_deref() == Some(name) && in_region(template.region.as_ref(), region_id)
        });

        debug!(template = name, region_id, found = found.is_some(), "Template lookup");
        Ok(found)
    }
}
