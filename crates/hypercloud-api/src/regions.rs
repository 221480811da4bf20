//! Region operations.

use crate::client::resource_path;
use crate::models::Region;
use crate::Hypercloud;
use hypercloud_core::{Result, Value};
use tracing::debug;

impl Hypercloud {
    /// List all regions.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn region_list(&self) -> Result<Value> {
        self.get("/regions").await
    }

    /// Get one region.
    ///
    /// # Errors
    ///
    /// Returns [`hypercloud_core::Error::Api`] for any non-2xx outcome.
    pub async fn region_info(&self, region_id: &str) -> Result<Value> {
        self.get(&resource_path(&["regions", region_id])?).await
    }

    /// Find a region by its short code, e.g. `SY3`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails or the listing is not an
    /// array of regions.
    pub async fn find_region_by_code(&self, code: &str) -> Result<Option<Region>> {
        let regions: Vec<Region> = serde_json::from_value(self.region_list().await?)?;
        let found = regions
            .into_iter()
            .find(|region| region.code.as_deref() == Some(code));

        debug!(code, found = found.is_some(), "Region lookup");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, hypercloud, server};
    use hypercloud_core::{Error, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_find_region_by_code() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/regions"))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "r-1", "code": "SY3", "name": "Sydney 3"},
                {"id": "r-2", "code": "ME1", "name": "Melbourne 1"}
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let hc = hypercloud(&server);
        let region = hc.find_region_by_code("ME1").await.unwrap().unwrap();
        assert_eq!(region.id, "r-2");
        assert!(hc.find_region_by_code("XX9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_region_info_not_found() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/regions/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not_found"})))
            .mount(&server)
            .await;

        let err = hypercloud(&server).region_info("missing").await.unwrap_err();
        let api = err.as_api_error().unwrap();
        assert_eq!(api.kind, ErrorKind::InvalidRequest);
        assert_eq!(api.json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_find_region_rejects_non_list() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/regions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"regions": []})))
            .mount(&server)
            .await;

        let err = hypercloud(&server).find_region_by_code("SY3").await.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
