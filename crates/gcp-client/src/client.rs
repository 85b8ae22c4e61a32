//! Compute Engine API client
//!
//! Implements the zone and image listings against the Compute Engine REST
//! API: `/projects/{project}/zones` and `/projects/{project}/global/images`.

use crate::error::GcpError;
use crate::gcp_trait::GcpClientTrait;
use crate::models::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Compute Engine API client bound to one project
pub struct GcpClient {
    client: Client,
    base_url: String,
    token: String,
    project_id: String,
}

impl std::fmt::Debug for GcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl GcpClient {
    /// Create a new Compute Engine client
    ///
    /// # Arguments
    /// * `base_url` - Compute API base URL (e.g., "https://compute.googleapis.com/compute/v1")
    /// * `token` - OAuth2 bearer token
    /// * `project_id` - Project to query
    pub fn new(base_url: String, token: String, project_id: String) -> Result<Self, GcpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            project_id,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a query string from parameters, skipping empty values
    fn build_query_string(params: &[(&str, &str)]) -> String {
        params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// GET a collection path under the project
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, GcpError> {
        let query = Self::build_query_string(params);
        let url = if query.is_empty() {
            format!("{}/projects/{}{}", self.base_url, self.project_id, path)
        } else {
            format!("{}/projects/{}{}?{}", self.base_url, self.project_id, path, query)
        };
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::Authentication(format!("{} - {}", status, body)));
        }
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::NotFound(format!("{} - {}", path, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::Api(format!("GET {} failed: {} - {}", path, status, body)));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            GcpError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ))
        })
    }
}

#[async_trait::async_trait]
impl GcpClientTrait for GcpClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn list_compute_zones(&self, options: ListComputeZonesOptions) -> Result<ZoneList, GcpError> {
        debug!("Listing zones in project {} with filter {}", self.project_id, options.filter);
        self.get(
            "/zones",
            &[("filter", options.filter.as_str()), ("pageToken", options.page_token.as_str())],
        )
        .await
    }

    async fn list_compute_images(&self, options: ListComputeImagesOptions) -> Result<ImageList, GcpError> {
        debug!("Listing images in project {} with filter {}", self.project_id, options.filter);
        self.get("/global/images", &[("filter", options.filter.as_str())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_skips_empty_page_token() {
        let query = GcpClient::build_query_string(&[("filter", "status eq UP"), ("pageToken", "")]);
        assert_eq!(query, "filter=status%20eq%20UP");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GcpClient::new(
            "https://compute.googleapis.com/compute/v1/".to_string(),
            "token".to_string(),
            "project".to_string(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://compute.googleapis.com/compute/v1");
        assert_eq!(client.project_id(), "project");
    }

    #[test]
    fn test_zone_list_without_next_page_token() {
        let page: ZoneList = serde_json::from_str(
            r#"{"kind":"compute#zoneList","items":[{"name":"us-east1-b","region":"https://x/regions/us-east1","status":"UP"}]}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "us-east1-b");
        assert!(page.next_page_token.is_empty());
    }

    #[test]
    fn test_image_list_without_items() {
        let list: ImageList = serde_json::from_str(r#"{"kind":"compute#imageList"}"#).unwrap();
        assert!(list.items.is_empty());
    }
}
