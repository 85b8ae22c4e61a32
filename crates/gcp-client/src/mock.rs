//! Mock GcpClient for unit testing
//!
//! Serves scripted zone pages and images from memory and records every
//! request so tests can assert on filters and call counts.

use crate::error::GcpError;
use crate::gcp_trait::GcpClientTrait;
use crate::models::*;
use std::sync::{Arc, Mutex};

/// Mock GcpClient for testing
#[derive(Clone, Debug, Default)]
pub struct MockGcpClient {
    pub(crate) project_id: String,
    // Zone pages, served in order; page N is requested with token "page-N"
    pub(crate) zone_pages: Arc<Mutex<Vec<Vec<Zone>>>>,
    pub(crate) images: Arc<Mutex<Vec<Image>>>,
    // Page index whose request fails, if any
    pub(crate) fail_zone_page: Arc<Mutex<Option<usize>>>,
    pub(crate) fail_images: Arc<Mutex<Option<String>>>,
    // Recorded requests
    pub(crate) zone_requests: Arc<Mutex<Vec<ListComputeZonesOptions>>>,
    pub(crate) image_requests: Arc<Mutex<Vec<ListComputeImagesOptions>>>,
}

impl MockGcpClient {
    /// Create a new mock client for `project_id`
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Serve `pages` as consecutive zone pages (for test setup)
    pub fn set_zone_pages(&self, pages: Vec<Vec<Zone>>) {
        *self.zone_pages.lock().unwrap() = pages;
    }

    /// Serve the given zone names as a single page (for test setup)
    pub fn set_zones(&self, names: &[&str]) {
        self.set_zone_pages(vec![names.iter().map(|n| zone(n)).collect()]);
    }

    /// Fail the request for zone page `index` (for test setup)
    pub fn fail_zone_page(&self, index: usize) {
        *self.fail_zone_page.lock().unwrap() = Some(index);
    }

    /// Serve the given image names (for test setup)
    pub fn set_images(&self, names: &[&str]) {
        *self.images.lock().unwrap() = names.iter().map(|n| image(n)).collect();
    }

    /// Fail every image request with `message` (for test setup)
    pub fn fail_images(&self, message: impl Into<String>) {
        *self.fail_images.lock().unwrap() = Some(message.into());
    }

    /// Zone requests received so far
    pub fn zone_requests(&self) -> Vec<ListComputeZonesOptions> {
        self.zone_requests.lock().unwrap().clone()
    }

    /// Image requests received so far
    pub fn image_requests(&self) -> Vec<ListComputeImagesOptions> {
        self.image_requests.lock().unwrap().clone()
    }
}

/// Build a zone that is up
pub fn zone(name: &str) -> Zone {
    Zone {
        name: name.to_string(),
        region: String::new(),
        status: "UP".to_string(),
    }
}

/// Build a ready image
pub fn image(name: &str) -> Image {
    Image {
        name: name.to_string(),
        self_link: String::new(),
        status: "READY".to_string(),
    }
}

fn page_index(token: &str) -> Result<usize, GcpError> {
    if token.is_empty() {
        return Ok(0);
    }
    token
        .strip_prefix("page-")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| GcpError::Api(format!("invalid page token {}", token)))
}

#[async_trait::async_trait]
impl GcpClientTrait for MockGcpClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn list_compute_zones(&self, options: ListComputeZonesOptions) -> Result<ZoneList, GcpError> {
        self.zone_requests.lock().unwrap().push(options.clone());

        let index = page_index(&options.page_token)?;
        if *self.fail_zone_page.lock().unwrap() == Some(index) {
            return Err(GcpError::Api(format!("zone page {} unavailable", index)));
        }

        let pages = self.zone_pages.lock().unwrap();
        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = if index + 1 < pages.len() {
            format!("page-{}", index + 1)
        } else {
            String::new()
        };
        Ok(ZoneList { items, next_page_token })
    }

    async fn list_compute_images(&self, options: ListComputeImagesOptions) -> Result<ImageList, GcpError> {
        self.image_requests.lock().unwrap().push(options);

        if let Some(message) = self.fail_images.lock().unwrap().clone() {
            return Err(GcpError::Api(message));
        }
        Ok(ImageList {
            items: self.images.lock().unwrap().clone(),
            next_page_token: String::new(),
        })
    }
}
