//! GcpClient trait for mocking
//!
//! This trait abstracts the GcpClient to enable mocking in unit tests.
//! The concrete GcpClient implements this trait, and tests can use mock implementations.

use crate::error::GcpError;
use crate::models::*;

/// Trait for Compute Engine query operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait GcpClientTrait: Send + Sync {
    /// Project the client queries
    fn project_id(&self) -> &str;

    /// List one page of zones matching `options.filter`
    async fn list_compute_zones(&self, options: ListComputeZonesOptions) -> Result<ZoneList, GcpError>;

    /// List images matching `options.filter`
    async fn list_compute_images(&self, options: ListComputeImagesOptions) -> Result<ImageList, GcpError>;
}
