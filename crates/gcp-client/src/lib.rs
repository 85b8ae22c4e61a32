//! Google Compute Engine Query Client
//!
//! A small client for the two Compute Engine read operations the machine
//! pool controller needs: listing zones of a region and looking up the
//! boot image the installer uploaded for a cluster.
//!
//! # Example
//!
//! ```no_run
//! use gcp_client::{GcpClient, GcpClientTrait, ListComputeZonesOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GcpClient::new(
//!     "https://compute.googleapis.com/compute/v1".to_string(),
//!     "ya29.access-token".to_string(),
//!     "my-project".to_string(),
//! )?;
//!
//! let page = client
//!     .list_compute_zones(ListComputeZonesOptions {
//!         filter: "(region eq '.*us-east1.*') (status eq UP)".to_string(),
//!         page_token: String::new(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod gcp_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::GcpClient;
pub use error::GcpError;
pub use models::*;
pub use gcp_trait::GcpClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockGcpClient;
