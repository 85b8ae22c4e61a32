//! Controller configuration from environment variables.

use crate::error::ControllerError;
use std::env;

/// Default Compute Engine REST endpoint
pub const DEFAULT_COMPUTE_URL: &str = "https://compute.googleapis.com/compute/v1";

#[derive(Clone)]
pub struct Config {
    /// Namespace whose MachinePools and leases are watched
    pub namespace: String,
    /// Bearer token for the Compute Engine API
    pub gcp_access_token: String,
    pub gcp_compute_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("namespace", &self.namespace)
            .field("gcp_access_token", &"<redacted>")
            .field("gcp_compute_url", &self.gcp_compute_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gcp_access_token = non_empty("GCP_ACCESS_TOKEN").ok_or_else(|| {
            ControllerError::InvalidConfig("GCP_ACCESS_TOKEN environment variable is required".to_string())
        })?;
        let namespace = non_empty("WATCH_NAMESPACE").unwrap_or_else(|| "default".to_string());
        let gcp_compute_url = non_empty("GCP_COMPUTE_URL").unwrap_or_else(|| DEFAULT_COMPUTE_URL.to_string());

        Ok(Self {
            namespace,
            gcp_access_token,
            gcp_compute_url,
        })
    }
}
