//! MachinePool Controller
//!
//! Generates the GCP `MachineSet`s for Hive `MachinePool`s. Pools on
//! clusters that cannot address machine sets by a pool's full name get a
//! single-character name, claimed through `MachinePoolNameLease` objects.

mod config;
mod controller;
mod error;
mod reconciler;
mod remotemachineset;
mod store;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // kube and reqwest both use rustls; pick the provider once per process
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting MachinePool Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace);
    info!("  Compute URL: {}", config.gcp_compute_url);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
