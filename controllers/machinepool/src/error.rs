//! Controller-specific error types.
//!
//! This module defines error types specific to the MachinePool Controller
//! that are not covered by upstream library errors.

use crate::store::StoreError;
use gcp_client::GcpError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the MachinePool Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Compute Engine API error
    #[error("GCP error: {0}")]
    Gcp(#[from] GcpError),

    /// Lease or pool record store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid controller configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// ClusterDeployment or MachinePool is missing a required section
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An existing lease does not match the name its owner implies
    #[error("Lease integrity error: {0}")]
    LeaseIntegrity(String),

    /// No boot image found for the cluster
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    /// More than one boot image matches the cluster
    #[error("Ambiguous image: {0}")]
    AmbiguousImage(String),

    /// Zone resolution produced nothing usable
    #[error("Zone lookup failed: {0}")]
    ZoneLookup(String),

    /// Machine set assembly rejected its input
    #[error("Machine set generation failed: {0}")]
    MachineSetGeneration(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
