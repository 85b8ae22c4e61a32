//! Machine set generation for remote clusters.
//!
//! An `Actuator` turns a `MachinePool` into the `MachineSet`s to apply on
//! the pool's cluster. Pools on clusters that cannot address machine sets
//! by the pool's full name are named through single-character leases.

pub mod alphabet;
pub mod conditions;
pub mod expectations;
pub mod gcp_actuator;
pub mod lease_policy;
pub mod leases;
pub mod machine_sets;
pub mod topology;


use crate::error::ControllerError;
use crds::{ClusterDeployment, MachinePool, MachineSet};

pub use expectations::ExpectationTracker;
pub use gcp_actuator::GcpActuator;

/// Generates the machine sets for a pool on a particular cloud
#[async_trait::async_trait]
pub trait Actuator: Send + Sync {
    /// Machine sets for `pool`, and whether they are final.
    ///
    /// `(_, false)` without an error means nothing can be generated yet:
    /// a lease is pending or every name is taken. Call again once state
    /// has settled. The pool's status conditions may be updated in place.
    async fn generate_machine_sets(
        &self,
        cd: &ClusterDeployment,
        pool: &mut MachinePool,
    ) -> Result<(Vec<MachineSet>, bool), ControllerError>;
}
