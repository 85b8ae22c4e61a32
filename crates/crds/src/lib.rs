//! Machine Pool CRD Definitions
//!
//! Kubernetes resource types shared by the machine pool controller:
//! the Hive-managed `ClusterDeployment`, `MachinePool` and
//! `MachinePoolNameLease` resources, plus the `MachineSet` objects the
//! controller generates for the remote cluster.

pub mod constants;
pub mod cluster_deployment;
pub mod machine_pool;
pub mod machine_pool_name_lease;
pub mod machine_set;

pub use constants::*;
pub use cluster_deployment::*;
pub use machine_pool::*;
pub use machine_pool_name_lease::*;
pub use machine_set::*;
