//! Label keys and API identifiers shared across resources.

/// API group of the Hive resources.
pub const HIVE_API_GROUP: &str = "hive.openshift.io";

/// `apiVersion` used in owner references to Hive resources.
pub const HIVE_API_VERSION: &str = "hive.openshift.io/v1";

/// Label carrying the name of the `ClusterDeployment` a resource belongs to.
pub const CLUSTER_DEPLOYMENT_NAME_LABEL: &str = "hive.openshift.io/cluster-deployment-name";

/// Label carrying the name of the `MachinePool` that owns a lease.
pub const MACHINE_POOL_NAME_LABEL: &str = "hive.openshift.io/machine-pool-name";

/// Namespace on the remote cluster where machine sets live.
pub const MACHINE_API_NAMESPACE: &str = "openshift-machine-api";

/// Machine API labels applied to generated machine sets.
pub const MACHINE_CLUSTER_LABEL: &str = "machine.openshift.io/cluster-api-cluster";
pub const MACHINE_ROLE_LABEL: &str = "machine.openshift.io/cluster-api-machine-role";
pub const MACHINE_TYPE_LABEL: &str = "machine.openshift.io/cluster-api-machine-type";
pub const MACHINE_SET_LABEL: &str = "machine.openshift.io/cluster-api-machineset";
