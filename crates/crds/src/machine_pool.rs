//! MachinePool CRD
//!
//! Desired compute pool for a `ClusterDeployment`. The controller only
//! writes `status.conditions`.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition type set while every lease character of a cluster is taken.
pub const NO_MACHINE_POOL_NAME_LEASES_AVAILABLE: &str = "NoMachinePoolNameLeasesAvailable";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "MachinePool",
    namespaced,
    status = "MachinePoolStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolSpec {
    /// ClusterDeployment this pool belongs to (same namespace)
    pub cluster_deployment_ref: LocalObjectReference,

    /// Logical pool name as configured by the user (e.g., "worker", "infra")
    pub name: String,

    /// Total number of machines across all zones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,

    /// Platform specific settings
    #[serde(default)]
    pub platform: MachinePoolPlatform,

    /// Labels applied to the nodes of this pool
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct LocalObjectReference {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolPlatform {
    /// Google Cloud machine settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpMachinePool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpMachinePool {
    /// Zones to spread machines across. Empty means every zone of the
    /// cluster's region that is up.
    #[serde(default)]
    pub zones: Vec<String>,

    /// Instance type (e.g., "n1-standard-4")
    #[serde(rename = "type")]
    pub instance_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolStatus {
    /// Status conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<MachinePoolCondition>,

    /// Machine sets this pool owns on the remote cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_sets: Vec<MachineSetStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachineSetStatus {
    /// Name of the machine set on the remote cluster
    pub name: String,

    #[serde(default)]
    pub replicas: i32,
}

/// Condition status following Kubernetes conventions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition on a MachinePool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolCondition {
    /// Type of condition (e.g., NoMachinePoolNameLeasesAvailable)
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the condition was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probe_time: Option<DateTime<Utc>>,

    /// Last time the status flipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl MachinePool {
    /// `namespace/name` of this pool. Stable identity used for expectations
    /// and log lines.
    pub fn key(&self) -> String {
        format!(
            "{}/{}",
            self.metadata.namespace.as_deref().unwrap_or("default"),
            self.metadata.name.as_deref().unwrap_or_default()
        )
    }

    /// Conditions currently recorded on the pool.
    pub fn conditions(&self) -> &[MachinePoolCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }
}
