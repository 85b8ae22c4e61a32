//! ClusterDeployment CRD
//!
//! The subset of a Hive `ClusterDeployment` the machine pool controller reads.
//! Owned by Hive; this controller never writes it.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "ClusterDeployment",
    namespaced,
    status = "ClusterDeploymentStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    /// Name of the cluster
    pub cluster_name: String,

    /// Cloud platform the cluster runs on
    #[serde(default)]
    pub platform: Platform,

    /// Metadata recorded once the cluster is installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metadata: Option<ClusterMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// Google Cloud platform settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpPlatform>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpPlatform {
    /// Region the cluster is installed in (e.g., "us-east1")
    pub region: String,

    /// GCP project holding the cluster's resources
    #[serde(rename = "projectID")]
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    /// Infrastructure ID, globally unique per cluster. Prefix of every
    /// cloud resource the installer created.
    #[serde(rename = "infraID")]
    pub infra_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentStatus {
    /// Software version reported by the installed cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,
}
