//! MachineSet (machine.openshift.io/v1beta1)
//!
//! Output of the controller. These objects are applied to the remote
//! cluster by a separate component, so only the fields the controller
//! generates are modelled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "machine.openshift.io",
    version = "v1beta1",
    kind = "MachineSet",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSetSpec {
    pub replicas: i32,
    pub selector: LabelSelector,
    pub template: MachineTemplateSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineTemplateSpec {
    /// Labels stamped onto every machine of the set
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Labels the machines' nodes register with
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_labels: BTreeMap<String, String>,
    pub provider_spec: GcpMachineProviderSpec,
}

/// GCP provider configuration for a machine
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GcpMachineProviderSpec {
    pub machine_type: String,
    pub region: String,
    pub zone: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub disks: Vec<GcpDisk>,
    pub network_interfaces: Vec<GcpNetworkInterface>,
    pub service_accounts: Vec<GcpServiceAccount>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user_data_secret: SecretReference,
    pub credentials_secret: SecretReference,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpDisk {
    pub auto_delete: bool,
    pub boot: bool,
    pub size_gb: i64,
    #[serde(rename = "type")]
    pub disk_type: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpNetworkInterface {
    pub network: String,
    pub subnetwork: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpServiceAccount {
    pub email: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct SecretReference {
    pub name: String,
}
