//! MachinePoolNameLease CRD
//!
//! Claims one single-character pool name within a cluster. The claimed
//! character is the last character of the object name (`<infraID>-<char>`);
//! the API server rejecting duplicate names is what keeps claims unique.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "MachinePoolNameLease",
    namespaced
)]
pub struct MachinePoolNameLeaseSpec {}

impl MachinePoolNameLease {
    /// Label value `key` on this lease, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }
}
