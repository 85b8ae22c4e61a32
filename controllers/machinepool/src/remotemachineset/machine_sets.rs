//! Assembles the GCP `MachineSet`s for a pool.
//!
//! Pure: every input has been resolved by the caller. One machine set is
//! generated per zone, named `<infraID>-<pool>-<zone suffix>`.

use crate::error::ControllerError;
use crds::{
    GcpDisk, GcpMachineProviderSpec, GcpNetworkInterface, GcpServiceAccount, LabelSelector,
    MACHINE_API_NAMESPACE, MACHINE_CLUSTER_LABEL, MACHINE_ROLE_LABEL, MACHINE_SET_LABEL,
    MACHINE_TYPE_LABEL, MachineSet, MachineSetSpec, MachineTemplateSpec, SecretReference,
};
use std::collections::BTreeMap;

/// Boot disk type of generated machines
pub const DISK_TYPE: &str = "pd-ssd";

/// Boot disk size of generated machines, in GB
pub const DISK_SIZE_GB: i64 = 128;

/// Role of every generated machine set
pub const WORKER_ROLE: &str = "worker";

/// Secret holding the cloud credentials on the remote cluster
pub const CREDENTIALS_SECRET: &str = "gcp-cloud-credentials";

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Everything needed to generate a pool's machine sets
#[derive(Debug, Clone)]
pub struct MachineSetParams<'a> {
    pub infra_id: &'a str,
    pub region: &'a str,
    pub project_id: &'a str,
    /// Name used in machine set names: the leased character or the pool's
    /// logical name
    pub pool_name: &'a str,
    pub zones: &'a [String],
    pub instance_type: &'a str,
    pub replicas: i64,
    pub image: &'a str,
    pub role: &'a str,
    pub user_data_secret: &'a str,
    pub node_labels: &'a BTreeMap<String, String>,
}

/// Zone with the `<region>-` prefix removed
pub fn zone_suffix<'z>(region: &str, zone: &'z str) -> &'z str {
    zone.strip_prefix(region)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(zone)
}

/// Split `total` replicas across `zones` zones, earlier zones taking the
/// remainder.
pub fn replicas_per_zone(total: i64, zones: usize) -> Vec<i64> {
    if zones == 0 {
        return Vec::new();
    }
    let n = zones as i64;
    (0..n)
        .map(|idx| total / n + if idx < total % n { 1 } else { 0 })
        .collect()
}

pub fn build_machine_sets(params: &MachineSetParams<'_>) -> Result<Vec<MachineSet>, ControllerError> {
    if params.zones.is_empty() {
        return Err(ControllerError::MachineSetGeneration("no zones to place machines in".to_string()));
    }
    if params.replicas < 0 {
        return Err(ControllerError::MachineSetGeneration(format!(
            "replicas must not be negative, got {}",
            params.replicas
        )));
    }
    if params.infra_id.is_empty() || params.pool_name.is_empty() {
        return Err(ControllerError::MachineSetGeneration(
            "infrastructure ID and pool name are required".to_string(),
        ));
    }

    let counts = replicas_per_zone(params.replicas, params.zones.len());
    params
        .zones
        .iter()
        .zip(counts)
        .map(|(zone, replicas)| build_machine_set(params, zone, replicas))
        .collect()
}

fn build_machine_set(
    params: &MachineSetParams<'_>,
    zone: &str,
    replicas: i64,
) -> Result<MachineSet, ControllerError> {
    let name = format!(
        "{}-{}-{}",
        params.infra_id,
        params.pool_name,
        zone_suffix(params.region, zone)
    );
    let replicas = i32::try_from(replicas).map_err(|_| {
        ControllerError::MachineSetGeneration(format!("too many replicas for machine set {}", name))
    })?;

    let labels = BTreeMap::from([
        (MACHINE_CLUSTER_LABEL.to_string(), params.infra_id.to_string()),
        (MACHINE_ROLE_LABEL.to_string(), params.role.to_string()),
        (MACHINE_TYPE_LABEL.to_string(), params.role.to_string()),
    ]);

    let mut machine_set = MachineSet::new(
        &name,
        MachineSetSpec {
            replicas,
            selector: LabelSelector {
                match_labels: BTreeMap::from([
                    (MACHINE_CLUSTER_LABEL.to_string(), params.infra_id.to_string()),
                    (MACHINE_SET_LABEL.to_string(), name.clone()),
                ]),
            },
            template: MachineTemplateSpec {
                labels: {
                    let mut template_labels = labels.clone();
                    template_labels.insert(MACHINE_SET_LABEL.to_string(), name.clone());
                    template_labels
                },
                node_labels: params.node_labels.clone(),
                provider_spec: provider_spec(params, zone),
            },
        },
    );
    machine_set.metadata.namespace = Some(MACHINE_API_NAMESPACE.to_string());
    machine_set.metadata.labels = Some(labels);
    Ok(machine_set)
}

fn provider_spec(params: &MachineSetParams<'_>, zone: &str) -> GcpMachineProviderSpec {
    let infra = params.infra_id;
    // Service account IDs are capped at 30 characters
    let account_prefix: String = infra.chars().take(12).collect();

    GcpMachineProviderSpec {
        machine_type: params.instance_type.to_string(),
        region: params.region.to_string(),
        zone: zone.to_string(),
        project_id: params.project_id.to_string(),
        disks: vec![GcpDisk {
            auto_delete: true,
            boot: true,
            size_gb: DISK_SIZE_GB,
            disk_type: DISK_TYPE.to_string(),
            image: params.image.to_string(),
        }],
        network_interfaces: vec![GcpNetworkInterface {
            network: format!("{}-network", infra),
            subnetwork: format!("{}-worker-subnet", infra),
        }],
        service_accounts: vec![GcpServiceAccount {
            email: format!("{}-w@{}.iam.gserviceaccount.com", account_prefix, params.project_id),
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
        }],
        tags: vec![format!("{}-worker", infra)],
        user_data_secret: SecretReference {
            name: params.user_data_secret.to_string(),
        },
        credentials_secret: SecretReference {
            name: CREDENTIALS_SECRET.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(names: &[&str]) -> Vec<String> {
        names.iter().map(|z| z.to_string()).collect()
    }

    static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

    fn params<'a>(zones: &'a [String], replicas: i64) -> MachineSetParams<'a> {
        MachineSetParams {
            infra_id: "abc123",
            region: "us-east1",
            project_id: "test-project",
            pool_name: "k",
            zones,
            instance_type: "n1-standard-4",
            replicas,
            image: "abc123-rhcos-image",
            role: WORKER_ROLE,
            user_data_secret: "worker-user-data",
            node_labels: &NO_LABELS,
        }
    }

    #[test]
    fn test_zone_suffix() {
        assert_eq!(zone_suffix("us-east1", "us-east1-b"), "b");
        assert_eq!(zone_suffix("us-east1", "europe-west1-c"), "europe-west1-c");
    }

    #[test]
    fn test_replicas_spread_with_remainder_first() {
        assert_eq!(replicas_per_zone(5, 3), vec![2, 2, 1]);
        assert_eq!(replicas_per_zone(3, 3), vec![1, 1, 1]);
        assert_eq!(replicas_per_zone(1, 3), vec![1, 0, 0]);
        assert_eq!(replicas_per_zone(0, 2), vec![0, 0]);
        assert!(replicas_per_zone(4, 0).is_empty());
    }

    #[test]
    fn test_one_machine_set_per_zone() {
        let zones = zones(&["us-east1-b", "us-east1-c", "us-east1-d"]);
        let sets = build_machine_sets(&params(&zones, 4)).unwrap();

        let names: Vec<_> = sets.iter().map(|s| s.metadata.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["abc123-k-b", "abc123-k-c", "abc123-k-d"]);
        let replicas: Vec<_> = sets.iter().map(|s| s.spec.replicas).collect();
        assert_eq!(replicas, vec![2, 1, 1]);
        assert!(
            sets.iter()
                .all(|s| s.metadata.namespace.as_deref() == Some(MACHINE_API_NAMESPACE))
        );
    }

    #[test]
    fn test_provider_spec_fields() {
        let zones = zones(&["us-east1-b"]);
        let sets = build_machine_sets(&params(&zones, 1)).unwrap();
        let spec = &sets[0].spec.template.provider_spec;

        assert_eq!(spec.machine_type, "n1-standard-4");
        assert_eq!(spec.zone, "us-east1-b");
        assert_eq!(spec.project_id, "test-project");
        assert_eq!(spec.disks.len(), 1);
        assert_eq!(spec.disks[0].disk_type, "pd-ssd");
        assert_eq!(spec.disks[0].size_gb, 128);
        assert_eq!(spec.disks[0].image, "abc123-rhcos-image");
        assert_eq!(spec.network_interfaces[0].network, "abc123-network");
        assert_eq!(spec.network_interfaces[0].subnetwork, "abc123-worker-subnet");
        assert_eq!(spec.tags, vec!["abc123-worker"]);
        assert_eq!(spec.service_accounts[0].email, "abc123-w@test-project.iam.gserviceaccount.com");
        assert_eq!(spec.user_data_secret.name, "worker-user-data");
        assert_eq!(spec.credentials_secret.name, CREDENTIALS_SECRET);
    }

    #[test]
    fn test_labels_and_selector() {
        let zones = zones(&["us-east1-b"]);
        let sets = build_machine_sets(&params(&zones, 1)).unwrap();
        let set = &sets[0];

        let selector = &set.spec.selector.match_labels;
        assert_eq!(selector.get(MACHINE_CLUSTER_LABEL).map(String::as_str), Some("abc123"));
        assert_eq!(selector.get(MACHINE_SET_LABEL).map(String::as_str), Some("abc123-k-b"));

        let template = &set.spec.template.labels;
        assert_eq!(template.get(MACHINE_ROLE_LABEL).map(String::as_str), Some("worker"));
        assert_eq!(template.get(MACHINE_TYPE_LABEL).map(String::as_str), Some("worker"));
        assert_eq!(template.get(MACHINE_SET_LABEL).map(String::as_str), Some("abc123-k-b"));

        let labels = set.metadata.labels.as_ref().unwrap();
        assert!(!labels.contains_key(MACHINE_SET_LABEL));
        assert!(set.spec.template.node_labels.is_empty());
    }

    #[test]
    fn test_pool_labels_become_node_labels() {
        let zones = zones(&["us-east1-b", "us-east1-c"]);
        let node_labels = BTreeMap::from([("node-role.kubernetes.io/infra".to_string(), String::new())]);
        let mut p = params(&zones, 2);
        p.node_labels = &node_labels;

        let sets = build_machine_sets(&p).unwrap();

        assert!(sets.iter().all(|s| s.spec.template.node_labels == node_labels));
        assert!(
            !sets[0]
                .spec
                .template
                .labels
                .contains_key("node-role.kubernetes.io/infra")
        );
    }

    #[test]
    fn test_long_infra_id_truncated_in_service_account() {
        let zones = zones(&["us-east1-b"]);
        let mut p = params(&zones, 1);
        p.infra_id = "averylonginfraid-x7k2p";
        let sets = build_machine_sets(&p).unwrap();

        assert_eq!(
            sets[0].spec.template.provider_spec.service_accounts[0].email,
            "averylonginf-w@test-project.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_rejects_invalid_input() {
        let none: Vec<String> = Vec::new();
        assert!(matches!(
            build_machine_sets(&params(&none, 1)),
            Err(ControllerError::MachineSetGeneration(_))
        ));

        let zones = zones(&["us-east1-b"]);
        assert!(build_machine_sets(&params(&zones, -1)).is_err());
    }
}
