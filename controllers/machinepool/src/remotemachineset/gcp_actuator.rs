//! GCP actuator: turns a MachinePool into GCP machine sets.

use super::Actuator;
use super::expectations::ExpectationTracker;
use super::lease_policy::{parse_version_tolerant, requires_leasing};
use super::leases::LeaseAllocator;
use super::machine_sets::{MachineSetParams, WORKER_ROLE, build_machine_sets};
use super::topology::{resolve_image, resolve_zones};
use crate::error::ControllerError;
use crate::store::RecordStore;
use crds::{ClusterDeployment, MachinePool, MachineSet};
use gcp_client::GcpClientTrait;
use semver::Version;
use std::sync::Arc;
use tracing::{debug, warn};

/// First cluster version whose workers boot from the managed user data secret
pub const MIN_VERSION_MANAGED_USER_DATA: Version = Version::new(4, 6, 0);

const WORKER_USER_DATA: &str = "worker-user-data";
const WORKER_USER_DATA_MANAGED: &str = "worker-user-data-managed";

/// Name of the user data secret workers of `cluster_version` boot from
pub fn worker_user_data(cluster_version: &str) -> Result<&'static str, ControllerError> {
    let version = parse_version_tolerant(cluster_version).ok_or_else(|| {
        ControllerError::InvalidInput(format!(
            "error determining worker user data secret: unable to parse cluster version {:?}",
            cluster_version
        ))
    })?;
    if version >= MIN_VERSION_MANAGED_USER_DATA {
        Ok(WORKER_USER_DATA_MANAGED)
    } else {
        Ok(WORKER_USER_DATA)
    }
}

/// Software version reported by the cluster
pub fn cluster_version(cd: &ClusterDeployment) -> Result<&str, ControllerError> {
    cd.status
        .as_ref()
        .and_then(|s| s.cluster_version.as_deref())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ControllerError::InvalidInput("Unable to get cluster version: no version reported".to_string())
        })
}

/// Generates machine sets for pools of one GCP cluster
pub struct GcpActuator {
    gcp: Arc<dyn GcpClientTrait>,
    store: Arc<dyn RecordStore>,
    allocator: LeaseAllocator,
    leases_required: bool,
}

impl std::fmt::Debug for GcpActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpActuator")
            .field("project_id", &self.gcp.project_id())
            .field("leases_required", &self.leases_required)
            .finish_non_exhaustive()
    }
}

impl GcpActuator {
    /// Build an actuator for a cluster at `cluster_version` whose pools own
    /// `remote_machine_sets` (machine set names on the remote cluster).
    pub fn new<S: AsRef<str>>(
        gcp: Arc<dyn GcpClientTrait>,
        store: Arc<dyn RecordStore>,
        expectations: Arc<ExpectationTracker>,
        cluster_version: &str,
        remote_machine_sets: &[S],
    ) -> Self {
        let leases_required = requires_leasing(cluster_version, remote_machine_sets);
        Self {
            gcp,
            allocator: LeaseAllocator::new(store.clone(), expectations),
            store,
            leases_required,
        }
    }

    pub fn leases_required(&self) -> bool {
        self.leases_required
    }
}

#[async_trait::async_trait]
impl Actuator for GcpActuator {
    async fn generate_machine_sets(
        &self,
        cd: &ClusterDeployment,
        pool: &mut MachinePool,
    ) -> Result<(Vec<MachineSet>, bool), ControllerError> {
        let infra_id = cd
            .spec
            .cluster_metadata
            .as_ref()
            .map(|m| m.infra_id.clone())
            .ok_or_else(|| ControllerError::InvalidInput("ClusterDeployment does not have cluster metadata".to_string()))?;
        let cd_gcp = cd
            .spec
            .platform
            .gcp
            .clone()
            .ok_or_else(|| ControllerError::InvalidInput("ClusterDeployment is not for GCP".to_string()))?;
        let pool_gcp = pool
            .spec
            .platform
            .gcp
            .clone()
            .ok_or_else(|| ControllerError::InvalidInput("MachinePool is not for GCP".to_string()))?;
        let version = cluster_version(cd)?.to_string();
        let key = pool.key();

        let namespace = pool.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
        let cd_name = cd.metadata.name.clone().unwrap_or_default();
        let leases = self
            .store
            .list_leases(&namespace, &cd_name)
            .await
            .inspect_err(|e| warn!("Error fetching MachinePoolNameLeases for {}/{}: {}", namespace, cd_name, e))?;

        // Once any lease exists the cluster stays on leased names
        let use_leases = if self.leases_required {
            debug!("Using leases since they are required by the cluster");
            true
        } else if !leases.is_empty() {
            debug!("Using leases since there are existing MachinePoolNameLeases");
            true
        } else {
            debug!("Not using leases");
            false
        };

        let pool_name = if use_leases {
            let outcome = self
                .allocator
                .obtain_lease(pool, cd, &leases)
                .await
                .inspect_err(|e| warn!("Error obtaining pool name lease for {}: {}", key, e))?;
            match outcome.lease_char() {
                Some(c) if outcome.proceed() => c.to_string(),
                _ => return Ok((Vec::new(), false)),
            }
        } else {
            pool.spec.name.clone()
        };

        let image = resolve_image(self.gcp.as_ref(), &infra_id).await?;

        let zones = if pool_gcp.zones.is_empty() {
            let zones = resolve_zones(self.gcp.as_ref(), &cd_gcp.region).await?;
            if zones.is_empty() {
                return Err(ControllerError::ZoneLookup(format!(
                    "zero zones returned for region {}",
                    cd_gcp.region
                )));
            }
            zones
        } else {
            pool_gcp.zones.clone()
        };

        let user_data_secret = worker_user_data(&version)?;

        let machine_sets = build_machine_sets(&MachineSetParams {
            infra_id: &infra_id,
            region: &cd_gcp.region,
            project_id: self.gcp.project_id(),
            pool_name: &pool_name,
            zones: &zones,
            instance_type: &pool_gcp.instance_type,
            replicas: pool.spec.replicas.unwrap_or(0),
            image: &image,
            role: WORKER_ROLE,
            user_data_secret,
            node_labels: &pool.spec.labels,
        })?;
        debug!("Generated {} machine sets for {}", machine_sets.len(), key);
        Ok((machine_sets, true))
    }
}
