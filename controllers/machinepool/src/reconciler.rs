//! Reconciliation logic for MachinePool CRDs.
//!
//! Builds a GCP actuator for the pool's cluster and generates the pool's
//! machine sets. Applying them to the remote cluster is left to the
//! component that syncs remote resources.

use crate::config::Config;
use crate::error::ControllerError;
use crate::remotemachineset::{Actuator, ExpectationTracker, GcpActuator};
use crate::store::RecordStore;
use crds::{ClusterDeployment, MachinePool};
use dashmap::DashMap;
use gcp_client::{GcpClient, GcpClientTrait};
use kube::Api;
use kube::api::ListParams;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Machine sets were generated; their names
    Generated(Vec<String>),
    /// Nothing to generate yet; the pool is waiting on its lease
    Waiting,
}

/// Compute clients keyed by project, built on first use so each project
/// keeps one connection pool
#[derive(Default)]
pub struct GcpClientCache {
    clients: DashMap<String, Arc<dyn GcpClientTrait>>,
}

impl std::fmt::Debug for GcpClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpClientCache")
            .field("projects", &self.clients.len())
            .finish()
    }
}

impl GcpClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client for `project_id`, calling `build` only when none is cached
    pub fn get_or_try_insert<F>(&self, project_id: &str, build: F) -> Result<Arc<dyn GcpClientTrait>, ControllerError>
    where
        F: FnOnce() -> Result<Arc<dyn GcpClientTrait>, ControllerError>,
    {
        if let Some(client) = self.clients.get(project_id) {
            return Ok(client.value().clone());
        }
        let client = build()?;
        debug!("Created GCP client for project {}", project_id);
        Ok(self
            .clients
            .entry(project_id.to_string())
            .or_insert(client)
            .value()
            .clone())
    }
}

/// Reconciles MachinePool resources.
pub struct Reconciler {
    config: Config,
    gcp_clients: GcpClientCache,
    store: Arc<dyn RecordStore>,
    expectations: Arc<ExpectationTracker>,
    cluster_deployment_api: Api<ClusterDeployment>,
    machine_pool_api: Api<MachinePool>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        config: Config,
        store: Arc<dyn RecordStore>,
        expectations: Arc<ExpectationTracker>,
        cluster_deployment_api: Api<ClusterDeployment>,
        machine_pool_api: Api<MachinePool>,
    ) -> Self {
        Self {
            config,
            gcp_clients: GcpClientCache::new(),
            store,
            expectations,
            cluster_deployment_api,
            machine_pool_api,
        }
    }

    /// Expectation tracker shared with the lease watcher
    pub fn expectations(&self) -> &Arc<ExpectationTracker> {
        &self.expectations
    }

    /// Reconciles a MachinePool resource.
    ///
    /// This method:
    /// 1. Fetches the pool's ClusterDeployment
    /// 2. Collects the machine set names of every pool of that cluster
    /// 3. Builds a GCP actuator for the cluster's project
    /// 4. Generates the pool's machine sets
    pub async fn reconcile_machine_pool(&self, pool: &MachinePool) -> Result<ReconcileOutcome, ControllerError> {
        let key = pool.key();
        info!("Reconciling MachinePool {}", key);

        let cd_name = &pool.spec.cluster_deployment_ref.name;
        let cd = self.cluster_deployment_api.get(cd_name).await?;

        let project_id = cd
            .spec
            .platform
            .gcp
            .as_ref()
            .map(|gcp| gcp.project_id.clone())
            .ok_or_else(|| ControllerError::InvalidInput(format!("ClusterDeployment {} is not for GCP", cd_name)))?;
        let cluster_version = cd
            .status
            .as_ref()
            .and_then(|s| s.cluster_version.clone())
            .unwrap_or_default();

        let remote_machine_sets = self.cluster_machine_sets(cd_name).await?;
        debug!(
            "Cluster {} has {} machine sets across its pools",
            cd_name,
            remote_machine_sets.len()
        );

        let gcp = self.gcp_clients.get_or_try_insert(&project_id, || {
            let client = GcpClient::new(
                self.config.gcp_compute_url.clone(),
                self.config.gcp_access_token.clone(),
                project_id.clone(),
            )?;
            Ok(Arc::new(client) as Arc<dyn GcpClientTrait>)
        })?;
        let actuator = GcpActuator::new(
            gcp,
            self.store.clone(),
            self.expectations.clone(),
            &cluster_version,
            &remote_machine_sets,
        );

        let mut pool = pool.clone();
        let (machine_sets, ready) = actuator.generate_machine_sets(&cd, &mut pool).await?;
        if !ready {
            info!("MachinePool {} is waiting for a pool name lease", key);
            return Ok(ReconcileOutcome::Waiting);
        }

        let names: Vec<String> = machine_sets
            .iter()
            .filter_map(|ms| ms.metadata.name.clone())
            .collect();
        info!("Generated machine sets for MachinePool {}: {}", key, names.join(", "));
        Ok(ReconcileOutcome::Generated(names))
    }

    /// Names of the machine sets owned by pools of `cd_name`, as recorded in
    /// pool status
    async fn cluster_machine_sets(&self, cd_name: &str) -> Result<Vec<String>, ControllerError> {
        let pools = self
            .machine_pool_api
            .list(&ListParams::default())
            .await
            .inspect_err(|e| warn!("Failed to list MachinePools for {}: {}", cd_name, e))?;
        Ok(machine_set_names(&pools.items, cd_name))
    }
}

/// Machine set names recorded in the status of the pools of `cd_name`
pub fn machine_set_names(pools: &[MachinePool], cd_name: &str) -> Vec<String> {
    pools
        .iter()
        .filter(|p| p.spec.cluster_deployment_ref.name == cd_name)
        .filter_map(|p| p.status.as_ref())
        .flat_map(|s| s.machine_sets.iter().map(|ms| ms.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_machine_pool;
    use crds::{MachinePoolStatus, MachineSetStatus};
    use gcp_client::MockGcpClient;

    fn with_machine_sets(mut pool: MachinePool, names: &[&str]) -> MachinePool {
        pool.status = Some(MachinePoolStatus {
            conditions: Vec::new(),
            machine_sets: names
                .iter()
                .map(|n| MachineSetStatus {
                    name: n.to_string(),
                    replicas: 1,
                })
                .collect(),
        });
        pool
    }

    #[test]
    fn test_machine_set_names_scoped_to_cluster() {
        let pools = vec![
            with_machine_sets(create_test_machine_pool("cd-a", "worker", &[]), &["abc123-w-b", "abc123-w-c"]),
            with_machine_sets(create_test_machine_pool("cd-a", "infra", &[]), &["abc123-infra-b"]),
            with_machine_sets(create_test_machine_pool("cd-b", "worker", &[]), &["xyz789-worker-b"]),
            create_test_machine_pool("cd-a", "gpu", &[]),
        ];

        let names = machine_set_names(&pools, "cd-a");

        assert_eq!(names, vec!["abc123-w-b", "abc123-w-c", "abc123-infra-b"]);
    }

    #[test]
    fn test_gcp_client_built_once_per_project() {
        let cache = GcpClientCache::new();
        let mut builds = 0;
        let mut build = |project: &str| -> Result<Arc<dyn GcpClientTrait>, ControllerError> {
            builds += 1;
            Ok(Arc::new(MockGcpClient::new(project)) as Arc<dyn GcpClientTrait>)
        };

        let first = cache.get_or_try_insert("project-a", || build("project-a")).unwrap();
        let again = cache.get_or_try_insert("project-a", || build("project-a")).unwrap();
        let other = cache.get_or_try_insert("project-b", || build("project-b")).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(other.project_id(), "project-b");
        assert_eq!(builds, 2);
    }

    #[test]
    fn test_failed_client_build_is_not_cached() {
        let cache = GcpClientCache::new();

        let result = cache.get_or_try_insert("project-a", || {
            Err(ControllerError::InvalidConfig("bad compute url".to_string()))
        });
        assert!(result.is_err());

        let client = cache
            .get_or_try_insert("project-a", || {
                Ok(Arc::new(MockGcpClient::new("project-a")) as Arc<dyn GcpClientTrait>)
            })
            .unwrap();
        assert_eq!(client.project_id(), "project-a");
    }
}
