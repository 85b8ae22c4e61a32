//! Kubernetes resource watchers.
//!
//! MachinePool events trigger reconciliation. A lease showing up lowers its
//! pool's expectation and runs that pool again, which is the pass that
//! proceeds with the new character. A lease going away frees a character,
//! so every pool of its cluster is run again.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::remotemachineset::ExpectationTracker;
use crds::{CLUSTER_DEPLOYMENT_NAME_LABEL, MACHINE_POOL_NAME_LABEL, MachinePool, MachinePoolNameLease};
use futures::TryStreamExt;
use kube::Api;
use kube::api::ListParams;
use kube_runtime::watcher;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Expectation key of the pool owning `lease`, if the lease is labelled
pub fn lease_owner_key(lease: &MachinePoolNameLease) -> Option<String> {
    let pool_name = lease.label(MACHINE_POOL_NAME_LABEL)?;
    Some(format!(
        "{}/{}",
        lease.metadata.namespace.as_deref().unwrap_or("default"),
        pool_name
    ))
}

/// Lower the owning pool's expectation when a lease shows up
pub fn observe_lease(expectations: &ExpectationTracker, lease: &MachinePoolNameLease) {
    let name = lease.metadata.name.as_deref().unwrap_or("<unknown>");
    match lease_owner_key(lease) {
        Some(key) => {
            debug!("Observed lease {} for MachinePool {}", name, key);
            expectations.creation_observed(&key);
        }
        None => warn!("MachinePoolNameLease {} has no {} label", name, MACHINE_POOL_NAME_LABEL),
    }
}

/// Pools that may take the character `lease` held: the live pools of the
/// lease's cluster, in the lease's namespace
pub fn pools_sharing_cluster<'a>(lease: &MachinePoolNameLease, pools: &'a [MachinePool]) -> Vec<&'a MachinePool> {
    let Some(cd_name) = lease.label(CLUSTER_DEPLOYMENT_NAME_LABEL) else {
        return Vec::new();
    };
    let namespace = lease.metadata.namespace.as_deref();
    pools
        .iter()
        .filter(|p| p.metadata.namespace.as_deref() == namespace)
        .filter(|p| p.spec.cluster_deployment_ref.name == cd_name)
        .filter(|p| p.metadata.deletion_timestamp.is_none())
        .collect()
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    machine_pool_api: Api<MachinePool>,
    lease_api: Api<MachinePoolNameLease>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher").finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        machine_pool_api: Api<MachinePool>,
        lease_api: Api<MachinePoolNameLease>,
    ) -> Self {
        Self {
            reconciler,
            machine_pool_api,
            lease_api,
        }
    }

    async fn reconcile(&self, pool: &MachinePool) {
        let key = pool.key();
        match self.reconciler.reconcile_machine_pool(pool).await {
            Ok(outcome) => debug!("MachinePool {} reconciled: {:?}", key, outcome),
            Err(e) => error!("Failed to reconcile MachinePool {}: {}", key, e),
        }
    }

    /// Run the pool that owns `lease` again
    async fn reconcile_lease_owner(&self, lease: &MachinePoolNameLease) {
        let Some(pool_name) = lease.label(MACHINE_POOL_NAME_LABEL) else {
            return;
        };
        match self.machine_pool_api.get_opt(pool_name).await {
            Ok(Some(pool)) => self.reconcile(&pool).await,
            Ok(None) => debug!("Owner {} of lease is gone, nothing to reconcile", pool_name),
            Err(e) => warn!("Failed to fetch MachinePool {}: {}", pool_name, e),
        }
    }

    /// Run every pool of the cluster `lease` belonged to again
    async fn reconcile_cluster_pools(&self, lease: &MachinePoolNameLease) {
        let pools = match self.machine_pool_api.list(&ListParams::default()).await {
            Ok(list) => list.items,
            Err(e) => {
                warn!("Failed to list MachinePools after lease deletion: {}", e);
                return;
            }
        };
        for pool in pools_sharing_cluster(lease, &pools) {
            self.reconcile(pool).await;
        }
    }

    /// Starts watching MachinePool resources.
    pub async fn watch_machine_pools(&self) -> Result<(), ControllerError> {
        info!("Starting MachinePool watcher");

        let mut stream = Box::pin(watcher(self.machine_pool_api.clone(), watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Watcher stream error: {}", e)))?
        {
            match event {
                watcher::Event::Apply(pool) => {
                    info!("MachinePool applied: {}", pool.key());
                    self.reconcile(&pool).await;
                }
                watcher::Event::Delete(pool) => {
                    // Leases are owned by the pool and garbage collected with it
                    info!("MachinePool deleted: {}", pool.key());
                    self.reconciler.expectations().delete_expectations(&pool.key());
                }
                watcher::Event::Init => {
                    info!("MachinePool watcher initialized");
                }
                watcher::Event::InitApply(pool) => {
                    debug!("MachinePool init apply: {}", pool.key());
                    self.reconcile(&pool).await;
                }
                watcher::Event::InitDone => {
                    info!("MachinePool watcher initialization complete");
                }
            }
        }

        Ok(())
    }

    /// Starts watching MachinePoolNameLease resources.
    pub async fn watch_leases(&self) -> Result<(), ControllerError> {
        info!("Starting MachinePoolNameLease watcher");

        let mut stream = Box::pin(watcher(self.lease_api.clone(), watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Watcher stream error: {}", e)))?
        {
            match event {
                watcher::Event::Apply(lease) => {
                    observe_lease(self.reconciler.expectations(), &lease);
                    self.reconcile_lease_owner(&lease).await;
                }
                watcher::Event::InitApply(lease) => {
                    // The MachinePool watcher runs every pool on startup
                    observe_lease(self.reconciler.expectations(), &lease);
                }
                watcher::Event::Delete(lease) => {
                    let name = lease.metadata.name.as_deref().unwrap_or("<unknown>");
                    info!("MachinePoolNameLease deleted: {}", name);
                    self.reconcile_cluster_pools(&lease).await;
                }
                watcher::Event::Init => {
                    debug!("MachinePoolNameLease watcher initialized");
                }
                watcher::Event::InitDone => {
                    debug!("MachinePoolNameLease watcher initialization complete");
                }
            }
        }

        Ok(())
    }
}
