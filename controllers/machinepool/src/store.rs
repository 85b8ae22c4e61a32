//! Record store for leases and pool status.
//!
//! The allocator talks to the store through `RecordStore` so tests can
//! count calls and script failures. The Kubernetes implementation relies on
//! the API server rejecting duplicate object names: lease creation is an
//! atomic create-if-absent, and a conflict surfaces as
//! `StoreError::AlreadyExists`.

use crds::{CLUSTER_DEPLOYMENT_NAME_LABEL, MachinePool, MachinePoolCondition, MachinePoolNameLease};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

/// Errors returned by a `RecordStore`
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same identifier already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The record to update no longer exists
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other Kubernetes API failure
    #[error(transparent)]
    Kube(kube::Error),
}

impl StoreError {
    fn from_kube(err: kube::Error, name: &str) -> Self {
        match &err {
            kube::Error::Api(status) if status.code == 409 => StoreError::AlreadyExists(name.to_string()),
            kube::Error::Api(status) if status.code == 404 => StoreError::NotFound(name.to_string()),
            _ => StoreError::Kube(err),
        }
    }
}

/// Persistent records the allocator reads and writes
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// List leases in `namespace` labelled for `cluster_deployment`
    async fn list_leases(
        &self,
        namespace: &str,
        cluster_deployment: &str,
    ) -> Result<Vec<MachinePoolNameLease>, StoreError>;

    /// Create `lease`; fails with `AlreadyExists` if its name is taken
    async fn create_lease(&self, lease: &MachinePoolNameLease) -> Result<(), StoreError>;

    /// Replace the status conditions of `pool`
    async fn update_pool_conditions(
        &self,
        pool: &MachinePool,
        conditions: &[MachinePoolCondition],
    ) -> Result<(), StoreError>;
}

/// `RecordStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeRecordStore {
    client: Client,
}

impl std::fmt::Debug for KubeRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeRecordStore").finish_non_exhaustive()
    }
}

impl KubeRecordStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RecordStore for KubeRecordStore {
    async fn list_leases(
        &self,
        namespace: &str,
        cluster_deployment: &str,
    ) -> Result<Vec<MachinePoolNameLease>, StoreError> {
        let api: Api<MachinePoolNameLease> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default()
            .labels(&format!("{}={}", CLUSTER_DEPLOYMENT_NAME_LABEL, cluster_deployment));
        let list = api
            .list(&lp)
            .await
            .map_err(|e| StoreError::from_kube(e, cluster_deployment))?;
        debug!("Found {} leases for {}/{}", list.items.len(), namespace, cluster_deployment);
        Ok(list.items)
    }

    async fn create_lease(&self, lease: &MachinePoolNameLease) -> Result<(), StoreError> {
        let namespace = lease.metadata.namespace.as_deref().unwrap_or("default");
        let name = lease.metadata.name.as_deref().unwrap_or_default();
        let api: Api<MachinePoolNameLease> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), lease)
            .await
            .map_err(|e| StoreError::from_kube(e, name))?;
        Ok(())
    }

    async fn update_pool_conditions(
        &self,
        pool: &MachinePool,
        conditions: &[MachinePoolCondition],
    ) -> Result<(), StoreError> {
        let namespace = pool.metadata.namespace.as_deref().unwrap_or("default");
        let name = pool.metadata.name.as_deref().unwrap_or_default();
        let api: Api<MachinePool> = Api::namespaced(self.client.clone(), namespace);

        // Merge patches replace lists wholesale, so the full condition set is sent
        let status_patch = serde_json::json!({
            "status": {
                "conditions": conditions,
            }
        });
        let pp = PatchParams::default();
        api.patch_status(name, &pp, &Patch::Merge(&status_patch))
            .await
            .map_err(|e| StoreError::from_kube(e, name))?;
        Ok(())
    }
}
