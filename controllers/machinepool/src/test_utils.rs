//! Test utilities for unit testing the actuator
//!
//! This module provides an in-memory record store and helpers for creating
//! test data.

#[cfg(test)]
use crate::store::{RecordStore, StoreError};
#[cfg(test)]
use crds::*;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// How the next `create_lease` call should fail, if at all
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum CreateFailure {
    AlreadyExists,
    NotFound,
}

/// In-memory RecordStore for testing
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct MockRecordStore {
    leases: Arc<Mutex<Vec<MachinePoolNameLease>>>,
    created: Arc<Mutex<Vec<MachinePoolNameLease>>>,
    condition_updates: Arc<Mutex<Vec<Vec<MachinePoolCondition>>>>,
    fail_next_create: Arc<Mutex<Option<CreateFailure>>>,
}

#[cfg(test)]
impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `leases`
    pub fn with_leases(leases: Vec<MachinePoolNameLease>) -> Self {
        let store = Self::new();
        *store.leases.lock().unwrap() = leases;
        store
    }

    /// Fail the next create with `failure` (for test setup)
    pub fn fail_next_create(&self, failure: CreateFailure) {
        *self.fail_next_create.lock().unwrap() = Some(failure);
    }

    /// Leases currently stored
    pub fn leases(&self) -> Vec<MachinePoolNameLease> {
        self.leases.lock().unwrap().clone()
    }

    /// Leases successfully created through the store
    pub fn created(&self) -> Vec<MachinePoolNameLease> {
        self.created.lock().unwrap().clone()
    }

    /// Number of successful create calls
    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Condition sets written, in order
    pub fn condition_updates(&self) -> Vec<Vec<MachinePoolCondition>> {
        self.condition_updates.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn list_leases(
        &self,
        namespace: &str,
        cluster_deployment: &str,
    ) -> Result<Vec<MachinePoolNameLease>, StoreError> {
        Ok(self
            .leases
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.metadata.namespace.as_deref() == Some(namespace))
            .filter(|l| l.label(CLUSTER_DEPLOYMENT_NAME_LABEL) == Some(cluster_deployment))
            .cloned()
            .collect())
    }

    async fn create_lease(&self, lease: &MachinePoolNameLease) -> Result<(), StoreError> {
        let name = lease.metadata.name.clone().unwrap_or_default();
        match self.fail_next_create.lock().unwrap().take() {
            Some(CreateFailure::AlreadyExists) => return Err(StoreError::AlreadyExists(name)),
            Some(CreateFailure::NotFound) => return Err(StoreError::NotFound(name)),
            None => {}
        }

        let mut leases = self.leases.lock().unwrap();
        if leases.iter().any(|l| l.metadata.name.as_deref() == Some(name.as_str())) {
            return Err(StoreError::AlreadyExists(name));
        }
        leases.push(lease.clone());
        self.created.lock().unwrap().push(lease.clone());
        Ok(())
    }

    async fn update_pool_conditions(
        &self,
        _pool: &MachinePool,
        conditions: &[MachinePoolCondition],
    ) -> Result<(), StoreError> {
        self.condition_updates.lock().unwrap().push(conditions.to_vec());
        Ok(())
    }
}

/// Helper to create test ClusterDeployment with GCP platform and metadata
#[cfg(test)]
pub fn create_test_cluster_deployment(name: &str, infra_id: &str, version: &str) -> ClusterDeployment {
    ClusterDeployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("test-ns".to_string()),
            ..Default::default()
        },
        spec: ClusterDeploymentSpec {
            cluster_name: name.to_string(),
            platform: Platform {
                gcp: Some(GcpPlatform {
                    region: "us-east1".to_string(),
                    project_id: "test-project".to_string(),
                }),
            },
            cluster_metadata: Some(ClusterMetadata {
                infra_id: infra_id.to_string(),
            }),
        },
        status: Some(ClusterDeploymentStatus {
            cluster_version: Some(version.to_string()),
        }),
    }
}

/// Helper to create test MachinePool for `pool_name` on cluster `cd_name`
#[cfg(test)]
pub fn create_test_machine_pool(cd_name: &str, pool_name: &str, zones: &[&str]) -> MachinePool {
    MachinePool {
        metadata: ObjectMeta {
            name: Some(format!("{}-{}", cd_name, pool_name)),
            namespace: Some("test-ns".to_string()),
            uid: Some(format!("uid-{}", pool_name)),
            ..Default::default()
        },
        spec: MachinePoolSpec {
            cluster_deployment_ref: LocalObjectReference {
                name: cd_name.to_string(),
            },
            name: pool_name.to_string(),
            replicas: Some(3),
            platform: MachinePoolPlatform {
                gcp: Some(GcpMachinePool {
                    zones: zones.iter().map(|z| z.to_string()).collect(),
                    instance_type: "n1-standard-4".to_string(),
                }),
            },
            labels: BTreeMap::new(),
        },
        status: None,
    }
}

/// Helper to create test lease `<infra_id>-<lease_char>` owned by `pool`
#[cfg(test)]
pub fn create_test_lease(pool: &MachinePool, cd_name: &str, infra_id: &str, lease_char: char) -> MachinePoolNameLease {
    create_test_lease_named(pool, cd_name, &format!("{}-{}", infra_id, lease_char))
}

/// Helper to create test lease with an arbitrary object name
#[cfg(test)]
pub fn create_test_lease_named(pool: &MachinePool, cd_name: &str, name: &str) -> MachinePoolNameLease {
    let mut lease = MachinePoolNameLease::new(name, MachinePoolNameLeaseSpec {});
    lease.metadata.namespace = pool.metadata.namespace.clone();
    lease.metadata.labels = Some(BTreeMap::from([
        (
            MACHINE_POOL_NAME_LABEL.to_string(),
            pool.metadata.name.clone().unwrap_or_default(),
        ),
        (CLUSTER_DEPLOYMENT_NAME_LABEL.to_string(), cd_name.to_string()),
    ]));
    lease
}
