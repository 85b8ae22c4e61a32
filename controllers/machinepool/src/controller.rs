//! Main controller implementation.
//!
//! This module contains the `Controller` struct that orchestrates
//! reconciliation and resource watching for the MachinePool Controller.

use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::remotemachineset::ExpectationTracker;
use crate::store::{KubeRecordStore, RecordStore};
use crate::watcher::Watcher;
use crds::{ClusterDeployment, MachinePool, MachinePoolNameLease};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for MachinePool machine set generation.
#[derive(Debug)]
pub struct Controller {
    machine_pool_watcher: JoinHandle<Result<(), ControllerError>>,
    lease_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its watchers.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing MachinePool Controller");

        let kube_client = Client::try_default().await?;

        let ns = config.namespace.clone();
        let cluster_deployment_api: Api<ClusterDeployment> = Api::namespaced(kube_client.clone(), &ns);
        let machine_pool_api: Api<MachinePool> = Api::namespaced(kube_client.clone(), &ns);
        let lease_api: Api<MachinePoolNameLease> = Api::namespaced(kube_client.clone(), &ns);

        // One tracker per process, shared by every reconcile and the lease watcher
        let expectations = Arc::new(ExpectationTracker::new());
        let store: Arc<dyn RecordStore> = Arc::new(KubeRecordStore::new(kube_client));

        let reconciler = Arc::new(Reconciler::new(
            config,
            store,
            expectations,
            cluster_deployment_api,
            machine_pool_api.clone(),
        ));

        let pool_watcher_instance = Watcher::new(reconciler.clone(), machine_pool_api.clone(), lease_api.clone());
        let lease_watcher_instance = Watcher::new(reconciler, machine_pool_api, lease_api);

        let machine_pool_watcher = tokio::spawn(async move { pool_watcher_instance.watch_machine_pools().await });
        let lease_watcher = tokio::spawn(async move { lease_watcher_instance.watch_leases().await });

        Ok(Self {
            machine_pool_watcher,
            lease_watcher,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("MachinePool Controller running");

        // Wait for either watcher to exit (they should run forever)
        tokio::select! {
            result = &mut self.machine_pool_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("MachinePool watcher panicked: {}", e)))??;
            }
            result = &mut self.lease_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("MachinePoolNameLease watcher panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}
