//! Single-character pool name leases.
//!
//! GCP name length limits leave one character for the pool in the
//! installer's `<infraID>-<pool>-<zone>` convention. Each pool on a leasing
//! cluster claims a character by creating a `MachinePoolNameLease` named
//! `<infraID>-<char>`. The API server rejects duplicate names, which is the
//! only thing keeping two pools from holding the same character; there is
//! no client-side locking.
//!
//! A freshly created lease may not be visible to the next list, so the
//! creating pass never proceeds. The next pass finds the lease and
//! proceeds with it.

use super::alphabet::{self, WORKER_LEASE_CHAR, WORKER_POOL_NAME};
use super::conditions::{
    UpdateConditionCheck, set_condition_with_change_check, update_condition_if_reason_or_message_change,
    update_condition_never,
};
use super::expectations::ExpectationTracker;
use crate::error::ControllerError;
use crate::store::RecordStore;
use crds::{
    CLUSTER_DEPLOYMENT_NAME_LABEL, ClusterDeployment, ConditionStatus, MACHINE_POOL_NAME_LABEL,
    MachinePool, MachinePoolNameLease, MachinePoolNameLeaseSpec, MachinePoolStatus,
    NO_MACHINE_POOL_NAME_LEASES_AVAILABLE,
};
use kube::Resource;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of trying to obtain a lease for a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseOutcome {
    /// The pool holds this character and may proceed
    Leased(char),
    /// A lease for this character was just created; wait for it to be observed
    Created(char),
    /// A create for this pool is still outstanding; wait
    Pending,
    /// Every character is taken; the pool's condition says so
    Exhausted,
}

impl LeaseOutcome {
    /// Character assigned to the pool, if one was chosen
    pub fn lease_char(&self) -> Option<char> {
        match self {
            Self::Leased(c) | Self::Created(c) => Some(*c),
            Self::Pending | Self::Exhausted => None,
        }
    }

    /// True if machine sets may be generated with the character now
    pub fn proceed(&self) -> bool {
        matches!(self, Self::Leased(_))
    }
}

/// Claims pool name characters through `MachinePoolNameLease` records
#[derive(Clone)]
pub struct LeaseAllocator {
    store: Arc<dyn RecordStore>,
    expectations: Arc<ExpectationTracker>,
}

impl std::fmt::Debug for LeaseAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseAllocator")
            .field("expectations", &self.expectations)
            .finish_non_exhaustive()
    }
}

/// Name of the lease for `lease_char` in the cluster `infra_id`
pub fn lease_name(infra_id: &str, lease_char: char) -> String {
    format!("{}-{}", infra_id, lease_char)
}

/// Character claimed by a lease name: its last character
pub fn leased_char(name: &str) -> Option<char> {
    name.chars().last()
}

impl LeaseAllocator {
    pub fn new(store: Arc<dyn RecordStore>, expectations: Arc<ExpectationTracker>) -> Self {
        Self { store, expectations }
    }

    /// Obtain the pool's name character.
    ///
    /// `leases` is the list of leases currently visible for the cluster.
    /// The pool's status conditions are updated in place when the
    /// exhaustion condition changes.
    pub async fn obtain_lease(
        &self,
        pool: &mut MachinePool,
        cd: &ClusterDeployment,
        leases: &[MachinePoolNameLease],
    ) -> Result<LeaseOutcome, ControllerError> {
        let infra_id = infra_id(cd)?;
        let pool_name = pool.metadata.name.clone().unwrap_or_default();
        let expect_key = pool.key();

        if let Some(lease) = leases
            .iter()
            .find(|l| l.label(MACHINE_POOL_NAME_LABEL) == Some(pool_name.as_str()))
        {
            let name = lease.metadata.name.as_deref().unwrap_or_default();
            debug!("Machine pool {} already has lease: {}", expect_key, name);

            // Everything up to the last character is known
            let lease_char = leased_char(name)
                .filter(|c| lease_name(infra_id, *c) == name)
                .ok_or_else(|| {
                    ControllerError::LeaseIntegrity(format!(
                        "lease {} did not match expected lease name format ({}-[CHAR])",
                        name, infra_id
                    ))
                })?;
            self.expectations.creation_observed(&expect_key);
            return Ok(LeaseOutcome::Leased(lease_char));
        }

        debug!("Machine pool {} does not have a lease yet", expect_key);

        // The installer named the original worker pool "w"; keep it so
        // those machines are not replaced. Only one pool per cluster can
        // carry the logical name "worker" and "w" is outside the alphabet,
        // so no other pool can collide with it.
        if pool.spec.name == WORKER_POOL_NAME {
            debug!("Selecting lease char 'w' for original worker pool {}", expect_key);
            return Ok(LeaseOutcome::Leased(WORKER_LEASE_CHAR));
        }

        if !self.expectations.satisfied_expectations(&expect_key) {
            debug!("Lease creation for {} not yet observed, waiting", expect_key);
            return Ok(LeaseOutcome::Pending);
        }

        let available = available_lease_chars(cd, leases);
        if available.is_empty() {
            warn!("No MachinePoolNameLease characters available for {}, setting condition", expect_key);
            self.set_exhausted_condition(
                pool,
                ConditionStatus::True,
                "OutOfMachinePoolNames",
                "All machine pool names are in use",
                update_condition_if_reason_or_message_change,
            )
            .await?;
            // Nothing else to do until a lease frees up
            return Ok(LeaseOutcome::Exhausted);
        }
        self.set_exhausted_condition(
            pool,
            ConditionStatus::False,
            "MachinePoolNamesAvailable",
            "Machine pool names available",
            update_condition_never,
        )
        .await?;

        // A random pick keeps pools reconciled at the same time from
        // colliding; the loser's create fails and it redraws next pass.
        let lease_char = available[rand::thread_rng().gen_range(0..available.len())];
        debug!("Selected lease char {} for {}", lease_char, expect_key);

        let name = lease_name(infra_id, lease_char);
        let lease = build_lease(pool, cd, &name)?;

        debug!("Adding expectation for lease creation for {}", expect_key);
        self.expectations.expect_creations(&expect_key, 1);
        if let Err(e) = self.store.create_lease(&lease).await {
            self.expectations.delete_expectations(&expect_key);
            return Err(e.into());
        }
        info!("Created lease {} for {}, waiting until creation is observed", name, expect_key);

        Ok(LeaseOutcome::Created(lease_char))
    }

    async fn set_exhausted_condition(
        &self,
        pool: &mut MachinePool,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        update_check: UpdateConditionCheck,
    ) -> Result<(), ControllerError> {
        let (conditions, changed) = set_condition_with_change_check(
            pool.conditions(),
            NO_MACHINE_POOL_NAME_LEASES_AVAILABLE,
            status,
            reason,
            message,
            update_check,
        );
        if !changed {
            return Ok(());
        }
        self.store.update_pool_conditions(pool, &conditions).await?;
        pool.status.get_or_insert_with(MachinePoolStatus::default).conditions = conditions;
        debug!("Updated {} condition on {} to {}", NO_MACHINE_POOL_NAME_LEASES_AVAILABLE, pool.key(), status);
        Ok(())
    }
}

/// Alphabet characters not claimed by any lease of this cluster, in
/// alphabet order.
pub fn available_lease_chars(cd: &ClusterDeployment, leases: &[MachinePoolNameLease]) -> Vec<char> {
    let cd_name = cd.metadata.name.as_deref().unwrap_or_default();
    let taken: Vec<char> = leases
        .iter()
        // Callers list by this label already
        .filter(|l| l.label(CLUSTER_DEPLOYMENT_NAME_LABEL) == Some(cd_name))
        .filter_map(|l| l.metadata.name.as_deref().and_then(leased_char))
        .collect();

    alphabet::lease_chars().filter(|c| !taken.contains(c)).collect()
}

fn infra_id(cd: &ClusterDeployment) -> Result<&str, ControllerError> {
    cd.spec
        .cluster_metadata
        .as_ref()
        .map(|m| m.infra_id.as_str())
        .ok_or_else(|| ControllerError::InvalidInput("ClusterDeployment does not have cluster metadata".to_string()))
}

fn build_lease(
    pool: &MachinePool,
    cd: &ClusterDeployment,
    name: &str,
) -> Result<MachinePoolNameLease, ControllerError> {
    let owner = pool.controller_owner_ref(&()).ok_or_else(|| {
        ControllerError::InvalidInput(format!("MachinePool {} has no uid to own its lease", pool.key()))
    })?;

    let mut lease = MachinePoolNameLease::new(name, MachinePoolNameLeaseSpec {});
    lease.metadata.namespace = pool.metadata.namespace.clone();
    lease.metadata.labels = Some(BTreeMap::from([
        (
            MACHINE_POOL_NAME_LABEL.to_string(),
            pool.metadata.name.clone().unwrap_or_default(),
        ),
        (
            CLUSTER_DEPLOYMENT_NAME_LABEL.to_string(),
            cd.metadata.name.clone().unwrap_or_default(),
        ),
    ]));
    lease.metadata.owner_references = Some(vec![owner]);
    Ok(lease)
}
