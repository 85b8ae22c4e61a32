//! Decides whether a cluster's pools must be named through leases.
//!
//! Clusters older than 4.4.7 cannot address pools by their full names, and
//! clusters still running the installer's original `w` worker machine sets
//! must keep the single-character scheme so those machine sets are not
//! recreated.

use super::alphabet::{WORKER_LEASE_CHAR, WORKER_POOL_NAME};
use semver::Version;
use std::collections::HashSet;
use tracing::debug;

/// First cluster version whose machine sets may carry full pool names.
pub const MIN_VERSION_SUPPORTING_FULL_NAMES: Version = Version::new(4, 4, 7);

/// Parse a version the way cluster versions are reported: an optional
/// leading `v`, and missing minor/patch components read as zero.
/// `4.5` parses as `4.5.0`, `v4.6.1-rc.0` as `4.6.1-rc.0`.
pub fn parse_version_tolerant(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }

    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), suffix)).ok()
}

/// Pool token of a machine set named `<infraID>-<pool>-<zone>`. The infra
/// ID may itself contain dashes, so the token is the second to last part.
pub fn pool_token(machine_set_name: &str) -> Option<&str> {
    let parts: Vec<&str> = machine_set_name.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(parts[parts.len() - 2])
}

/// True if pools of this cluster must be named with leased characters.
///
/// An unparsable version is not an error; only the machine set names are
/// consulted then.
pub fn requires_leasing<S: AsRef<str>>(cluster_version: &str, machine_set_names: &[S]) -> bool {
    match parse_version_tolerant(cluster_version) {
        Some(v) if v < MIN_VERSION_SUPPORTING_FULL_NAMES => {
            debug!(
                "Leases required: cluster version {} does not support full machine names",
                cluster_version
            );
            return true;
        }
        Some(_) => {}
        None => debug!("Could not parse cluster version {:?}, checking machine sets", cluster_version),
    }

    let pool_names: HashSet<&str> = machine_set_names
        .iter()
        .filter_map(|name| pool_token(name.as_ref()))
        .collect();

    // A "w" pool without any "worker" pool is taken to be the installer's
    // original worker pool. Manually created "w" machine sets would trip
    // this too; pools named "w" are rejected upstream.
    let worker_char = WORKER_LEASE_CHAR.to_string();
    if pool_names.contains(worker_char.as_str()) && !pool_names.contains(WORKER_POOL_NAME) {
        debug!("Leases required: cluster has a \"w\" machine pool that is likely installer-created");
        return true;
    }

    debug!("Leases not required for cluster version {}", cluster_version);
    false
}
