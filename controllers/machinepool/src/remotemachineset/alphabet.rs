//! Characters a leased pool name may use.
//!
//! GCP resource names leave a single character of room for the pool in the
//! installer's naming convention, so pools on leasing clusters are named by
//! one character out of this alphabet.

/// Lowercase alphanumerics without `m` (control plane machines) and `w`
/// (the installer's original worker pool).
pub const LEASE_CHARS: &str = "abcdefghijklnopqrstuvxyz0123456789";

/// Character reserved for the pool whose logical name is `worker`.
pub const WORKER_LEASE_CHAR: char = 'w';

/// Logical pool name that maps onto the installer's `w` machine sets.
pub const WORKER_POOL_NAME: &str = "worker";

/// True if `c` may be handed out to an arbitrary pool.
pub fn is_lease_char(c: char) -> bool {
    LEASE_CHARS.contains(c)
}

/// All lease characters in alphabet order.
pub fn lease_chars() -> impl Iterator<Item = char> {
    LEASE_CHARS.chars()
}
