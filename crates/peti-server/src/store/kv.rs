//! The contract every backing store must satisfy.
//!
//! The vault relies on exactly two atomic primitives: a conditional insert
//! (`SET key value NX EX ttl`) and a consuming read (`GETDEL key`). A backend
//! that can only offer separate get/set/delete calls would let two writers
//! both observe absence, or two readers both observe presence; both shipped
//! backends implement the primitives atomically.

use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

use crate::StoreError;

/// Synchronous key/value store with per-entry expiry.
///
/// Expiry is enforced on read: an entry past its TTL is never returned and
/// never blocks an insert, whether or not it has been physically removed yet.
/// Implementations share their state behind `Arc`, so clones see the same
/// entries.
pub trait KvStore: Clone + Send + Sync + 'static {
    /// Write `value` under `key` only if no unexpired entry exists.
    ///
    /// Returns `true` if the value was written, `false` if the key was taken.
    fn insert_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, StoreError>;

    /// Atomically remove and return the unexpired value under `key`.
    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Return the unexpired value under `key` without consuming it.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove `key` unconditionally. Returns true if an unexpired entry existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Physically remove every expired entry. Returns how many were removed.
    ///
    /// Reads already treat expired entries as absent; this only reclaims space.
    fn prune(&self) -> Result<usize, StoreError>;
}

/// Spawn a background Tokio task that calls `prune()` every `interval`.
pub fn spawn_sweep<S: KvStore>(store: S, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.tick().await; // skip first immediate tick
        loop {
            ticker.tick().await;
            match store.prune() {
                Ok(0) => {}
                Ok(removed) => info!(removed, "pruned expired secrets"),
                Err(e) => warn!(error = %e, "background sweep error"),
            }
        }
    });
}
