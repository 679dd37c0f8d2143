pub mod db;
pub mod kv;
pub mod memory;
pub mod model;

use std::time::{SystemTime, UNIX_EPOCH};

pub use db::RedbStore;
pub use kv::{spawn_sweep, KvStore};
pub use memory::MemoryStore;
pub use model::{Blob, SecretRecord};

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Expiry timestamp for an entry written at `now` with a TTL of `ttl_secs`.
pub(crate) fn expiry(now: i64, ttl_secs: u64) -> i64 {
    now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
}

/// Entries are live strictly before their expiry second.
pub(crate) fn is_expired(expires_at: i64, now: i64) -> bool {
    now >= expires_at
}
