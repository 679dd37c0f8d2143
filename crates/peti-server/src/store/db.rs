use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, warn};

use super::kv::KvStore;
use super::{expiry, is_expired, unix_now};
use crate::StoreError;

const VAULT: TableDefinition<&str, &[u8]> = TableDefinition::new("vault");

/// Entry layout: `[ENTRY_MARKER, expires_at (i64, big-endian)] + payload`.
const ENTRY_MARKER: u8 = 0x01;
const HEADER_LEN: usize = 1 + 8;

/// Thread-safe handle to the redb-backed store.
///
/// Every mutating operation runs in its own write transaction. redb admits one
/// writer at a time, which is what makes `insert_if_absent` and `take` atomic.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

impl RedbStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(db_err)?;

        let write_txn = db.begin_write().map_err(db_err)?;
        write_txn.open_table(VAULT).map_err(db_err)?;
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KvStore for RedbStore {
    fn insert_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, StoreError> {
        let now = unix_now();
        let expires_at = expiry(now, ttl.as_secs());

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let inserted = {
            let mut table = write_txn.open_table(VAULT).map_err(db_err)?;

            // Clone the bytes so the AccessGuard borrow on `table` ends before insert.
            let existing: Option<Vec<u8>> = table
                .get(key)
                .map_err(db_err)?
                .map(|guard| guard.value().to_vec());

            let occupied = existing
                .as_deref()
                .and_then(decode_or_drop)
                .is_some_and(|(at, _)| !is_expired(at, now));

            if occupied {
                false
            } else {
                let entry = encode(expires_at, value);
                table.insert(key, entry.as_slice()).map_err(db_err)?;
                true
            }
        };
        write_txn.commit().map_err(db_err)?;

        Ok(inserted)
    }

    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = unix_now();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let taken = {
            let mut table = write_txn.open_table(VAULT).map_err(db_err)?;

            let removed: Option<Vec<u8>> = table
                .remove(key)
                .map_err(db_err)?
                .map(|guard| guard.value().to_vec());

            match removed.as_deref().and_then(decode_or_drop) {
                None => None,
                Some((expires_at, _)) if is_expired(expires_at, now) => {
                    debug!("lazy-evicted expired secret");
                    None
                }
                Some((_, payload)) => Some(payload.to_vec()),
            }
        };
        write_txn.commit().map_err(db_err)?;

        Ok(taken)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = unix_now();
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(VAULT).map_err(db_err)?;

        let raw: Option<Vec<u8>> = table
            .get(key)
            .map_err(db_err)?
            .map(|guard| guard.value().to_vec());

        Ok(raw
            .as_deref()
            .and_then(decode_or_drop)
            .filter(|(expires_at, _)| !is_expired(*expires_at, now))
            .map(|(_, payload)| payload.to_vec()))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = unix_now();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let existed = {
            let mut table = write_txn.open_table(VAULT).map_err(db_err)?;
            let removed: Option<Vec<u8>> = table
                .remove(key)
                .map_err(db_err)?
                .map(|guard| guard.value().to_vec());
            removed
                .as_deref()
                .and_then(decode_or_drop)
                .is_some_and(|(at, _)| !is_expired(at, now))
        };
        write_txn.commit().map_err(db_err)?;

        Ok(existed)
    }

    /// Collection and removal share one write transaction so a key re-admitted
    /// concurrently is never swept. Undecodable entries are swept too.
    fn prune(&self) -> Result<usize, StoreError> {
        let now = unix_now();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let removed = {
            let mut table = write_txn.open_table(VAULT).map_err(db_err)?;

            let mut dead_keys = Vec::new();
            for item in table.iter().map_err(db_err)? {
                let (k, v) = item.map_err(db_err)?;
                let live = decode_or_drop(v.value()).is_some_and(|(at, _)| !is_expired(at, now));
                if !live {
                    dead_keys.push(k.value().to_owned());
                }
            }

            for key in &dead_keys {
                table.remove(key.as_str()).map_err(db_err)?;
            }
            dead_keys.len()
        };
        write_txn.commit().map_err(db_err)?;

        Ok(removed)
    }
}

fn encode(expires_at: i64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(ENTRY_MARKER);
    out.extend_from_slice(&expires_at.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Split an entry into `(expires_at, payload)`.
fn decode(bytes: &[u8]) -> Result<(i64, &[u8]), StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::Codec(format!(
            "truncated entry: {} bytes",
            bytes.len()
        )));
    }
    if bytes[0] != ENTRY_MARKER {
        return Err(StoreError::Codec(format!(
            "unknown entry marker {:#04x}",
            bytes[0]
        )));
    }
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[1..HEADER_LEN]);
    Ok((i64::from_be_bytes(ts), &bytes[HEADER_LEN..]))
}

/// Decode an entry, logging and treating it as expired if it will not decode.
/// Callers overwrite or remove such entries rather than failing on them forever.
fn decode_or_drop(bytes: &[u8]) -> Option<(i64, &[u8])> {
    match decode(bytes) {
        Ok(parts) => Some(parts),
        Err(e) => {
            warn!(error = %e, "discarding undecodable entry");
            None
        }
    }
}
