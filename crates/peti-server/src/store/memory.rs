use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::kv::KvStore;
use super::{expiry, is_expired, unix_now};
use crate::StoreError;

/// In-memory store for tests and throwaway instances.
///
/// A single mutex guards the map, so every operation is atomic. Expired
/// entries are dropped when touched or when `prune` runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

struct Entry {
    value: Vec<u8>,
    expires_at: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired or not.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KvStore for MemoryStore {
    fn insert_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, StoreError> {
        let now = unix_now();
        let mut map = self.lock()?;

        if let Some(entry) = map.get(key) {
            if !is_expired(entry.expires_at, now) {
                return Ok(false);
            }
        }
        map.insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                expires_at: expiry(now, ttl.as_secs()),
            },
        );
        Ok(true)
    }

    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = unix_now();
        let mut map = self.lock()?;
        Ok(map
            .remove(key)
            .filter(|entry| !is_expired(entry.expires_at, now))
            .map(|entry| entry.value))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = unix_now();
        let map = self.lock()?;
        Ok(map
            .get(key)
            .filter(|entry| !is_expired(entry.expires_at, now))
            .map(|entry| entry.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = unix_now();
        let mut map = self.lock()?;
        Ok(map
            .remove(key)
            .is_some_and(|entry| !is_expired(entry.expires_at, now)))
    }

    fn prune(&self) -> Result<usize, StoreError> {
        let now = unix_now();
        let mut map = self.lock()?;
        let before = map.len();
        map.retain(|_, entry| !is_expired(entry.expires_at, now));
        Ok(before - map.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::spawn_sweep;

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn insert_take() {
        let s = MemoryStore::new();
        assert!(s.insert_if_absent("K", b"v1", DAY).unwrap());
        assert!(!s.insert_if_absent("K", b"v2", DAY).unwrap());
        assert_eq!(s.get("K").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(s.take("K").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(s.take("K").unwrap(), None);
        assert!(s.is_empty().unwrap());
    }

    #[test]
    fn expired_entry_is_absent_and_replaceable() {
        let s = MemoryStore::new();
        assert!(s.insert_if_absent("K", b"old", Duration::ZERO).unwrap());
        assert_eq!(s.get("K").unwrap(), None);
        assert!(!s.delete("K").unwrap());
        assert!(s.insert_if_absent("K", b"new", Duration::ZERO).unwrap());
        assert_eq!(s.len().unwrap(), 1);
        assert_eq!(s.take("K").unwrap(), None);
        assert!(s.is_empty().unwrap(), "take drops expired entries");
    }

    #[test]
    fn prune_reclaims_unread_expired_entries() {
        let s = MemoryStore::new();
        for i in 0..1000 {
            s.insert_if_absent(&format!("dead-{i}"), b"v", Duration::ZERO)
                .unwrap();
        }
        s.insert_if_absent("LIVE", b"v", DAY).unwrap();
        assert_eq!(s.len().unwrap(), 1001);

        assert_eq!(s.prune().unwrap(), 1000);
        assert_eq!(s.len().unwrap(), 1);
        assert_eq!(s.prune().unwrap(), 0);
        assert_eq!(s.take("LIVE").unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn sweep_task_prunes_on_interval() {
        let s = MemoryStore::new();
        s.insert_if_absent("DEAD", b"v", Duration::ZERO).unwrap();
        s.insert_if_absent("LIVE", b"v", DAY).unwrap();
        spawn_sweep(s.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(s.len().unwrap(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.insert_if_absent("K", b"v", DAY).unwrap();
        assert_eq!(b.take("K").unwrap(), Some(b"v".to_vec()));
        assert_eq!(a.get("K").unwrap(), None);
    }

    #[test]
    fn concurrent_takes_succeed_exactly_once() {
        let s = MemoryStore::new();
        s.insert_if_absent("RACE", b"once", DAY).unwrap();
        let winners = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let s = s.clone();
                    scope.spawn(move || s.take("RACE").unwrap())
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .count()
        });
        assert_eq!(winners, 1);
    }
}
