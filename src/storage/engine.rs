//! Thread-Safe In-Memory Store
//!
//! This module implements the process-wide key-value store shared by every
//! connection.
//!
//! ## Design Decisions
//!
//! 1. **One RwLock**: `del` removes a whole batch of keys atomically, so the
//!    map sits behind a single reader/writer lock rather than per-key shards.
//! 2. **Short critical sections**: values are `Bytes`, so the read lock is
//!    held only for a reference-count bump.
//! 3. **Relaxed counters**: operation statistics are approximate and never
//!    synchronize with the map.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │               MemoryStore                 │
//! │   get ──> read lock ─┐                    │
//! │   set ──> write lock ┼──> HashMap<K, V>   │
//! │   del ──> write lock ┘                    │
//! └───────────────────────────────────────────┘
//! ```

use crate::storage::store::{DataStore, DuplicatePolicy, StoreError, StoreResult};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The in-memory key-value store.
///
/// # Thread Safety
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// all connection tasks. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use redline::storage::{DataStore, MemoryStore, StoreError};
///
/// let store = MemoryStore::new();
///
/// store.set(Bytes::from("name"), Bytes::from("test1")).unwrap();
/// assert_eq!(store.get(b"name").unwrap(), "test1");
///
/// assert_eq!(store.del(&[Bytes::from("name")]), 1);
/// assert_eq!(store.get(b"name"), Err(StoreError::KeyNotFound));
/// ```
pub struct MemoryStore {
    data: RwLock<HashMap<Bytes, Bytes>>,

    policy: DuplicatePolicy,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total successful SET operations
    set_count: AtomicU64,

    /// Statistics: SET operations refused by the duplicate policy
    rejected_count: AtomicU64,

    /// Statistics: total keys removed by DEL
    deleted_count: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("policy", &self.policy)
            .field("keys", &self.len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store that overwrites existing keys.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Overwrite)
    }

    /// Creates an empty store with the given duplicate-key policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            policy,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            deleted_count: AtomicU64::new(0),
        }
    }

    /// The duplicate-key policy this store was created with.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    // No operation can leave the map half-updated, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the store's statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            gets: self.get_count.load(Ordering::Relaxed),
            sets: self.set_count.load(Ordering::Relaxed),
            rejected_sets: self.rejected_count.load(Ordering::Relaxed),
            deleted: self.deleted_count.load(Ordering::Relaxed),
        }
    }
}

impl DataStore for MemoryStore {
    fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()> {
        let mut data = self.write();

        if self.policy == DuplicatePolicy::Reject && data.contains_key(&key) {
            drop(data);
            self.rejected_count.fetch_add(1, Ordering::Relaxed);
            return Err(StoreError::KeyExists {
                key: String::from_utf8_lossy(&key).into_owned(),
            });
        }

        data.insert(key, value);
        drop(data);

        self.set_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        self.read().get(key).cloned().ok_or(StoreError::KeyNotFound)
    }

    fn del(&self, keys: &[Bytes]) -> usize {
        let removed = {
            let mut data = self.write();
            keys.iter().filter(|key| data.remove(*key).is_some()).count()
        };

        self.deleted_count
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

/// Statistics about the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub gets: u64,
    pub sets: u64,
    pub rejected_sets: u64,
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[&str]) -> Vec<Bytes> {
        values
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();

        store.set("1".into(), "1".into()).unwrap();
        assert_eq!(store.get(b"1"), Ok(Bytes::from("1")));
    }

    #[test]
    fn test_large_key_and_value() {
        let store = MemoryStore::new();
        let big = "abc".repeat(256);

        store.set(big.clone().into(), big.clone().into()).unwrap();
        assert_eq!(store.get(big.as_bytes()), Ok(Bytes::from(big)));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = MemoryStore::new();
        assert_eq!(store.get(b"nonexistent"), Err(StoreError::KeyNotFound));
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryStore::new();

        store.set("key".into(), "v1".into()).unwrap();
        store.set("key".into(), "v2".into()).unwrap();
        assert_eq!(store.get(b"key"), Ok(Bytes::from("v2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_get_del_cycle() {
        let store = MemoryStore::new();

        store.set("k".into(), "v".into()).unwrap();
        assert_eq!(store.get(b"k"), Ok(Bytes::from("v")));

        assert_eq!(store.del(&keys(&["k"])), 1);
        assert_eq!(store.get(b"k"), Err(StoreError::KeyNotFound));
        assert_eq!(store.del(&keys(&["k"])), 0); // Already deleted
    }

    #[test]
    fn test_del_counts_only_existing() {
        let store = MemoryStore::new();
        let big = "abc".repeat(256);

        store.set("1".into(), "1".into()).unwrap();
        store.set("hello".into(), "world".into()).unwrap();
        store.set(big.clone().into(), big.clone().into()).unwrap();

        let removed = store.del(&keys(&["1", "hello", "missing", big.as_str()]));
        assert_eq!(removed, 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_del_duplicate_keys_in_batch() {
        let store = MemoryStore::new();
        store.set("k".into(), "v".into()).unwrap();

        assert_eq!(store.del(&keys(&["k", "k"])), 1);
    }

    #[test]
    fn test_reject_duplicates() {
        let store = MemoryStore::with_policy(DuplicatePolicy::Reject);

        store.set("k".into(), "v1".into()).unwrap();
        assert_eq!(
            store.set("k".into(), "v2".into()),
            Err(StoreError::KeyExists {
                key: "k".to_string()
            })
        );
        assert_eq!(store.get(b"k"), Ok(Bytes::from("v1")));

        // Once removed, the key can be set again.
        store.del(&keys(&["k"]));
        store.set("k".into(), "v3".into()).unwrap();
        assert_eq!(store.get(b"k"), Ok(Bytes::from("v3")));
    }

    #[test]
    fn test_stats() {
        let store = MemoryStore::with_policy(DuplicatePolicy::Reject);

        store.set("a".into(), "1".into()).unwrap();
        store.set("b".into(), "2".into()).unwrap();
        let _ = store.set("a".into(), "3".into());
        let _ = store.get(b"a");
        let _ = store.get(b"zzz");
        store.del(&keys(&["a", "zzz"]));

        assert_eq!(
            store.stats(),
            StorageStats {
                keys: 1,
                gets: 2,
                sets: 2,
                rejected_sets: 1,
                deleted: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        // Spawn multiple writers
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    store.set(key.clone().into(), "value".into()).unwrap();
                    assert_eq!(store.get(key.as_bytes()), Ok(Bytes::from("value")));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_concurrent_reject_has_single_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::with_policy(DuplicatePolicy::Reject));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .set("contended".into(), format!("v{}", i).into())
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.stats().rejected_sets, 15);
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        store.set("k".into(), "v".into()).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(store.get(b"k"), Ok(Bytes::from("v")));
        assert_eq!(store.del(&keys(&["k"])), 1);
    }

    #[test]
    fn test_non_utf8_key_and_value() {
        let store = MemoryStore::with_policy(DuplicatePolicy::Reject);
        let key = Bytes::from_static(b"k\xff");

        store
            .set(key.clone(), Bytes::from_static(b"\xfe\x00"))
            .unwrap();
        assert_eq!(store.get(b"k\xff"), Ok(Bytes::from_static(b"\xfe\x00")));
        assert_eq!(
            store.set(key.clone(), Bytes::from_static(b"x")),
            Err(StoreError::KeyExists {
                key: "k\u{fffd}".to_string()
            })
        );
        assert_eq!(store.del(&[key]), 1);
    }
}
