// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock transport for testing.
//!
//! This module provides `MockDistributedCache`, an in-memory transport that records
//! every operation and supports failure injection for exercising error paths.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{DistributedCache, Error, ExpirationPolicy};

/// Recorded transport operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    /// A read of the given key.
    Get(String),
    /// A write of raw bytes under a key.
    Set {
        /// The key that was written.
        key: String,
        /// The bytes that were written.
        value: Vec<u8>,
        /// The expiration policy the write carried.
        policy: ExpirationPolicy,
    },
    /// A refresh of the given key.
    Refresh(String),
    /// A removal of the given key.
    Remove(String),
}

impl CacheOp {
    /// Returns the key this operation targeted.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Refresh(key) | Self::Remove(key) | Self::Set { key, .. } => key,
        }
    }
}

type FailPredicate = Box<dyn Fn(&CacheOp) -> bool + Send + Sync>;

/// A configurable mock transport for testing.
///
/// Entries are stored as raw bytes without expiration. Clones share the same storage,
/// operation log and failure predicate, so a test can hand one clone to the code under
/// test and inspect another.
///
/// # Examples
///
/// ```
/// use cacheside_tier::{testing::{CacheOp, MockDistributedCache}, DistributedCache, ExpirationPolicy};
///
/// # futures::executor::block_on(async {
/// let cache = MockDistributedCache::new();
///
/// cache.set("key", b"42".to_vec(), &ExpirationPolicy::none()).await.unwrap();
/// assert_eq!(cache.get("key").await.unwrap(), Some(b"42".to_vec()));
///
/// assert_eq!(cache.operations(), vec![
///     CacheOp::Set { key: "key".to_string(), value: b"42".to_vec(), policy: ExpirationPolicy::none() },
///     CacheOp::Get("key".to_string()),
/// ]);
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use cacheside_tier::{testing::{CacheOp, MockDistributedCache}, DistributedCache};
///
/// # futures::executor::block_on(async {
/// let cache = MockDistributedCache::new();
///
/// cache.fail_when(|op| matches!(op, CacheOp::Get(k) if k == "forbidden"));
/// assert!(cache.get("forbidden").await.is_err());
/// assert!(cache.get("allowed").await.is_ok());
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockDistributedCache {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    operations: Arc<Mutex<Vec<CacheOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockDistributedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDistributedCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl MockDistributedCache {
    /// Creates a new empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock transport with pre-populated raw entries.
    #[must_use]
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            ..Self::default()
        }
    }

    /// Stores raw bytes directly, bypassing the operation log and failure predicate.
    ///
    /// Useful for planting malformed entries.
    pub fn put_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.lock().insert(key.into(), value.into());
    }

    /// Returns the raw bytes stored under `key`, bypassing the operation log.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if an entry is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that decides which operations fail.
    ///
    /// Failed operations are still recorded but leave the stored data untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside_tier::testing::{CacheOp, MockDistributedCache};
    ///
    /// let cache = MockDistributedCache::new();
    ///
    /// // Fail every write
    /// cache.fail_when(|op| matches!(op, CacheOp::Set { .. }));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp> {
        self.operations.lock().clone()
    }

    /// Returns the recorded writes as `(key, bytes, policy)` triples.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, Vec<u8>, ExpirationPolicy)> {
        self.operations
            .lock()
            .iter()
            .filter_map(|op| match op {
                CacheOp::Set { key, value, policy } => Some((key.clone(), value.clone(), *policy)),
                _ => None,
            })
            .collect()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: CacheOp) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        let message = match &op {
            CacheOp::Get(_) => "mock: get failed",
            CacheOp::Set { .. } => "mock: set failed",
            CacheOp::Refresh(_) => "mock: refresh failed",
            CacheOp::Remove(_) => "mock: remove failed",
        };
        self.operations.lock().push(op);
        if fail { Err(Error::caused_by(message)) } else { Ok(()) }
    }
}

impl DistributedCache for MockDistributedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.check(CacheOp::Get(key.to_owned()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, policy: &ExpirationPolicy) -> Result<(), Error> {
        self.check(CacheOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            policy: *policy,
        })?;
        self.data.lock().insert(key.to_owned(), value);
        Ok(())
    }

    async fn refresh(&self, key: &str) -> Result<(), Error> {
        self.check(CacheOp::Refresh(key.to_owned()))
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.check(CacheOp::Remove(key.to_owned()))?;
        self.data.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn failed_set_is_recorded_but_not_stored() {
        block_on(async {
            let cache = MockDistributedCache::new();
            cache.fail_when(|op| matches!(op, CacheOp::Set { .. }));

            cache.set("k", vec![1], &ExpirationPolicy::none()).await.unwrap_err();

            assert!(!cache.contains_key("k"));
            assert_eq!(cache.writes().len(), 1);
        });
    }

    #[test]
    fn clear_failures_restores_success() {
        block_on(async {
            let cache = MockDistributedCache::new();
            cache.fail_when(|_| true);
            cache.get("k").await.unwrap_err();

            cache.clear_failures();
            assert_eq!(cache.get("k").await.unwrap(), None);
        });
    }

    #[test]
    fn clones_share_state() {
        block_on(async {
            let cache = MockDistributedCache::new();
            let clone = cache.clone();

            clone.set("k", vec![7], &ExpirationPolicy::DEFAULT).await.unwrap();

            assert_eq!(cache.raw("k"), Some(vec![7]));
            assert_eq!(cache.operations().len(), 1);
        });
    }

    #[test]
    fn put_raw_bypasses_operation_log() {
        let cache = MockDistributedCache::with_data(HashMap::from([("a".to_string(), vec![1])]));
        cache.put_raw("b", b"not json".to_vec());

        assert_eq!(cache.entry_count(), 2);
        assert!(cache.operations().is_empty());
    }

    #[test]
    fn op_key_returns_target() {
        assert_eq!(CacheOp::Get("a".into()).key(), "a");
        assert_eq!(CacheOp::Remove("b".into()).key(), "b");
        let set = CacheOp::Set {
            key: "c".into(),
            value: vec![],
            policy: ExpirationPolicy::none(),
        };
        assert_eq!(set.key(), "c");
    }
}
