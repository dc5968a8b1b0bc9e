// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory transport implementation using moka.

use std::{sync::Arc, time::SystemTime};

use cacheside_tier::{DistributedCache, Error, ExpirationPolicy};
use moka::future::Cache;

use crate::{
    builder::InMemoryDistributedCacheBuilder,
    expiry::{EntryExpiry, StoredEntry},
};

/// An in-process [`DistributedCache`] backed by moka.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use cacheside_memory::InMemoryDistributedCache;
/// use cacheside_tier::{DistributedCache, ExpirationPolicy};
/// use std::time::Duration;
/// # futures::executor::block_on(async {
///
/// let cache = InMemoryDistributedCache::new();
/// let policy = ExpirationPolicy::none().with_sliding_expiration(Duration::from_secs(30));
///
/// cache.set("session:1", b"{}".to_vec(), &policy).await?;
/// cache.refresh("session:1").await?;
/// assert!(cache.get("session:1").await?.is_some());
/// # Ok::<(), cacheside_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryDistributedCache {
    inner: Cache<String, StoredEntry>,
}

impl Default for InMemoryDistributedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDistributedCache {
    /// Creates a new unbounded in-memory transport.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory transport holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory transport.
    #[must_use]
    pub fn builder() -> InMemoryDistributedCacheBuilder {
        InMemoryDistributedCacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryDistributedCacheBuilder) -> Self {
        let mut moka_builder = Cache::builder().expire_after(EntryExpiry);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Returns the approximate number of live entries.
    ///
    /// Moka maintains entry counts eventually; the value may lag recent writes.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl DistributedCache for InMemoryDistributedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.inner.get(key).await.map(|entry| entry.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, policy: &ExpirationPolicy) -> Result<(), Error> {
        let absolute_ttl = policy.absolute_ttl(SystemTime::now())?;
        let entry = StoredEntry {
            bytes: Arc::from(value),
            absolute_ttl,
            sliding: policy.sliding_expiration(),
        };
        self.inner.insert(key.to_owned(), entry).await;
        Ok(())
    }

    async fn refresh(&self, key: &str) -> Result<(), Error> {
        // Reading is what restarts the sliding window.
        let _ = self.inner.get(key).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}
