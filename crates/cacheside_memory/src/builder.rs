// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory transports.
//!
//! The builder keeps moka's configuration types out of the public API.

use crate::tier::InMemoryDistributedCache;

/// Builder for configuring an [`InMemoryDistributedCache`].
///
/// Expiration is not configured here: every write carries its own policy.
///
/// # Examples
///
/// ```
/// use cacheside_memory::InMemoryDistributedCache;
///
/// let cache = InMemoryDistributedCache::builder()
///     .max_capacity(10_000)
///     .initial_capacity(128)
///     .name("sessions")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDistributedCacheBuilder {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
}

impl InMemoryDistributedCacheBuilder {
    /// Creates a new builder for an unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries.
    ///
    /// Once the capacity is reached, entries are evicted using the `TinyLFU` policy
    /// before their expiration. Without a capacity the cache is bounded only by memory.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint).
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name that may appear in debugging output of the underlying cache.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured transport.
    #[must_use]
    pub fn build(self) -> InMemoryDistributedCache {
        InMemoryDistributedCache::from_builder(&self)
    }
}
