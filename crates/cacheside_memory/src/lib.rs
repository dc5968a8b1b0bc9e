// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! An in-process distributed cache transport backed by moka.
//!
//! This crate provides [`InMemoryDistributedCache`], a concurrent byte store implementing
//! [`DistributedCache`](cacheside_tier::DistributedCache). Each entry carries its own
//! [`ExpirationPolicy`](cacheside_tier::ExpirationPolicy): the absolute deadline is fixed
//! when the entry is written, and the sliding window restarts on every read or refresh.
//!
//! It is a drop-in transport for tests, single-process deployments, and local development
//! against code that normally talks to a remote cache service.
//!
//! # Quick Start
//!
//! ```
//! use cacheside_memory::InMemoryDistributedCache;
//! use cacheside_tier::{DistributedCache, ExpirationPolicy};
//!
//! # futures::executor::block_on(async {
//! let cache = InMemoryDistributedCache::builder().max_capacity(1000).build();
//!
//! cache.set("key", b"42".to_vec(), &ExpirationPolicy::default()).await?;
//! assert_eq!(cache.get("key").await?, Some(b"42".to_vec()));
//! # Ok::<(), cacheside_tier::Error>(())
//! # });
//! ```

pub mod builder;
mod expiry;
pub mod tier;

#[doc(inline)]
pub use builder::InMemoryDistributedCacheBuilder;
#[doc(inline)]
pub use tier::InMemoryDistributedCache;
