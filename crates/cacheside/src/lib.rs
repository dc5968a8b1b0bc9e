// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Typed cache-aside access over any byte-oriented distributed cache.
//!
//! This crate provides a [`CacheAccessor`] that sits on top of a [`DistributedCache`]:
//! - Typed reads and writes through a pluggable [`Codec`] (JSON by default)
//! - Tolerant reads that treat malformed entries like missing ones
//! - Cache-aside population from a caller-supplied producer
//! - A default [`ExpirationPolicy`] with per-call overrides
//! - Cancellation of every operation through a [`CancellationToken`]
//! - Opt-in per-key stampede protection
//! - Optional `tracing` logs and OpenTelemetry metrics
//!
//! # Examples
//!
//! ## Cache-Aside
//!
//! ```
//! use cacheside::{CacheAccessor, CancellationToken};
//! use serde::{Deserialize, Serialize};
//! # futures::executor::block_on(async {
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Profile {
//!     id: u64,
//!     display_name: String,
//! }
//!
//! let accessor = CacheAccessor::in_memory();
//! let token = CancellationToken::new();
//!
//! let profile: Profile = accessor
//!     .get_or_insert("profile:7", None, &token, || async {
//!         Profile { id: 7, display_name: "Ada".into() }
//!     })
//!     .await?;
//! assert_eq!(profile.display_name, "Ada");
//! # Ok::<(), cacheside::Error>(())
//! # });
//! ```
//!
//! ## Tolerant Reads
//!
//! ```
//! use cacheside::{CacheAccessor, CancellationToken};
//! # futures::executor::block_on(async {
//!
//! let accessor = CacheAccessor::in_memory();
//! let token = CancellationToken::new();
//!
//! accessor.set("visits", &"not a number", None, &token).await?;
//!
//! // The stored entry is not a `u32`, so it reads as missing.
//! assert_eq!(accessor.try_get::<u32>("visits", &token).await?, None);
//! assert_eq!(accessor.get::<u32>("visits", &token).await?, 0);
//! assert_eq!(accessor.get_or_default("visits", 10_u32, &token).await?, 10);
//! # Ok::<(), cacheside::Error>(())
//! # });
//! ```

pub mod accessor;
pub mod builder;
mod codec;
pub mod error;
mod stampede;
mod telemetry;

#[doc(inline)]
pub use accessor::{AccessorName, CacheAccessor};
#[doc(inline)]
pub use builder::AccessorBuilder;
#[cfg(feature = "memory")]
#[doc(inline)]
pub use cacheside_memory::{InMemoryDistributedCache, InMemoryDistributedCacheBuilder};
#[doc(inline)]
pub use cacheside_tier::{DistributedCache, Error as TransportError, ExpirationPolicy};
#[doc(inline)]
pub use codec::{Codec, CodecError, JsonCodec};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(no_inline)]
pub use tokio_util::sync::CancellationToken;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use cacheside_tier::testing::{CacheOp, MockDistributedCache};
