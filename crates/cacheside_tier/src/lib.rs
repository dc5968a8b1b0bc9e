// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The byte-level capability that typed cache accessors are built on.
//!
//! This crate defines the [`DistributedCache`] trait that every cache transport must
//! satisfy, along with the [`ExpirationPolicy`] attached to each write and the opaque
//! transport [`Error`].
//!
//! # Overview
//!
//! A distributed cache stores opaque bytes under string keys with a per-entry expiration
//! policy. It knows nothing about the values it holds: typing, serialization and the
//! cache-aside pattern live in `cacheside`, which consumes this trait.
//!
//! # Implementing a Transport
//!
//! ```
//! use cacheside_tier::{DistributedCache, Error, ExpirationPolicy};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleCache(RwLock<HashMap<String, Vec<u8>>>);
//!
//! impl DistributedCache for SimpleCache {
//!     async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: Vec<u8>, _policy: &ExpirationPolicy) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), value);
//!         Ok(())
//!     }
//!
//!     async fn refresh(&self, _key: &str) -> Result<(), Error> {
//!         Ok(())
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
mod policy;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use policy::ExpirationPolicy;
#[doc(inline)]
pub use tier::DistributedCache;
