// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache transports.
//!
//! [`DistributedCache`] is the narrow, byte-oriented capability that typed accessors
//! consume. Transports implement it over whatever they talk to: a remote cache service,
//! a shared in-process map, a mock.

use std::sync::Arc;

use crate::{Error, ExpirationPolicy};

/// Trait for byte-level cache transports.
///
/// A missing key is reported as `Ok(None)` from [`get`](Self::get), never as an error.
/// Errors are reserved for the transport itself failing; callers propagate them.
///
/// Cancellation is expressed by dropping the returned future. Transports should not
/// leave partially applied writes behind when that happens.
pub trait DistributedCache: Send + Sync {
    /// Reads the raw bytes stored under `key`.
    ///
    /// A successful read of an entry with a sliding expiration restarts its window.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send;

    /// Stores `value` under `key`, replacing any existing entry.
    fn set(&self, key: &str, value: Vec<u8>, policy: &ExpirationPolicy) -> impl Future<Output = Result<(), Error>> + Send;

    /// Restarts the sliding expiration window of `key` without reading it.
    ///
    /// Refreshing a missing key is not an error.
    fn refresh(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes the entry stored under `key`.
    ///
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

impl<T> DistributedCache for Arc<T>
where
    T: DistributedCache,
{
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        T::get(self, key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, policy: &ExpirationPolicy) -> Result<(), Error> {
        T::set(self, key, value, policy).await
    }

    async fn refresh(&self, key: &str) -> Result<(), Error> {
        T::refresh(self, key).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        T::remove(self, key).await
    }
}
