// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-key serialization of the cache-aside path.
//!
//! While a key's guard is held, other callers for the same key wait; callers for other
//! keys proceed. Every caller takes a lease on the key's slot before waiting, and the slot
//! is dropped with its last lease, whether that lease ended as a guard or as an abandoned
//! wait. The map therefore only holds keys that currently have a holder or waiter.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<SyncMutex<HashMap<String, Slot>>>;

#[derive(Debug, Default)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    leases: usize,
}

#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    slots: Slots,
}

impl KeyedLocks {
    /// Waits until no other guard for `key` is held, then returns one.
    ///
    /// Dropping the returned future before it completes gives up the wait and its lease.
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard {
        let lease = self.lease(key);
        let guard = Arc::clone(&lease.mutex).lock_owned().await;
        KeyGuard { _guard: guard, _lease: lease }
    }

    fn lease(&self, key: &str) -> Lease {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.to_owned()).or_default();
        slot.leases += 1;

        Lease {
            key: key.to_owned(),
            slots: Arc::clone(&self.slots),
            mutex: Arc::clone(&slot.mutex),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// A holder's or waiter's claim on a key's slot.
#[derive(Debug)]
struct Lease {
    key: String,
    slots: Slots,
    mutex: Arc<AsyncMutex<()>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.leases = slot.leases.saturating_sub(1);
            if slot.leases == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Holds a key's lock until dropped.
#[derive(Debug)]
pub(crate) struct KeyGuard {
    // Declared first so the lock is released before the lease.
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}
