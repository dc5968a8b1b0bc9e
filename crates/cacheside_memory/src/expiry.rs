// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-entry expiration combining an absolute deadline with a sliding window.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use moka::Expiry;

/// A stored entry: the raw bytes plus the resolved expiration of the write that produced it.
#[derive(Clone, Debug)]
pub(crate) struct StoredEntry {
    pub(crate) bytes: Arc<[u8]>,
    /// Time from the write to the absolute deadline.
    pub(crate) absolute_ttl: Option<Duration>,
    pub(crate) sliding: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EntryExpiry;

impl EntryExpiry {
    fn on_write(entry: &StoredEntry) -> Option<Duration> {
        match (entry.absolute_ttl, entry.sliding) {
            (Some(absolute), Some(sliding)) => Some(absolute.min(sliding)),
            (absolute, sliding) => absolute.or(sliding),
        }
    }
}

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &StoredEntry, _created_at: Instant) -> Option<Duration> {
        Self::on_write(value)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &StoredEntry,
        read_at: Instant,
        duration_until_expiry: Option<Duration>,
        last_modified_at: Instant,
    ) -> Option<Duration> {
        let Some(sliding) = value.sliding else {
            return duration_until_expiry;
        };

        match value.absolute_ttl {
            Some(absolute) => {
                let remaining = (last_modified_at + absolute).saturating_duration_since(read_at);
                Some(sliding.min(remaining))
            }
            None => Some(sliding),
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // A replacing write carries its own policy.
        Self::on_write(value)
    }
}
