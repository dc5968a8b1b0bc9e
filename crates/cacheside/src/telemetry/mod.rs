// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Accessor telemetry integration with `tracing` and OpenTelemetry.
//!
//! With the `logs` feature every accessor operation can emit one structured event; with
//! the `metrics` feature it can feed an event counter and a duration histogram. With
//! neither feature enabled, recording compiles down to nothing.

use std::time::Duration;

#[cfg(any(feature = "logs", feature = "metrics", test))]
use std::sync::Arc;

#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;

#[cfg(any(feature = "logs", feature = "metrics", test))]
use recorder::TelemetryInner;

use crate::{Error, accessor::AccessorName};

pub(crate) mod attributes;
pub(crate) mod config;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(any(feature = "logs", feature = "metrics", test))]
pub(crate) mod recorder;
#[cfg(test)]
pub(crate) mod testing;

/// Records accessor activity to whichever sinks were configured on the builder.
#[derive(Clone, Debug, Default)]
pub(crate) struct AccessorTelemetry {
    #[cfg(any(feature = "logs", feature = "metrics", test))]
    inner: Option<Arc<TelemetryInner>>,
}

impl AccessorTelemetry {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, reason = "no-op when telemetry is disabled")
    )]
    pub(crate) fn record(&self, name: AccessorName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        #[cfg(any(feature = "logs", feature = "metrics", test))]
        if let Some(inner) = &self.inner {
            inner.record(name, operation, activity, duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    TryGet,
    Get,
    GetOrDefault,
    GetOrInsert,
    Set,
    Refresh,
    Remove,
}

impl CacheOperation {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(dead_code, reason = "only read by telemetry sinks")
    )]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TryGet => "cache.try_get",
            Self::Get => "cache.get",
            Self::GetOrDefault => "cache.get_or_default",
            Self::GetOrInsert => "cache.get_or_insert",
            Self::Set => "cache.set",
            Self::Refresh => "cache.refresh",
            Self::Remove => "cache.remove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Malformed,
    NotCached,
    Written,
    Refreshed,
    Removed,
    Cancelled,
    Error,
}

impl CacheActivity {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(dead_code, reason = "only read by telemetry sinks")
    )]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Malformed => "cache.malformed",
            Self::NotCached => "cache.not_cached",
            Self::Written => "cache.written",
            Self::Refreshed => "cache.refreshed",
            Self::Removed => "cache.removed",
            Self::Cancelled => "cache.cancelled",
            Self::Error => "cache.error",
        }
    }

    /// The activity to report for a failed operation.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Cancelled => Self::Cancelled,
            Error::Decode { .. } => Self::Malformed,
            _ => Self::Error,
        }
    }

    #[cfg(any(feature = "logs", test))]
    pub fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Refreshed => Severity::Debug,
            Self::Malformed | Self::NotCached | Self::Written | Self::Removed | Self::Cancelled => Severity::Info,
            Self::Error => Severity::Error,
        }
    }
}
