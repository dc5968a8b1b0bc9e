// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fan-out of accessor events to the configured sinks.

use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram},
};
#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;

use crate::{
    accessor::AccessorName,
    telemetry::{CacheActivity, CacheOperation},
};
#[cfg(any(feature = "metrics", test))]
use crate::telemetry::attributes;

#[derive(Debug)]
pub(crate) struct TelemetryInner {
    #[cfg(any(feature = "logs", test))]
    pub(crate) logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) operation_duration: Option<Histogram<f64>>,
}

impl TelemetryInner {
    pub(crate) fn record(&self, name: AccessorName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, name),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(counter) = &self.event_counter {
                counter.add(1, &attrs);
            }

            if let Some(histogram) = &self.operation_duration {
                histogram.record(duration.as_secs_f64(), &attrs);
            }
        }

        #[cfg(any(feature = "logs", test))]
        if self.logging_enabled {
            Self::emit(name, operation, activity, duration);
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn emit(name: AccessorName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.as_nanos();

        // Tracing levels must be constant, hence one macro arm per level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = name,
                    cache.operation = op,
                    cache.activity = act,
                    cache.duration_ns = duration_ns,
                    "cache.event"
                )
            };
        }

        match activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
            _ => {}
        }
    }
}
