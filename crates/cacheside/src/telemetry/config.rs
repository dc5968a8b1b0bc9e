// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration collected by the accessor builder.

#[cfg(any(feature = "logs", feature = "metrics", test))]
use std::sync::Arc;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::AccessorTelemetry;
#[cfg(any(feature = "logs", feature = "metrics", test))]
use crate::telemetry::recorder::TelemetryInner;

/// Which telemetry sinks an accessor reports to.
///
/// Everything is disabled by default; the builder turns sinks on one at a time.
#[derive(Clone, Debug, Default)]
pub(crate) struct TelemetryConfig {
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Enables one structured `tracing` event per accessor operation.
    #[cfg(any(feature = "logs", test))]
    #[must_use]
    pub(crate) fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Enables the event counter and duration histogram on a meter from `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub(crate) fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the recorder. With no sink enabled, recording is a no-op.
    #[must_use]
    pub(crate) fn build(self) -> AccessorTelemetry {
        #[cfg(not(any(feature = "logs", feature = "metrics", test)))]
        {
            AccessorTelemetry::default()
        }

        #[cfg(any(feature = "logs", feature = "metrics", test))]
        {
            #[cfg(any(feature = "logs", test))]
            let logging_enabled = self.logs_enabled;
            #[cfg(not(any(feature = "logs", test)))]
            let logging_enabled = false;

            #[cfg(any(feature = "metrics", test))]
            let metrics_enabled = self.meter.is_some();
            #[cfg(not(any(feature = "metrics", test)))]
            let metrics_enabled = false;

            if !logging_enabled && !metrics_enabled {
                return AccessorTelemetry::default();
            }

            #[cfg(any(feature = "metrics", test))]
            let (event_counter, operation_duration) = {
                use crate::telemetry::metrics::{create_event_counter, create_operation_duration_histogram};
                (
                    self.meter.as_ref().map(create_event_counter),
                    self.meter.as_ref().map(create_operation_duration_histogram),
                )
            };

            AccessorTelemetry {
                inner: Some(Arc::new(TelemetryInner {
                    #[cfg(any(feature = "logs", test))]
                    logging_enabled,
                    #[cfg(any(feature = "metrics", test))]
                    event_counter,
                    #[cfg(any(feature = "metrics", test))]
                    operation_duration,
                })),
            }
        }
    }
}
