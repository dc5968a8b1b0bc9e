// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`CacheAccessor`].

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::MeterProvider;

use cacheside_tier::{DistributedCache, ExpirationPolicy};

use crate::{
    CacheAccessor,
    accessor::AccessorName,
    codec::{Codec, JsonCodec},
    telemetry::config::TelemetryConfig,
};

const DEFAULT_NAME: AccessorName = "cacheside";

/// Configures and builds a [`CacheAccessor`].
///
/// Created by [`CacheAccessor::builder`]. Without further configuration the accessor uses
/// [`JsonCodec`], [`ExpirationPolicy::DEFAULT`], no stampede protection and no telemetry.
#[derive(Debug)]
pub struct AccessorBuilder<C, Cd = JsonCodec> {
    cache: C,
    codec: Cd,
    name: AccessorName,
    default_policy: ExpirationPolicy,
    stampede_protection: bool,
    telemetry: TelemetryConfig,
}

impl<C> AccessorBuilder<C, JsonCodec>
where
    C: DistributedCache,
{
    pub(crate) fn new(cache: C) -> Self {
        Self {
            cache,
            codec: JsonCodec,
            name: DEFAULT_NAME,
            default_policy: ExpirationPolicy::DEFAULT,
            stampede_protection: false,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl<C, Cd> AccessorBuilder<C, Cd>
where
    C: DistributedCache,
    Cd: Codec,
{
    /// Sets the name reported in logs and metrics.
    #[must_use]
    pub fn name(mut self, name: AccessorName) -> Self {
        self.name = name;
        self
    }

    /// Sets the policy applied to writes that do not supply their own.
    #[must_use]
    pub fn default_policy(mut self, policy: ExpirationPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Replaces the codec used to encode and decode values.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::{CacheAccessor, Codec, CodecError, InMemoryDistributedCache};
    /// use serde::{Serialize, de::DeserializeOwned};
    ///
    /// struct PrettyJson;
    ///
    /// impl Codec for PrettyJson {
    ///     fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
    ///         serde_json::to_vec_pretty(value).map_err(CodecError::new)
    ///     }
    ///
    ///     fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
    ///         serde_json::from_slice(bytes).map_err(CodecError::new)
    ///     }
    /// }
    ///
    /// let accessor = CacheAccessor::builder(InMemoryDistributedCache::new())
    ///     .codec(PrettyJson)
    ///     .build();
    /// # let _ = accessor;
    /// ```
    #[must_use]
    pub fn codec<Cd2: Codec>(self, codec: Cd2) -> AccessorBuilder<C, Cd2> {
        AccessorBuilder {
            cache: self.cache,
            codec,
            name: self.name,
            default_policy: self.default_policy,
            stampede_protection: self.stampede_protection,
            telemetry: self.telemetry,
        }
    }

    /// Serializes cache-aside calls per key.
    ///
    /// While one caller reads, produces and writes a key, other cache-aside callers for that
    /// key wait and then read the stored entry instead of running their own producers.
    /// Tolerant reads and writes are unaffected.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::{CacheAccessor, InMemoryDistributedCache};
    ///
    /// let accessor = CacheAccessor::builder(InMemoryDistributedCache::new())
    ///     .stampede_protection()
    ///     .build();
    /// assert!(accessor.has_stampede_protection());
    /// ```
    #[must_use]
    pub fn stampede_protection(mut self) -> Self {
        self.stampede_protection = true;
        self
    }

    /// Emits one `tracing` event per operation.
    #[cfg(any(feature = "logs", test))]
    #[must_use]
    pub fn logs(mut self) -> Self {
        self.telemetry = self.telemetry.with_logs();
        self
    }

    /// Records an event counter and a duration histogram on a meter from `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.telemetry = self.telemetry.with_metrics(provider);
        self
    }

    /// Builds the accessor.
    #[must_use]
    pub fn build(self) -> CacheAccessor<C, Cd> {
        CacheAccessor::from_parts(
            self.name,
            self.cache,
            self.codec,
            self.default_policy,
            self.telemetry.build(),
            self.stampede_protection,
        )
    }
}
