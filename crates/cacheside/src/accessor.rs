// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The typed cache-aside accessor.

use std::{future::Future, time::Instant};

use cacheside_tier::{DistributedCache, ExpirationPolicy};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

use crate::{
    Error, Result,
    builder::AccessorBuilder,
    codec::{Codec, CodecError, JsonCodec, is_absent},
    stampede::{KeyGuard, KeyedLocks},
    telemetry::{AccessorTelemetry, CacheActivity, CacheOperation},
};

/// Name identifying an accessor in logs and metrics.
pub type AccessorName = &'static str;

/// Outcome of reading and decoding one entry.
enum Lookup<T> {
    Hit(T),
    Miss,
    Malformed(CodecError),
}

impl<T> Lookup<T> {
    fn activity(&self) -> CacheActivity {
        match self {
            Self::Hit(_) => CacheActivity::Hit,
            Self::Miss => CacheActivity::Miss,
            Self::Malformed(_) => CacheActivity::Malformed,
        }
    }
}

/// Typed read/write access to a byte-oriented [`DistributedCache`].
///
/// The accessor encodes values with its [`Codec`] (JSON by default) and writes them with a
/// default [`ExpirationPolicy`] fixed at construction. Two families of reads are offered:
///
/// - **Tolerant reads** ([`try_get`](Self::try_get), [`get`](Self::get),
///   [`get_or_default`](Self::get_or_default)) treat an entry that does not decode as the
///   requested type exactly like a missing one.
/// - **Cache-aside reads** ([`get_or_insert`](Self::get_or_insert) and friends) return a
///   present entry, or run the caller's producer on a miss and write its value back. Here a
///   malformed entry is an [`Error::Decode`].
///
/// Every operation takes a [`CancellationToken`]. Reads and producers are abandoned when the
/// token fires. Writes are only issued if the token has not fired; once issued they run to
/// completion, so an `Ok` always means the value was stored and [`Error::Cancelled`] from a
/// write always means it was not.
///
/// # Examples
///
/// ```
/// use cacheside::{CacheAccessor, CancellationToken, InMemoryDistributedCache};
/// # futures::executor::block_on(async {
///
/// let accessor = CacheAccessor::new(InMemoryDistributedCache::new());
/// let token = CancellationToken::new();
///
/// let greeting: String = accessor
///     .get_or_insert("greeting", None, &token, || async { "hello".to_string() })
///     .await?;
/// assert_eq!(greeting, "hello");
///
/// let cached: Option<String> = accessor.try_get("greeting", &token).await?;
/// assert_eq!(cached.as_deref(), Some("hello"));
/// # Ok::<(), cacheside::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct CacheAccessor<C, Cd = JsonCodec> {
    name: AccessorName,
    cache: C,
    codec: Cd,
    default_policy: ExpirationPolicy,
    telemetry: AccessorTelemetry,
    locks: Option<KeyedLocks>,
}

impl<C> CacheAccessor<C, JsonCodec>
where
    C: DistributedCache,
{
    /// Creates a builder for an accessor over `cache`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use cacheside::{CacheAccessor, ExpirationPolicy, InMemoryDistributedCache};
    ///
    /// let accessor = CacheAccessor::builder(InMemoryDistributedCache::new())
    ///     .name("profiles")
    ///     .default_policy(ExpirationPolicy::none().with_sliding_expiration(Duration::from_secs(300)))
    ///     .build();
    ///
    /// assert_eq!(accessor.name(), "profiles");
    /// ```
    #[must_use]
    pub fn builder(cache: C) -> AccessorBuilder<C> {
        AccessorBuilder::new(cache)
    }

    /// Creates an accessor with the JSON codec and the default expiration policy
    /// (12 hours absolute, 2 hours sliding).
    #[must_use]
    pub fn new(cache: C) -> Self {
        Self::builder(cache).build()
    }
}

#[cfg(feature = "memory")]
impl CacheAccessor<cacheside_memory::InMemoryDistributedCache, JsonCodec> {
    /// Creates an accessor over a fresh, unbounded in-process cache.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(cacheside_memory::InMemoryDistributedCache::new())
    }
}

impl<C, Cd> CacheAccessor<C, Cd> {
    pub(crate) fn from_parts(
        name: AccessorName,
        cache: C,
        codec: Cd,
        default_policy: ExpirationPolicy,
        telemetry: AccessorTelemetry,
        stampede_protection: bool,
    ) -> Self {
        Self {
            name,
            cache,
            codec,
            default_policy,
            telemetry,
            locks: stampede_protection.then(KeyedLocks::default),
        }
    }

    /// Returns the name used in telemetry.
    #[must_use]
    pub fn name(&self) -> AccessorName {
        self.name
    }

    /// Returns the policy applied to writes that do not supply their own.
    #[must_use]
    pub fn default_policy(&self) -> &ExpirationPolicy {
        &self.default_policy
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> &Cd {
        &self.codec
    }

    /// Returns `true` if cache-aside calls are serialized per key.
    #[must_use]
    pub fn has_stampede_protection(&self) -> bool {
        self.locks.is_some()
    }

    /// Returns a reference to the underlying cache.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.cache
    }

    /// Consumes the accessor and returns the underlying cache.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.cache
    }
}

/// Tolerant reads.
impl<C, Cd> CacheAccessor<C, Cd>
where
    C: DistributedCache,
    Cd: Codec,
{
    /// Reads and decodes the entry for `key`.
    ///
    /// Returns `None` if the entry is missing or does not decode as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the read fails and [`Error::Cancelled`] if
    /// `cancellation` fires first.
    pub async fn try_get<T>(&self, key: &str, cancellation: &CancellationToken) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.observe(CacheOperation::TryGet, async {
            let lookup = self.lookup::<T>(key, cancellation).await?;
            let activity = lookup.activity();
            let value = match lookup {
                Lookup::Hit(value) => Some(value),
                Lookup::Miss | Lookup::Malformed(_) => None,
            };
            Ok((value, activity))
        })
        .await
    }

    /// Reads the entry for `key`, falling back to `T::default()`.
    ///
    /// # Errors
    ///
    /// Same as [`try_get`](Self::try_get).
    pub async fn get<T>(&self, key: &str, cancellation: &CancellationToken) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.read_or(CacheOperation::Get, key, T::default, cancellation).await
    }

    /// Reads the entry for `key`, falling back to `default`.
    ///
    /// A malformed entry also yields `default`.
    ///
    /// # Errors
    ///
    /// Same as [`try_get`](Self::try_get).
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::{CacheAccessor, CancellationToken};
    /// # futures::executor::block_on(async {
    ///
    /// let accessor = CacheAccessor::in_memory();
    /// let token = CancellationToken::new();
    ///
    /// let retries: u32 = accessor.get_or_default("retries", 3, &token).await?;
    /// assert_eq!(retries, 3);
    /// # Ok::<(), cacheside::Error>(())
    /// # });
    /// ```
    pub async fn get_or_default<T>(&self, key: &str, default: T, cancellation: &CancellationToken) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.read_or(CacheOperation::GetOrDefault, key, || default, cancellation).await
    }

    async fn read_or<T>(
        &self,
        operation: CacheOperation,
        key: &str,
        fallback: impl FnOnce() -> T,
        cancellation: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.observe(operation, async {
            let lookup = self.lookup::<T>(key, cancellation).await?;
            let activity = lookup.activity();
            let value = match lookup {
                Lookup::Hit(value) => value,
                Lookup::Miss | Lookup::Malformed(_) => fallback(),
            };
            Ok((value, activity))
        })
        .await
    }
}

/// Cache-aside reads.
impl<C, Cd> CacheAccessor<C, Cd>
where
    C: DistributedCache,
    Cd: Codec,
{
    /// Returns the cached value for `key`, or produces, stores and returns it.
    ///
    /// On a miss `producer` is called once and its value is written with `policy`, or with
    /// the accessor's default policy when `policy` is `None`. The write completes before the
    /// value is returned. An absent value, such as `None` when `T` is an `Option`, is returned
    /// without being written, so the next call runs the producer again.
    ///
    /// # Stampede Protection
    ///
    /// When enabled via [`stampede_protection()`](crate::AccessorBuilder::stampede_protection),
    /// concurrent calls for the same key run one at a time, so later callers find the entry
    /// written by the first. Calling a cache-aside method for the same key from inside
    /// `producer` then deadlocks.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if the entry is present but does not decode as `T`.
    /// - [`Error::Encode`] if the produced value cannot be encoded. Nothing is written.
    /// - [`Error::Transport`] if the read or write fails.
    /// - [`Error::Cancelled`] if `cancellation` fires before the write is issued.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::{CacheAccessor, CancellationToken};
    /// # futures::executor::block_on(async {
    ///
    /// let accessor = CacheAccessor::in_memory();
    /// let token = CancellationToken::new();
    ///
    /// let first: u64 = accessor.get_or_insert("answer", None, &token, || async { 42 }).await?;
    /// let second: u64 = accessor.get_or_insert("answer", None, &token, || async { 0 }).await?;
    /// assert_eq!(first, 42);
    /// assert_eq!(second, 42);
    /// # Ok::<(), cacheside::Error>(())
    /// # });
    /// ```
    pub async fn get_or_insert<T, Fut>(
        &self,
        key: &str,
        policy: Option<&ExpirationPolicy>,
        cancellation: &CancellationToken,
        producer: impl FnOnce() -> Fut + Send,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = T> + Send,
    {
        self.observe(CacheOperation::GetOrInsert, async {
            let _guard = self.lock(key, cancellation).await?;
            if let Some(value) = self.read_through(key, cancellation).await? {
                return Ok((value, CacheActivity::Hit));
            }

            let value = cancellable(cancellation, producer()).await?;
            let activity = self.store(key, &value, policy, cancellation).await?;
            Ok((value, activity))
        })
        .await
    }

    /// Like [`get_or_insert`](Self::get_or_insert), but the producer can fail.
    ///
    /// A failed producer writes nothing; its error is returned as [`Error::Producer`] and can
    /// be recovered with [`Error::producer_error`].
    ///
    /// # Errors
    ///
    /// Same as [`get_or_insert`](Self::get_or_insert), plus [`Error::Producer`].
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::{CacheAccessor, CancellationToken};
    /// # futures::executor::block_on(async {
    ///
    /// let accessor = CacheAccessor::in_memory();
    /// let token = CancellationToken::new();
    ///
    /// let error = accessor
    ///     .try_get_or_insert::<u64, _, _>("quota", None, &token, || async {
    ///         Err(std::io::Error::other("quota service down"))
    ///     })
    ///     .await
    ///     .unwrap_err();
    /// assert!(error.producer_error::<std::io::Error>().is_some());
    /// # });
    /// ```
    pub async fn try_get_or_insert<T, E, Fut>(
        &self,
        key: &str,
        policy: Option<&ExpirationPolicy>,
        cancellation: &CancellationToken,
        producer: impl FnOnce() -> Fut + Send,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        E: std::error::Error + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        self.observe(CacheOperation::GetOrInsert, async {
            let _guard = self.lock(key, cancellation).await?;
            if let Some(value) = self.read_through(key, cancellation).await? {
                return Ok((value, CacheActivity::Hit));
            }

            let value = cancellable(cancellation, producer()).await?.map_err(Error::producer)?;
            let activity = self.store(key, &value, policy, cancellation).await?;
            Ok((value, activity))
        })
        .await
    }

    /// Like [`get_or_insert`](Self::get_or_insert), but the producer may have nothing to
    /// cache.
    ///
    /// A producer returning `None` writes nothing and `None` is returned.
    ///
    /// # Errors
    ///
    /// Same as [`get_or_insert`](Self::get_or_insert).
    pub async fn optionally_get_or_insert<T, Fut>(
        &self,
        key: &str,
        policy: Option<&ExpirationPolicy>,
        cancellation: &CancellationToken,
        producer: impl FnOnce() -> Fut + Send,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Option<T>> + Send,
    {
        self.observe(CacheOperation::GetOrInsert, async {
            let _guard = self.lock(key, cancellation).await?;
            if let Some(value) = self.read_through(key, cancellation).await? {
                return Ok((Some(value), CacheActivity::Hit));
            }

            let Some(value) = cancellable(cancellation, producer()).await? else {
                return Ok((None, CacheActivity::NotCached));
            };
            let activity = self.store(key, &value, policy, cancellation).await?;
            Ok((Some(value), activity))
        })
        .await
    }

    async fn lock(&self, key: &str, cancellation: &CancellationToken) -> Result<Option<KeyGuard>> {
        match &self.locks {
            Some(locks) => cancellable(cancellation, locks.lock(key)).await.map(Some),
            None => Ok(None),
        }
    }

    /// Writes a produced value unless it is absent (`None`, `()`), which is never cached.
    async fn store<T>(
        &self,
        key: &str,
        value: &T,
        policy: Option<&ExpirationPolicy>,
        cancellation: &CancellationToken,
    ) -> Result<CacheActivity>
    where
        T: Serialize,
    {
        if is_absent(value) {
            return Ok(CacheActivity::NotCached);
        }

        self.write(key, value, policy, cancellation).await?;
        Ok(CacheActivity::Written)
    }

    async fn read_through<T>(&self, key: &str, cancellation: &CancellationToken) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.lookup(key, cancellation).await? {
            Lookup::Hit(value) => Ok(Some(value)),
            Lookup::Miss => Ok(None),
            Lookup::Malformed(source) => Err(Error::Decode {
                key: key.to_owned(),
                source,
            }),
        }
    }
}

/// Writes and maintenance.
impl<C, Cd> CacheAccessor<C, Cd>
where
    C: DistributedCache,
    Cd: Codec,
{
    /// Encodes `value` and writes it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the value cannot be encoded, [`Error::Transport`] if the
    /// write fails and [`Error::Cancelled`] if `cancellation` fired before the write was
    /// issued. In every error case nothing was stored by this call.
    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        policy: Option<&ExpirationPolicy>,
        cancellation: &CancellationToken,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.observe(CacheOperation::Set, async {
            self.write(key, value, policy, cancellation).await?;
            Ok(((), CacheActivity::Written))
        })
        .await
    }

    /// Removes the entry for `key`. Removing a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the removal fails and [`Error::Cancelled`] if
    /// `cancellation` fired before it was issued.
    pub async fn remove(&self, key: &str, cancellation: &CancellationToken) -> Result<()> {
        self.observe(CacheOperation::Remove, async {
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.cache.remove(key).await?;
            Ok(((), CacheActivity::Removed))
        })
        .await
    }

    /// Restarts the sliding expiration window of the entry for `key` without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the refresh fails and [`Error::Cancelled`] if
    /// `cancellation` fires first.
    pub async fn refresh(&self, key: &str, cancellation: &CancellationToken) -> Result<()> {
        self.observe(CacheOperation::Refresh, async {
            cancellable(cancellation, self.cache.refresh(key)).await??;
            Ok(((), CacheActivity::Refreshed))
        })
        .await
    }

    async fn lookup<T>(&self, key: &str, cancellation: &CancellationToken) -> Result<Lookup<T>>
    where
        T: DeserializeOwned,
    {
        let Some(bytes) = cancellable(cancellation, self.cache.get(key)).await?? else {
            return Ok(Lookup::Miss);
        };

        Ok(match self.codec.decode(&bytes) {
            Ok(value) => Lookup::Hit(value),
            Err(source) => Lookup::Malformed(source),
        })
    }

    async fn write<T>(&self, key: &str, value: &T, policy: Option<&ExpirationPolicy>, cancellation: &CancellationToken) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = self.codec.encode(value).map_err(|source| Error::Encode {
            key: key.to_owned(),
            source,
        })?;

        // Issued writes are never abandoned.
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.cache.set(key, bytes, policy.unwrap_or(&self.default_policy)).await?;
        Ok(())
    }

    async fn observe<R>(&self, operation: CacheOperation, operation_fut: impl Future<Output = Result<(R, CacheActivity)>>) -> Result<R> {
        let start = Instant::now();
        let result = operation_fut.await;
        let activity = match &result {
            Ok((_, activity)) => *activity,
            Err(error) => CacheActivity::from_error(error),
        };
        self.telemetry.record(self.name, operation, activity, start.elapsed());
        result.map(|(value, _)| value)
    }
}

/// Races `fut` against `token`, preferring cancellation when both are ready.
async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}
