// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for accessor operations.

use std::error::Error as StdError;

use crate::codec::CodecError;

/// An error from a [`CacheAccessor`](crate::CacheAccessor) operation.
///
/// Which failures surface depends on the operation. Tolerant reads (`try_get`, `get`,
/// `get_or_default`) treat an undecodable entry as a miss and never return
/// [`Error::Decode`]; the cache-aside family does. Transport and producer failures are
/// always returned, never retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying cache did not complete a read or write.
    #[error(transparent)]
    Transport(#[from] cacheside_tier::Error),

    /// An entry was present but could not be decoded as the requested type.
    #[error("entry for key `{key}` could not be decoded")]
    Decode {
        /// The key whose entry was malformed.
        key: String,
        /// The codec's description of the failure.
        #[source]
        source: CodecError,
    },

    /// A value could not be encoded. Nothing was written.
    #[error("value for key `{key}` could not be encoded")]
    Encode {
        /// The key the value was meant for.
        key: String,
        /// The codec's description of the failure.
        #[source]
        source: CodecError,
    },

    /// The caller-supplied producer failed. Nothing was written.
    #[error("producer failed")]
    Producer(#[source] Box<dyn StdError + Send + Sync>),

    /// The operation observed cancellation before it completed.
    ///
    /// If the operation was a write, the write was not issued.
    #[error("operation was cancelled")]
    Cancelled,
}

impl Error {
    /// Wraps a producer's error.
    pub fn producer(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Producer(cause.into())
    }

    /// Returns `true` if the underlying cache failed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if a present entry could not be decoded.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns `true` if a value could not be encoded.
    #[must_use]
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }

    /// Returns `true` if the producer failed.
    #[must_use]
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the producer's original error if it is of type `E`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside::Error;
    ///
    /// let error = Error::producer(std::io::Error::other("upstream down"));
    /// let io = error.producer_error::<std::io::Error>().unwrap();
    /// assert_eq!(io.to_string(), "upstream down");
    /// ```
    #[must_use]
    pub fn producer_error<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Producer(cause) => cause.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A specialized [`Result`] type for accessor operations.
pub type Result<T> = std::result::Result<T, Error>;
