// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache transport operations.

use std::error::Error as StdError;

/// An error from a cache transport.
///
/// This is an opaque error type that wraps whatever the underlying transport reported:
/// a refused connection, a timeout, a rejected expiration policy. Use
/// [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use cacheside_tier::Error;
///
/// let error = Error::caused_by("connection refused");
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[derive(Debug, thiserror::Error)]
#[error("cache transport failed: {source}")]
pub struct Error {
    source: Box<dyn StdError + Send + Sync>,
}

impl Error {
    /// Creates a new error from anything convertible into a boxed error.
    ///
    /// String messages and concrete error types are both accepted.
    pub fn caused_by(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { source: cause.into() }
    }

    /// Returns the underlying cause if it is of type `E`.
    #[must_use]
    pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

/// A specialized [`Result`] type for cache transport operations.
pub type Result<T> = std::result::Result<T, Error>;
