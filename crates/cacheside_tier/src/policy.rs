// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use crate::Error;

const DEFAULT_ABSOLUTE_EXPIRATION: Duration = Duration::from_secs(12 * 60 * 60);
const DEFAULT_SLIDING_EXPIRATION: Duration = Duration::from_secs(2 * 60 * 60);

/// Expiration settings attached to an entry when it is written.
///
/// An entry expires at the earliest of:
/// - its absolute deadline, given either as a point in time or relative to the write,
/// - the end of its sliding window, which restarts every time the entry is read or refreshed.
///
/// The [`Default`] policy expires entries 12 hours after they were written and after
/// 2 hours without access. [`ExpirationPolicy::none`] never expires entries; the transport
/// alone decides when to evict them.
///
/// # Examples
///
/// ```
/// use cacheside_tier::ExpirationPolicy;
/// use std::time::Duration;
///
/// let policy = ExpirationPolicy::default();
/// assert_eq!(policy.absolute_expiration_relative_to_now(), Some(Duration::from_secs(12 * 3600)));
/// assert_eq!(policy.sliding_expiration(), Some(Duration::from_secs(2 * 3600)));
///
/// let short = ExpirationPolicy::none().with_sliding_expiration(Duration::from_secs(30));
/// assert_eq!(short.absolute_expiration_relative_to_now(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExpirationPolicy {
    absolute_expiration: Option<SystemTime>,
    absolute_expiration_relative_to_now: Option<Duration>,
    sliding_expiration: Option<Duration>,
}

impl ExpirationPolicy {
    /// The policy used when a write does not supply its own.
    pub const DEFAULT: Self = Self {
        absolute_expiration: None,
        absolute_expiration_relative_to_now: Some(DEFAULT_ABSOLUTE_EXPIRATION),
        sliding_expiration: Some(DEFAULT_SLIDING_EXPIRATION),
    };

    /// Creates a policy with no expiration at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            absolute_expiration: None,
            absolute_expiration_relative_to_now: None,
            sliding_expiration: None,
        }
    }

    /// Sets an absolute point in time after which the entry expires.
    #[must_use]
    pub fn with_absolute_expiration(mut self, at: SystemTime) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    /// Sets the absolute expiration relative to the moment the entry is written.
    #[must_use]
    pub fn with_absolute_expiration_relative_to_now(mut self, after: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(after);
        self
    }

    /// Sets how long the entry may go unread before it expires.
    #[must_use]
    pub fn with_sliding_expiration(mut self, idle: Duration) -> Self {
        self.sliding_expiration = Some(idle);
        self
    }

    /// Returns the absolute point in time after which the entry expires, if set.
    #[must_use]
    pub fn absolute_expiration(&self) -> Option<SystemTime> {
        self.absolute_expiration
    }

    /// Returns the absolute expiration relative to the write, if set.
    #[must_use]
    pub fn absolute_expiration_relative_to_now(&self) -> Option<Duration> {
        self.absolute_expiration_relative_to_now
    }

    /// Returns the sliding expiration window, if set.
    #[must_use]
    pub fn sliding_expiration(&self) -> Option<Duration> {
        self.sliding_expiration
    }

    /// Resolves the absolute part of the policy into a time-to-live for a write at `now`.
    ///
    /// When both an absolute point in time and a relative duration are set, the earlier
    /// deadline wins. Returns `Ok(None)` when the policy has no absolute component.
    ///
    /// # Errors
    ///
    /// Returns an error when a duration is zero or the absolute point in time is not in
    /// the future relative to `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheside_tier::ExpirationPolicy;
    /// use std::time::{Duration, SystemTime};
    ///
    /// let now = SystemTime::now();
    /// let policy = ExpirationPolicy::none()
    ///     .with_absolute_expiration(now + Duration::from_secs(60))
    ///     .with_absolute_expiration_relative_to_now(Duration::from_secs(600));
    ///
    /// assert_eq!(policy.absolute_ttl(now)?, Some(Duration::from_secs(60)));
    /// # Ok::<(), cacheside_tier::Error>(())
    /// ```
    pub fn absolute_ttl(&self, now: SystemTime) -> Result<Option<Duration>, Error> {
        if self.sliding_expiration == Some(Duration::ZERO) {
            return Err(Error::caused_by("the sliding expiration must be positive"));
        }

        let relative = match self.absolute_expiration_relative_to_now {
            Some(Duration::ZERO) => return Err(Error::caused_by("the relative expiration must be positive")),
            other => other,
        };

        let until_deadline = match self.absolute_expiration {
            Some(at) => match at.duration_since(now) {
                Ok(remaining) if !remaining.is_zero() => Some(remaining),
                _ => return Err(Error::caused_by("the absolute expiration must be in the future")),
            },
            None => None,
        };

        Ok(match (relative, until_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        })
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_twelve_hours_absolute_two_hours_sliding() {
        let policy = ExpirationPolicy::default();
        assert_eq!(policy.absolute_expiration_relative_to_now(), Some(Duration::from_secs(43_200)));
        assert_eq!(policy.sliding_expiration(), Some(Duration::from_secs(7_200)));
        assert_eq!(policy.absolute_expiration(), None);
    }

    #[test]
    fn none_policy_has_no_components() {
        let policy = ExpirationPolicy::none();
        assert_eq!(policy.absolute_ttl(SystemTime::now()).unwrap(), None);
        assert_eq!(policy.sliding_expiration(), None);
    }

    #[test]
    fn absolute_ttl_uses_relative_duration() {
        let policy = ExpirationPolicy::none().with_absolute_expiration_relative_to_now(Duration::from_secs(5));
        assert_eq!(policy.absolute_ttl(SystemTime::now()).unwrap(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn absolute_ttl_prefers_earlier_deadline() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let policy = ExpirationPolicy::none()
            .with_absolute_expiration(now + Duration::from_secs(600))
            .with_absolute_expiration_relative_to_now(Duration::from_secs(60));

        assert_eq!(policy.absolute_ttl(now).unwrap(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn absolute_ttl_rejects_past_deadline() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let policy = ExpirationPolicy::none().with_absolute_expiration(now - Duration::from_secs(1));

        let err = policy.absolute_ttl(now).unwrap_err();
        assert!(err.to_string().contains("must be in the future"));
    }

    #[test]
    fn absolute_ttl_rejects_deadline_equal_to_now() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let policy = ExpirationPolicy::none().with_absolute_expiration(now);
        policy.absolute_ttl(now).unwrap_err();
    }

    #[test]
    fn absolute_ttl_rejects_zero_durations() {
        let now = SystemTime::now();
        ExpirationPolicy::none()
            .with_absolute_expiration_relative_to_now(Duration::ZERO)
            .absolute_ttl(now)
            .unwrap_err();
        ExpirationPolicy::none()
            .with_sliding_expiration(Duration::ZERO)
            .absolute_ttl(now)
            .unwrap_err();
    }
}
