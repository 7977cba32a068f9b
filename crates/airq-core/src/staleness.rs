//! Decides whether the cached entry can be served without a refresh.

use serde::{Deserialize, Serialize};

/// Default freshness window in seconds.
pub const FRESHNESS_WINDOW_SECS: i64 = 300;

/// Freshness window applied to the cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessPolicy {
    /// Maximum age in seconds at which an entry is still fresh.
    pub window_secs: i64,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            window_secs: FRESHNESS_WINDOW_SECS,
        }
    }
}

impl StalenessPolicy {
    /// Create a policy with a custom window.
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    /// Whether an entry written at `timestamp` is still fresh at `now`.
    ///
    /// An absent entry or timestamp is never fresh. A timestamp in the
    /// future (clock skew) counts as fresh.
    pub fn is_fresh(&self, entry_present: bool, timestamp: Option<i64>, now: i64) -> bool {
        match timestamp {
            Some(ts) if entry_present => now.saturating_sub(ts) <= self.window_secs,
            _ => false,
        }
    }
}

/// [`StalenessPolicy::is_fresh`] with the default 300 second window.
pub fn is_fresh(entry_present: bool, timestamp: Option<i64>, now: i64) -> bool {
    StalenessPolicy::default().is_fresh(entry_present, timestamp, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_window_boundaries() {
        assert!(is_fresh(true, Some(NOW), NOW));
        assert!(is_fresh(true, Some(NOW - 299), NOW));
        assert!(is_fresh(true, Some(NOW - 300), NOW));
        assert!(!is_fresh(true, Some(NOW - 301), NOW));
    }

    #[test]
    fn test_absent_is_stale() {
        assert!(!is_fresh(false, Some(NOW), NOW));
        assert!(!is_fresh(true, None, NOW));
        assert!(!is_fresh(false, None, NOW));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        assert!(is_fresh(true, Some(NOW + 3600), NOW));
    }

    #[test]
    fn test_custom_window() {
        let policy = StalenessPolicy::new(60);
        assert!(policy.is_fresh(true, Some(NOW - 60), NOW));
        assert!(!policy.is_fresh(true, Some(NOW - 61), NOW));

        let never = StalenessPolicy::new(0);
        assert!(never.is_fresh(true, Some(NOW), NOW));
        assert!(!never.is_fresh(true, Some(NOW - 1), NOW));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        assert!(!is_fresh(true, Some(i64::MIN), i64::MAX));
        assert!(is_fresh(true, Some(i64::MAX), i64::MIN));
    }
}
