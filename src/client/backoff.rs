//! Reconnection timing

use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Linear backoff with a cap, then periodic polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failures tolerated before falling back to polling
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ReconnectPolicy {
    /// Set the fallback poll interval, clamped to 1..=300 seconds
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        self
    }

    /// `min(attempt × base, max)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay before the next connection after `attempt` consecutive failures,
    /// or `None` once the client should give up and poll instead.
    pub fn retry_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.backoff_delay(attempt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear_then_capped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(3));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(6));
        assert_eq!(policy.backoff_delay(9), Duration::from_secs(27));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(50), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.retry_delay(9), Some(Duration::from_secs(27)));
        assert_eq!(policy.retry_delay(10), None);
        assert_eq!(policy.retry_delay(11), None);
    }

    #[test]
    fn test_poll_interval_clamped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(
            policy.with_poll_interval(Duration::ZERO).poll_interval,
            Duration::from_secs(1)
        );
        assert_eq!(
            policy.with_poll_interval(Duration::from_secs(3600)).poll_interval,
            Duration::from_secs(300)
        );
        assert_eq!(
            policy.with_poll_interval(Duration::from_secs(42)).poll_interval,
            Duration::from_secs(42)
        );
    }
}
