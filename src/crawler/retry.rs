//! Exponential backoff for failed renders
//!
//! The decision depends only on how many times a request has already failed,
//! never on why it failed.

use crate::config::RetryConfig;
use std::time::Duration;

/// What to do with a request that just failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enqueue the request once the delay has elapsed
    RetryAfter(Duration),
    /// Drop the request and count it as permanently failed
    GiveUp,
}

/// Fixed exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }

    /// Decides the fate of a request that has failed `attempt + 1` times
    ///
    /// With the defaults: 0 → 1s, 1 → 2s, 2 → 4s, 3 and above → give up.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        RetryDecision::RetryAfter(self.base_delay.saturating_mul(factor))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(0), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(policy.decide(1), RetryDecision::RetryAfter(Duration::from_secs(2)));
        assert_eq!(policy.decide(2), RetryDecision::RetryAfter(Duration::from_secs(4)));
        assert_eq!(policy.decide(3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_gives_up_past_threshold() {
        let policy = RetryPolicy::default();
        for attempt in 3..20 {
            assert_eq!(policy.decide(attempt), RetryDecision::GiveUp);
        }
    }

    #[test]
    fn test_delays_strictly_increase_and_stay_bounded() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;

        for attempt in 0..policy.max_retries() {
            match policy.decide(attempt) {
                RetryDecision::RetryAfter(delay) => {
                    assert!(delay > previous);
                    assert!(delay <= Duration::from_secs(4));
                    previous = delay;
                }
                RetryDecision::GiveUp => panic!("gave up early at attempt {}", attempt),
            }
        }
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_retries: 1,
            base_delay_ms: 250,
        });
        assert_eq!(
            policy.decide(0),
            RetryDecision::RetryAfter(Duration::from_millis(250))
        );
        assert_eq!(policy.decide(1), RetryDecision::GiveUp);
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.decide(0), RetryDecision::GiveUp);
    }
}
