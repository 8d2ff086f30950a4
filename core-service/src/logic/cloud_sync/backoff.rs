//! Publish Retry Policy
//!
//! Pure schedule; the publisher does the sleeping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_PUBLISH_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(constants::DEFAULT_BACKOFF_BASE_MS),
            max_delay: Duration::from_millis(constants::DEFAULT_BACKOFF_MAX_MS),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        Self {
            max_attempts: constants::get_publish_max_attempts(),
            base_delay: Duration::from_millis(constants::get_backoff_base_ms()),
            max_delay: Duration::from_millis(constants::get_backoff_max_ms()),
        }
    }

    /// Wait after failed attempt `attempt` (1-based): base × 2^(attempt-1), capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let ms: Vec<u128> = (1..=7).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(ms, vec![500, 1000, 2000, 4000, 8000, 8000, 8000]);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(8000));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy { max_attempts: 3, ..RetryPolicy::default() };
        assert!(policy.has_attempts_left(2));
        assert!(!policy.has_attempts_left(3));
    }
}
