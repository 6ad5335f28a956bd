//! Bounded retry policy with exponential backoff.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How many silent background retries a transient failure gets, and how far
/// apart they are spaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// A policy that never retries automatically.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_ms: 0,
            max_ms: 0,
            multiplier: 1.0,
            jitter_ms: 0,
        }
    }

    /// Whether a failure on 0-based `attempt` may be retried in the background.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_ms as f64 * self.multiplier.powi(attempt as i32);
        let base = if scaled.is_finite() {
            (scaled as u64).min(self.max_ms)
        } else {
            self.max_ms
        };
        Duration::from_millis(jittered_backoff(base, self.jitter_ms))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_retries > 0 && self.initial_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "retry.initial_ms".to_string(),
                reason: "must be > 0 when retries are enabled".to_string(),
            });
        }
        if self.max_ms < self.initial_ms {
            return Err(ValidationError::InvalidValue {
                field: "retry.max_ms".to_string(),
                reason: "must be >= initial_ms".to_string(),
            });
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(ValidationError::InvalidValue {
                field: "retry.multiplier".to_string(),
                reason: "must be >= 1.0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_ms: 250,
            max_ms: 5_000,
            multiplier: 2.0,
            jitter_ms: 100,
        }
    }
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_ms: 100,
            max_ms: 1_000,
            multiplier: 2.0,
            jitter_ms: 0,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let p = policy();
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(10), Duration::from_millis(1_000));
    }

    #[test]
    fn test_allows_is_bounded() {
        let p = policy();
        assert!(p.allows(0));
        assert!(p.allows(2));
        assert!(!p.allows(3));
        assert!(!RetryPolicy::disabled().allows(0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut p = policy();
        p.max_ms = 50;
        assert!(p.validate().is_err());

        let mut p = policy();
        p.multiplier = 0.5;
        assert!(p.validate().is_err());

        let mut p = policy();
        p.initial_ms = 0;
        p.max_ms = 0;
        assert!(p.validate().is_err());

        assert!(RetryPolicy::disabled().validate().is_ok());
        assert!(RetryPolicy::default().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_delay_within_bounds(attempt in 0u32..64, jitter in 0u64..50) {
            let mut p = policy();
            p.jitter_ms = jitter;
            let delay = p.delay_for(attempt).as_millis() as u64;
            prop_assert!(delay >= p.initial_ms.min(p.max_ms));
            prop_assert!(delay < p.max_ms + jitter.max(1));
        }
    }
}
