use crate::protocol::BackoffConfig;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff for network-level failures.
///
/// `max_retries` counts retries, so a call makes at most `max_retries + 1`
/// attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(3, &BackoffConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(max_retries: u32, backoff: &BackoffConfig) -> Self {
        Self {
            max_retries,
            base_delay_ms: backoff.base_ms,
            multiplier: backoff.multiplier,
            max_delay_ms: backoff.max_ms,
            jitter: backoff.jitter,
        }
    }

    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retries_done` (0-based), or `None` when the
    /// budget is spent.
    pub fn next_delay(&self, retries_done: u32) -> Option<Duration> {
        (retries_done < self.max_retries).then(|| self.backoff_delay(retries_done))
    }

    /// `min(base * multiplier^n, cap)`, jittered by `U[0.5, 1.5)` when enabled.
    pub fn backoff_delay(&self, n: u32) -> Duration {
        let exp = n.min(i32::MAX as u32) as i32;
        let mut delay = self.base_delay_ms as f64 * self.multiplier.powi(exp);
        if self.jitter {
            let mut rng = rand::thread_rng();
            delay *= 0.5 + rng.gen::<f64>();
        }
        let capped = if delay.is_finite() {
            (delay as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        };
        Duration::from_millis(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_1_2_4_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.next_delay(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.next_delay(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.next_delay(3), None);
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(10));
        assert_eq!(policy.backoff_delay(5000), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..100 {
            let d = policy.backoff_delay(1);
            assert!(d >= Duration::from_secs(1) && d < Duration::from_secs(3));
        }
    }

    #[test]
    fn no_retries_means_single_attempt() {
        let policy = RetryPolicy::no_retries();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.next_delay(0), None);
    }
}
