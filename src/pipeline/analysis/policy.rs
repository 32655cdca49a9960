use std::time::Duration;

/// Poll schedule for one document.
///
/// The first call happens `initial_interval` after the loop starts; each
/// "not ready" answer stretches the next delay by `multiplier`, capped at
/// `max_interval`. No call is issued once `max_wait` has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(3000),
            multiplier: 1.5,
            max_interval: Duration::from_secs(30),
            max_wait: Duration::from_millis(300_000),
        }
    }
}

impl PollPolicy {
    /// Constant interval, no backoff.
    pub fn fixed(interval: Duration, max_wait: Duration) -> Self {
        Self {
            initial_interval: interval,
            multiplier: 1.0,
            max_interval: interval,
            max_wait,
        }
    }

    pub fn next_delay(&self, current: Duration) -> Duration {
        let factor = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let cap = self.max_interval.max(self.initial_interval);
        current.mul_f64(factor).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_timings() {
        let policy = PollPolicy::default();
        assert_eq!(policy.initial_interval, Duration::from_secs(3));
        assert_eq!(policy.max_wait, Duration::from_secs(300));
    }

    #[test]
    fn backoff_grows_then_caps() {
        let policy = PollPolicy::default();
        let d1 = policy.next_delay(policy.initial_interval);
        assert_eq!(d1, Duration::from_millis(4500));
        let mut delay = d1;
        for _ in 0..20 {
            delay = policy.next_delay(delay);
        }
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn fixed_policy_never_grows() {
        let policy = PollPolicy::fixed(Duration::from_secs(3), Duration::from_secs(300));
        assert_eq!(policy.next_delay(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[test]
    fn shrinking_multiplier_is_ignored() {
        let policy = PollPolicy {
            multiplier: 0.2,
            ..PollPolicy::default()
        };
        assert_eq!(policy.next_delay(Duration::from_secs(3)), Duration::from_secs(3));
    }
}
