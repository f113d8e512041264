use std::time::Duration;

/// Retry and throttling limits for one enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay slept after the first rate-limited answer.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive rate-limited answers that force a cooldown.
    pub cooldown_after: u32,
    pub cooldown: Duration,
    /// Total generation attempts per record.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            cooldown_after: 3,
            cooldown: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

/// What to wait for after a rate-limited answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffStep {
    pub wait: Duration,
    pub cooldown: Option<Duration>,
}

/// Throttling state shared by every record of one enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateState {
    current_delay: Duration,
    consecutive_rate_limit_hits: u32,
}

impl RateState {
    pub fn new(policy: &BackoffPolicy) -> Self {
        Self {
            current_delay: policy.base_delay,
            consecutive_rate_limit_hits: 0,
        }
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn consecutive_rate_limit_hits(&self) -> u32 {
        self.consecutive_rate_limit_hits
    }

    /// Record a rate-limited answer.
    ///
    /// The returned wait is the delay before doubling; the delay then doubles
    /// up to the cap. Every `cooldown_after`-th consecutive hit adds a
    /// cooldown and restarts the count.
    pub fn on_rate_limited(&mut self, policy: &BackoffPolicy) -> BackoffStep {
        let wait = self.current_delay;
        self.current_delay = (self.current_delay * 2).min(policy.max_delay);
        self.consecutive_rate_limit_hits += 1;

        let cooldown = if self.consecutive_rate_limit_hits >= policy.cooldown_after {
            self.consecutive_rate_limit_hits = 0;
            Some(policy.cooldown)
        } else {
            None
        };

        BackoffStep { wait, cooldown }
    }

    pub fn on_success(&mut self, policy: &BackoffPolicy) {
        self.current_delay = policy.base_delay;
        self.consecutive_rate_limit_hits = 0;
    }

    /// Any other failure ends the backoff sequence but not the hit streak.
    pub fn on_other_error(&mut self, policy: &BackoffPolicy) {
        self.current_delay = policy.base_delay;
    }
}
