use std::time::Duration;

/// Bounded retry with exponential backoff for store submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
    /// Upper bound for a single submission. Hitting it counts as a transient failure.
    pub submit_timeout: Duration
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
            max_backoff: Duration::from_secs(8),
            submit_timeout: Duration::from_secs(10)
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_submit_timeout(mut self, submit_timeout: Duration) -> Self {
        self.submit_timeout = submit_timeout;
        self
    }

    /// At least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the `failed_attempts`-th consecutive failure.
    pub fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        let factor = self.multiplier.max(1).saturating_pow(exponent);

        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub retry: RetryPolicy,
    /// How many recently ingested transaction ids the client remembers.
    pub recent_capacity: u64,
    /// How long a recently ingested id is remembered.
    pub recent_ttl: Duration
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            recent_capacity: 10_000,
            recent_ttl: Duration::from_secs(60 * 60)
        }
    }
}

impl ListenerConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_recent_capacity(mut self, recent_capacity: u64) -> Self {
        self.recent_capacity = recent_capacity;
        self
    }

    pub fn with_recent_ttl(mut self, recent_ttl: Duration) -> Self {
        self.recent_ttl = recent_ttl;
        self
    }
}
