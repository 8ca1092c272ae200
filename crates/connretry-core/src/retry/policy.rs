use super::error::PolicyError;
use std::time::Duration;

/// Fixed-interval retry policy bounded by an overall connect timeout.
///
/// `max_retries` counts re-attempts beyond the first, so a connection makes
/// at most `max_retries + 1` attempts. The connect timeout bounds the whole
/// operation and is not reset between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_interval: Duration,
    connect_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval: Duration::from_millis(500),
            connect_timeout: Some(Duration::from_secs(15)),
        }
    }
}

impl RetryPolicy {
    /// Build a policy. `connect_timeout = None` means unbounded; a finite
    /// timeout must be positive.
    pub fn new(
        max_retries: u32,
        retry_interval: Duration,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, PolicyError> {
        if connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PolicyError::ZeroConnectTimeout);
        }
        Ok(Self {
            max_retries,
            retry_interval,
            connect_timeout,
        })
    }

    /// Same as [`RetryPolicy::new`] with millisecond inputs, as they appear in config.
    pub fn from_millis(
        max_retries: u32,
        retry_interval_ms: u64,
        connect_timeout_ms: Option<u64>,
    ) -> Result<Self, PolicyError> {
        Self::new(
            max_retries,
            Duration::from_millis(retry_interval_ms),
            connect_timeout_ms.map(Duration::from_millis),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Whether another re-attempt is allowed after `retries_made` re-attempts.
    pub fn has_retries_left(&self, retries_made: u32) -> bool {
        retries_made < self.max_retries
    }
}
