//! Configuration for the client.

use std::time::Duration;

/// Shortest accepted update rate.
pub const MIN_UPDATE_RATE: Duration = Duration::from_millis(10);

/// Longest accepted update rate.
pub const MAX_UPDATE_RATE: Duration = Duration::from_secs(1);

/// Clamps a requested update rate in seconds to the accepted range.
///
/// NaN, zero and negative values select the shortest rate.
pub fn clamp_update_rate(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return MIN_UPDATE_RATE;
    }
    let clamped = seconds.clamp(MIN_UPDATE_RATE.as_secs_f64(), MAX_UPDATE_RATE.as_secs_f64());
    Duration::from_secs_f64(clamped)
}

/// Configuration for a [`NetworkTable`](crate::NetworkTable) client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity announced in the client hello.
    pub identity: String,
    /// Interval between outbox flushes.
    pub update_rate: Duration,
    /// Upper bound on a single socket write.
    pub write_timeout: Duration,
    /// Upper bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Upper bound on the handshake after the socket is connected.
    pub handshake_timeout: Duration,
    /// Idle time after which a keep-alive is sent.
    pub keep_alive_interval: Duration,
    /// Decode errors tolerated within `protocol_error_window`.
    pub max_protocol_errors: usize,
    /// Window over which decode errors are counted.
    pub protocol_error_window: Duration,
    /// Reconnection backoff.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a configuration with the given identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            update_rate: Duration::from_millis(100),
            write_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(2),
            handshake_timeout: Duration::from_secs(5),
            keep_alive_interval: Duration::from_secs(1),
            max_protocol_errors: 3,
            protocol_error_window: Duration::from_secs(1),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the update rate in seconds, clamped to the accepted range.
    pub fn with_update_rate(mut self, seconds: f64) -> Self {
        self.update_rate = clamp_update_rate(seconds);
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the keep-alive interval.
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Sets the reconnection backoff.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("nettable")
    }
}

/// Configuration for reconnection backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates the default backoff: 100 ms doubling up to 5 s.
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// A fixed delay without growth or jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }

    /// Calculates the delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            // Add up to 25% jitter
            let jitter = delay_secs * 0.25 * rand::random::<f64>();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}
