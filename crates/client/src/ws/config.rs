//! Socket client configuration and reconnect backoff.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{env_flag, TokenProvider};

pub const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a [`SocketClient`](super::SocketClient).
#[derive(Clone)]
pub struct WebSocketConfig {
    /// Socket endpoint. `http(s)` URLs are accepted and mapped to `ws(s)`.
    pub url: String,
    pub token_provider: TokenProvider,
    pub debug: bool,
    /// Consecutive failed connects before giving up (0 = never give up).
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    /// Bounds both a single handshake and [`ensure_connection`](super::SocketClient::ensure_connection).
    pub connect_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl WebSocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token_provider: Arc::new(|| None),
            debug: false,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MARKETPLACE_WS_URL`: socket endpoint (default: "ws://localhost:3000/ws")
    /// - `MARKETPLACE_DEBUG`: "1" or "true" enables frame logging
    pub fn from_env() -> Self {
        let url = std::env::var("MARKETPLACE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());
        Self::new(url).with_debug(env_flag("MARKETPLACE_DEBUG"))
    }

    pub fn with_token_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.token_provider = Arc::new(provider);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            max_attempts: self.max_reconnect_attempts,
            initial_delay: self.reconnect_delay,
            max_delay: self.max_reconnect_delay.max(self.reconnect_delay),
            ..ReconnectConfig::default()
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WS_URL)
    }
}

impl fmt::Debug for WebSocketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketConfig")
            .field("url", &self.url)
            .field("debug", &self.debug)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("max_reconnect_delay", &self.max_reconnect_delay)
            .field("connect_timeout", &self.connect_timeout)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish_non_exhaustive()
    }
}

/// Auto-reconnect behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failed attempts (0 = infinite)
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            initial_delay: DEFAULT_RECONNECT_DELAY,
            max_delay: DEFAULT_MAX_RECONNECT_DELAY,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(32) as i32;
        let delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
            .unwrap_or(self.max_delay)
    }

    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts > 0 && failures >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1500));
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(5000));
    }

    #[test]
    fn zero_max_attempts_never_exhausts() {
        let config = ReconnectConfig {
            max_attempts: 0,
            ..ReconnectConfig::default()
        };
        assert!(!config.exhausted(1000));
        assert!(ReconnectConfig::default().exhausted(5));
        assert!(!ReconnectConfig::default().exhausted(4));
    }

    #[test]
    fn degenerate_backoff_falls_back_to_max_delay() {
        let config = ReconnectConfig {
            backoff_multiplier: -2.0,
            ..ReconnectConfig::default()
        };
        assert_eq!(config.delay_for_attempt(1), config.max_delay);

        let config = ReconnectConfig {
            initial_delay: Duration::MAX,
            max_delay: Duration::MAX,
            ..ReconnectConfig::default()
        };
        assert_eq!(config.delay_for_attempt(3), Duration::MAX);
    }

    #[test]
    fn socket_defaults() {
        let config = WebSocketConfig::default();
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert!((config.token_provider)().is_none());
    }

    #[test]
    fn reconnect_never_caps_below_initial_delay() {
        let config = WebSocketConfig::default()
            .with_reconnect_delay(Duration::from_secs(10))
            .with_max_reconnect_delay(Duration::from_secs(1));
        assert_eq!(config.reconnect().delay_for_attempt(0), Duration::from_secs(10));
    }
}
