//! Tunable intervals and the collector endpoint for the streaming client.

use std::time::Duration;

/// Default collector endpoint. Points at localhost so the project can be
/// cloned and exercised without infrastructure; deployments override it.
pub const DEFAULT_COLLECTOR_URL: &str = "ws://127.0.0.1:8508/ws";

/// Configuration for a [`StreamClient`](super::client::StreamClient).
///
/// All intervals are in milliseconds so they can be carried verbatim through
/// config files and environment variables.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Collector WebSocket endpoint. `None`, an unparsable value, or a
    /// non-`ws`/`wss` scheme selects the local log sink at construction.
    pub collector_url: Option<String>,
    /// How long the worker waits on an empty queue before re-checking its
    /// running flag.
    pub dequeue_timeout_ms: u64,
    /// Fixed delay between failed connection attempts.
    pub reconnect_delay_ms: u64,
    /// How long `stop()` waits for the worker before abandoning it.
    pub stop_timeout_ms: u64,
    /// Producer-side send gate: at most one snapshot per this interval.
    pub send_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            collector_url: Some(DEFAULT_COLLECTOR_URL.to_string()),
            dequeue_timeout_ms: 250,
            reconnect_delay_ms: 1000,
            stop_timeout_ms: 1000,
            send_interval_ms: 500,
        }
    }
}

impl StreamConfig {
    /// Default intervals with an explicit collector endpoint.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            collector_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Default intervals with no collector at all (log sink).
    pub fn offline() -> Self {
        Self {
            collector_url: None,
            ..Self::default()
        }
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_cadences() {
        let config = StreamConfig::default();
        assert_eq!(config.collector_url.as_deref(), Some(DEFAULT_COLLECTOR_URL));
        assert_eq!(config.dequeue_timeout(), Duration::from_millis(250));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(1));
        assert_eq!(config.stop_timeout(), Duration::from_secs(1));
        assert_eq!(config.send_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_offline_has_no_endpoint() {
        assert!(StreamConfig::offline().collector_url.is_none());
    }
}
