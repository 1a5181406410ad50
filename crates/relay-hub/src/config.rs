//! Hub configuration.

use std::time::Duration;

/// Configuration for the event hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How often to poll every subscribed board.
    pub poll_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl HubConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder() {
        let config = HubConfig::new()
            .with_poll_interval(Duration::from_millis(100));

        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }
}
