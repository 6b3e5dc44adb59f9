use std::time::Duration;

/// Frame client configuration
#[derive(Debug, Clone)]
pub struct FrameClientConfig {
    /// How long `request` waits for the correlated reply
    pub request_timeout: Duration,
    /// Capacity of the push broadcast channel
    pub event_capacity: usize,
}

impl Default for FrameClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            event_capacity: 256,
        }
    }
}

impl FrameClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
