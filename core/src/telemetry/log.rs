use log::{debug, info};

/// Thin wrapper over the `log` facade shared by the replay layers.
pub struct LogManager {
    scope: &'static str,
}

impl LogManager {
    pub fn new(scope: &'static str) -> Self {
        Self { scope }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.scope, message);
    }

    pub fn trace_drop(&self, message: &str) {
        debug!("[{}] dropped: {}", self.scope, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("replay")
    }
}
