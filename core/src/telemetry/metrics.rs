use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counts of log fragments seen by the normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestCounts {
    pub accepted: usize,
    pub dropped: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<IngestCounts>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IngestCounts::default()),
        }
    }

    pub fn record_accepted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.accepted += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn snapshot(&self) -> IngestCounts {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            IngestCounts::default()
        }
    }

    pub fn reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            *metrics = IngestCounts::default();
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
