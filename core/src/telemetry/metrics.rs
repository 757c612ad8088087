use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters describing the composer's work since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderMetrics {
    pub columns_rendered: usize,
    pub rebuilds: usize,
    pub advances: usize,
    /// Filter steps that kept the prior estimate (missing, weak, or outlier).
    pub bottom_holds: usize,
    pub reacquisitions: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<RenderMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RenderMetrics::default()),
        }
    }

    fn with(&self, update: impl FnOnce(&mut RenderMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            update(&mut metrics);
        }
    }

    pub fn record_column(&self) {
        self.with(|m| m.columns_rendered += 1);
    }

    pub fn record_rebuild(&self) {
        self.with(|m| m.rebuilds += 1);
    }

    pub fn record_advance(&self) {
        self.with(|m| m.advances += 1);
    }

    pub fn record_hold(&self) {
        self.with(|m| m.bottom_holds += 1);
    }

    pub fn record_reacquisition(&self) {
        self.with(|m| m.reacquisitions += 1);
    }

    pub fn snapshot(&self) -> RenderMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            RenderMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MetricsRecorder").field(&self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = MetricsRecorder::new();
        metrics.record_column();
        metrics.record_column();
        metrics.record_rebuild();
        metrics.record_hold();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.columns_rendered, 2);
        assert_eq!(snapshot.rebuilds, 1);
        assert_eq!(snapshot.bottom_holds, 1);
        assert_eq!(snapshot.advances, 0);
    }
}
