use crate::workflow::runner::WorkflowResult;
use serde::{Deserialize, Serialize};
use sonarcore::telemetry::RenderMetrics;
use sonarcore::PingOverlay;

/// Snapshot served on `GET /payload`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub status: String,
    pub ping_count: usize,
    pub overlay: Option<PingOverlay>,
    pub metrics: RenderMetrics,
    pub bottom_track: Vec<Option<usize>>,
    pub scenario: Option<String>,
}

impl VisualizationModel {
    pub fn from_result(result: &WorkflowResult, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ping_count: result.pings,
            overlay: result.overlay.clone(),
            metrics: result.metrics,
            bottom_track: result.bottom_track.clone(),
            scenario: None,
        }
    }
}
