use crate::workflow::config::WorkflowConfig;
use anyhow::{ensure, Context};
use log::info;
use sonarcore::telemetry::RenderMetrics;
use sonarcore::{FrameComposer, FrameUpdate, Ping, PingOverlay};

pub struct WorkflowResult {
    pub pings: usize,
    pub overlay: Option<PingOverlay>,
    pub metrics: RenderMetrics,
    /// Tracked bottom of every ping in playback order, `None` while unknown.
    pub bottom_track: Vec<Option<usize>>,
    pub final_update: FrameUpdate,
    /// Raw RGBA bytes of the last frame.
    pub frame: Vec<u8>,
}

impl WorkflowResult {
    /// Share of pings with a tracked bottom, in percent.
    pub fn bottom_coverage(&self) -> f32 {
        if self.bottom_track.is_empty() {
            return 0.0;
        }
        let tracked = self.bottom_track.iter().filter(|b| b.is_some()).count();
        tracked as f32 * 100.0 / self.bottom_track.len() as f32
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Plays the pings through a fresh composer, then applies the configured seek.
    pub fn execute(&self, pings: &[Ping]) -> anyhow::Result<WorkflowResult> {
        ensure!(!pings.is_empty(), "no pings to render");
        let mut composer =
            FrameComposer::new(self.config.display.clone(), self.config.tuning.clone())
                .context("building frame composer")?;

        let mut bottom_track = Vec::with_capacity(pings.len());
        let mut final_update = FrameUpdate::Cleared;
        for index in 0..pings.len() {
            final_update = composer.render(pings, index);
            bottom_track.push(composer.overlay().and_then(|overlay| overlay.bottom_bin));
        }
        if let Some(seek) = self.config.seek {
            final_update = composer.render(pings, seek);
            info!("seeked to ping {} -> {:?}", seek, final_update);
        }

        Ok(WorkflowResult {
            pings: pings.len(),
            overlay: composer.overlay().cloned(),
            metrics: composer.metrics(),
            bottom_track,
            final_update,
            frame: composer.pixels().to_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_pings, GeneratorConfig};
    use crate::workflow::config::SourceConfig;
    use sonarcore::{DisplayConfig, ResolutionMode};

    fn config(seek: Option<usize>) -> WorkflowConfig {
        let display = DisplayConfig {
            resolution: ResolutionMode::Coarse,
            width: 100,
            height: 80,
            ..Default::default()
        };
        WorkflowConfig::from_args(display, SourceConfig::default(), seek)
    }

    fn pings() -> Vec<Ping> {
        build_pings(&GeneratorConfig {
            pings: 60,
            dropout_rate: 0.05,
            seed: 3,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn runner_plays_sequence() {
        let runner = Runner::new(config(None));
        let result = runner.execute(&pings()).unwrap();
        assert_eq!(result.pings, 60);
        assert_eq!(result.metrics.rebuilds, 1);
        assert_eq!(result.metrics.advances, 59);
        assert_eq!(result.final_update, FrameUpdate::Advanced);
        assert_eq!(result.frame.len(), 100 * 80 * 4);
        assert_eq!(result.overlay.unwrap().index, 59);
    }

    #[test]
    fn bottom_is_tracked_through_dropouts() {
        let runner = Runner::new(config(None));
        let result = runner.execute(&pings()).unwrap();
        let first = result
            .bottom_track
            .iter()
            .position(Option::is_some)
            .unwrap();
        assert!(first <= 2);
        assert!(result.bottom_track[first..].iter().all(Option::is_some));
        assert!(result.bottom_coverage() > 95.0);
    }

    #[test]
    fn seek_rebuilds_frame() {
        let runner = Runner::new(config(Some(10)));
        let result = runner.execute(&pings()).unwrap();
        assert_eq!(result.final_update, FrameUpdate::Rebuilt { columns: 11 });
        assert_eq!(result.metrics.rebuilds, 2);
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let runner = Runner::new(config(None));
        assert!(runner.execute(&[]).is_err());
    }
}
