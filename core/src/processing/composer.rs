use crate::config::{DisplayConfig, RenderTuning};
use crate::prelude::{composite, RenderResult, Rgba};
use crate::processing::buffer_pool::ColumnPool;
use crate::processing::classifier::{BinClass, Classifier};
use crate::processing::decorator::ColumnDecorator;
use crate::processing::pixels::PixelBuffer;
use crate::processing::tracker::{BottomTracker, FilterStep};
use crate::processing::{BottomDetector, NoiseEstimator, SampleExpander};
use crate::sonar_interface::{Ping, PingOverlay};
use crate::telemetry::{LogManager, MetricsRecorder, RenderMetrics};

/// How the last `render` call changed the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    /// Cleared and redrawn from scratch.
    Rebuilt { columns: usize },
    /// Scrolled one column and drew the newest ping.
    Advanced,
    /// No pings to draw; background only.
    Cleared,
}

/// Owns the echogram raster and the per-column bottom filters.
#[derive(Debug)]
pub struct FrameComposer {
    display: DisplayConfig,
    tuning: RenderTuning,
    pixels: PixelBuffer,
    tracker: BottomTracker,
    expander: SampleExpander,
    detector: BottomDetector,
    noise: NoiseEstimator,
    classifier: Classifier,
    decorator: Option<Box<dyn ColumnDecorator>>,
    pool: ColumnPool,
    classes: Vec<BinClass>,
    colors: Vec<Rgba>,
    watermark: Option<usize>,
    overlay: Option<PingOverlay>,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl FrameComposer {
    pub fn new(display: DisplayConfig, tuning: RenderTuning) -> RenderResult<Self> {
        display.validate()?;
        tuning.validate()?;
        let bins = display.resolution.bins();
        let background = tuning.palettes.for_mode(display.color_mode).background;

        Ok(Self {
            pixels: PixelBuffer::new(display.width, display.height, background),
            tracker: BottomTracker::new(display.visible_columns(), bins, &tuning),
            expander: SampleExpander::new(&tuning),
            detector: BottomDetector::new(&tuning),
            noise: NoiseEstimator::new(&tuning),
            classifier: Classifier::new(&tuning, display.color_mode),
            decorator: None,
            pool: ColumnPool::with_capacity(4),
            classes: Vec::with_capacity(bins),
            colors: Vec::with_capacity(bins),
            watermark: None,
            overlay: None,
            logger: LogManager::new("composer"),
            metrics: MetricsRecorder::new(),
            display,
            tuning,
        })
    }

    pub fn with_decorator(mut self, decorator: Box<dyn ColumnDecorator>) -> Self {
        self.decorator = Some(decorator);
        self.watermark = None;
        self
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn tuning(&self) -> &RenderTuning {
        &self.tuning
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn overlay(&self) -> Option<&PingOverlay> {
        self.overlay.as_ref()
    }

    pub fn watermark(&self) -> Option<usize> {
        self.watermark
    }

    pub fn metrics(&self) -> RenderMetrics {
        self.metrics.snapshot()
    }

    pub fn background(&self) -> Rgba {
        self.classifier.palette().background
    }

    /// Swaps display settings; reallocates the raster and resets every filter.
    ///
    /// Nothing changes if the new settings are invalid.
    pub fn reconfigure(&mut self, display: DisplayConfig) -> RenderResult<()> {
        display.validate()?;
        let rebuilt = Self::new(display, self.tuning.clone())?;
        self.logger.record(&format!(
            "reconfigured to {} ({}x{})",
            rebuilt.display.mode_label(),
            rebuilt.display.width,
            rebuilt.display.height
        ));
        self.display = rebuilt.display;
        self.pixels = rebuilt.pixels;
        self.tracker = rebuilt.tracker;
        self.classifier = rebuilt.classifier;
        self.classes = rebuilt.classes;
        self.colors = rebuilt.colors;
        self.watermark = None;
        self.overlay = None;
        Ok(())
    }

    /// Drops all history so the next render rebuilds from scratch.
    pub fn reset(&mut self) {
        self.watermark = None;
        self.overlay = None;
        self.tracker.reset();
        self.pixels.fill(self.background());
    }

    /// Brings the raster up to date with ping `index`.
    ///
    /// Exactly the next index scrolls by one column; anything else redraws
    /// the whole visible window ending at `index`. Indices past the end are
    /// clamped to the last ping.
    pub fn render(&mut self, pings: &[Ping], index: usize) -> FrameUpdate {
        if pings.is_empty() {
            self.reset();
            return FrameUpdate::Cleared;
        }
        let index = index.min(pings.len() - 1);

        let update = match self.watermark {
            Some(mark) if index == mark + 1 && self.tracker.columns() > 0 => {
                self.advance(&pings[index], index);
                FrameUpdate::Advanced
            }
            _ => FrameUpdate::Rebuilt {
                columns: self.rebuild(pings, index),
            },
        };
        self.watermark = Some(index);
        update
    }

    fn rebuild(&mut self, pings: &[Ping], index: usize) -> usize {
        let slots = self.tracker.columns();
        self.pixels.fill(self.background());
        self.tracker.reset();
        self.overlay = None;
        self.metrics.record_rebuild();

        let first = (index + 1).saturating_sub(slots);
        let count = index + 1 - first;
        for (offset, ping_index) in (first..=index).enumerate() {
            let slot = slots - count + offset;
            self.draw_column(&pings[ping_index], ping_index, slot);
        }
        self.logger
            .detail(&format!("rebuilt {} columns ending at ping {}", count, index));
        count
    }

    fn advance(&mut self, ping: &Ping, index: usize) {
        let slots = self.tracker.columns();
        let width = self.display.resolution.column_width();
        self.pixels.shift_left(width, self.background());
        self.tracker.shift_left(1);
        self.draw_column(ping, index, slots - 1);
        self.metrics.record_advance();
    }

    /// Runs the full column pipeline for one ping and paints it at `slot`.
    fn draw_column(&mut self, ping: &Ping, index: usize, slot: usize) {
        let bins = self.display.resolution.bins();
        let mut column = self.pool.checkout(bins);
        self.expander.expand_into(&ping.scan_data, &mut column);

        let detection = self.detector.detect_ping(&ping.scan_data, bins);
        let (bottom, step) = self.tracker.track(slot, detection);
        match step {
            FilterStep::Reacquired => {
                self.metrics.record_reacquisition();
                self.logger
                    .detail(&format!("bottom reacquired at bin {:?} (ping {})", bottom, index));
            }
            step if step.is_hold() => self.metrics.record_hold(),
            _ => {}
        }

        let noise_floor = self.noise.estimate(&column, bottom);
        let ctx = self.classifier.context(
            &column,
            bottom,
            noise_floor,
            self.display.sensitivity,
            self.display.amplitude_window,
        );
        self.classifier
            .classify_column(&column, &ctx, &mut self.classes);
        self.colors.clear();
        self.colors
            .extend(self.classes.iter().map(|&class| self.classifier.color(class)));
        if let Some(decorator) = &self.decorator {
            decorator.decorate(&self.classes, &mut self.colors);
        }

        self.paint(slot);
        self.overlay = Some(PingOverlay {
            index,
            timestamp: ping.timestamp.clone(),
            depth_m: ping.depth,
            temperature_c: ping.temperature,
            bottom_bin: bottom,
            bottom_fraction: bottom.map(|bin| bin as f32 / bins as f32),
            noise_floor,
            water_mean: self.noise.water_mean(&column, bottom),
            mode_label: self.display.mode_label(),
        });
        self.pool.release(column);
        self.metrics.record_column();
    }

    /// Maps the column's bins onto pixel rows at `slot`.
    fn paint(&mut self, slot: usize) {
        let width = self.display.resolution.column_width();
        let slots = self.tracker.columns();
        let x0 = self.display.width - slots * width + slot * width;
        let height = self.pixels.height();
        let bins = self.colors.len();
        if bins == 0 {
            return;
        }
        let background = self.background();
        for y in 0..height {
            let bin = (y * bins / height).min(bins - 1);
            let color = composite(self.colors[bin], background);
            self.pixels.fill_span(x0, x0 + width, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorMode, ResolutionMode};
    use crate::processing::decorator::{FixedClock, ThermoclineDecorator};

    fn ping(bottom: usize, fish: Option<usize>) -> Ping {
        let scan_data = (0..90)
            .map(|i| {
                if i >= bottom {
                    80
                } else if fish.map_or(false, |f| (f..f + 3).contains(&i)) {
                    60
                } else {
                    1
                }
            })
            .collect();
        Ping::new("t", 18.5, 12.0, scan_data)
    }

    fn pings(count: usize) -> Vec<Ping> {
        (0..count)
            .map(|i| ping(40 + (i / 4) % 6, if i % 7 == 3 { Some(15) } else { None }))
            .collect()
    }

    fn display(resolution: ResolutionMode) -> DisplayConfig {
        DisplayConfig {
            resolution,
            width: 60,
            height: 72,
            ..Default::default()
        }
    }

    fn composer(resolution: ResolutionMode) -> FrameComposer {
        FrameComposer::new(display(resolution), RenderTuning::default()).unwrap()
    }

    #[test]
    fn first_render_rebuilds_then_advances() {
        let data = pings(30);
        let mut composer = composer(ResolutionMode::Coarse);
        assert_eq!(composer.render(&data, 0), FrameUpdate::Rebuilt { columns: 1 });
        assert_eq!(composer.render(&data, 1), FrameUpdate::Advanced);
        assert_eq!(composer.render(&data, 2), FrameUpdate::Advanced);
        assert_eq!(composer.watermark(), Some(2));
        let metrics = composer.metrics();
        assert_eq!(metrics.rebuilds, 1);
        assert_eq!(metrics.advances, 2);
        assert_eq!(metrics.columns_rendered, 3);
    }

    #[test]
    fn backwards_or_jumping_index_rebuilds() {
        let data = pings(30);
        let mut composer = composer(ResolutionMode::Coarse);
        composer.render(&data, 5);
        assert_eq!(composer.render(&data, 5), FrameUpdate::Rebuilt { columns: 6 });
        assert_eq!(composer.render(&data, 2), FrameUpdate::Rebuilt { columns: 3 });
        assert_eq!(composer.render(&data, 25), FrameUpdate::Rebuilt { columns: 12 });
    }

    #[test]
    fn sequential_playback_matches_rebuild_of_steady_scene() {
        let data = vec![ping(45, Some(15)); 40];
        let mut played = composer(ResolutionMode::Coarse);
        for index in 0..30 {
            played.render(&data, index);
        }
        let mut seeked = composer(ResolutionMode::Coarse);
        seeked.render(&data, 29);
        assert_eq!(played.pixels(), seeked.pixels());
        assert_ne!(played.pixels().pixel(59, 71), Some(played.background()));
    }

    #[test]
    fn reset_then_seek_is_idempotent() {
        let data = pings(50);
        let mut composer = composer(ResolutionMode::Standard);
        for index in 0..20 {
            composer.render(&data, index);
        }
        composer.reset();
        composer.render(&data, 33);
        let first = composer.pixels().to_bytes();
        composer.reset();
        composer.render(&data, 33);
        assert_eq!(composer.pixels().to_bytes(), first);
    }

    #[test]
    fn resolution_change_repaints_everything() {
        let data = pings(50);
        let mut composer = composer(ResolutionMode::Coarse);
        for index in 0..20 {
            composer.render(&data, index);
        }
        composer.reconfigure(display(ResolutionMode::Fine)).unwrap();
        assert_eq!(composer.watermark(), None);
        assert_eq!(composer.render(&data, 20), FrameUpdate::Rebuilt { columns: 21 });

        let mut fresh = self::composer(ResolutionMode::Fine);
        fresh.render(&data, 20);
        assert_eq!(composer.pixels(), fresh.pixels());
    }

    #[test]
    fn invalid_reconfigure_keeps_current_state() {
        let data = pings(10);
        let mut composer = composer(ResolutionMode::Coarse);
        composer.render(&data, 3);
        let before = composer.pixels().clone();
        let bad = DisplayConfig {
            sensitivity: -1.0,
            ..display(ResolutionMode::Fine)
        };
        assert!(composer.reconfigure(bad).is_err());
        assert_eq!(composer.pixels(), &before);
        assert_eq!(composer.render(&data, 4), FrameUpdate::Advanced);
    }

    #[test]
    fn bottom_rows_are_brown_and_surface_is_background() {
        let data = vec![ping(45, None); 3];
        let mut composer = composer(ResolutionMode::Standard);
        composer.render(&data, 2);
        let bg = composer.background();
        let pixels = composer.pixels();
        assert_eq!(pixels.pixel(59, 2), Some(bg));
        let deep = pixels.pixel(59, 70).unwrap();
        assert!(deep[0] > deep[1] && deep[1] > deep[2]);
        assert_eq!(pixels.pixel(0, 70), Some(bg));

        let overlay = composer.overlay().unwrap();
        assert_eq!(overlay.index, 2);
        assert!(overlay.bottom_fraction.unwrap() > 0.45);
        assert_eq!(overlay.mode_label, "Standard (360) | Bottom/Fish");
    }

    #[test]
    fn empty_sequence_clears_to_background() {
        let mut composer = composer(ResolutionMode::Coarse);
        composer.render(&pings(5), 4);
        assert_eq!(composer.render(&[], 0), FrameUpdate::Cleared);
        let bg = composer.background();
        assert!((0..60).all(|x| composer.pixels().pixel(x, 40) == Some(bg)));
        assert!(composer.overlay().is_none());
    }

    #[test]
    fn out_of_range_index_clamps_to_last_ping() {
        let data = pings(4);
        let mut composer = composer(ResolutionMode::Coarse);
        composer.render(&data, 99);
        assert_eq!(composer.watermark(), Some(3));
    }

    #[test]
    fn dropout_ping_keeps_bottom_painted() {
        let mut data = vec![ping(45, None); 10];
        data[8] = Ping::new("t", 18.5, 12.0, vec![0; 90]);
        let mut composer = composer(ResolutionMode::Coarse);
        for index in 0..10 {
            composer.render(&data, index);
        }
        // Ping 8 is now one slot left of the newest column.
        let x = 60 - 2 * 5;
        let deep = composer.pixels().pixel(x, 70).unwrap();
        assert_ne!(deep, composer.background());
        assert!(composer.metrics().bottom_holds >= 1);
    }

    #[test]
    fn light_mode_uses_light_background() {
        let config = DisplayConfig {
            color_mode: ColorMode::LightBackground,
            ..display(ResolutionMode::Coarse)
        };
        let composer = FrameComposer::new(config, RenderTuning::default()).unwrap();
        let bg = composer.background();
        assert!(bg[0] > 200 && bg[1] > 200 && bg[2] > 200);
        assert_eq!(composer.pixels().pixel(0, 0), Some(bg));
    }

    #[test]
    fn decorated_render_is_repeatable_with_fixed_clock() {
        let data = pings(20);
        let build = || {
            FrameComposer::new(display(ResolutionMode::Standard), RenderTuning::default())
                .unwrap()
                .with_decorator(Box::new(ThermoclineDecorator::new(Box::new(FixedClock(3.0)))))
        };
        let mut first = build();
        let mut second = build();
        first.render(&data, 12);
        second.render(&data, 12);
        assert_eq!(first.pixels(), second.pixels());
    }
}
