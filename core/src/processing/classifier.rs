//! Per-bin classification and color selection.
//!
//! Classification (what is this bin) and color mapping (what color is that)
//! are separate pure functions; [`Classifier::colorize`] composes them.

use crate::config::{AmplitudeWindow, ColorMode, Palette, RenderTuning};
use crate::prelude::{Rgba, TRANSPARENT};
use crate::processing::bottom::BottomEcho;
use crate::processing::noise::NoiseEstimator;

/// What a depth bin represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinClass {
    /// Water with nothing above the noise threshold.
    Background,
    /// Fish, lure, or other water-column echo.
    Target { snr: f32 },
    /// Seafloor; `boundary` marks the first bins of the bottom region.
    Bottom { amplitude: f32, boundary: bool },
    /// Multipath echo below the primary bottom echo.
    Suppressed,
}

impl BinClass {
    pub fn is_visible(&self) -> bool {
        matches!(self, BinClass::Target { .. } | BinClass::Bottom { .. })
    }
}

/// Everything a bin's classification needs from its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnContext {
    pub bins: usize,
    pub echo: Option<BottomEcho>,
    pub noise_floor: f32,
    pub snr_threshold: f32,
    pub window: Option<AmplitudeWindow>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    tuning: RenderTuning,
    noise: NoiseEstimator,
    palette: Palette,
}

impl Classifier {
    pub fn new(tuning: &RenderTuning, color_mode: ColorMode) -> Self {
        Self {
            tuning: tuning.clone(),
            noise: NoiseEstimator::new(tuning),
            palette: tuning.palettes.for_mode(color_mode).clone(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Sensitivity 0..=100 mapped linearly onto the SNR threshold range.
    pub fn snr_threshold(&self, sensitivity: f32) -> f32 {
        let classifier = &self.tuning.classifier;
        let t = sensitivity.clamp(0.0, 100.0) / 100.0;
        classifier.snr_threshold_low_sensitivity
            + (classifier.snr_threshold_high_sensitivity - classifier.snr_threshold_low_sensitivity)
                * t
    }

    pub fn context(
        &self,
        column: &[f32],
        bottom: Option<usize>,
        noise_floor: f32,
        sensitivity: f32,
        window: Option<AmplitudeWindow>,
    ) -> ColumnContext {
        ColumnContext {
            bins: column.len(),
            echo: bottom.and_then(|start| BottomEcho::measure(column, start, &self.tuning)),
            noise_floor: noise_floor.max(self.tuning.noise.min_floor),
            snr_threshold: self.snr_threshold(sensitivity),
            window,
        }
    }

    pub fn classify(&self, amplitude: f32, bin: usize, ctx: &ColumnContext) -> BinClass {
        let tuning = &self.tuning;
        let amplitude = amplitude.clamp(0.0, tuning.max_amplitude);

        if let Some(echo) = ctx.echo {
            if bin >= echo.start {
                let multipath = bin > echo.end
                    && echo.peak >= tuning.strong_threshold()
                    && amplitude <= echo.peak * tuning.classifier.second_reflection_fraction
                    && !tuning.is_near_max(amplitude);
                if multipath {
                    return BinClass::Suppressed;
                }
                return BinClass::Bottom {
                    amplitude,
                    boundary: bin < echo.start + tuning.classifier.accent_bins,
                };
            }
            if bin + self.shoulder_bins(ctx.bins) >= echo.start {
                return BinClass::Background;
            }
        }

        if amplitude < tuning.max_amplitude * tuning.classifier.min_target_fraction {
            return BinClass::Background;
        }
        if let Some(window) = ctx.window {
            if !window.contains(amplitude) {
                return BinClass::Background;
            }
        }

        let snr = self.noise.compensated(amplitude, bin, ctx.bins) / ctx.noise_floor;
        if snr < ctx.snr_threshold {
            BinClass::Background
        } else {
            BinClass::Target { snr }
        }
    }

    /// Display bins just above the bottom that are interpolated from its
    /// first raw sample.
    fn shoulder_bins(&self, bins: usize) -> usize {
        self.tuning.bins_per_raw(bins).ceil() as usize - 1
    }

    pub fn color(&self, class: BinClass) -> Rgba {
        match class {
            BinClass::Background | BinClass::Suppressed => TRANSPARENT,
            BinClass::Target { snr } => self.palette.target.sample(snr),
            BinClass::Bottom { boundary: true, .. } => self.palette.bottom_accent,
            BinClass::Bottom { amplitude, .. } => self
                .palette
                .bottom
                .sample(amplitude / self.tuning.max_amplitude),
        }
    }

    /// Classifies every bin of a column into `classes`.
    pub fn classify_column(
        &self,
        column: &[f32],
        ctx: &ColumnContext,
        classes: &mut Vec<BinClass>,
    ) {
        classes.clear();
        classes.extend(
            column
                .iter()
                .enumerate()
                .map(|(bin, &amplitude)| self.classify(amplitude, bin, ctx)),
        );
    }

    /// Single-bin color for a fully specified column.
    #[allow(clippy::too_many_arguments)]
    pub fn colorize(
        &self,
        raw_amplitude: f32,
        bin: usize,
        column: &[f32],
        bottom: Option<usize>,
        noise_floor: f32,
        sensitivity: f32,
        window: Option<AmplitudeWindow>,
    ) -> Rgba {
        let ctx = self.context(column, bottom, noise_floor, sensitivity, window);
        self.color(self.classify(raw_amplitude, bin, &ctx))
    }
}
