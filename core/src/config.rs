//! Display selection and algorithm tuning.
//!
//! Every numeric threshold the renderer uses lives in [`RenderTuning`].
//! Amplitude thresholds are fractions of `max_amplitude` so one tuning serves
//! both the legacy 0..=80 hardware scale and full-byte logs.

use crate::math::{ColorStop, Gradient};
use crate::prelude::{RenderError, RenderResult, Rgba};
use serde::{Deserialize, Serialize};

/// Display-depth resolution and the matching column width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    Coarse,
    #[default]
    Standard,
    Fine,
}

impl ResolutionMode {
    pub const ALL: [ResolutionMode; 3] = [
        ResolutionMode::Coarse,
        ResolutionMode::Standard,
        ResolutionMode::Fine,
    ];

    /// Depth bins per column.
    pub fn bins(self) -> usize {
        match self {
            ResolutionMode::Coarse => 144,
            ResolutionMode::Standard => 360,
            ResolutionMode::Fine => 720,
        }
    }

    /// Horizontal pixels occupied by one ping.
    pub fn column_width(self) -> usize {
        match self {
            ResolutionMode::Coarse => 5,
            ResolutionMode::Standard => 2,
            ResolutionMode::Fine => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolutionMode::Coarse => "Coarse (144)",
            ResolutionMode::Standard => "Standard (360)",
            ResolutionMode::Fine => "Fine (720)",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ResolutionMode::Coarse => ResolutionMode::Standard,
            ResolutionMode::Standard => ResolutionMode::Fine,
            ResolutionMode::Fine => ResolutionMode::Coarse,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Dark water, yellow-green targets, brown bottom.
    #[default]
    BottomFishContrast,
    /// Inverted palette on a light background.
    LightBackground,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::BottomFishContrast => "Bottom/Fish",
            ColorMode::LightBackground => "Light",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ColorMode::BottomFishContrast => ColorMode::LightBackground,
            ColorMode::LightBackground => ColorMode::BottomFishContrast,
        }
    }
}

/// Operator-selected raw amplitude window; bins outside it stay hidden.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeWindow {
    pub min: f32,
    pub max: f32,
}

impl AmplitudeWindow {
    pub fn contains(&self, amplitude: f32) -> bool {
        amplitude >= self.min && amplitude <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub resolution: ResolutionMode,
    pub color_mode: ColorMode,
    /// 0 (only strong targets) ..= 100 (show nearly everything).
    pub sensitivity: f32,
    pub amplitude_window: Option<AmplitudeWindow>,
    pub width: usize,
    pub height: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::Standard,
            color_mode: ColorMode::BottomFishContrast,
            sensitivity: 50.0,
            amplitude_window: None,
            width: 720,
            height: 360,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if !(0.0..=100.0).contains(&self.sensitivity) {
            return Err(RenderError::InvalidConfig(format!(
                "sensitivity {} outside 0..=100",
                self.sensitivity
            )));
        }
        if let Some(window) = self.amplitude_window {
            if window.min > window.max {
                return Err(RenderError::InvalidConfig(format!(
                    "amplitude window min {} exceeds max {}",
                    window.min, window.max
                )));
            }
        }
        Ok(())
    }

    /// Whole ping columns that fit the output width.
    pub fn visible_columns(&self) -> usize {
        self.width / self.resolution.column_width()
    }

    pub fn mode_label(&self) -> String {
        format!(
            "{} | {}",
            self.resolution.label(),
            self.color_mode.label()
        )
    }
}

/// Raw bottom detection thresholds. The detector runs on raw samples, so
/// window lengths here are counts of raw bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorTuning {
    /// Values within this distance of `max_amplitude` are the sentinel.
    pub sentinel_tolerance: f32,
    pub near_max_fraction: f32,
    pub strong_fraction: f32,
    /// Threshold a bin within the lookahead of a strong bin must exceed. The
    /// strong bin itself counts.
    pub lookahead_fraction: f32,
    pub lookahead_bins: usize,
    pub consecutive_bins: usize,
    pub edge_window_bins: usize,
    /// Minimum rise per raw bin, as a fraction of `max_amplitude`.
    pub min_edge_slope: f32,
    pub peak_window_bins: usize,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self {
            sentinel_tolerance: 0.5,
            near_max_fraction: 0.9,
            strong_fraction: 0.5,
            lookahead_fraction: 0.75,
            lookahead_bins: 4,
            consecutive_bins: 3,
            edge_window_bins: 3,
            min_edge_slope: 0.1,
            peak_window_bins: 4,
        }
    }
}

/// Per-column bottom smoothing filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTuning {
    pub process_noise: f32,
    pub measurement_noise: f32,
    pub initial_uncertainty: f32,
    pub max_uncertainty: f32,
    /// `(peak fraction of max, confidence)` pairs, highest first.
    pub confidence_breakpoints: Vec<(f32, f32)>,
    pub min_confidence: f32,
    /// Measurement noise shrinks by this factor per consecutive stable update.
    pub stability_gain: f32,
    pub stability_cap: u32,
    /// Physical bottom movement allowed per ping, in raw bins.
    pub max_step_bins: f32,
    /// Extra gate width covering the fractional estimate's lag.
    pub gate_slack_bins: f32,
    /// Consecutive agreeing outliers that force re-initialisation.
    pub reacquire_frames: u32,
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self {
            process_noise: 1.0,
            measurement_noise: 0.5,
            initial_uncertainty: 1.0,
            max_uncertainty: 100.0,
            confidence_breakpoints: vec![(0.99, 1.0), (0.9, 0.85), (0.75, 0.65), (0.5, 0.4)],
            min_confidence: 0.35,
            stability_gain: 0.25,
            stability_cap: 8,
            max_step_bins: 1.0,
            gate_slack_bins: 1.0,
            reacquire_frames: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseTuning {
    /// Share of the sorted water-column bins averaged for the floor.
    pub floor_fraction: f32,
    pub min_floor: f32,
    pub compensate_depth: bool,
    /// Spreading gain in dB per decade of normalised range.
    pub spreading_db: f32,
    /// Absorption gain in dB across the full column.
    pub absorption_db: f32,
}

impl Default for NoiseTuning {
    fn default() -> Self {
        Self {
            floor_fraction: 0.2,
            min_floor: 1.0,
            compensate_depth: true,
            spreading_db: 6.0,
            absorption_db: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierTuning {
    /// Bins past the echo at or below this share of the bottom peak are
    /// treated as multipath.
    pub second_reflection_fraction: f32,
    /// Weak raw bins tolerated inside the primary echo before it ends.
    pub echo_gap_bins: usize,
    pub snr_threshold_low_sensitivity: f32,
    pub snr_threshold_high_sensitivity: f32,
    pub min_target_fraction: f32,
    /// Display bins painted with the accent at the bottom boundary.
    pub accent_bins: usize,
}

impl Default for ClassifierTuning {
    fn default() -> Self {
        Self {
            second_reflection_fraction: 0.6,
            echo_gap_bins: 2,
            snr_threshold_low_sensitivity: 6.0,
            snr_threshold_high_sensitivity: 1.5,
            min_target_fraction: 0.05,
            accent_bins: 1,
        }
    }
}

/// Colors for one color mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgba,
    /// Keyed by signal-to-noise ratio.
    pub target: Gradient,
    /// Keyed by normalised amplitude (0..=1).
    pub bottom: Gradient,
    pub bottom_accent: Rgba,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: [6, 10, 22, 255],
            target: Gradient::new(vec![
                ColorStop::new(1.5, [85, 90, 20, 255]),
                ColorStop::new(4.0, [170, 160, 25, 255]),
                ColorStop::new(8.0, [255, 235, 30, 255]),
                ColorStop::new(16.0, [160, 255, 40, 255]),
                ColorStop::new(32.0, [240, 255, 230, 255]),
            ]),
            bottom: Gradient::new(vec![
                ColorStop::new(0.0, [210, 180, 140, 255]),
                ColorStop::new(0.5, [139, 69, 19, 255]),
                ColorStop::new(1.0, [74, 40, 16, 255]),
            ]),
            bottom_accent: [255, 170, 60, 255],
        }
    }

    pub fn light() -> Self {
        Self {
            background: [238, 241, 245, 255],
            target: Gradient::new(vec![
                ColorStop::new(1.5, [150, 150, 90, 255]),
                ColorStop::new(4.0, [120, 110, 20, 255]),
                ColorStop::new(8.0, [200, 90, 10, 255]),
                ColorStop::new(16.0, [170, 20, 20, 255]),
                ColorStop::new(32.0, [60, 0, 0, 255]),
            ]),
            bottom: Gradient::new(vec![
                ColorStop::new(0.0, [210, 180, 140, 255]),
                ColorStop::new(0.5, [139, 69, 19, 255]),
                ColorStop::new(1.0, [74, 40, 16, 255]),
            ]),
            bottom_accent: [90, 50, 20, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteTuning {
    pub dark: Palette,
    pub light: Palette,
}

impl Default for PaletteTuning {
    fn default() -> Self {
        Self {
            dark: Palette::dark(),
            light: Palette::light(),
        }
    }
}

impl PaletteTuning {
    pub fn for_mode(&self, mode: ColorMode) -> &Palette {
        match mode {
            ColorMode::BottomFishContrast => &self.dark,
            ColorMode::LightBackground => &self.light,
        }
    }
}

/// Every algorithm constant, passed explicitly into each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTuning {
    /// Largest representable amplitude; also the out-of-range sentinel.
    pub max_amplitude: f32,
    /// Raw bins per ping the window lengths are expressed against.
    pub reference_bins: usize,
    pub detector: DetectorTuning,
    pub filter: FilterTuning,
    pub noise: NoiseTuning,
    pub classifier: ClassifierTuning,
    pub palettes: PaletteTuning,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            max_amplitude: 80.0,
            reference_bins: 90,
            detector: DetectorTuning::default(),
            filter: FilterTuning::default(),
            noise: NoiseTuning::default(),
            classifier: ClassifierTuning::default(),
            palettes: PaletteTuning::default(),
        }
    }
}

impl RenderTuning {
    /// Same tuning on a different amplitude scale.
    pub fn with_max_amplitude(mut self, max_amplitude: f32) -> Self {
        self.max_amplitude = max_amplitude;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if !(self.max_amplitude > 0.0) {
            return Err(RenderError::InvalidConfig(
                "max_amplitude must be positive".into(),
            ));
        }
        if self.reference_bins == 0 {
            return Err(RenderError::InvalidConfig(
                "reference_bins must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn is_sentinel(&self, amplitude: f32) -> bool {
        amplitude >= self.max_amplitude - self.detector.sentinel_tolerance
    }

    pub fn is_near_max(&self, amplitude: f32) -> bool {
        amplitude > self.max_amplitude * self.detector.near_max_fraction
    }

    pub fn strong_threshold(&self) -> f32 {
        self.max_amplitude * self.detector.strong_fraction
    }

    /// Display bins per raw bin for a column of `bins` length, at least 1.
    pub fn bins_per_raw(&self, bins: usize) -> f32 {
        (bins as f32 / self.reference_bins.max(1) as f32).max(1.0)
    }

    /// Converts a raw-bin window length to display bins.
    pub fn scaled_window(&self, raw_bins: usize, bins: usize) -> usize {
        ((raw_bins as f32 * self.bins_per_raw(bins)).floor() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_modes_trade_width_for_depth() {
        assert_eq!(ResolutionMode::Coarse.bins(), 144);
        assert_eq!(ResolutionMode::Fine.column_width(), 1);
        assert_eq!(ResolutionMode::Fine.next(), ResolutionMode::Coarse);
    }

    #[test]
    fn display_config_rejects_inverted_window() {
        let config = DisplayConfig {
            amplitude_window: Some(AmplitudeWindow { min: 50.0, max: 10.0 }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn display_config_rejects_out_of_range_sensitivity() {
        let config = DisplayConfig {
            sensitivity: 140.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn visible_columns_follow_column_width() {
        let config = DisplayConfig {
            resolution: ResolutionMode::Coarse,
            width: 52,
            ..Default::default()
        };
        assert_eq!(config.visible_columns(), 10);
    }

    #[test]
    fn partial_tuning_keeps_defaults() {
        let tuning: RenderTuning =
            serde_json::from_str(r#"{"max_amplitude": 255.0, "noise": {"min_floor": 2.0}}"#)
                .unwrap();
        assert_eq!(tuning.max_amplitude, 255.0);
        assert_eq!(tuning.noise.min_floor, 2.0);
        assert_eq!(tuning.noise.floor_fraction, 0.2);
        assert_eq!(tuning.reference_bins, 90);
    }

    #[test]
    fn scaled_window_grows_with_resolution() {
        let tuning = RenderTuning::default();
        assert_eq!(tuning.scaled_window(3, 90), 3);
        assert_eq!(tuning.scaled_window(3, 144), 4);
        assert_eq!(tuning.scaled_window(3, 720), 24);
    }
}
