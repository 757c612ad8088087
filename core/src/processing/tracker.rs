use crate::config::{FilterTuning, RenderTuning};
use crate::processing::bottom::Detection;

/// What a single filter step did with its measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStep {
    Initialized,
    Updated,
    /// Measurement absent or too weak; prediction only.
    HeldMissing,
    /// Measurement moved further than the bottom physically can.
    HeldOutlier,
    /// A run of agreeing outliers replaced the estimate.
    Reacquired,
    /// Nothing to hold yet.
    Idle,
}

impl FilterStep {
    pub fn is_hold(self) -> bool {
        matches!(self, FilterStep::HeldMissing | FilterStep::HeldOutlier)
    }
}

/// One-dimensional recursive estimator of the bottom start bin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BottomFilter {
    estimate: Option<f32>,
    uncertainty: f32,
    stable_count: u32,
    missed: u32,
    outlier_streak: u32,
    last_outlier: Option<f32>,
}

impl BottomFilter {
    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }

    pub fn uncertainty(&self) -> f32 {
        self.uncertainty
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Estimate rounded to a bin, or `None` before initialisation.
    pub fn stable_index(&self) -> Option<usize> {
        self.estimate.map(|x| x.round().max(0.0) as usize)
    }

    /// Advances the filter by one ping.
    ///
    /// `gate` is the largest plausible move, in display bins, between two
    /// consecutive pings. Only a reacquisition moves the estimate further
    /// than `gate` in one step.
    pub fn step(
        &mut self,
        measurement: Option<f32>,
        confidence: f32,
        gate: f32,
        tuning: &FilterTuning,
    ) -> FilterStep {
        let reliable = measurement.filter(|_| confidence >= tuning.min_confidence);

        let Some(prior) = self.estimate else {
            return match reliable {
                Some(z) => {
                    self.initialize(z, tuning);
                    FilterStep::Initialized
                }
                None => FilterStep::Idle,
            };
        };

        let Some(z) = reliable else {
            self.predict(tuning);
            self.missed += 1;
            return FilterStep::HeldMissing;
        };

        let allowed = gate * (1 + self.missed) as f32 + tuning.gate_slack_bins;
        if (z - prior).abs() > allowed {
            let agrees = self
                .last_outlier
                .map_or(true, |previous| (z - previous).abs() <= gate + tuning.gate_slack_bins);
            self.outlier_streak = if agrees { self.outlier_streak + 1 } else { 1 };
            self.last_outlier = Some(z);
            if self.outlier_streak >= tuning.reacquire_frames {
                self.initialize(z, tuning);
                return FilterStep::Reacquired;
            }
            self.predict(tuning);
            self.stable_count = 0;
            self.missed += 1;
            return FilterStep::HeldOutlier;
        }

        let predicted = (self.uncertainty + tuning.process_noise).min(tuning.max_uncertainty);
        let stability = 1.0 + tuning.stability_gain * self.stable_count.min(tuning.stability_cap) as f32;
        let noise = tuning.measurement_noise / (confidence.max(f32::EPSILON) * stability);
        let gain = predicted / (predicted + noise);

        self.estimate = Some(prior + (gain * (z - prior)).clamp(-gate, gate));
        self.uncertainty = (1.0 - gain) * predicted;
        self.stable_count = self.stable_count.saturating_add(1);
        self.missed = 0;
        self.outlier_streak = 0;
        self.last_outlier = None;
        FilterStep::Updated
    }

    fn initialize(&mut self, z: f32, tuning: &FilterTuning) {
        *self = Self {
            estimate: Some(z),
            uncertainty: tuning.initial_uncertainty,
            ..Self::default()
        };
    }

    fn predict(&mut self, tuning: &FilterTuning) {
        self.uncertainty = (self.uncertainty + tuning.process_noise).min(tuning.max_uncertainty);
    }
}

/// Per-screen-column arena of bottom filters.
///
/// Slot `i` holds the filter state as of the ping drawn at column `i`. A slot
/// is seeded from its left neighbour before updating, so the chain of slots
/// carries temporal history in drawing order.
#[derive(Debug, Clone)]
pub struct BottomTracker {
    filters: Vec<BottomFilter>,
    tuning: RenderTuning,
    gate: f32,
}

impl BottomTracker {
    /// `bins` is the display resolution the detections are expressed in.
    pub fn new(columns: usize, bins: usize, tuning: &RenderTuning) -> Self {
        let gate = tuning.filter.max_step_bins * tuning.bins_per_raw(bins);
        Self {
            filters: vec![BottomFilter::default(); columns],
            tuning: tuning.clone(),
            gate,
        }
    }

    pub fn columns(&self) -> usize {
        self.filters.len()
    }

    pub fn filter(&self, position: usize) -> Option<&BottomFilter> {
        self.filters.get(position)
    }

    /// Maps peak amplitude to a confidence score via the fixed breakpoints.
    pub fn confidence(&self, peak_signal: f32) -> f32 {
        let fraction = peak_signal / self.tuning.max_amplitude;
        self.tuning
            .filter
            .confidence_breakpoints
            .iter()
            .find(|(at, _)| fraction >= *at)
            .map_or(0.0, |&(_, confidence)| confidence)
    }

    pub fn reset(&mut self) {
        self.filters.iter_mut().for_each(BottomFilter::reset);
    }

    /// Moves every slot `count` positions left, clearing exposed slots.
    pub fn shift_left(&mut self, count: usize) {
        let count = count.min(self.filters.len());
        self.filters.rotate_left(count);
        let len = self.filters.len();
        self.filters[len - count..]
            .iter_mut()
            .for_each(BottomFilter::reset);
    }

    /// Filters one raw detection at `position` and returns the stable index.
    pub fn track(&mut self, position: usize, detection: Detection) -> (Option<usize>, FilterStep) {
        if position >= self.filters.len() {
            return (detection.index, FilterStep::Idle);
        }
        if position > 0 {
            self.filters[position] = self.filters[position - 1].clone();
        }

        let confidence = self.confidence(detection.peak_signal);
        let filter = &mut self.filters[position];
        let step = filter.step(
            detection.index.map(|index| index as f32),
            confidence,
            self.gate,
            &self.tuning.filter,
        );
        (filter.stable_index(), step)
    }
}
