use crate::config::RenderTuning;
use crate::math::first_target_index;

/// Raw single-column bottom estimate, before temporal filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub index: Option<usize>,
    pub peak_signal: f32,
}

impl Detection {
    pub const MISSING: Detection = Detection {
        index: None,
        peak_signal: 0.0,
    };

    pub fn found(index: usize, peak_signal: f32) -> Self {
        Self {
            index: Some(index),
            peak_signal,
        }
    }

    /// Index with `-1` standing for "not found".
    pub fn signed_index(&self) -> i64 {
        self.index.map_or(-1, |index| index as i64)
    }
}

/// Extent of the primary bottom echo within one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BottomEcho {
    pub start: usize,
    /// Last bin still carrying the primary echo.
    pub end: usize,
    pub peak: f32,
}

impl BottomEcho {
    /// Measures the echo that begins at `start`.
    ///
    /// The echo runs while bins stay above the second-reflection share of the
    /// peak, tolerating short weak gaps.
    pub fn measure(column: &[f32], start: usize, tuning: &RenderTuning) -> Option<Self> {
        let len = column.len();
        if start >= len {
            return None;
        }
        let peak_end = (start + tuning.scaled_window(tuning.detector.peak_window_bins, len))
            .min(len - 1);
        let peak = column[start..=peak_end]
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);

        let tail = peak * tuning.classifier.second_reflection_fraction;
        let gap_limit = tuning.scaled_window(tuning.classifier.echo_gap_bins, len);
        let mut end = start;
        let mut gap = 0;
        for (i, &value) in column.iter().enumerate().skip(start) {
            if value > tail {
                end = i;
                gap = 0;
            } else {
                gap += 1;
                if gap > gap_limit {
                    break;
                }
            }
        }

        Some(Self { start, end, peak })
    }
}

/// Heuristic seafloor detector.
///
/// The rules run on raw ping samples, so a bottom found in one resolution
/// mode is found at the same raw sample in every other mode.
#[derive(Debug, Clone)]
pub struct BottomDetector {
    tuning: RenderTuning,
}

impl BottomDetector {
    pub fn new(tuning: &RenderTuning) -> Self {
        Self {
            tuning: tuning.clone(),
        }
    }

    /// Detects over raw samples; the index is a raw bin.
    pub fn detect(&self, samples: &[f32]) -> Detection {
        let Some(candidate) = self.find_candidate(samples) else {
            return Detection::MISSING;
        };
        let start = self.refine_edge(samples, candidate);
        let peak_end = (candidate + self.tuning.detector.peak_window_bins).min(samples.len() - 1);
        let peak = samples[start..=peak_end]
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);
        Detection::found(start, peak)
    }

    /// Detects over a raw ping and reports the bottom as the first bin of a
    /// `bins`-long display column whose source position reaches it.
    pub fn detect_ping(&self, raw: &[u8], bins: usize) -> Detection {
        let samples: Vec<f32> = raw
            .iter()
            .map(|&v| (v as f32).min(self.tuning.max_amplitude))
            .collect();
        let detection = self.detect(&samples);
        Detection {
            index: detection
                .index
                .map(|index| first_target_index(index, raw.len(), bins)),
            ..detection
        }
    }

    /// First bin matching the strongest available rule, in priority order:
    /// sentinel, near-max, sustained strong run, strong bin with a bright
    /// bin at or close behind it.
    fn find_candidate(&self, samples: &[f32]) -> Option<usize> {
        let tuning = &self.tuning;
        let detector = &tuning.detector;

        if let Some(index) = samples.iter().position(|&v| tuning.is_sentinel(v)) {
            return Some(index);
        }
        if let Some(index) = samples.iter().position(|&v| tuning.is_near_max(v)) {
            return Some(index);
        }

        let strong = tuning.strong_threshold();
        let run = detector.consecutive_bins.max(1);
        let mut streak = 0;
        for (i, &value) in samples.iter().enumerate() {
            if value > strong {
                streak += 1;
                if streak >= run {
                    return Some(i + 1 - run);
                }
            } else {
                streak = 0;
            }
        }

        let bright = tuning.max_amplitude * detector.lookahead_fraction;
        (0..samples.len()).find(|&i| {
            let end = (i + detector.lookahead_bins).min(samples.len() - 1);
            samples[i] > strong && samples[i..=end].iter().any(|&v| v > bright)
        })
    }

    /// Pulls the candidate back to the leading edge of its echo: the start of
    /// the rising run containing the steepest increase before it.
    fn refine_edge(&self, samples: &[f32], candidate: usize) -> usize {
        let detector = &self.tuning.detector;
        let min_slope = self.tuning.max_amplitude * detector.min_edge_slope;
        let lo = candidate.saturating_sub(detector.edge_window_bins).max(1);
        if lo > candidate {
            return candidate;
        }

        let mut steepest: Option<(usize, f32)> = None;
        for i in lo..=candidate {
            let rise = samples[i] - samples[i - 1];
            if rise >= min_slope && steepest.map_or(true, |(_, best)| rise > best) {
                steepest = Some((i, rise));
            }
        }

        let Some((mut edge, _)) = steepest else {
            return candidate;
        };
        while edge > lo && samples[edge - 1] - samples[edge - 2] >= min_slope {
            edge -= 1;
        }
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::SampleExpander;

    fn flat_bottom(start: usize, value: u8) -> Vec<u8> {
        (0..90).map(|i| if i < start { 0 } else { value }).collect()
    }

    #[test]
    fn sentinel_marks_bottom_at_raw_resolution() {
        let tuning = RenderTuning::default();
        let column: Vec<f32> = flat_bottom(40, 80).iter().map(|&v| v as f32).collect();
        let detection = BottomDetector::new(&tuning).detect(&column);
        assert_eq!(detection.index, Some(40));
        assert_eq!(detection.peak_signal, 80.0);
    }

    #[test]
    fn edge_stays_on_first_bottom_sample_at_every_resolution() {
        let tuning = RenderTuning::default();
        let detector = BottomDetector::new(&tuning);
        let raw = flat_bottom(40, 80);
        for (bins, expected) in [(90, 40), (144, 64), (360, 160), (720, 320)] {
            let detection = detector.detect_ping(&raw, bins);
            // Bins before `expected` are interpolated between raw 39 and 40.
            assert_eq!(detection.index, Some(expected), "bins {}", bins);
            assert_eq!(detection.peak_signal, 80.0);

            let column = SampleExpander::new(&tuning).expand(&raw, bins);
            assert_eq!(column[expected], 80.0);
            assert!(column[expected - 1] < 80.0);
        }
    }

    #[test]
    fn edge_refinement_walks_back_over_rising_samples() {
        let tuning = RenderTuning::default();
        let detector = BottomDetector::new(&tuning);
        let mut raw = flat_bottom(40, 80);
        raw[38] = 20;
        raw[39] = 50;
        assert_eq!(detector.detect_ping(&raw, 90).index, Some(38));
        assert_eq!(detector.detect_ping(&raw, 144).index, Some(61));
        assert_eq!(detector.detect_ping(&raw, 720).index, Some(304));
    }

    #[test]
    fn lone_bright_echo_is_bottom_at_every_resolution() {
        let tuning = RenderTuning::default().with_max_amplitude(255.0);
        let detector = BottomDetector::new(&tuning);
        let mut raw = vec![0u8; 90];
        raw[40] = 200;
        for value in raw.iter_mut().skip(80) {
            *value = 80;
        }
        for (bins, expected) in [(144, 64), (360, 160), (720, 320)] {
            let detection = detector.detect_ping(&raw, bins);
            assert_eq!(detection.index, Some(expected), "bins {}", bins);
            assert_eq!(detection.peak_signal, 200.0);
        }
    }

    #[test]
    fn short_strong_run_is_missing_at_every_resolution() {
        let tuning = RenderTuning::default();
        let detector = BottomDetector::new(&tuning);
        let mut raw = vec![0u8; 90];
        for value in raw.iter_mut().skip(30).take(2) {
            *value = 50;
        }
        for bins in [90, 144, 360, 720] {
            assert_eq!(detector.detect_ping(&raw, bins), Detection::MISSING, "bins {}", bins);
        }
    }

    #[test]
    fn empty_ping_has_no_bottom() {
        let detector = BottomDetector::new(&RenderTuning::default());
        assert_eq!(detector.detect_ping(&[], 144), Detection::MISSING);
    }

    #[test]
    fn single_strong_bin_is_not_bottom() {
        let tuning = RenderTuning::default();
        let mut column = vec![0.0; 90];
        column[20] = 60.0;
        let detection = BottomDetector::new(&tuning).detect(&column);
        assert_eq!(detection, Detection::MISSING);
        assert_eq!(detection.signed_index(), -1);
    }

    #[test]
    fn sustained_strong_run_is_bottom() {
        let tuning = RenderTuning::default();
        let mut column = vec![0.0; 90];
        for value in column.iter_mut().skip(50) {
            *value = 50.0;
        }
        let detection = BottomDetector::new(&tuning).detect(&column);
        assert_eq!(detection.index, Some(50));
        assert_eq!(detection.peak_signal, 50.0);
    }

    #[test]
    fn strong_bin_before_bright_bin_is_bottom() {
        let tuning = RenderTuning::default();
        let mut column = vec![0.0; 90];
        column[30] = 45.0;
        column[31] = 10.0;
        column[32] = 65.0;
        let detection = BottomDetector::new(&tuning).detect(&column);
        assert_eq!(detection.index, Some(30));
        assert_eq!(detection.peak_signal, 65.0);
    }

    #[test]
    fn sentinel_outranks_earlier_strong_fish() {
        let tuning = RenderTuning::default();
        let mut column = vec![0.0; 90];
        for value in column.iter_mut().skip(20).take(3) {
            *value = 60.0;
        }
        for value in column.iter_mut().skip(60) {
            *value = 80.0;
        }
        let detection = BottomDetector::new(&tuning).detect(&column);
        assert_eq!(detection.index, Some(60));
    }

    #[test]
    fn echo_extent_stops_after_gap() {
        let tuning = RenderTuning::default().with_max_amplitude(255.0);
        let mut column = vec![0.0; 90];
        for value in column.iter_mut().skip(40).take(5) {
            *value = 200.0;
        }
        for value in column.iter_mut().skip(80) {
            *value = 80.0;
        }
        let echo = BottomEcho::measure(&column, 40, &tuning).unwrap();
        assert_eq!(echo.peak, 200.0);
        assert_eq!(echo.end, 44);
        assert!(BottomEcho::measure(&column, 90, &tuning).is_none());
    }
}
