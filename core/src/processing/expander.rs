use crate::config::RenderTuning;
use crate::math::resample_linear;

/// Expands a raw ping to display-depth resolution by linear interpolation.
#[derive(Debug, Clone)]
pub struct SampleExpander {
    max_amplitude: f32,
}

impl SampleExpander {
    pub fn new(tuning: &RenderTuning) -> Self {
        Self {
            max_amplitude: tuning.max_amplitude,
        }
    }

    pub fn expand(&self, raw: &[u8], target_length: usize) -> Vec<f32> {
        let mut column = vec![0.0; target_length];
        self.expand_into(raw, &mut column);
        column
    }

    /// Fills `column` in place; its length is the target resolution.
    pub fn expand_into(&self, raw: &[u8], column: &mut [f32]) {
        resample_linear(raw, column, self.max_amplitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn aligned_positions_reproduce_raw_samples() {
        let expander = SampleExpander::new(&RenderTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        let raw: Vec<u8> = (0..90).map(|_| rng.gen_range(0..=80)).collect();

        for target in [90, 144, 180, 360, 720] {
            let column = expander.expand(&raw, target);
            assert_eq!(column.len(), target);
            for (i, value) in column.iter().enumerate() {
                if (i * raw.len()) % target == 0 {
                    let source = i * raw.len() / target;
                    assert_eq!(*value, raw[source] as f32, "target {} index {}", target, i);
                }
            }
        }
    }

    #[test]
    fn expansion_stays_within_neighbours() {
        let expander = SampleExpander::new(&RenderTuning::default());
        let raw = [0u8, 40, 10, 80];
        let column = expander.expand(&raw, 16);
        for (i, value) in column.iter().enumerate() {
            let i0 = i * raw.len() / 16;
            let i1 = (i0 + 1).min(raw.len() - 1);
            let lo = raw[i0].min(raw[i1]) as f32;
            let hi = raw[i0].max(raw[i1]) as f32;
            assert!(*value >= lo && *value <= hi);
        }
    }

    #[test]
    fn empty_ping_expands_to_zeros() {
        let expander = SampleExpander::new(&RenderTuning::default());
        assert_eq!(expander.expand(&[], 144), vec![0.0; 144]);
    }
}
