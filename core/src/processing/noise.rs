use crate::config::RenderTuning;
use crate::math::StatsHelper;

/// Background level of the water column above the bottom.
#[derive(Debug, Clone)]
pub struct NoiseEstimator {
    tuning: RenderTuning,
}

impl NoiseEstimator {
    pub fn new(tuning: &RenderTuning) -> Self {
        Self {
            tuning: tuning.clone(),
        }
    }

    /// Range gain for `bin` in a column of `len` bins.
    ///
    /// Logarithmic spreading plus linear absorption over normalised depth,
    /// applied as a linear multiplier. Returns 1 when compensation is off.
    pub fn depth_gain(&self, bin: usize, len: usize) -> f32 {
        let noise = &self.tuning.noise;
        if !noise.compensate_depth || len == 0 {
            return 1.0;
        }
        let range = (bin + 1) as f32 / len as f32;
        let gain_db = noise.spreading_db * (1.0 + 9.0 * range).log10() + noise.absorption_db * range;
        10f32.powf(gain_db / 20.0)
    }

    pub fn compensated(&self, amplitude: f32, bin: usize, len: usize) -> f32 {
        amplitude * self.depth_gain(bin, len)
    }

    /// Mean of the quietest share of the compensated water-column bins.
    ///
    /// Sentinel bins never contribute. The result is at least `min_floor`.
    pub fn estimate(&self, column: &[f32], bottom: Option<usize>) -> f32 {
        let mut water = self.water_samples(column, bottom);
        let floor = StatsHelper::mean_of_lowest(&mut water, self.tuning.noise.floor_fraction);
        floor.max(self.tuning.noise.min_floor)
    }

    /// Plain mean of the compensated water column, sentinel excluded.
    pub fn water_mean(&self, column: &[f32], bottom: Option<usize>) -> f32 {
        StatsHelper::mean(&self.water_samples(column, bottom))
    }

    fn water_samples(&self, column: &[f32], bottom: Option<usize>) -> Vec<f32> {
        let len = column.len();
        let end = bottom.map_or(len, |index| index.min(len));
        column[..end]
            .iter()
            .enumerate()
            .filter(|&(_, &value)| !self.tuning.is_sentinel(value))
            .map(|(bin, &value)| self.compensated(value, bin, len))
            .collect()
    }
}
