pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f32>() / samples.len() as f32
    }

    /// Median of the samples; sorts a private copy.
    pub fn median(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    /// Mean of the lowest `fraction` of the samples (at least one sample).
    ///
    /// Sorts `samples` in place.
    pub fn mean_of_lowest(samples: &mut [f32], fraction: f32) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_by(|a, b| a.total_cmp(b));
        let take = ((samples.len() as f32 * fraction.clamp(0.0, 1.0)).floor() as usize)
            .clamp(1, samples.len());
        Self::mean(&samples[..take])
    }

    /// Percentage (0..=100) of samples satisfying `predicate`.
    pub fn percent_where(samples: &[f32], predicate: impl Fn(f32) -> bool) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let hits = samples.iter().filter(|&&v| predicate(v)).count();
        hits as f32 * 100.0 / samples.len() as f32
    }
}
