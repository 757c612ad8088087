use serde::{Deserialize, Serialize};

/// Text overlay values for the most recently drawn ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PingOverlay {
    pub index: usize,
    pub timestamp: String,
    pub depth_m: f32,
    pub temperature_c: f32,
    /// Tracked bottom start in display bins.
    pub bottom_bin: Option<usize>,
    /// Tracked bottom start as a share of the column height.
    pub bottom_fraction: Option<f32>,
    pub noise_floor: f32,
    pub water_mean: f32,
    pub mode_label: String,
}

impl PingOverlay {
    pub fn summary(&self) -> String {
        let bottom = match self.bottom_fraction {
            Some(fraction) => format!("{:.0}%", fraction * 100.0),
            None => "--".to_string(),
        };
        format!(
            "#{} {:.1} m {:.1} °C bottom {} [{}]",
            self.index, self.depth_m, self.temperature_c, bottom, self.mode_label
        )
    }
}
