use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sonarcore::Ping;
use std::f32::consts::TAU;

/// Configuration for generating a synthetic ping sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub pings: usize,
    pub bins: usize,
    /// Raw value reported for an out-of-range return; also the top of the scale.
    pub max_amplitude: u8,
    /// Mean bottom start in raw bins.
    pub bottom_bin: f32,
    /// Peak excursion of the bottom around `bottom_bin`, in raw bins.
    pub bottom_wander: f32,
    /// Pings per full bottom undulation.
    pub bottom_period: usize,
    /// Bins of saturated return at the top of the bottom echo.
    pub sentinel_bins: usize,
    /// A fish passes every `fish_every` pings; 0 disables fish.
    pub fish_every: usize,
    pub fish_bin: usize,
    /// Upper bound of uniform background noise.
    pub noise: u8,
    /// Probability that a ping carries no echo at all.
    pub dropout_rate: f64,
    pub second_reflection: bool,
    pub meters_per_bin: f32,
    pub temperature: f32,
    /// Seconds between pings.
    pub interval: f32,
    pub seed: u64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pings: 400,
            bins: 90,
            max_amplitude: 80,
            bottom_bin: 42.0,
            bottom_wander: 6.0,
            bottom_period: 160,
            sentinel_bins: 2,
            fish_every: 37,
            fish_bin: 22,
            noise: 3,
            dropout_rate: 0.02,
            second_reflection: true,
            meters_per_bin: 0.25,
            temperature: 17.5,
            interval: 0.071,
            seed: 0,
            description: None,
            scenario: None,
        }
    }
}

/// Length of a fish pass in pings; the trace arcs over this many columns.
const FISH_PASS: usize = 9;
/// Bins of strong echo below the sentinel before the tail fades.
const ECHO_BODY: usize = 5;

impl GeneratorConfig {
    fn bottom_at(&self, ping: usize) -> usize {
        let period = self.bottom_period.max(1) as f32;
        let offset = self.bottom_wander * (TAU * ping as f32 / period).sin();
        let upper = self.bins.saturating_sub(4).max(1) as f32;
        (self.bottom_bin + offset).round().clamp(1.0, upper) as usize
    }

    fn fish_at(&self, ping: usize) -> Option<usize> {
        if self.fish_every == 0 {
            return None;
        }
        let phase = ping % self.fish_every;
        if phase >= FISH_PASS {
            return None;
        }
        let centre = FISH_PASS as f32 / 2.0;
        let arc = ((phase as f32 - centre).abs() / centre * 2.0).round() as usize;
        Some(self.fish_bin + arc)
    }
}

fn build_scan(config: &GeneratorConfig, ping: usize, rng: &mut StdRng) -> Vec<u8> {
    let max = config.max_amplitude;
    let scaled = |fraction: f32| (max as f32 * fraction).round() as u8;
    let mut scan: Vec<u8> = (0..config.bins)
        .map(|_| rng.gen_range(0..=config.noise.min(max)))
        .collect();

    if rng.gen_bool(config.dropout_rate.clamp(0.0, 1.0)) {
        return scan;
    }

    let bottom = config.bottom_at(ping);
    if let Some(fish) = config.fish_at(ping).filter(|&bin| bin + 2 < bottom) {
        scan[fish] = scaled(0.4);
        scan[fish + 1] = scaled(0.45);
    }

    for (offset, value) in scan.iter_mut().skip(bottom).enumerate() {
        *value = if offset < config.sentinel_bins {
            max
        } else if offset < config.sentinel_bins + ECHO_BODY {
            scaled(0.85 - 0.05 * (offset - config.sentinel_bins) as f32)
        } else {
            scaled(0.2) + rng.gen_range(0..=config.noise.min(max))
        };
    }

    if config.second_reflection {
        let echo = bottom * 2;
        for bin in echo..(echo + 3).min(config.bins) {
            scan[bin] = scaled(0.45);
        }
    }
    scan
}

pub fn build_pings(config: &GeneratorConfig) -> anyhow::Result<Vec<Ping>> {
    ensure!(config.bins > 0, "generator needs at least one bin per ping");
    ensure!(config.max_amplitude > 0, "generator max_amplitude must be positive");
    config
        .pings
        .checked_mul(config.bins)
        .context("overflow computing sample count for generator")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let pings = (0..config.pings)
        .map(|index| {
            let scan = build_scan(config, index, &mut rng);
            let depth = config.bottom_at(index) as f32 * config.meters_per_bin;
            let temperature = config.temperature + 0.3 * (index as f32 / 50.0).sin();
            let timestamp = format!("{:.3}", index as f32 * config.interval);
            Ping::new(timestamp, temperature, depth, scan)
        })
        .collect();
    Ok(pings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> GeneratorConfig {
        GeneratorConfig {
            pings: 50,
            dropout_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn builds_requested_shape() {
        let pings = build_pings(&quiet()).unwrap();
        assert_eq!(pings.len(), 50);
        assert!(pings.iter().all(|p| p.bins() == 90));
        assert!(pings.iter().all(|p| p.scan_data.iter().all(|&v| v <= 80)));
    }

    #[test]
    fn same_seed_same_sequence() {
        let config = GeneratorConfig {
            seed: 7,
            ..Default::default()
        };
        assert_eq!(build_pings(&config).unwrap(), build_pings(&config).unwrap());
        let other = GeneratorConfig { seed: 8, ..config.clone() };
        assert_ne!(build_pings(&config).unwrap(), build_pings(&other).unwrap());
    }

    #[test]
    fn bottom_starts_with_sentinel() {
        let config = quiet();
        let pings = build_pings(&config).unwrap();
        for (index, ping) in pings.iter().enumerate() {
            let bottom = config.bottom_at(index);
            assert_eq!(ping.scan_data[bottom], 80);
            assert!(ping.scan_data[..bottom].iter().all(|&v| v < 80));
        }
    }

    #[test]
    fn second_reflection_sits_at_twice_the_bottom() {
        let config = GeneratorConfig {
            bottom_wander: 0.0,
            ..quiet()
        };
        let ping = &build_pings(&config).unwrap()[0];
        assert_eq!(ping.scan_data[84], 36);
        assert_eq!(ping.scan_data[86], 36);
    }

    #[test]
    fn fish_pass_stays_above_bottom() {
        let config = quiet();
        let pings = build_pings(&config).unwrap();
        let ping = &pings[37 + 4];
        let fish = config.fish_at(41).unwrap();
        assert_eq!(ping.scan_data[fish + 1], 36);
        assert!(fish < config.bottom_at(41));
    }

    #[test]
    fn full_dropout_rate_yields_noise_only() {
        let config = GeneratorConfig {
            pings: 5,
            dropout_rate: 1.0,
            ..Default::default()
        };
        let pings = build_pings(&config).unwrap();
        assert!(pings.iter().all(|p| p.scan_data.iter().all(|&v| v <= 3)));
    }

    #[test]
    fn zero_bins_is_rejected() {
        let config = GeneratorConfig {
            bins: 0,
            ..Default::default()
        };
        assert!(build_pings(&config).is_err());
    }
}
