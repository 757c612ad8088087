//! Per-depth statistics over a recorded ping sequence.
//!
//! Used offline to sanity-check a capture: where the lure sits, where the
//! bottom starts, and how amplitudes are spread across depth zones.

use crate::config::RenderTuning;
use crate::math::StatsHelper;
use crate::prelude::{RenderError, RenderResult};
use crate::sonar_interface::Ping;
use serde::Serialize;

/// Zone boundaries (inclusive) on the reference ping length.
const ZONES: [(&str, usize, usize); 5] = [
    ("Surface", 0, 15),
    ("Upper", 16, 30),
    ("Middle", 31, 60),
    ("Lower", 61, 75),
    ("Bottom", 76, 89),
];

/// Band searched for the lure, half-open, on the reference ping length.
const LURE_BAND: (usize, usize) = (20, 70);

const SIGNIFICANT_FRACTION: f32 = 0.2;
const BOTTOM_MEAN_FRACTION: f32 = 0.625;
const COMMON_VALUES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthStats {
    pub index: usize,
    pub mean: f32,
    pub median: f32,
    pub min: u8,
    pub max: u8,
    pub nonzero_percent: f32,
    pub significant_percent: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub mean: f32,
    pub median: f32,
    /// `(value, count)`, most common first.
    pub common: Vec<(u8, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthProfile {
    pub pings: usize,
    pub depths: Vec<DepthStats>,
    pub lure_depth: Option<usize>,
    pub bottom_start: Option<usize>,
    /// Occurrences of every raw value across the whole sequence.
    pub histogram: Vec<usize>,
    pub zones: Vec<ZoneSummary>,
}

impl DepthProfile {
    /// Profiles the first `n` bins of every ping, where `n` is the shortest
    /// ping in the sequence.
    pub fn analyze(pings: &[Ping], tuning: &RenderTuning) -> RenderResult<Self> {
        let bins = pings.iter().map(Ping::bins).min().unwrap_or(0);
        if bins == 0 {
            return Err(RenderError::EmptySequence(
                "depth profile needs at least one non-empty ping".to_string(),
            ));
        }

        let significant = SIGNIFICANT_FRACTION * tuning.max_amplitude;
        let depths: Vec<DepthStats> = (0..bins)
            .map(|index| {
                let values: Vec<f32> = pings.iter().map(|p| p.scan_data[index] as f32).collect();
                DepthStats {
                    index,
                    mean: StatsHelper::mean(&values),
                    median: StatsHelper::median(&values),
                    min: pings.iter().map(|p| p.scan_data[index]).min().unwrap_or(0),
                    max: pings.iter().map(|p| p.scan_data[index]).max().unwrap_or(0),
                    nonzero_percent: StatsHelper::percent_where(&values, |v| v > 0.0),
                    significant_percent: StatsHelper::percent_where(&values, |v| v > significant),
                }
            })
            .collect();

        let scale = |reference: usize| reference * bins / tuning.reference_bins.max(1);
        let lure_depth = depths[scale(LURE_BAND.0).min(bins)..scale(LURE_BAND.1).min(bins)]
            .iter()
            .fold(None::<&DepthStats>, |best, stats| match best {
                Some(b) if b.mean >= stats.mean => Some(b),
                _ => Some(stats),
            })
            .map(|stats| stats.index);
        let bottom_limit = BOTTOM_MEAN_FRACTION * tuning.max_amplitude;
        let bottom_start = depths
            .iter()
            .find(|stats| stats.mean > bottom_limit)
            .map(|stats| stats.index);

        let mut histogram = vec![0usize; 256];
        for ping in pings {
            for &value in &ping.scan_data[..bins] {
                histogram[value as usize] += 1;
            }
        }

        let zones = ZONES
            .iter()
            .filter_map(|&(name, start, end)| {
                let start = scale(start);
                let end = (scale(end + 1).min(bins)).checked_sub(1)?;
                (start <= end).then(|| Self::zone(name, start, end, pings))
            })
            .collect();

        Ok(Self {
            pings: pings.len(),
            depths,
            lure_depth,
            bottom_start,
            histogram,
            zones,
        })
    }

    fn zone(name: &str, start: usize, end: usize, pings: &[Ping]) -> ZoneSummary {
        let mut counts = [0usize; 256];
        let mut values = Vec::with_capacity(pings.len() * (end - start + 1));
        for ping in pings {
            for &value in &ping.scan_data[start..=end] {
                counts[value as usize] += 1;
                values.push(value as f32);
            }
        }
        let mut common: Vec<(u8, usize)> = counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(value, &count)| (value as u8, count))
            .collect();
        common.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        common.truncate(COMMON_VALUES);

        ZoneSummary {
            name: name.to_string(),
            start,
            end,
            mean: StatsHelper::mean(&values),
            median: StatsHelper::median(&values),
            common,
        }
    }

    /// Plain-text report for the command-line driver.
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("Total pings: {}", self.pings),
            format!(
                "{:>6} | {:>6} | {:>6} | {:>4} | Non-0%  | Sig%",
                "Depth", "Avg", "Median", "Max"
            ),
        ];
        let last = self.depths.len().saturating_sub(1);
        lines.extend(
            self.depths
                .iter()
                .filter(|s| s.index < 5 || s.index % 5 == 0 || s.index == last)
                .map(|stats| {
                    format!(
                        "{:6} | {:6.2} | {:6.2} | {:4} | {:6.1}% | {:6.1}%",
                        stats.index,
                        stats.mean,
                        stats.median,
                        stats.max,
                        stats.nonzero_percent,
                        stats.significant_percent
                    )
                }),
        );

        lines.push(match self.lure_depth.and_then(|i| self.depths.get(i)) {
            Some(lure) => format!(
                "Most likely lure position: depth {} (avg {:.2}, median {:.2}, max {})",
                lure.index, lure.mean, lure.median, lure.max
            ),
            None => "No lure band available".to_string(),
        });
        if let Some(bottom) = self.bottom_start.and_then(|i| self.depths.get(i)) {
            lines.push(format!(
                "Most likely bottom start: depth {} (avg {:.2})",
                bottom.index, bottom.mean
            ));
        }

        lines.extend(self.zones.iter().map(|zone| {
            let common: Vec<String> = zone
                .common
                .iter()
                .map(|(value, count)| format!("{}({})", value, count))
                .collect();
            format!(
                "{} ({}-{}): avg {:.2}, median {:.2}, top values {}",
                zone.name,
                zone.start,
                zone.end,
                zone.mean,
                zone.median,
                common.join(", ")
            )
        }));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> Vec<Ping> {
        (0..10)
            .map(|i| {
                let data = (0..90)
                    .map(|bin| match bin {
                        42 => 30,
                        72..=89 => 80,
                        _ if i % 2 == 0 => 2,
                        _ => 0,
                    })
                    .collect();
                Ping::new(format!("{}", i), 18.0, 10.0, data)
            })
            .collect()
    }

    #[test]
    fn finds_lure_and_bottom() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        assert_eq!(profile.pings, 10);
        assert_eq!(profile.depths.len(), 90);
        assert_eq!(profile.lure_depth, Some(42));
        assert_eq!(profile.bottom_start, Some(72));
    }

    #[test]
    fn per_depth_percentages() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        let shallow = &profile.depths[3];
        assert_eq!(shallow.nonzero_percent, 50.0);
        assert_eq!(shallow.significant_percent, 0.0);
        assert_eq!(shallow.min, 0);
        assert_eq!(shallow.max, 2);
        assert_eq!(profile.depths[42].significant_percent, 100.0);
    }

    #[test]
    fn histogram_counts_every_sample() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        assert_eq!(profile.histogram.iter().sum::<usize>(), 900);
        assert_eq!(profile.histogram[80], 180);
        assert_eq!(profile.histogram[30], 10);
    }

    #[test]
    fn zones_cover_reference_layout() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        let names: Vec<&str> = profile.zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["Surface", "Upper", "Middle", "Lower", "Bottom"]);
        let bottom = &profile.zones[4];
        assert_eq!((bottom.start, bottom.end), (76, 89));
        assert_eq!(bottom.common, vec![(80, 140)]);
        assert_eq!(bottom.mean, 80.0);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = DepthProfile::analyze(&[], &RenderTuning::default()).unwrap_err();
        assert!(matches!(err, RenderError::EmptySequence(_)));
    }

    #[test]
    fn report_mentions_findings() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        let report = profile.report();
        assert!(report.contains("Most likely lure position: depth 42"));
        assert!(report.contains("Most likely bottom start: depth 72"));
        assert!(report.contains("Bottom (76-89)"));
    }

    #[test]
    fn report_writes_one_line_per_entry() {
        let profile = DepthProfile::analyze(&capture(), &RenderTuning::default()).unwrap();
        let report = profile.report();
        assert!(report.ends_with('\n'));
        let lines: Vec<&str> = report.lines().collect();
        // Header pair, 23 sampled depths, lure, bottom, five zones.
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0], "Total pings: 10");
        assert!(lines[2].starts_with("     0 |"));
        assert!(lines[24].starts_with("    89 |"));
        assert!(lines.iter().all(|line| !line.is_empty()));

        let blind = DepthProfile {
            lure_depth: None,
            bottom_start: None,
            ..profile
        };
        let report = blind.report();
        assert!(report.contains("No lure band available\n"));
        assert!(!report.contains("Most likely bottom start"));
    }
}
