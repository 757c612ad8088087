use crate::prelude::{lerp, Rgba};
use serde::{Deserialize, Serialize};

/// One breakpoint of a piecewise-linear color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub at: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(at: f32, color: Rgba) -> Self {
        Self { at, color }
    }
}

/// Piecewise-linear color ramp over ascending breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColorStop>", into = "Vec<ColorStop>")]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Stops are sorted by position; duplicates keep their input order.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Samples the ramp, clamping to the first/last stop outside the range.
    pub fn sample(&self, value: f32) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return [0, 0, 0, 0],
        };
        if value.is_nan() || value <= first.at {
            return first.color;
        }
        if value >= last.at {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if value <= hi.at {
                let span = hi.at - lo.at;
                let t = if span > 0.0 { (value - lo.at) / span } else { 1.0 };
                let mut out = [0u8; 4];
                for channel in 0..4 {
                    out[channel] =
                        lerp(lo.color[channel] as f32, hi.color[channel] as f32, t).round() as u8;
                }
                return out;
            }
        }
        last.color
    }
}

impl From<Vec<ColorStop>> for Gradient {
    fn from(stops: Vec<ColorStop>) -> Self {
        Self::new(stops)
    }
}

impl From<Gradient> for Vec<ColorStop> {
    fn from(gradient: Gradient) -> Self {
        gradient.stops
    }
}
