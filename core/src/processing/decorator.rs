//! Optional cosmetic stages applied after classification.
//!
//! Decorators read time only through an injected [`TimeSource`], so a render
//! with a fixed clock is as reproducible as one without decorators.

use crate::prelude::Rgba;
use crate::processing::classifier::BinClass;
use std::f32::consts::TAU;
use std::fmt::Debug;
use std::time::Instant;

pub trait TimeSource: Debug + Send {
    /// Seconds since an arbitrary, fixed origin.
    fn seconds(&self) -> f64;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl TimeSource for FixedClock {
    fn seconds(&self) -> f64 {
        self.0
    }
}

pub trait ColumnDecorator: Debug + Send {
    /// Adjusts the finished colors of one column in place.
    fn decorate(&self, classes: &[BinClass], colors: &mut [Rgba]);
}

/// Faint drifting band marking a thermocline in the water column.
#[derive(Debug)]
pub struct ThermoclineDecorator {
    clock: Box<dyn TimeSource>,
    /// Band top and bottom as shares of the column height.
    pub band: (f32, f32),
    pub color: [u8; 3],
    pub max_alpha: u8,
    /// Band ripples per column.
    pub ripples: f32,
    /// Ripple cycles per second.
    pub speed: f32,
}

impl ThermoclineDecorator {
    pub fn new(clock: Box<dyn TimeSource>) -> Self {
        Self {
            clock,
            band: (0.22, 0.3),
            color: [40, 120, 160],
            max_alpha: 70,
            ripples: 3.0,
            speed: 0.25,
        }
    }
}

impl ColumnDecorator for ThermoclineDecorator {
    fn decorate(&self, classes: &[BinClass], colors: &mut [Rgba]) {
        let bins = colors.len().min(classes.len());
        if bins == 0 {
            return;
        }
        let phase = (self.clock.seconds() as f32 * self.speed).fract();
        let top = (self.band.0 * bins as f32) as usize;
        let bottom = ((self.band.1 * bins as f32) as usize).min(bins);

        for bin in top..bottom {
            if classes[bin] != BinClass::Background {
                continue;
            }
            let depth = (bin - top) as f32 / (bottom - top).max(1) as f32;
            let wave = 0.5 + 0.5 * (TAU * (depth * self.ripples + phase)).sin();
            let alpha = (wave * self.max_alpha as f32).round() as u8;
            let [r, g, b] = self.color;
            colors[bin] = [r, g, b, alpha];
        }
    }
}
