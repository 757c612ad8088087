//! Scrolling echogram renderer for a single-beam fishing sonar.
//!
//! Raw pings are expanded to the display resolution, the bottom is detected
//! and tracked per column, every bin is classified against a noise reference,
//! and the resulting colors are composed into a scrolling RGBA raster.

pub mod analysis;
pub mod config;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod sonar_interface;
pub mod telemetry;

pub use config::{ColorMode, DisplayConfig, RenderTuning, ResolutionMode};
pub use prelude::{RenderError, RenderResult, Rgba};
pub use processing::{FrameComposer, FrameUpdate};
pub use sonar_interface::{Ping, PingOverlay};
