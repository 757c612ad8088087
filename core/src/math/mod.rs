pub mod gradient;
pub mod interpolate;
pub mod stats;

pub use gradient::{ColorStop, Gradient};
pub use interpolate::{first_target_index, resample_linear};
pub use stats::StatsHelper;
