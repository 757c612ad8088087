pub mod depth_profile;

pub use depth_profile::{DepthProfile, DepthStats, ZoneSummary};
