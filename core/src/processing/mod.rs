pub mod bottom;
pub mod buffer_pool;
pub mod classifier;
pub mod composer;
pub mod decorator;
pub mod expander;
pub mod noise;
pub mod pixels;
pub mod tracker;

pub use bottom::{BottomDetector, BottomEcho, Detection};
pub use buffer_pool::ColumnPool;
pub use classifier::{BinClass, Classifier, ColumnContext};
pub use composer::{FrameComposer, FrameUpdate};
pub use decorator::{ColumnDecorator, FixedClock, SystemClock, ThermoclineDecorator, TimeSource};
pub use expander::SampleExpander;
pub use noise::NoiseEstimator;
pub use pixels::PixelBuffer;
pub use tracker::{BottomFilter, BottomTracker, FilterStep};
