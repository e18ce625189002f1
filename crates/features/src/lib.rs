pub mod bars;
pub mod builder;
pub mod indicators;
pub mod pipeline;
pub mod store;

pub use bars::{BarAggregator, InsufficientBars};
pub use builder::{normalize, BuildFailure, FeatureBuilder};
pub use pipeline::{CycleReport, FeaturePipeline};
pub use store::FeatureStore;
