pub mod config;
pub mod error;
pub mod market;
pub mod settings;
pub mod sink;
pub mod task;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use market::MarketData;
pub use settings::{DecisionSettings, FeatureSettings, ScheduleSettings, Settings};
pub use sink::SignalSink;
pub use task::PeriodicTask;
pub use types::*;
