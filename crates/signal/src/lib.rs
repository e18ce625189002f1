pub mod classifier;
pub mod decision;
pub mod pricing;
pub mod publisher;
pub mod task;

pub use classifier::{load_classifier, Classifier, FallbackClassifier, LinearModel, Prediction};
pub use decision::{DecisionEngine, DecisionStats};
pub use pricing::{bracket, pip_size, Bracket};
pub use publisher::SignalPublisher;
pub use task::DecisionTask;
