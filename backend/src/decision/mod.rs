// =============================================================================
// Decision Module
// =============================================================================
//
// Turns an indicator snapshot into a buy / sell / hold decision:
//
//   snapshot -> TrendStrength -> FeatureVector -> SignalClassifier
//            -> confidence veto (or rule fallback) -> Decision

pub mod classifier;
pub mod engine;
pub mod features;
pub mod forest;
pub mod trend;

pub use classifier::{ClassifierHandle, ClassifierStatus};
pub use engine::{Decision, DecisionEngine, DecisionParams};
pub use features::FeatureVector;
pub use trend::TrendStrength;
