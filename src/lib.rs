// Modules
pub mod data;
pub mod ensemble;
pub mod errors;
pub mod importance;
pub mod node;
pub mod partition;
pub mod utils;

// Individual classes, and functions
pub use data::{Dataset, Matrix};
pub use ensemble::Ensemble;
pub use importance::{compute_feature_importance, FeatureImportance, ImportanceEvaluator};
