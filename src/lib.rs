//! RetailForge: a Rust pipeline for retail unit-price prediction
//!
//! This library loads a retail price table, removes incomplete rows and
//! non-predictive columns, fits an ordinary least squares model and a random
//! forest, evaluates both on a seeded hold-out split, renders diagnostic
//! figures and persists the forest.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod split;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::PipelineConfig;
pub use data::{clean_dataset, load_dataset, split_features_and_target, FeatureSet};
pub use error::PipelineError;
pub use metrics::{evaluate, EvaluationReport};
pub use model::{ForestConfig, LinearModel, RandomForestRegressor, Regressor};
pub use persist::{load_model, save_model};
pub use pipeline::{run, PipelineOutcome};
pub use split::{train_test_split, TrainTestSplit};

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, PipelineError>;
