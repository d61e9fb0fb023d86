//! Command-line interface definitions and argument parsing

use crate::config::{
    PipelineConfig, DEFAULT_INPUT_PATH, DEFAULT_MODEL_PATH, DEFAULT_SEED, DEFAULT_TARGET_COLUMN,
    DEFAULT_TEST_SIZE,
};
use crate::model::ForestConfig;
use clap::Parser;
use std::path::PathBuf;

/// Retail unit-price prediction with linear regression and a random forest
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Output path for the serialized random forest
    #[arg(short = 'o', long, default_value = DEFAULT_MODEL_PATH)]
    pub model_output: PathBuf,

    /// Directory for the rendered figures
    #[arg(long, default_value = ".")]
    pub plot_dir: PathBuf,

    /// Skip rendering figures
    #[arg(long)]
    pub no_plots: bool,

    /// Target column to predict
    #[arg(short, long, default_value = DEFAULT_TARGET_COLUMN)]
    pub target: String,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,

    /// Seed for the train/test shuffle and the random forest
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of trees in the random forest
    #[arg(long, default_value = "100")]
    pub n_trees: usize,

    /// Maximum depth of each tree (unlimited when omitted)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration from the parsed flags
    pub fn to_config(&self) -> PipelineConfig {
        let forest = ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            seed: self.seed,
            ..Default::default()
        };

        PipelineConfig {
            target_column: self.target.clone(),
            ..PipelineConfig::new(&self.input)
        }
        .with_model_path(&self.model_output)
        .with_plot_dir(&self.plot_dir)
        .with_plots(!self.no_plots)
        .with_test_size(self.test_size)
        .with_forest(forest)
        .with_seed(self.seed)
        .with_verbose(self.verbose)
    }
}
