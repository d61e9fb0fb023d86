//! Run configuration for the price prediction pipeline

use crate::error::PipelineError;
use crate::model::ForestConfig;
use std::path::PathBuf;

/// Default dataset location
pub const DEFAULT_INPUT_PATH: &str = "retail_price.csv";
/// Default location of the persisted random forest
pub const DEFAULT_MODEL_PATH: &str = "rf_model.bin";
/// Column holding the prediction target
pub const DEFAULT_TARGET_COLUMN: &str = "unit_price";
/// Identifier, date and category-name columns removed before modelling
pub const DEFAULT_DROP_COLUMNS: [&str; 3] = ["product_id", "month_year", "product_category_name"];
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

pub const HEATMAP_FILE: &str = "correlation_heatmap.png";
pub const SCATTER_FILE: &str = "actual_vs_predicted.png";
pub const IMPORTANCE_FILE: &str = "feature_importance.png";

/// Parameters of a single pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the input CSV file
    pub input_path: PathBuf,
    /// Output path for the serialized random forest
    pub model_path: PathBuf,
    /// Directory receiving the rendered figures
    pub plot_dir: PathBuf,
    /// Whether figures are rendered at all
    pub render_plots: bool,
    /// Name of the target column
    pub target_column: String,
    /// Columns dropped after the missing-value pass
    pub drop_columns: Vec<String>,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed shared by the splitter and the forest
    pub seed: u64,
    /// Random forest hyper-parameters
    pub forest: ForestConfig,
    /// Print extra model statistics
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            plot_dir: PathBuf::from("."),
            render_plots: true,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            forest: ForestConfig::default(),
            verbose: false,
        }
    }
}

impl PipelineConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Default::default()
        }
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_plot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plot_dir = dir.into();
        self
    }

    pub fn with_plots(mut self, render: bool) -> Self {
        self.render_plots = render;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the seed for both the split and the forest
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.forest.seed = seed;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration before any stage runs
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test size must lie strictly between 0 and 1, got {}",
                self.test_size
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(PipelineError::InvalidConfig(
                "random forest needs at least one tree".to_string(),
            ));
        }
        if self.target_column.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "target column name is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn heatmap_path(&self) -> PathBuf {
        self.plot_dir.join(HEATMAP_FILE)
    }

    pub fn scatter_path(&self) -> PathBuf {
        self.plot_dir.join(SCATTER_FILE)
    }

    pub fn importance_path(&self) -> PathBuf {
        self.plot_dir.join(IMPORTANCE_FILE)
    }
}
