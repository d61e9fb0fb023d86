//! End-to-end run: load, clean, explore, split, train, evaluate, plot, persist

use crate::config::PipelineConfig;
use crate::data::{
    clean_dataset, column_names, correlation_matrix, load_dataset, missing_value_counts,
    print_missing_values, print_preview, print_remaining_columns, split_features_and_target,
};
use crate::metrics::{evaluate, EvaluationReport};
use crate::model::{train_models, Regressor};
use crate::persist::save_model;
use crate::split::train_test_split;
use crate::viz;
use std::path::PathBuf;
use tracing::{debug, info};

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Rows left after dropping incomplete ones
    pub cleaned_rows: usize,
    /// Columns left after dropping the non-predictive ones, target included
    pub remaining_columns: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    pub linear: EvaluationReport,
    pub forest: EvaluationReport,
    /// Forest importances in feature order
    pub feature_importances: Vec<(String, f64)>,
    pub model_path: PathBuf,
    /// Figures written during the run
    pub plots: Vec<PathBuf>,
}

/// Run every stage in order; any failure stops the run before the model is saved
pub fn run(config: &PipelineConfig) -> crate::Result<PipelineOutcome> {
    config.validate()?;

    // Loader
    let df = load_dataset(&config.input_path)?;
    print_preview(&df);
    print_missing_values(&missing_value_counts(&df));

    // Cleaner
    let cleaned = clean_dataset(&df, &config.drop_columns)?;
    print_remaining_columns(&cleaned);
    let remaining_columns = column_names(&cleaned);

    // Schema problems surface here, before any figure is written
    let data = split_features_and_target(&cleaned, &config.target_column)?;
    debug!(
        samples = data.n_samples(),
        features = data.n_features(),
        "feature matrix extracted"
    );

    let mut plots = Vec::new();
    if config.render_plots {
        std::fs::create_dir_all(&config.plot_dir)?;
    }

    // Explorer
    let corr = correlation_matrix(&cleaned)?;
    debug!(columns = corr.columns.len(), "correlation matrix computed");
    if config.render_plots {
        let path = config.heatmap_path();
        viz::create_correlation_heatmap(&corr, &path)?;
        plots.push(path);
    }

    // Splitter
    let split = train_test_split(&data, config.test_size, config.seed)?;

    // Trainer
    let models = train_models(&split, &data.feature_names, &config.forest)?;

    // Evaluator
    let linear = evaluate(&models.linear, &split.x_test, &split.y_test)?;
    let forest_predictions = models.forest.predict(&split.x_test)?;
    let forest =
        EvaluationReport::from_predictions(models.forest.name(), &split.y_test, &forest_predictions)?;
    linear.print();
    forest.print();

    // Visualizer
    if config.render_plots {
        let target_range = data
            .target
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let path = config.scatter_path();
        viz::create_actual_vs_predicted_plot(&split.y_test, &forest_predictions, target_range, &path)?;
        plots.push(path);

        let path = config.importance_path();
        viz::create_feature_importance_chart(&models.forest, &path)?;
        plots.push(path);
    }

    if config.verbose {
        models.linear.summary();
        models.forest.summary();
    }

    // Persister
    save_model(&models.forest, &config.model_path)?;
    println!("\nModel saved as '{}'", config.model_path.display());

    info!(
        rows = cleaned.height(),
        linear_rmse = linear.rmse,
        forest_rmse = forest.rmse,
        "pipeline complete"
    );

    let feature_importances = models
        .forest
        .feature_names()
        .iter()
        .cloned()
        .zip(models.forest.feature_importances().iter().copied())
        .collect();

    Ok(PipelineOutcome {
        cleaned_rows: cleaned.height(),
        remaining_columns,
        n_train: split.n_train(),
        n_test: split.n_test(),
        linear,
        forest,
        feature_importances,
        model_path: config.model_path.clone(),
        plots,
    })
}
