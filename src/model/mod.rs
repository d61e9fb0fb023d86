//! Regression estimators and the training stage

pub mod forest;
pub mod linear;
pub mod tree;

pub use forest::{ForestConfig, RandomForestRegressor};
pub use linear::LinearModel;
pub use tree::{RegressionTree, TreeConfig, TreeNode};

use crate::error::PipelineError;
use crate::split::TrainTestSplit;
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::info;

/// A fitted estimator mapping feature rows to predicted prices
pub trait Regressor {
    /// Human-readable model name used in reports
    fn name(&self) -> &str;

    /// Number of input features the model was fitted on
    fn n_features(&self) -> usize;

    /// Predict one value per row of `features`
    fn predict(&self, features: &Array2<f64>) -> crate::Result<Array1<f64>>;
}

/// Reject a feature matrix whose width differs from the fitted one
pub(crate) fn check_width(expected: usize, features: &Array2<f64>) -> crate::Result<()> {
    if features.ncols() != expected {
        return Err(PipelineError::SchemaMismatch(format!(
            "model expects {} features, got {}",
            expected,
            features.ncols()
        )));
    }
    Ok(())
}

/// The two independently fitted estimators
#[derive(Debug)]
pub struct TrainedModels {
    pub linear: LinearModel,
    pub forest: RandomForestRegressor,
}

/// Fit the linear and random forest models on the training subset
pub fn train_models(
    split: &TrainTestSplit,
    feature_names: &[String],
    forest_config: &ForestConfig,
) -> crate::Result<TrainedModels> {
    let linear_start = Instant::now();
    let linear = LinearModel::fit(&split.x_train, &split.y_train, feature_names)?;
    info!(
        elapsed_ms = linear_start.elapsed().as_millis() as u64,
        "linear regression fitted"
    );

    let forest_start = Instant::now();
    let forest = RandomForestRegressor::fit(
        forest_config.clone(),
        &split.x_train,
        &split.y_train,
        feature_names,
    )?;
    info!(
        trees = forest.n_trees(),
        elapsed_ms = forest_start.elapsed().as_millis() as u64,
        "random forest fitted"
    );

    Ok(TrainedModels { linear, forest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureSet;
    use crate::split::train_test_split;

    fn create_feature_set() -> FeatureSet {
        let n = 40;
        let features = Array2::from_shape_fn((n, 2), |(r, c)| {
            if c == 0 {
                r as f64
            } else {
                ((r * 7) % 11) as f64
            }
        });
        let target = Array1::from_shape_fn(n, |r| 3.0 * r as f64 - ((r * 7) % 11) as f64 + 10.0);
        FeatureSet {
            features,
            target,
            feature_names: vec!["qty".to_string(), "freight_price".to_string()],
            target_name: "unit_price".to_string(),
        }
    }

    #[test]
    fn test_train_models() {
        let data = create_feature_set();
        let split = train_test_split(&data, 0.2, 42).unwrap();
        let config = ForestConfig {
            n_trees: 10,
            ..Default::default()
        };

        let models = train_models(&split, &data.feature_names, &config).unwrap();
        assert_eq!(models.linear.name(), "Linear Regression");
        assert_eq!(models.forest.name(), "Random Forest Regressor");

        let linear_pred = models.linear.predict(&split.x_test).unwrap();
        let forest_pred = models.forest.predict(&split.x_test).unwrap();
        assert_eq!(linear_pred.len(), split.n_test());
        assert_eq!(forest_pred.len(), split.n_test());
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let data = create_feature_set();
        let split = train_test_split(&data, 0.2, 42).unwrap();
        let config = ForestConfig {
            n_trees: 3,
            ..Default::default()
        };
        let models = train_models(&split, &data.feature_names, &config).unwrap();

        let narrow = Array2::zeros((2, 1));
        assert!(matches!(
            models.linear.predict(&narrow),
            Err(PipelineError::SchemaMismatch(_))
        ));
        assert!(matches!(
            models.forest.predict(&narrow),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }
}
