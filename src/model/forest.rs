//! Random forest regressor: bootstrap-aggregated regression trees

use super::tree::{RegressionTree, TreeConfig};
use super::{check_width, Regressor};
use crate::error::PipelineError;
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Max features per split (None = all features)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random forest model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

impl RandomForestRegressor {
    /// Train the random forest
    ///
    /// Tree `i` draws its bootstrap sample and its feature order from
    /// `seed + i`, so a fixed seed reproduces the same forest.
    pub fn fit(
        config: ForestConfig,
        features: &Array2<f64>,
        target: &Array1<f64>,
        feature_names: &[String],
    ) -> crate::Result<Self> {
        let n_samples = features.nrows();
        let n_features = features.ncols();

        if n_samples != target.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} targets",
                n_samples,
                target.len()
            )));
        }
        if feature_names.len() != n_features {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                n_features
            )));
        }
        if n_samples == 0 {
            return Err(PipelineError::InsufficientData(
                "no training rows for random forest".to_string(),
            ));
        }
        if config.n_trees == 0 {
            return Err(PipelineError::InvalidConfig(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let tree_config = TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: config.max_features,
                    seed,
                };

                let samples = if config.bootstrap {
                    bootstrap_indices(n_samples, seed)
                } else {
                    (0..n_samples).collect()
                };

                RegressionTree::fit(tree_config, features, target, &samples)
            })
            .collect();

        let feature_importances = aggregate_importances(&trees, n_features);
        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            "forest grown"
        );

        Ok(Self {
            config,
            trees,
            feature_names: feature_names.to_vec(),
            feature_importances,
        })
    }

    /// Predict for a single sample: mean of the tree predictions
    pub fn predict_one(&self, row: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_one(row)).sum();
        total / self.trees.len() as f64
    }

    /// Get feature importances, in feature order, summing to 1 unless no tree split
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Get feature names with importances, sorted by importance
    pub fn feature_importance_ranking(&self) -> Vec<(&str, f64)> {
        let mut ranking: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .zip(self.feature_importances.iter())
            .map(|(n, &i)| (n.as_str(), i))
            .collect();

        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Print summary
    pub fn summary(&self) {
        println!("\nRandom Forest Summary");
        println!("=====================");
        println!("Number of trees: {}", self.n_trees());
        println!(
            "Deepest tree: {}",
            self.trees.iter().map(|t| t.depth()).max().unwrap_or(0)
        );

        println!("\nTop 10 Feature Importances:");
        for (name, importance) in self.feature_importance_ranking().iter().take(10) {
            println!("  {}: {:.4}", name, importance);
        }
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &str {
        "Random Forest Regressor"
    }

    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict(&self, features: &Array2<f64>) -> crate::Result<Array1<f64>> {
        check_width(self.n_features(), features)?;
        Ok(features
            .outer_iter()
            .map(|row| self.predict_one(row))
            .collect())
    }
}

/// Draw `n` row indices with replacement
fn bootstrap_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Average the per-tree importances of trees that split at least once,
/// then renormalise
fn aggregate_importances(trees: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut importances = vec![0.0; n_features];
    let mut contributing = 0usize;

    for tree in trees.iter().filter(|t| !t.root().is_leaf()) {
        for (total, &imp) in importances.iter_mut().zip(tree.feature_importances()) {
            *total += imp;
        }
        contributing += 1;
    }

    if contributing == 0 {
        return importances;
    }

    for imp in &mut importances {
        *imp /= contributing as f64;
    }
    let sum: f64 = importances.iter().sum();
    if sum > 0.0 {
        for imp in &mut importances {
            *imp /= sum;
        }
    }
    importances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression_data() -> (Array2<f64>, Array1<f64>, Vec<String>) {
        let n = 200;
        let features = Array2::from_shape_fn((n, 3), |(r, c)| match c {
            0 => r as f64 / 20.0,
            1 => (r as f64 / 10.0).sin(),
            _ => ((r * 13) % 17) as f64,
        });
        let target = Array1::from_shape_fn(n, |r| {
            let x1 = r as f64 / 20.0;
            let x2 = (r as f64 / 10.0).sin();
            x1 + x2 * 2.0 + 0.1 * (r as f64 % 5.0)
        });
        let names = vec![
            "freight_price".to_string(),
            "product_score".to_string(),
            "weekday".to_string(),
        ];
        (features, target, names)
    }

    #[test]
    fn test_random_forest_regression() {
        let (features, target, names) = regression_data();
        let config = ForestConfig {
            n_trees: 10,
            ..Default::default()
        };

        let forest = RandomForestRegressor::fit(config, &features, &target, &names).unwrap();

        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.feature_importances().len(), 3);
        let sum: f64 = forest.feature_importances().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);

        // The noise column carries no signal
        let ranking = forest.feature_importance_ranking();
        assert_eq!(ranking[2].0, "weekday");

        let predictions = forest.predict(&features).unwrap();
        let mse = predictions
            .iter()
            .zip(target.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            / target.len() as f64;
        assert!(mse < 0.5, "training mse too high: {}", mse);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let (features, target, names) = regression_data();
        let config = ForestConfig {
            n_trees: 5,
            ..Default::default()
        };

        let a = RandomForestRegressor::fit(config.clone(), &features, &target, &names).unwrap();
        let b = RandomForestRegressor::fit(config, &features, &target, &names).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&features).unwrap(), b.predict(&features).unwrap());
    }

    #[test]
    fn test_constant_target_has_zero_importance() {
        let features = Array2::from_shape_fn((12, 2), |(r, c)| (r + c) as f64);
        let target = Array1::from_elem(12, 7.0);
        let names = vec!["a".to_string(), "b".to_string()];

        let forest =
            RandomForestRegressor::fit(ForestConfig::default(), &features, &target, &names)
                .unwrap();
        assert_eq!(forest.feature_importances(), &[0.0, 0.0]);
        assert_eq!(forest.predict_one(features.row(0)), 7.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let features = Array2::zeros((4, 2));
        let target = Array1::zeros(4);

        let one_name = vec!["a".to_string()];
        let result = RandomForestRegressor::fit(ForestConfig::default(), &features, &target, &one_name);
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));

        let names = vec!["a".to_string(), "b".to_string()];
        let no_trees = ForestConfig {
            n_trees: 0,
            ..Default::default()
        };
        let result = RandomForestRegressor::fit(no_trees, &features, &target, &names);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
