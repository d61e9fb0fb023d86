//! CART regression tree used as the random forest's base learner

use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Regression tree configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TreeNode {
    Leaf {
        /// Mean target of the samples reaching this leaf
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left
        threshold: f64,
        n_samples: usize,
        /// MSE impurity at this node
        impurity: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Impurity decrease weighted by the node's sample count
    weighted_gain: f64,
}

/// Regression tree fitted with the MSE criterion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    root: TreeNode,
    feature_importances: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the given sample rows
    ///
    /// # Arguments
    /// * `config` - Tree hyper-parameters
    /// * `features` - Full training matrix
    /// * `target` - Full training target
    /// * `samples` - Row indices to train on; repeats act as sample weights
    pub fn fit(
        config: TreeConfig,
        features: &Array2<f64>,
        target: &Array1<f64>,
        samples: &[usize],
    ) -> Self {
        let n_features = features.ncols();
        let mut builder = TreeBuilder {
            config: &config,
            features,
            target,
            importances: vec![0.0; n_features],
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        };

        let root = builder.build(samples.to_vec(), 0);

        let mut feature_importances = builder.importances;
        let sum: f64 = feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut feature_importances {
                *imp /= sum;
            }
        }

        Self {
            root,
            feature_importances,
        }
    }

    /// Predict for a single feature row
    pub fn predict_one(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
        features
            .outer_iter()
            .map(|row| self.predict_one(row))
            .collect()
    }

    /// Normalised impurity decrease per feature (all zero for a single-leaf tree)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

struct TreeBuilder<'a> {
    config: &'a TreeConfig,
    features: &'a Array2<f64>,
    target: &'a Array1<f64>,
    importances: Vec<f64>,
    rng: ChaCha8Rng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> TreeNode {
        let n = samples.len();
        let (mean, impurity) = mean_and_mse(samples.iter().map(|&i| self.target[i]));

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || impurity <= f64::EPSILON
        {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        let Some(best) = self.find_best_split(&samples, impurity) else {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .copied()
            .partition(|&i| self.features[[i, best.feature]] <= best.threshold);

        // A split that moves nothing would recurse on the same samples
        if left.is_empty() || right.is_empty() {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        self.importances[best.feature] += best.weighted_gain;

        let left = self.build(left, depth + 1);
        let right = self.build(right, depth + 1);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            n_samples: n,
            impurity,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Scan sorted values of each candidate feature with running sums
    fn find_best_split(&mut self, samples: &[usize], parent_impurity: f64) -> Option<SplitCandidate> {
        let n_features = self.features.ncols();
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(&mut self.rng);
        feature_indices.truncate(max_features);

        let n = samples.len();
        let n_f = n as f64;
        let min_leaf = self.config.min_samples_leaf.max(1);

        let total_sum: f64 = samples.iter().map(|&i| self.target[i]).sum();
        let total_sq: f64 = samples.iter().map(|&i| self.target[i].powi(2)).sum();

        let mut best: Option<SplitCandidate> = None;
        let mut best_gain = 0.0;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

        for &feature in &feature_indices {
            column.clear();
            column.extend(
                samples
                    .iter()
                    .map(|&i| (self.features[[i, feature]], self.target[i])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let (value, y) = column[k - 1];
                left_sum += y;
                left_sq += y * y;

                let next_value = column[k].0;
                // NaN never satisfies `x <= threshold`, so it cannot bound a split
                if value.is_nan() || next_value.is_nan() || value == next_value {
                    continue;
                }
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let n_left = k as f64;
                let n_right = n_f - n_left;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;

                let left_impurity = (left_sq / n_left - (left_sum / n_left).powi(2)).max(0.0);
                let right_impurity = (right_sq / n_right - (right_sum / n_right).powi(2)).max(0.0);

                let weighted = (n_left * left_impurity + n_right * right_impurity) / n_f;
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: split_threshold(value, next_value),
                        weighted_gain: gain * n_f,
                    });
                }
            }
        }

        best
    }
}

/// Midpoint of two distinct sorted values, falling back to the lower one when
/// the midpoint overflows or rounds up onto the upper value
fn split_threshold(value: f64, next_value: f64) -> f64 {
    let mid = value + (next_value - value) / 2.0;
    if mid.is_finite() && mid < next_value {
        mid
    } else {
        value
    }
}

/// Mean and population variance of the target values
fn mean_and_mse(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (count, sum) = values.clone().fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let mse = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, mse)
}
