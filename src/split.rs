//! Seeded train/test partition of the feature set

use crate::data::FeatureSet;
use crate::error::PipelineError;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Row-disjoint partition of (X, y) into training and test subsets
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Rows of the cleaned table assigned to training, in shuffled order
    pub train_indices: Vec<usize>,
    /// Rows of the cleaned table assigned to testing, in shuffled order
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Number of test rows for `n` samples: `ceil(test_size * n)`
pub fn test_count(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Shuffle row indices with a seeded RNG and split them
///
/// # Arguments
/// * `data` - Cleaned features and target
/// * `test_size` - Fraction of rows held out, strictly between 0 and 1
/// * `seed` - RNG seed; the same seed and row order give the same partition
///
/// # Returns
/// * The first `n - ceil(test_size * n)` shuffled rows as training data,
///   the rest as test data
pub fn train_test_split(
    data: &FeatureSet,
    test_size: f64,
    seed: u64,
) -> crate::Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test size must lie strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n_samples = data.n_samples();
    let n_test = test_count(n_samples, test_size);
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "{} rows cannot be split into non-empty train and test sets",
            n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices.split_off(n_train);
    let train_indices = indices;

    info!(train = n_train, test = n_test, seed, "dataset split");

    Ok(TrainTestSplit {
        x_train: data.features.select(Axis(0), &train_indices),
        x_test: data.features.select(Axis(0), &test_indices),
        y_train: data.target.select(Axis(0), &train_indices),
        y_test: data.target.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}
