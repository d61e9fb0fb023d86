//! Evaluation of fitted regressors on the held-out rows

use crate::error::PipelineError;
use crate::model::Regressor;
use ndarray::{Array1, Array2};

/// RMSE and R² of one model on the test subset
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub model_name: String,
    /// Root mean squared error, in target units
    pub rmse: f64,
    /// Coefficient of determination, at most 1
    pub r2: f64,
    pub n_samples: usize,
}

impl EvaluationReport {
    /// Score predictions against the actual values
    pub fn from_predictions(
        model_name: &str,
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
    ) -> crate::Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} actual values but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(PipelineError::InsufficientData(
                "cannot evaluate on an empty test set".to_string(),
            ));
        }

        Ok(Self {
            model_name: model_name.to_string(),
            rmse: root_mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
            n_samples: y_true.len(),
        })
    }

    /// Print the evaluation block to the console
    pub fn print(&self) {
        println!("\n{} Evaluation:", self.model_name);
        println!("RMSE: {:.2}", self.rmse);
        println!("R² Score: {:.2}", self.r2);
    }
}

/// Predict on the test rows and score the result
pub fn evaluate<M: Regressor + ?Sized>(
    model: &M,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> crate::Result<EvaluationReport> {
    let predictions = model.predict(x_test)?;
    EvaluationReport::from_predictions(model.name(), y_test, &predictions)
}

/// Mean Squared Error: (1/n) * Σ(y_true - y_pred)²
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

/// Root Mean Squared Error
pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

/// R² = 1 - SS_res / SS_tot
///
/// A constant target scores 1.0 for exact predictions and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let y_mean = y_true.mean().unwrap_or(0.0);

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();

    let ss_tot: f64 = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}
