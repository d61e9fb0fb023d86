//! Ordinary least squares model backed by linfa

use super::{check_width, Regressor};
use crate::error::PipelineError;
use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, Array2};

/// OLS fit with intercept on raw, unscaled features
#[derive(Debug)]
pub struct LinearModel {
    model: FittedLinearRegression<f64>,
    feature_names: Vec<String>,
}

impl LinearModel {
    /// Fit ordinary least squares on the training rows
    pub fn fit(
        features: &Array2<f64>,
        target: &Array1<f64>,
        feature_names: &[String],
    ) -> crate::Result<Self> {
        if features.nrows() != target.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} targets",
                features.nrows(),
                target.len()
            )));
        }
        if features.nrows() == 0 {
            return Err(PipelineError::InsufficientData(
                "no training rows for linear regression".to_string(),
            ));
        }

        let dataset = Dataset::new(features.clone(), target.clone());
        let model = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| PipelineError::Training(format!("linear regression: {}", e)))?;

        Ok(Self {
            model,
            feature_names: feature_names.to_vec(),
        })
    }

    /// Fitted coefficient per feature, in feature order
    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.params()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Print the fitted equation, one coefficient per feature
    pub fn summary(&self) {
        println!("\nLinear Regression Summary");
        println!("=========================");
        println!("Intercept: {:.4}", self.intercept());
        for (name, coef) in self.feature_names.iter().zip(self.coefficients().iter()) {
            println!("  {}: {:.4}", name, coef);
        }
    }
}

impl Regressor for LinearModel {
    fn name(&self) -> &str {
        "Linear Regression"
    }

    fn n_features(&self) -> usize {
        self.model.params().len()
    }

    fn predict(&self, features: &Array2<f64>) -> crate::Result<Array1<f64>> {
        check_width(self.n_features(), features)?;
        let predictions: Array1<f64> = self.model.predict(features);
        Ok(predictions)
    }
}
