//! Hyperparameter grid expansion.

use serde::{Deserialize, Serialize};

use crate::training::{ConfigError, TrainParams};

/// Per-axis value lists expanded into one [`TrainParams`] per combination.
///
/// Axes are `n_factors`, `learning_rate`, `regularization`, in that order;
/// the last axis varies fastest. An empty axis keeps the template's value.
///
/// ```
/// use factorec::harness::ParamGrid;
///
/// let grid: ParamGrid = serde_json::from_str(
///     r#"{"n_factors": [10, 20], "regularization": [0.01, 0.05, 0.1]}"#,
/// ).unwrap();
/// let params = grid.expand().unwrap();
/// assert_eq!(params.len(), 6);
/// assert_eq!((params[1].n_factors, params[1].regularization), (10, 0.05));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    /// Values shared by every combination.
    pub template: TrainParams,
    pub n_factors: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub regularization: Vec<f64>,
}

impl ParamGrid {
    pub fn new(template: TrainParams) -> Self {
        Self {
            template,
            ..Default::default()
        }
    }

    pub fn n_factors(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.n_factors = values.into_iter().collect();
        self
    }

    pub fn learning_rate(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.learning_rate = values.into_iter().collect();
        self
    }

    pub fn regularization(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.regularization = values.into_iter().collect();
        self
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        axis_len(&self.n_factors) * axis_len(&self.learning_rate) * axis_len(&self.regularization)
    }

    /// Always false: a grid with no axes is the template alone.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All combinations, each validated.
    pub fn expand(&self) -> Result<Vec<TrainParams>, ConfigError> {
        let t = &self.template;
        let factors = axis_or(&self.n_factors, t.n_factors);
        let rates = axis_or(&self.learning_rate, t.learning_rate);
        let regs = axis_or(&self.regularization, t.regularization);

        let mut out = Vec::with_capacity(self.len());
        for &n_factors in &factors {
            for &learning_rate in &rates {
                for &regularization in &regs {
                    let params = TrainParams {
                        n_factors,
                        learning_rate,
                        regularization,
                        ..t.clone()
                    };
                    params.validate()?;
                    out.push(params);
                }
            }
        }
        Ok(out)
    }
}

#[inline]
fn axis_len<T>(axis: &[T]) -> usize {
    axis.len().max(1)
}

fn axis_or<T: Copy>(axis: &[T], fallback: T) -> Vec<T> {
    if axis.is_empty() {
        vec![fallback]
    } else {
        axis.to_vec()
    }
}
