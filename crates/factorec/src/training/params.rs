//! Training hyperparameters with builder pattern.
//!
//! # Example
//!
//! ```
//! use factorec::training::{Loss, RegKind, TrainParams};
//!
//! // All defaults
//! let params = TrainParams::builder().build().unwrap();
//! assert_eq!(params.n_factors, 10);
//!
//! let params = TrainParams::builder()
//!     .n_factors(20)
//!     .learning_rate(0.005)
//!     .regularizer(RegKind::ThresholdL1)
//!     .loss(Loss::Squared)
//!     .max_rounds(50)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::loss::Loss;
use super::logger::Verbosity;
use super::regularizer::{RegKind, Regularizer};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during parameter validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("learning_rate must be positive, got {0}")]
    InvalidLearningRate(f64),

    #[error("n_factors must be at least 1")]
    InvalidNFactors,

    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidNonNegative { field: &'static str, value: f64 },

    #[error("rating range is empty: min {min} > max {max}")]
    InvalidRange { min: f32, max: f32 },
}

// =============================================================================
// TrainParams
// =============================================================================

/// Hyperparameters of one training run.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct TrainParams {
    /// Number of latent factors per user and item. Default: 10.
    #[builder(default = 10)]
    pub n_factors: usize,

    /// SGD step size. Default: 0.01.
    #[builder(default = 0.01)]
    pub learning_rate: f64,

    /// Regularization weight (lambda). Default: 0.05.
    #[builder(default = 0.05)]
    pub regularization: f64,

    /// Loss function. Default: squared.
    #[builder(default)]
    pub loss: Loss,

    /// Penalty family. Default: L2.
    #[builder(default)]
    pub regularizer: RegKind,

    /// Upper bound on training rounds. Default: 100.
    #[builder(default = 100)]
    pub max_rounds: u32,

    /// Minimum improvement of the training RMSE to keep going. Default: 1e-4.
    #[builder(default = 1e-4)]
    pub epsilon: f64,

    /// Evaluate the held-out set every this many rounds; 0 disables. Default: 5.
    #[builder(default = 5)]
    pub eval_period: u32,

    /// Clamp predictions into `[min, max]`. `None` leaves them unclamped.
    pub rating_range: Option<(f32, f32)>,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,

    /// Random seed for factor initialisation. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,
}

impl<S: train_params_builder::IsComplete> TrainParamsBuilder<S> {
    /// Build and validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `learning_rate <= 0`
    /// - `n_factors == 0`
    /// - negative or non-finite `regularization` or `epsilon`
    /// - `rating_range` with `min > max`
    pub fn build(self) -> Result<TrainParams, ConfigError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl TrainParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_factors == 0 {
            return Err(ConfigError::InvalidNFactors);
        }
        for (field, value) in [("regularization", self.regularization), ("epsilon", self.epsilon)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNonNegative { field, value });
            }
        }
        if let Some((min, max)) = self.rating_range {
            if min > max {
                return Err(ConfigError::InvalidRange { min, max });
            }
        }
        Ok(())
    }

    /// `"[F]_[LR*1000]_[REG*1000]"` with rates rounded to thousandths.
    pub fn brief_desc(&self) -> String {
        format!(
            "[{}]_[{}]_[{}]",
            self.n_factors,
            (self.learning_rate * 1000.0).round() as i64,
            (self.regularization * 1000.0).round() as i64
        )
    }

    /// The configured penalty with its weight.
    pub fn regularizer(&self) -> Regularizer {
        Regularizer::new(self.regularizer, self.regularization)
    }
}

impl Default for TrainParams {
    fn default() -> Self {
        Self::builder().build().expect("default params are valid")
    }
}

// =============================================================================
// Tests
// =============================================================================
