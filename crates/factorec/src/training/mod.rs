//! Training infrastructure for factor models.
//!
//! - [`TrainParams`]: hyperparameters, validated at build time
//! - [`RuntimeEnv`]: hyperparameters plus mutable round state of one run
//! - [`Learner`]: an algorithm's per-row update and prediction
//! - [`Trainer`]: round loop with convergence control and held-out evaluation
//! - [`TrainingLogger`]: progress logging with verbosity levels
//!
//! ## Loss and regularization
//!
//! - [`Loss`]: squared, logistic, exponential, hinge
//! - [`Regularizer`]: smooth-L1, threshold-L1, L2, L12, elastic net

mod controller;
mod eval;
mod logger;
mod loss;
mod params;
mod regularizer;
mod runtime;

pub use controller::{History, Learner, StopReason, Trainer};
pub use eval::{evaluate, EvalSummary};
pub use logger::{TrainingLogger, Verbosity};
pub use loss::Loss;
pub use params::{ConfigError, TrainParams};
pub use regularizer::{RegKind, Regularizer};
pub use runtime::{RuntimeEnv, INITIAL_CURR_ERR, INITIAL_PREV_ERR};
