//! Hyperparameters plus the mutable state of one training run.

use super::loss::Loss;
use super::params::TrainParams;
use super::regularizer::Regularizer;

/// Seed for `prev_err`, large enough that the first round always runs.
pub const INITIAL_PREV_ERR: f64 = 99999.0;
/// Seed for `curr_err`.
pub const INITIAL_CURR_ERR: f64 = 9999.0;

/// Per-task training state.
///
/// Owned by exactly one [`Trainer`](super::Trainer); learners read the
/// hyperparameters from it and add each observation's loss through
/// [`add_error`](Self::add_error).
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    pub params: TrainParams,
    pub regularizer: Regularizer,
    /// Completed rounds.
    pub round: u32,
    pub prev_err: f64,
    pub curr_err: f64,
    /// Loss accumulated during the current round.
    pub sum_err: f64,
    /// Observations per round, the denominator of the round RMSE.
    pub nnz: usize,
}

impl RuntimeEnv {
    pub fn new(params: TrainParams) -> Self {
        Self {
            regularizer: params.regularizer(),
            params,
            round: 0,
            prev_err: INITIAL_PREV_ERR,
            curr_err: INITIAL_CURR_ERR,
            sum_err: 0.0,
            nnz: 0,
        }
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.params.learning_rate
    }

    #[inline]
    pub fn n_factors(&self) -> usize {
        self.params.n_factors
    }

    #[inline]
    pub fn loss(&self) -> Loss {
        self.params.loss
    }

    /// Add one observation's loss to the current round.
    #[inline]
    pub fn add_error(&mut self, loss: f64) {
        self.sum_err += loss;
    }

    /// Improvement of the last round (`prev_err - curr_err`). Negative when
    /// the error rose.
    #[inline]
    pub fn improvement(&self) -> f64 {
        self.prev_err - self.curr_err
    }

    /// `"[F]_[LR*1000]_[REG*1000]"`, used to name tasks.
    pub fn brief_desc(&self) -> String {
        self.params.brief_desc()
    }
}
