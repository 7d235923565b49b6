//! Convergence-controlled training loop.
//!
//! A [`Trainer`] drives any [`Learner`] through rounds: every round is one
//! full pass of the training iterator calling [`Learner::update_each`] per
//! row, followed by [`Trainer::finish_round`], which turns the accumulated
//! loss into the round RMSE. The outer driver keeps going while
//!
//! ```text
//! prev_err - curr_err > epsilon  &&  round < max_rounds
//! ```
//!
//! The improvement is signed: a round whose error rises also ends training,
//! and is reported as [`StopReason::Regressed`]. A NaN or infinite round
//! error fails the test as well and is reported as [`StopReason::Diverged`].

use serde::{Deserialize, Serialize};

use crate::data::{DatasetIter, FeatureRecord};
use crate::utils::guarded_rmse;

use super::eval::{self, EvalSummary};
use super::logger::TrainingLogger;
use super::params::TrainParams;
use super::runtime::RuntimeEnv;

// =============================================================================
// Learner
// =============================================================================

/// An algorithm's per-row update rule plus its prediction function.
///
/// Implementations own their model state. `update_each` must add each
/// observation's loss to the round through [`RuntimeEnv::add_error`] and
/// may only touch state addressable from the record's ids.
pub trait Learner {
    /// Display name, e.g. `RSVD[10]_[10]_[50]`.
    fn name(&self) -> String;

    /// Called once before each round's pass.
    fn start_round(&mut self, _env: &RuntimeEnv) {}

    /// Update the model from one row.
    fn update_each(&mut self, record: &FeatureRecord<'_>, env: &mut RuntimeEnv);

    /// Predicted rating of `item` by `user`.
    fn predict(&self, user: u32, item: u32) -> f64;
}

// =============================================================================
// StopReason / History
// =============================================================================

/// Why the outer driver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Improvement fell to `epsilon` or below.
    Converged,
    /// The training error rose.
    Regressed,
    /// `max_rounds` rounds were run.
    MaxRounds,
    /// The round error is NaN or infinite.
    Diverged,
}

/// Error series recorded during training.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Training RMSE after each round.
    pub train_rmse: Vec<f64>,
    /// `(round, rmse)` of each held-out evaluation.
    pub test_rmse: Vec<(u32, f64)>,
}

impl History {
    /// Training RMSE of the last completed round.
    pub fn last_train(&self) -> Option<f64> {
        self.train_rmse.last().copied()
    }

    /// Held-out RMSE of the last evaluation.
    pub fn last_test(&self) -> Option<f64> {
        self.test_rmse.last().map(|&(_, rmse)| rmse)
    }
}

// =============================================================================
// Trainer
// =============================================================================

/// Runs a [`Learner`] over a training iterator until convergence.
///
/// ```
/// use factorec::data::{DatasetIter, StoreCapacity, TupleStore};
/// use factorec::testing::SgdFactorLearner;
/// use factorec::training::{StopReason, TrainParams, Trainer};
///
/// let mut store = TupleStore::new(StoreCapacity::new(2, 3));
/// store.push_row(0, &[(0, 4.0), (1, 2.0)]);
/// store.push_row(1, &[(1, 3.0)]);
///
/// let params = TrainParams::builder().max_rounds(3).epsilon(0.0).build().unwrap();
/// let learner = SgdFactorLearner::new(&params, 2, 2);
/// let mut trainer = Trainer::new(learner, params, DatasetIter::new(&store));
/// let reason = trainer.run();
/// assert!(trainer.env().round <= 3);
/// assert!(matches!(reason, StopReason::MaxRounds | StopReason::Regressed | StopReason::Converged));
/// ```
pub struct Trainer<'a, L: Learner> {
    learner: L,
    env: RuntimeEnv,
    train: DatasetIter<'a>,
    test: Option<DatasetIter<'a>>,
    logger: TrainingLogger,
    history: History,
}

impl<'a, L: Learner> Trainer<'a, L> {
    /// Prepare a run. The round denominator is the training iterator's
    /// visible item count.
    pub fn new(learner: L, params: TrainParams, train: DatasetIter<'a>) -> Self {
        let mut env = RuntimeEnv::new(params);
        env.nnz = train.aggregate_counts().item;
        let logger = TrainingLogger::new(env.params.verbosity).with_tag(learner.name());
        Self {
            learner,
            env,
            train,
            test: None,
            logger,
            history: History::default(),
        }
    }

    /// Attach a held-out iterator, evaluated every `eval_period` rounds.
    pub fn with_test(mut self, test: DatasetIter<'a>) -> Self {
        self.test = Some(test);
        self
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn env(&self) -> &RuntimeEnv {
        &self.env
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// One round: a full pass of `update_each`, then [`finish_round`](Self::finish_round).
    pub fn update_inner(&mut self) {
        self.learner.start_round(&self.env);
        self.train.refresh();
        while let Some(record) = self.train.next_record() {
            self.learner.update_each(record, &mut self.env);
        }
        self.finish_round();
    }

    /// Close the current round: compute its RMSE, shift the error pair,
    /// bump the round counter and reset the accumulator.
    pub fn finish_round(&mut self) {
        let env = &mut self.env;
        let err = guarded_rmse(env.sum_err, env.nnz);
        env.prev_err = env.curr_err;
        env.curr_err = err;
        env.round += 1;
        env.sum_err = 0.0;
        self.history.train_rmse.push(err);

        let round = env.round;
        let period = env.params.eval_period;
        let test_err = match self.test.as_mut() {
            Some(test) if period > 0 && round % period == 0 => {
                let summary: EvalSummary = eval::evaluate(&self.learner, test);
                self.logger
                    .log_eval(round, summary.rmse, summary.mae, summary.count);
                self.history.test_rmse.push((round, summary.rmse));
                Some(summary.rmse)
            }
            _ => None,
        };
        self.logger.log_round(round, err, test_err);
    }

    /// Whether the outer driver runs another round.
    #[inline]
    pub fn should_continue(&self) -> bool {
        self.env.improvement() > self.env.params.epsilon && self.env.round < self.env.params.max_rounds
    }

    /// Drive rounds until convergence or `max_rounds`.
    pub fn run(&mut self) -> StopReason {
        self.logger.start_training(self.env.params.max_rounds, self.env.nnz);
        while self.should_continue() {
            self.update_inner();
        }

        let reason = self.stop_reason();
        self.logger
            .log_stop(reason, self.env.round, self.env.prev_err, self.env.curr_err);
        self.logger.finish_training();
        reason
    }

    fn stop_reason(&self) -> StopReason {
        if !self.env.curr_err.is_finite() {
            return StopReason::Diverged;
        }
        let improvement = self.env.improvement();
        if improvement > self.env.params.epsilon {
            StopReason::MaxRounds
        } else if improvement < 0.0 {
            StopReason::Regressed
        } else {
            StopReason::Converged
        }
    }

    /// Take back the learner, final state and error history.
    pub fn into_parts(self) -> (L, RuntimeEnv, History) {
        (self.learner, self.env, self.history)
    }
}
