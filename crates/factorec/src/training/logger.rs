//! Verbosity-gated training progress logging over the `log` facade.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::controller::StopReason;

/// How much a trainer reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Regressions and other anomalies.
    Warning,
    /// Start, per-round errors and the stop reason.
    Info,
    /// Everything, including evaluation details.
    Debug,
}

/// Progress logger for one training run.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    tag: String,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            tag: String::new(),
            started: None,
        }
    }

    /// Prefix every line with `tag` (typically the task name).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn start_training(&mut self, max_rounds: u32, nnz: usize) {
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            log::info!(
                "{}training up to {} rounds over {} observations",
                self.prefix(),
                max_rounds,
                nnz
            );
        }
    }

    /// One line per round: round number, train RMSE, optional held-out RMSE.
    pub fn log_round(&self, round: u32, train_err: f64, test_err: Option<f64>) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        match test_err {
            Some(test) => log::info!("{}{}\t{:.6} [test {:.6}]", self.prefix(), round, train_err, test),
            None => log::info!("{}{}\t{:.6}", self.prefix(), round, train_err),
        }
    }

    pub fn log_eval(&self, round: u32, rmse: f64, mae: f64, count: usize) {
        if self.enabled(Verbosity::Debug) {
            log::debug!(
                "{}round {} held-out: rmse={:.6} mae={:.6} over {} ratings",
                self.prefix(),
                round,
                rmse,
                mae,
                count
            );
        }
    }

    pub fn log_stop(&self, reason: StopReason, round: u32, prev_err: f64, curr_err: f64) {
        match reason {
            StopReason::Regressed if self.enabled(Verbosity::Warning) => log::warn!(
                "{}training error rose at round {} ({:.6} -> {:.6}), stopping",
                self.prefix(),
                round,
                prev_err,
                curr_err
            ),
            StopReason::Diverged if self.enabled(Verbosity::Warning) => log::warn!(
                "{}training error became non-finite at round {} ({:.6} -> {}), stopping",
                self.prefix(),
                round,
                prev_err,
                curr_err
            ),
            _ if self.enabled(Verbosity::Info) => log::info!(
                "{}stopped at round {}: {:?} (error {:.6})",
                self.prefix(),
                round,
                reason,
                curr_err
            ),
            _ => {}
        }
    }

    pub fn finish_training(&self) {
        if let (true, Some(started)) = (self.enabled(Verbosity::Info), self.started) {
            log::info!(
                "{}training finished in {:.2?}",
                self.prefix(),
                started.elapsed()
            );
        }
    }

    fn prefix(&self) -> String {
        if self.tag.is_empty() {
            String::new()
        } else {
            format!("[{}] ", self.tag)
        }
    }
}
