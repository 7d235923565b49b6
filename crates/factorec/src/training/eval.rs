//! Held-out error evaluation over a [`DatasetIter`].

use crate::data::DatasetIter;
use crate::utils::{guarded_div, guarded_rmse};

use super::controller::Learner;

/// Rating errors over one pass of an iterator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvalSummary {
    pub rmse: f64,
    pub mae: f64,
    /// Number of `(user, item, rating)` observations scored.
    pub count: usize,
}

/// Score `learner` on every visible `(user, item, rating)` of `iter`.
///
/// Rows without a user index carry nothing to score and are skipped. An
/// empty pass yields zero errors.
pub fn evaluate<L: Learner + ?Sized>(learner: &L, iter: &mut DatasetIter<'_>) -> EvalSummary {
    let mut sum_sq = 0.0;
    let mut sum_abs = 0.0;
    let mut count = 0usize;

    iter.for_each_record(|record| {
        let Some(user) = record.user_id() else {
            return;
        };
        for (item, rating) in record.items() {
            let diff = rating as f64 - learner.predict(user, item);
            sum_sq += diff * diff;
            sum_abs += diff.abs();
            count += 1;
        }
    });

    EvalSummary {
        rmse: guarded_rmse(sum_sq, count),
        mae: guarded_div(sum_abs, count as f64),
        count,
    }
}
