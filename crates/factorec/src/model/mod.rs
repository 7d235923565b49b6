//! Latent factor model.
//!
//! [`FactorModel`] holds one factor row and one bias per user and per item:
//!
//! ```text
//! r̂(u, i) = base + b_u + b_i + ⟨p_u, q_i⟩
//! ```
//!
//! optionally clamped into a rating range. It is owned by exactly one
//! training task and mutated in place by the learner's per-row update.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// User/item factor matrices plus biases.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorModel {
    /// `n_users × n_factors`.
    user_factors: Array2<f32>,
    /// `n_items × n_factors`.
    item_factors: Array2<f32>,
    user_bias: Array1<f32>,
    item_bias: Array1<f32>,
    base: f32,
    range: Option<(f32, f32)>,
}

impl FactorModel {
    /// Zero-initialised model.
    pub fn zeros(n_users: usize, n_items: usize, n_factors: usize) -> Self {
        Self {
            user_factors: Array2::zeros((n_users, n_factors)),
            item_factors: Array2::zeros((n_items, n_factors)),
            user_bias: Array1::zeros(n_users),
            item_bias: Array1::zeros(n_items),
            base: 0.0,
            range: None,
        }
    }

    /// Model with factors drawn uniformly from `[-scale, scale)` and zero
    /// biases. The same `seed` always yields the same factors.
    pub fn random(n_users: usize, n_items: usize, n_factors: usize, scale: f32, seed: u64) -> Self {
        let mut model = Self::zeros(n_users, n_items, n_factors);
        if scale > 0.0 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            model
                .user_factors
                .iter_mut()
                .chain(model.item_factors.iter_mut())
                .for_each(|w| *w = rng.gen_range(-scale..scale));
        }
        model
    }

    /// Set the global base prediction.
    pub fn with_base(mut self, base: f32) -> Self {
        self.base = base;
        self
    }

    /// Clamp predictions into `[min, max]`.
    pub fn with_range(mut self, range: Option<(f32, f32)>) -> Self {
        self.range = range;
        self
    }

    #[inline]
    pub fn n_users(&self) -> usize {
        self.user_factors.nrows()
    }

    #[inline]
    pub fn n_items(&self) -> usize {
        self.item_factors.nrows()
    }

    #[inline]
    pub fn n_factors(&self) -> usize {
        self.user_factors.ncols()
    }

    #[inline]
    pub fn base(&self) -> f32 {
        self.base
    }

    #[inline]
    pub fn range(&self) -> Option<(f32, f32)> {
        self.range
    }

    /// Clamp `value` into the configured range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        match self.range {
            Some((min, max)) => value.clamp(min as f64, max as f64),
            None => value,
        }
    }

    /// Prediction without clamping, for gradient computation.
    ///
    /// Ids outside the model fall back to the base prediction.
    #[inline]
    pub fn predict_raw(&self, user: u32, item: u32) -> f64 {
        let (u, i) = (user as usize, item as usize);
        if u >= self.n_users() || i >= self.n_items() {
            return self.base as f64;
        }
        let dot: f32 = self.user_factors.row(u).dot(&self.item_factors.row(i));
        self.base as f64 + self.user_bias[u] as f64 + self.item_bias[i] as f64 + dot as f64
    }

    /// Clamped prediction.
    #[inline]
    pub fn predict(&self, user: u32, item: u32) -> f64 {
        self.clamp(self.predict_raw(user, item))
    }

    pub fn user_factors(&self, user: u32) -> ArrayView1<'_, f32> {
        self.user_factors.row(user as usize)
    }

    pub fn item_factors(&self, item: u32) -> ArrayView1<'_, f32> {
        self.item_factors.row(item as usize)
    }

    /// Mutable factor rows of one user and one item at once.
    pub fn factor_rows_mut(&mut self, user: u32, item: u32) -> (ArrayViewMut1<'_, f32>, ArrayViewMut1<'_, f32>) {
        (
            self.user_factors.row_mut(user as usize),
            self.item_factors.row_mut(item as usize),
        )
    }

    /// Mutable biases of one user and one item at once.
    pub fn biases_mut(&mut self, user: u32, item: u32) -> (&mut f32, &mut f32) {
        (&mut self.user_bias[user as usize], &mut self.item_bias[item as usize])
    }

    /// Returns true if `user` and `item` both have factor rows.
    #[inline]
    pub fn contains(&self, user: u32, item: u32) -> bool {
        (user as usize) < self.n_users() && (item as usize) < self.n_items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn prediction_sums_terms() {
        let mut model = FactorModel::zeros(2, 3, 2).with_base(3.0);
        {
            let (mut p, mut q) = model.factor_rows_mut(1, 2);
            p.assign(&ndarray::arr1(&[1.0, 2.0]));
            q.assign(&ndarray::arr1(&[0.5, 0.25]));
            let (bu, bi) = model.biases_mut(1, 2);
            *bu = 0.1;
            *bi = -0.2;
        }
        assert_abs_diff_eq!(model.predict(1, 2), 3.0 + 0.1 - 0.2 + 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.predict(0, 0), 3.0);
    }

    #[test]
    fn clamps_into_range() {
        let model = FactorModel::zeros(1, 1, 1).with_base(7.0).with_range(Some((1.0, 5.0)));
        assert_eq!(model.predict(0, 0), 5.0);
        assert_eq!(model.predict_raw(0, 0), 7.0);
    }

    #[test]
    fn unknown_ids_fall_back_to_base() {
        let model = FactorModel::random(2, 2, 4, 0.1, 7).with_base(2.5);
        assert_eq!(model.predict(9, 0), 2.5);
        assert!(!model.contains(0, 2));
    }

    #[test]
    fn random_init_is_seeded() {
        let a = FactorModel::random(5, 4, 3, 0.1, 42);
        let b = FactorModel::random(5, 4, 3, 0.1, 42);
        let c = FactorModel::random(5, 4, 3, 0.1, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.user_factors(0).iter().all(|w| w.abs() < 0.1));
    }
}
