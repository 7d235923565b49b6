//! Factor regularization.
//!
//! A [`Regularizer`] contributes a penalty gradient to each factor update
//! and, for thresholded L1 and elastic net, a proximal step applied after
//! the update.

use serde::{Deserialize, Serialize};

/// Sharpness of the sigmoid approximation used by [`RegKind::SmoothL1`].
const SMOOTH_L1_ALPHA: f64 = 1.0e6;

/// Penalty family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegKind {
    /// Differentiable approximation of `λ·|w|`.
    SmoothL1,
    /// L1 applied as soft-thresholding after each update.
    ThresholdL1,
    /// `λ/2·w²`.
    #[default]
    L2,
    /// Group-sparse `λ·‖w_g‖₂` over a factor row.
    L12,
    /// Half L1, half L2.
    ElasticNet,
}

/// Penalty family plus its weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Regularizer {
    pub kind: RegKind,
    pub lambda: f64,
}

impl Regularizer {
    pub fn new(kind: RegKind, lambda: f64) -> Self {
        Self { kind, lambda }
    }

    /// Penalty gradient for a single factor value.
    ///
    /// For [`RegKind::L12`] the value is treated as a group of one; use
    /// [`group_gradient`](Self::group_gradient) when the row norm is known.
    #[inline]
    pub fn gradient(&self, value: f64) -> f64 {
        match self.kind {
            RegKind::L12 => self.group_gradient(value, value.abs()),
            _ => self.group_gradient(value, 0.0),
        }
    }

    /// Penalty gradient for a factor value whose group has L2 norm `group_norm`.
    #[inline]
    pub fn group_gradient(&self, value: f64, group_norm: f64) -> f64 {
        match self.kind {
            RegKind::SmoothL1 => {
                let a = SMOOTH_L1_ALPHA * value;
                self.lambda * (1.0 / (1.0 + (-a).exp()) - 1.0 / (1.0 + a.exp()))
            }
            RegKind::L2 => self.lambda * value,
            RegKind::L12 => {
                if group_norm == 0.0 {
                    0.0
                } else {
                    self.lambda * value / group_norm
                }
            }
            RegKind::ElasticNet => 0.5 * self.lambda * value,
            RegKind::ThresholdL1 => 0.0,
        }
    }

    /// Proximal step applied to a freshly updated factor value.
    #[inline]
    pub fn after_update(&self, value: f64) -> f64 {
        match self.kind {
            RegKind::ThresholdL1 => soft_threshold(value, self.lambda),
            RegKind::ElasticNet => soft_threshold(value, 0.5 * self.lambda),
            RegKind::SmoothL1 | RegKind::L2 | RegKind::L12 => value,
        }
    }
}

impl Default for Regularizer {
    fn default() -> Self {
        Self::new(RegKind::L2, 0.0)
    }
}

/// Shrink `w` toward zero by `lambda`, clamping to zero inside the band.
#[inline]
fn soft_threshold(w: f64, lambda: f64) -> f64 {
    if w > lambda {
        w - lambda
    } else if w < -lambda {
        w + lambda
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn l2_gradient_is_linear() {
        let reg = Regularizer::new(RegKind::L2, 0.1);
        assert_abs_diff_eq!(reg.gradient(2.0), 0.2);
        assert_eq!(reg.after_update(2.0), 2.0);
    }

    #[test]
    fn smooth_l1_approximates_sign() {
        let reg = Regularizer::new(RegKind::SmoothL1, 0.3);
        assert_abs_diff_eq!(reg.gradient(0.5), 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(reg.gradient(-0.5), -0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(reg.gradient(0.0), 0.0);
    }

    #[test]
    fn threshold_l1_shrinks_after_update() {
        let reg = Regularizer::new(RegKind::ThresholdL1, 0.5);
        assert_eq!(reg.gradient(3.0), 0.0);
        assert_eq!(reg.after_update(2.0), 1.5);
        assert_eq!(reg.after_update(-2.0), -1.5);
        assert_eq!(reg.after_update(0.25), 0.0);
    }

    #[test]
    fn l12_divides_by_group_norm() {
        let reg = Regularizer::new(RegKind::L12, 1.0);
        assert_abs_diff_eq!(reg.group_gradient(3.0, 5.0), 0.6);
        assert_eq!(reg.group_gradient(3.0, 0.0), 0.0);
        assert_abs_diff_eq!(reg.gradient(-2.0), -1.0);
    }

    #[test]
    fn elastic_net_mixes_l2_gradient_and_l1_shrink() {
        let reg = Regularizer::new(RegKind::ElasticNet, 0.4);
        assert_abs_diff_eq!(reg.gradient(2.0), 0.4);
        assert_abs_diff_eq!(reg.after_update(1.0), 0.8);
        assert_eq!(reg.after_update(-0.1), 0.0);
    }
}
