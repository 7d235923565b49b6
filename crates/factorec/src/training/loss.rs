//! Per-observation loss functions.

use serde::{Deserialize, Serialize};

/// Loss between an observed rating and a prediction.
///
/// The margin losses ([`Logistic`](Loss::Logistic), [`Exponential`](Loss::Exponential),
/// [`Hinge`](Loss::Hinge)) expect labels in `{-1, +1}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// `(y - p)²`. Its root mean is the reported RMSE.
    #[default]
    Squared,
    /// `ln(1 + exp(-y·p))`.
    Logistic,
    /// `exp(-y·p)`.
    Exponential,
    /// `max(0, 1 - y·p)`.
    Hinge,
}

impl Loss {
    /// Loss value.
    #[inline]
    pub fn value(self, label: f64, pred: f64) -> f64 {
        match self {
            Loss::Squared => {
                let diff = label - pred;
                diff * diff
            }
            Loss::Logistic => (-label * pred).exp().ln_1p(),
            Loss::Exponential => (-label * pred).exp(),
            Loss::Hinge => {
                let margin = label * pred;
                if margin < 1.0 {
                    1.0 - margin
                } else {
                    0.0
                }
            }
        }
    }

    /// Derivative of the loss with respect to the prediction.
    ///
    /// The squared loss uses `p - y` (the conventional half-gradient).
    #[inline]
    pub fn derivative(self, label: f64, pred: f64) -> f64 {
        match self {
            Loss::Squared => pred - label,
            Loss::Logistic => {
                let e = (-label * pred).exp();
                -label * e / (1.0 + e)
            }
            Loss::Exponential => -label * (-label * pred).exp(),
            Loss::Hinge => {
                if label * pred < 1.0 {
                    -label
                } else {
                    0.0
                }
            }
        }
    }

    /// Short name for logs and task descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Loss::Squared => "squared",
            Loss::Logistic => "logistic",
            Loss::Exponential => "exponential",
            Loss::Hinge => "hinge",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn squared_loss_and_gradient() {
        assert_abs_diff_eq!(Loss::Squared.value(4.0, 3.5), 0.25);
        assert_abs_diff_eq!(Loss::Squared.derivative(4.0, 3.5), -0.5);
    }

    #[test]
    fn logistic_at_zero_margin() {
        assert_abs_diff_eq!(Loss::Logistic.value(1.0, 0.0), 2f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(Loss::Logistic.derivative(1.0, 0.0), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn hinge_is_flat_past_the_margin() {
        assert_eq!(Loss::Hinge.value(1.0, 2.0), 0.0);
        assert_eq!(Loss::Hinge.derivative(1.0, 2.0), 0.0);
        assert_abs_diff_eq!(Loss::Hinge.value(-1.0, 0.5), 1.5);
        assert_eq!(Loss::Hinge.derivative(-1.0, 0.5), 1.0);
    }

    #[test]
    fn exponential_gradient_matches_finite_difference() {
        let (y, p, h) = (1.0, 0.3, 1e-6);
        let numeric = (Loss::Exponential.value(y, p + h) - Loss::Exponential.value(y, p - h)) / (2.0 * h);
        assert_abs_diff_eq!(Loss::Exponential.derivative(y, p), numeric, epsilon = 1e-6);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Loss::Logistic).unwrap();
        assert_eq!(json, "\"logistic\"");
        let back: Loss = serde_json::from_str("\"hinge\"").unwrap();
        assert_eq!(back, Loss::Hinge);
    }
}
