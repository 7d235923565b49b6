use crate::data::FeatureRecord;
use crate::model::FactorModel;
use crate::training::{Learner, RegKind, RuntimeEnv, TrainParams};

/// Initial factor magnitude.
const INIT_SCALE: f32 = 0.1;

/// Regularized SVD trained by plain stochastic gradient descent.
///
/// For every `(user, item, rating)` of a record the factor rows and biases
/// take one step against the loss derivative plus the penalty gradient.
/// Pairs whose ids fall outside the model are skipped and add no error.
#[derive(Debug, Clone)]
pub struct SgdFactorLearner {
    model: FactorModel,
    desc: String,
}

impl SgdFactorLearner {
    /// Randomly initialised learner sized for `n_users × n_items`, seeded
    /// from `params.seed` and clamped to `params.rating_range`.
    pub fn new(params: &TrainParams, n_users: usize, n_items: usize) -> Self {
        let model = FactorModel::random(n_users, n_items, params.n_factors, INIT_SCALE, params.seed)
            .with_range(params.rating_range);
        Self {
            model,
            desc: params.brief_desc(),
        }
    }

    /// Start predictions from `base`, usually the mean training rating.
    pub fn with_base(mut self, base: f32) -> Self {
        self.model = self.model.with_base(base);
        self
    }

    pub fn model(&self) -> &FactorModel {
        &self.model
    }

    pub fn into_model(self) -> FactorModel {
        self.model
    }
}

impl Learner for SgdFactorLearner {
    fn name(&self) -> String {
        format!("RSVD{}", self.desc)
    }

    fn update_each(&mut self, record: &FeatureRecord<'_>, env: &mut RuntimeEnv) {
        let Some(user) = record.user_id() else {
            return;
        };
        let lr = env.learning_rate();
        let loss = env.loss();
        let reg = env.regularizer;

        for (item, rating) in record.items() {
            if !self.model.contains(user, item) {
                continue;
            }
            let label = rating as f64;
            let pred = self.model.predict_raw(user, item);
            env.add_error(loss.value(label, pred));
            let d = loss.derivative(label, pred);

            let (mut p, mut q) = self.model.factor_rows_mut(user, item);
            let (p_norm, q_norm) = match reg.kind {
                RegKind::L12 => (norm(p.iter()), norm(q.iter())),
                _ => (0.0, 0.0),
            };
            for (pu, qi) in p.iter_mut().zip(q.iter_mut()) {
                let (pf, qf) = (*pu as f64, *qi as f64);
                let step_p = d * qf + reg.group_gradient(pf, p_norm);
                let step_q = d * pf + reg.group_gradient(qf, q_norm);
                *pu = reg.after_update(pf - lr * step_p) as f32;
                *qi = reg.after_update(qf - lr * step_q) as f32;
            }

            let (bu, bi) = self.model.biases_mut(user, item);
            *bu -= (lr * (d + reg.gradient(*bu as f64))) as f32;
            *bi -= (lr * (d + reg.gradient(*bi as f64))) as f32;
        }
    }

    fn predict(&self, user: u32, item: u32) -> f64 {
        self.model.predict(user, item)
    }
}

#[inline]
fn norm<'a>(row: impl Iterator<Item = &'a f32>) -> f64 {
    row.map(|&w| (w as f64) * (w as f64)).sum::<f64>().sqrt()
}
