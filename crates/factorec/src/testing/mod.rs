//! Fixtures shared by unit tests, integration tests and benches.
//!
//! - [`data`]: seeded synthetic rating matrices and their text/store forms
//! - [`SgdFactorLearner`]: plain SGD over a [`FactorModel`](crate::FactorModel)

pub mod data;
mod learner;

pub use data::{
    grouped_line, grouped_store, split_rows, synthetic_ratings, tuple_line, tuple_store, RatingRow,
};
pub use learner::SgdFactorLearner;
