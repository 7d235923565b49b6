//! factorec: training infrastructure for matrix-factorization recommenders.
//!
//! The crate provides the shared machinery every factorization algorithm
//! rides on, leaving the per-algorithm gradient math to implementors of
//! [`Learner`].
//!
//! # Key Types
//!
//! - [`GroupedStore`] / [`TupleStore`] - Append-only packed storage for sparse rows
//! - [`DatasetIter`] / [`FeatureRecord`] - Restartable, non-allocating row cursor
//! - [`RefVector`] / [`PrjRefVector`] - Zero-copy views into a store's arrays
//! - [`QuantDict`] - Code/value dictionary for compact value storage
//! - [`Trainer`] / [`Learner`] - Convergence-controlled training loop
//! - [`TaskHarness`] - Worker pool running independent training tasks
//!
//! # Data Flow
//!
//! Raw lines are ingested into a store, iterated in full passes by a
//! [`DatasetIter`], handed one [`FeatureRecord`] at a time to a
//! [`Learner`], and the [`Trainer`] aggregates the per-round error to decide
//! whether to continue. Many trainers run side by side through the
//! [`TaskHarness`].

pub mod data;
pub mod harness;
pub mod model;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Storage and iteration
pub use data::{
    BackingStore, DatasetIter, FeatureGroup, FeatureRecord, GroupCounts, GroupMask, GroupedStore,
    Ingest, Layout, MaskMode, OwnedRow, ParseError, PrjRefVector, PrjRefVectorMut, QuantDict,
    RefData, RefVector, RefVectorMut, Segment, StoreCapacity, TupleStore,
};

// Model consumed by learners
pub use model::FactorModel;

// Training loop
pub use training::{
    evaluate, ConfigError, EvalSummary, History, Learner, Loss, RegKind, Regularizer, RuntimeEnv,
    StopReason, TrainParams, Trainer, TrainingLogger, Verbosity,
};

// Task harness
pub use harness::{
    FnTask, HarnessError, HarnessReport, ParamGrid, Task, TaskHarness, TaskQueue, TaskResult,
};
