//! Sparse training data: storage, views and iteration.
//!
//! # Overview
//!
//! Rows carry a label plus up to three feature groups (global, user, item),
//! each a list of `(index, value)` pairs. Two storage layouts are provided:
//!
//! - [`GroupedStore`]: grouped CSR. One `row_ptr` entry per group boundary,
//!   shared index/value arrays. Values can be quantized through a [`QuantDict`].
//! - [`TupleStore`]: flat COO. One `(user, item, rating)` triple per nonzero
//!   with a derived row boundary array.
//!
//! Both are populated once through [`Ingest`] and are read-only afterwards,
//! so any number of [`DatasetIter`]s can read the same store concurrently.
//!
//! # Views
//!
//! A [`DatasetIter`] owns a single [`FeatureRecord`] that is repointed on every
//! [`advance`](DatasetIter::advance). The record hands out [`RefVector`] /
//! [`PrjRefVector`] views borrowed from the store; nothing is copied or
//! allocated per row.

mod iter;
mod parse;
mod quantize;
mod record;
mod refvec;
mod storage;

pub mod io;

pub use iter::{DatasetIter, GroupMask, MaskMode};
pub use parse::{LineHeader, ParseError};
pub use quantize::{QuantDict, MAX_CODES};
pub use record::{FeatureRecord, OwnedGroup, OwnedRow};
pub use refvec::{
    PrjRefVector, PrjRefVectorMut, RefData, RefDataMut, RefKind, RefVector, RefVectorMut,
};
pub use storage::{
    BackingStore, FeatureGroup, GroupCounts, GroupedStore, Ingest, Layout, Segment,
    StoreCapacity, TupleStore,
};
