//! # es-set — The "Engine" of EVENTSET
//!
//! A lazy relational algebra over typed events:
//!
//! - [`expr`]: expressions that filter and key events, and lower to query fragments.
//! - [`cmp`]: the relational and sort orderings over mixed-type values.
//! - [`EventSet`]: the immutable set tree with filter/sort/union/intersect.
//! - [`optimise()`]: the rewrite pass every combinator runs.
//! - [`EventSource`]: the seam for externally backed sets.
//! - [`query`]: a small SQL-like DSL over named sets.
//!
//! Building a tree is synchronous and free; only `materialise`, `count` and
//! `is_empty` do work.

pub mod cmp;
pub mod error;
pub mod expr;
pub mod optimise;
pub mod query;
pub mod set;
pub mod source;

pub use cmp::{asc, desc, Direction, SortSpec};
pub use error::{BoxError, Error, Result};
pub use expr::{BinOp, Expr};
pub use optimise::optimise;
pub use set::{
    ConcreteEventSet, EmptyEventSet, EventSet, FilterEventSet, IntersectionEventSet, SetKind,
    SortEventSet, SourceEventSet, UnionEventSet,
};
pub use source::{BufferedSource, EventSource};

pub use es_core::{Event, KeySet, Value, ValueKind};
