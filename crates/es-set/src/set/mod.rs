//! # Event Sets
//!
//! [`EventSet`] is a lazy, immutable relation of events. Sets are built by
//! chaining [`filter`](EventSet::filter), [`sort`](EventSet::sort),
//! [`union`](EventSet::union) and [`intersect`](EventSet::intersect) onto a
//! leaf. Each call returns an already-optimised set and does no I/O; only
//! [`materialise`](EventSet::materialise), [`count`](EventSet::count) and
//! [`is_empty`](EventSet::is_empty) evaluate anything.
//!
//! Every variant is a cheap handle over shared, immutable state, so
//! unchanged subtrees are reused as-is by the optimiser and can be
//! materialised from any number of tasks at once.

mod concrete;
mod naive;

use std::sync::Arc;

use es_core::{Event, KeySet};
use futures::future::{BoxFuture, FutureExt};

pub use concrete::{ConcreteEventSet, EmptyEventSet};
pub use naive::{FilterEventSet, IntersectionEventSet, SortEventSet, UnionEventSet};

pub(crate) use naive::dedup_by_id;

use crate::cmp::{Direction, SortSpec};
use crate::error::Result;
use crate::expr::Expr;
use crate::optimise::optimise;
use crate::source::EventSource;

/// An externally provided set.
#[derive(Clone)]
pub struct SourceEventSet {
    source: Arc<dyn EventSource>,
}

impl SourceEventSet {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn EventSource> {
        &self.source
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl std::fmt::Debug for SourceEventSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEventSet")
            .field("name", &self.source.name())
            .field("keys", self.source.keys())
            .finish()
    }
}

/// Discriminant of an [`EventSet`], for logs, plans and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    Empty,
    Concrete,
    Union,
    Intersection,
    Filter,
    Sort,
    Source,
}

impl std::fmt::Display for SetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Concrete => write!(f, "concrete"),
            Self::Union => write!(f, "union"),
            Self::Intersection => write!(f, "intersection"),
            Self::Filter => write!(f, "filter"),
            Self::Sort => write!(f, "sort"),
            Self::Source => write!(f, "source"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventSet {
    Empty(EmptyEventSet),
    Concrete(ConcreteEventSet),
    Union(UnionEventSet),
    Intersection(IntersectionEventSet),
    Filter(FilterEventSet),
    Sort(SortEventSet),
    Source(SourceEventSet),
}

// =============================================================================
// Construction
// =============================================================================

impl EventSet {
    /// The empty set over `keys`.
    pub fn empty(keys: KeySet) -> Self {
        Self::Empty(EmptyEventSet::new(keys))
    }

    /// An in-memory set. An empty event list yields [`EventSet::Empty`].
    pub fn concrete(keys: KeySet, events: Vec<Event>) -> Self {
        optimise(Self::Concrete(ConcreteEventSet::new(keys, events)))
    }

    pub fn from_source(source: Arc<dyn EventSource>) -> Self {
        Self::Source(SourceEventSet::new(source))
    }

    /// Declared keyset: the fields this set can report.
    pub fn keys(&self) -> &KeySet {
        match self {
            Self::Empty(s) => s.keys(),
            Self::Concrete(s) => s.keys(),
            Self::Union(s) => s.keys(),
            Self::Intersection(s) => s.keys(),
            Self::Filter(s) => s.keys(),
            Self::Sort(s) => s.keys(),
            Self::Source(s) => s.source.keys(),
        }
    }

    /// Same underlying node (not merely equal content).
    pub fn ptr_eq(&self, other: &EventSet) -> bool {
        match (self, other) {
            (Self::Empty(a), Self::Empty(b)) => a.ptr_eq(b),
            (Self::Concrete(a), Self::Concrete(b)) => a.ptr_eq(b),
            (Self::Union(a), Self::Union(b)) => a.ptr_eq(b),
            (Self::Intersection(a), Self::Intersection(b)) => a.ptr_eq(b),
            (Self::Filter(a), Self::Filter(b)) => a.ptr_eq(b),
            (Self::Sort(a), Self::Sort(b)) => a.ptr_eq(b),
            (Self::Source(a), Self::Source(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    // =========================================================================
    // Combinators
    // =========================================================================

    /// Keep events for which every expression is truthy.
    pub fn filter(&self, filters: impl IntoIterator<Item = Expr>) -> EventSet {
        optimise(Self::Filter(FilterEventSet::new(
            self.clone(),
            filters.into_iter().collect(),
        )))
    }

    /// Sort by each spec in turn; the last spec is the dominant key.
    pub fn sort(&self, sorts: impl IntoIterator<Item = SortSpec>) -> EventSet {
        optimise(Self::Sort(SortEventSet::new(
            self.clone(),
            sorts.into_iter().collect(),
        )))
    }

    pub fn union(&self, other: &EventSet) -> EventSet {
        optimise(Self::Union(UnionEventSet::new(vec![
            self.clone(),
            other.clone(),
        ])))
    }

    /// Intersect by id. Field values of the result come from `other`.
    pub fn intersect(&self, other: &EventSet) -> EventSet {
        optimise(Self::Intersection(IntersectionEventSet::new(vec![
            self.clone(),
            other.clone(),
        ])))
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate into memory, projected onto exactly `keys` and windowed to
    /// `[offset, offset + limit)`.
    pub fn materialise<'a>(
        &'a self,
        keys: &'a KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> BoxFuture<'a, Result<ConcreteEventSet>> {
        async move {
            match self {
                Self::Empty(_) => Ok(ConcreteEventSet::new(keys.clone(), Vec::new())),
                Self::Concrete(s) => s.project(keys, offset, limit),
                Self::Union(s) => s.materialise(keys, offset, limit).await,
                Self::Intersection(s) => s.materialise(keys, offset, limit).await,
                Self::Filter(s) => s.materialise(keys, offset, limit).await,
                Self::Sort(s) => s.materialise(keys, offset, limit).await,
                Self::Source(s) => s.source.materialise(keys, offset, limit).await,
            }
        }
        .boxed()
    }

    pub fn count(&self) -> BoxFuture<'_, Result<usize>> {
        async move {
            match self {
                Self::Empty(_) => Ok(0),
                Self::Concrete(s) => Ok(s.len()),
                Self::Filter(s) => s.count().await,
                // Sorting never changes cardinality.
                Self::Sort(s) => s.parent().count().await,
                Self::Source(s) => s.source.count().await,
                Self::Union(_) | Self::Intersection(_) => {
                    Ok(self.materialise(&KeySet::new(), None, None).await?.len())
                }
            }
        }
        .boxed()
    }

    pub fn is_empty(&self) -> BoxFuture<'_, Result<bool>> {
        async move {
            match self {
                Self::Empty(_) => Ok(true),
                Self::Concrete(s) => Ok(s.is_empty()),
                Self::Filter(s) => s.is_empty().await,
                Self::Sort(s) => s.parent().is_empty().await,
                Self::Source(s) => s.source.is_empty().await,
                Self::Union(_) | Self::Intersection(_) => Ok(self
                    .materialise(&KeySet::new(), None, Some(1))
                    .await?
                    .is_empty()),
            }
        }
        .boxed()
    }

    // =========================================================================
    // Type guards
    // =========================================================================

    pub fn kind(&self) -> SetKind {
        match self {
            Self::Empty(_) => SetKind::Empty,
            Self::Concrete(_) => SetKind::Concrete,
            Self::Union(_) => SetKind::Union,
            Self::Intersection(_) => SetKind::Intersection,
            Self::Filter(_) => SetKind::Filter,
            Self::Sort(_) => SetKind::Sort,
            Self::Source(_) => SetKind::Source,
        }
    }

    /// Is this the `Empty` variant? Says nothing about sets that merely
    /// evaluate to nothing; use [`is_empty`](Self::is_empty) for that.
    pub fn is_empty_set(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self, Self::Intersection(_))
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, Self::Filter(_))
    }

    pub fn is_sort(&self) -> bool {
        matches!(self, Self::Sort(_))
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    // =========================================================================
    // Plans
    // =========================================================================

    /// Indented, one-node-per-line rendering of the tree.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        let line = match self {
            Self::Empty(s) => format!("Empty keys={}", s.keys()),
            Self::Concrete(s) => format!("Concrete rows={} keys={}", s.len(), s.keys()),
            Self::Union(s) => format!("Union keys={}", s.keys()),
            Self::Intersection(s) => format!("Intersection keys={}", s.keys()),
            Self::Filter(s) => {
                let preds: Vec<String> = s.filters().iter().map(|e| e.to_string()).collect();
                format!("Filter [{}]", preds.join(", "))
            }
            Self::Sort(s) => {
                let specs: Vec<String> = s
                    .sorts()
                    .iter()
                    .map(|spec| match spec.direction {
                        Direction::Asc => format!("{} ASC", spec.expression),
                        Direction::Desc => format!("{} DESC", spec.expression),
                    })
                    .collect();
                format!("Sort [{}]", specs.join(", "))
            }
            Self::Source(s) => {
                format!("Source name={} keys={}", s.source.name(), s.source.keys())
            }
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&line);
        out.push('\n');
        match self {
            Self::Union(s) => s.parents().iter().for_each(|p| p.explain_into(out, depth + 1)),
            Self::Intersection(s) => s.parents().iter().for_each(|p| p.explain_into(out, depth + 1)),
            Self::Filter(s) => s.parent().explain_into(out, depth + 1),
            Self::Sort(s) => s.parent().explain_into(out, depth + 1),
            _ => {}
        }
    }
}

impl From<ConcreteEventSet> for EventSet {
    fn from(set: ConcreteEventSet) -> Self {
        Self::Concrete(set)
    }
}

impl From<EmptyEventSet> for EventSet {
    fn from(set: EmptyEventSet) -> Self {
        Self::Empty(set)
    }
}
