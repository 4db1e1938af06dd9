//! Composite sets. Each one wraps its inputs without evaluating them and
//! does the obvious in-memory work once materialised: hence "naive".

use std::collections::HashSet;
use std::sync::Arc;

use es_core::{Event, KeySet};
use futures::future::try_join_all;

use super::concrete::{paginate, ConcreteEventSet};
use super::EventSet;
use crate::cmp::{cmp_from_sort, SortSpec};
use crate::error::Result;
use crate::expr::{free_variables, truthy, Expr};

#[derive(Debug)]
struct ListInner {
    keys: KeySet,
    parents: Vec<EventSet>,
}

impl ListInner {
    fn new(parents: Vec<EventSet>) -> Self {
        let keys = parents
            .iter()
            .fold(KeySet::new(), |acc, p| acc.merge(p.keys()));
        Self { keys, parents }
    }
}

/// Keep the first event seen for each id, in iteration order.
pub(crate) fn dedup_by_id<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for event in events {
        if seen.insert(event.id.as_str()) {
            out.push(event.clone());
        }
    }
    out
}

// =============================================================================
// Union
// =============================================================================

/// N-ary union, deduplicated by id. The keyset is the right-biased merge of
/// the parents' keysets.
#[derive(Debug, Clone)]
pub struct UnionEventSet {
    inner: Arc<ListInner>,
}

impl UnionEventSet {
    pub fn new(parents: Vec<EventSet>) -> Self {
        Self {
            inner: Arc::new(ListInner::new(parents)),
        }
    }

    pub fn keys(&self) -> &KeySet {
        &self.inner.keys
    }

    pub fn parents(&self) -> &[EventSet] {
        &self.inner.parents
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Every parent is asked for exactly `keys`, concurrently. The combined
    /// order follows the parent list, whatever order the parents finish in.
    pub(crate) async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        let parts = try_join_all(self.parents().iter().map(|p| p.materialise(keys, None, None))).await?;
        let events = dedup_by_id(parts.iter().flat_map(|p| p.events()));
        tracing::debug!(
            parents = parts.len(),
            rows = events.len(),
            "materialised union"
        );
        Ok(ConcreteEventSet::new(
            keys.clone(),
            paginate(events, offset, limit),
        ))
    }
}

// =============================================================================
// Intersection
// =============================================================================

/// N-ary intersection by id. Field values come from the *last* parent only;
/// the others just vote on membership.
#[derive(Debug, Clone)]
pub struct IntersectionEventSet {
    inner: Arc<ListInner>,
}

impl IntersectionEventSet {
    pub fn new(parents: Vec<EventSet>) -> Self {
        Self {
            inner: Arc::new(ListInner::new(parents)),
        }
    }

    pub fn keys(&self) -> &KeySet {
        &self.inner.keys
    }

    pub fn parents(&self) -> &[EventSet] {
        &self.inner.parents
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        let Some((primary, rest)) = self.parents().split_last() else {
            return Ok(ConcreteEventSet::new(keys.clone(), Vec::new()));
        };
        let ids_only = KeySet::new();
        let (primary, others) = futures::try_join!(
            primary.materialise(keys, None, None),
            try_join_all(rest.iter().map(|p| p.materialise(&ids_only, None, None))),
        )?;

        let mut surviving: Option<HashSet<&str>> = None;
        for other in &others {
            let ids: HashSet<&str> = other.events().iter().map(|e| e.id.as_str()).collect();
            surviving = Some(match surviving {
                None => ids,
                Some(prev) => prev.intersection(&ids).copied().collect(),
            });
        }

        let events: Vec<Event> = primary
            .events()
            .iter()
            .filter(|e| surviving.as_ref().map_or(true, |s| s.contains(e.id.as_str())))
            .cloned()
            .collect();
        tracing::debug!(
            parents = self.parents().len(),
            rows = events.len(),
            "materialised intersection"
        );
        Ok(ConcreteEventSet::new(
            keys.clone(),
            paginate(events, offset, limit),
        ))
    }
}

// =============================================================================
// Filter
// =============================================================================

#[derive(Debug)]
struct FilterInner {
    parent: EventSet,
    filters: Vec<Expr>,
}

/// Keeps the parent's events for which every filter is truthy.
#[derive(Debug, Clone)]
pub struct FilterEventSet {
    inner: Arc<FilterInner>,
}

impl FilterEventSet {
    pub fn new(parent: EventSet, filters: Vec<Expr>) -> Self {
        Self {
            inner: Arc::new(FilterInner { parent, filters }),
        }
    }

    pub fn keys(&self) -> &KeySet {
        self.inner.parent.keys()
    }

    pub fn parent(&self) -> &EventSet {
        &self.inner.parent
    }

    pub fn filters(&self) -> &[Expr] {
        &self.inner.filters
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn matches(&self, event: &Event) -> bool {
        self.filters()
            .iter()
            .all(|f| truthy(f.execute(event).as_ref()))
    }

    /// Fetch the parent with the filters' fields on top of the request, so
    /// predicates see what they read even when the caller did not ask for it.
    pub(crate) async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        let needed = free_variables(self.filters()).merge(keys);
        let parent = self.parent().materialise(&needed, None, None).await?;
        let survivors: Vec<Event> = parent
            .events()
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect();
        tracing::debug!(
            input = parent.len(),
            rows = survivors.len(),
            "materialised filter"
        );
        ConcreteEventSet::new(needed, survivors).project(keys, offset, limit)
    }

    /// Counting only needs the filters' own fields.
    pub(crate) async fn count(&self) -> Result<usize> {
        let needed = free_variables(self.filters());
        let parent = self.parent().materialise(&needed, None, None).await?;
        Ok(parent.events().iter().filter(|e| self.matches(e)).count())
    }

    pub(crate) async fn is_empty(&self) -> Result<bool> {
        let needed = free_variables(self.filters());
        let parent = self.parent().materialise(&needed, None, None).await?;
        Ok(!parent.events().iter().any(|e| self.matches(e)))
    }
}

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug)]
struct SortInner {
    parent: EventSet,
    sorts: Vec<SortSpec>,
}

/// Orders the parent's events. Specs are applied in list order with a
/// stable sort, so the last spec is the dominant key.
#[derive(Debug, Clone)]
pub struct SortEventSet {
    inner: Arc<SortInner>,
}

impl SortEventSet {
    pub fn new(parent: EventSet, sorts: Vec<SortSpec>) -> Self {
        Self {
            inner: Arc::new(SortInner { parent, sorts }),
        }
    }

    pub fn keys(&self) -> &KeySet {
        self.inner.parent.keys()
    }

    pub fn parent(&self) -> &EventSet {
        &self.inner.parent
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.inner.sorts
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        let needed = free_variables(self.sorts().iter().map(|s| &s.expression)).merge(keys);
        let parent = self.parent().materialise(&needed, None, None).await?;
        let mut events = parent.events().to_vec();
        for sort in self.sorts() {
            events.sort_by(cmp_from_sort(sort));
        }
        tracing::debug!(rows = events.len(), keys = self.sorts().len(), "materialised sort");
        ConcreteEventSet::new(needed, events).project(keys, offset, limit)
    }
}
