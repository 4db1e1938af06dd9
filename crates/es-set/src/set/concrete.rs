//! Leaf sets: the empty set and the fully materialised in-memory set.

use std::sync::Arc;

use es_core::{Event, KeySet};

use crate::error::Result;

/// Zero events, for a given keyset.
#[derive(Debug, Clone)]
pub struct EmptyEventSet {
    keys: Arc<KeySet>,
}

impl EmptyEventSet {
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    /// The empty set over the empty keyset.
    pub fn get() -> Self {
        Self::new(KeySet::new())
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys)
    }
}

#[derive(Debug)]
struct ConcreteInner {
    keys: KeySet,
    events: Vec<Event>,
}

/// An ordered sequence of events held in memory.
///
/// Every materialisation resolves to one of these. The events are not
/// checked against the keyset; callers are trusted to pass events that
/// match what they declare.
#[derive(Debug, Clone)]
pub struct ConcreteEventSet {
    inner: Arc<ConcreteInner>,
}

impl ConcreteEventSet {
    pub fn new(keys: KeySet, events: Vec<Event>) -> Self {
        Self {
            inner: Arc::new(ConcreteInner { keys, events }),
        }
    }

    pub fn keys(&self) -> &KeySet {
        &self.inner.keys
    }

    pub fn events(&self) -> &[Event] {
        &self.inner.events
    }

    pub fn len(&self) -> usize {
        self.inner.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.events.is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Project onto `keys`, then keep `[offset, offset + limit)`.
    ///
    /// Returns `self` untouched when the request matches this set's keyset
    /// and asks for no window.
    pub fn project(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        if keys == self.keys() && offset.is_none() && limit.is_none() {
            return Ok(self.clone());
        }
        let projected = self
            .events()
            .iter()
            .map(|e| e.project(keys))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConcreteEventSet::new(
            keys.clone(),
            paginate(projected, offset, limit),
        ))
    }
}

/// Keep `[offset, offset + limit)`; `limit` defaults to everything remaining.
pub(crate) fn paginate(events: Vec<Event>, offset: Option<usize>, limit: Option<usize>) -> Vec<Event> {
    let offset = offset.unwrap_or(0);
    match limit {
        None if offset == 0 => events,
        _ => events
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect(),
    }
}
