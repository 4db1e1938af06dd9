//! # Event Sources
//!
//! The seam where event sets meet whatever actually holds the data: a
//! query engine, a live buffer, a remote service. Anything implementing
//! [`EventSource`] can be wrapped with [`EventSet::from_source`] and then
//! filtered, sorted and combined like any other set.
//!
//! [`EventSet::from_source`]: crate::EventSet::from_source

use std::collections::VecDeque;

use es_core::{Event, KeySet};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::set::ConcreteEventSet;

/// A backing store that can answer materialisation requests.
///
/// Implementations must honour the same contract as every event set:
/// project onto exactly `keys` (defaulting missing fields, never an `Id`),
/// then keep `[offset, offset + limit)`.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Human-readable name, used in plans and logs.
    fn name(&self) -> &str;

    /// Fields this source can report.
    fn keys(&self) -> &KeySet;

    async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet>;

    /// Number of events. Override when the backing store can count cheaply.
    async fn count(&self) -> Result<usize> {
        Ok(self.materialise(&KeySet::new(), None, None).await?.len())
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.materialise(&KeySet::new(), None, Some(1)).await?.is_empty())
    }
}

/// A bounded, appendable in-memory source.
///
/// Once `capacity` events are held, each push evicts the oldest one.
/// Materialisation takes a snapshot under a read lock, so concurrent
/// readers see a consistent prefix of the pushes.
pub struct BufferedSource {
    name: String,
    keys: KeySet,
    buffer: RwLock<VecDeque<Event>>,
    capacity: usize,
}

impl BufferedSource {
    pub fn new(name: impl Into<String>, keys: KeySet, capacity: usize) -> Self {
        Self {
            name: name.into(),
            keys,
            buffer: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn push(&self, event: Event) {
        let mut buf = self.buffer.write().await;
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(event);
    }

    pub async fn extend(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.push(event).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.len()
    }
}

#[async_trait::async_trait]
impl EventSource for BufferedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self) -> &KeySet {
        &self.keys
    }

    async fn materialise(
        &self,
        keys: &KeySet,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ConcreteEventSet> {
        let snapshot: Vec<Event> = self.buffer.read().await.iter().cloned().collect();
        tracing::debug!(source = %self.name, rows = snapshot.len(), "materialising buffered source");
        ConcreteEventSet::new(self.keys.clone(), snapshot).project(keys, offset, limit)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len().await)
    }
}
