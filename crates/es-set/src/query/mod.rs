//! # Query DSL
//!
//! A small SQL-like language for building event set trees over a catalog
//! of named sets, then materialising one page of the result.
//!
//! ```text
//! SELECT num, char FROM a, b INTERSECT c WHERE num >= 97 AND char != "b" ORDER BY num DESC LIMIT 10 OFFSET 2
//! ```

pub mod executor;
pub mod parser;

use std::collections::BTreeMap;

use es_core::Event;
use serde::{Deserialize, Serialize};

use crate::cmp::SortSpec;
use crate::expr::Expr;
use crate::EventSet;

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Projected fields (`None` = `*`).
    pub select: Option<Vec<String>>,
    /// Sets to union, in order.
    pub from: Vec<String>,
    /// Sets to intersect the union with, in order.
    pub intersect: Vec<String>,
    /// Combined WHERE predicate.
    pub filter: Option<Expr>,
    /// Sort keys by priority: the first one is dominant.
    pub order_by: Vec<SortSpec>,
    /// Result limit (`None` = configured default).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: usize,
}

/// Query execution result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub events: Vec<Event>,
    /// Matching events before pagination.
    pub total: usize,
    pub query_time_ms: u64,
    pub sets_searched: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("cannot parse query: {0}")]
    Parse(String),
    #[error("unknown event set '{0}'")]
    UnknownSet(String),
    #[error(transparent)]
    EventSet(#[from] crate::Error),
}

/// Named event sets a query can refer to.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sets: BTreeMap<String, EventSet>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, set: EventSet) {
        self.sets.insert(name.into(), set);
    }

    pub fn get(&self, name: &str) -> Option<&EventSet> {
        self.sets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventSet)> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
