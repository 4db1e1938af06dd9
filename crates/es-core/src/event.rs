//! # Events
//!
//! One row of an event set: a mandatory, lineage-stable `id` plus the fields
//! a keyset declares. Events are value snapshots; projection builds new ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{default_for_kind, CoreError, KeySet, Value};

/// Name of the identifier field every event carries.
pub const ID_KEY: &str = "id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique across the whole lineage of a set; drives union/intersection dedup.
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read a field. `id` answers with the identifier itself.
    pub fn get(&self, name: &str) -> Option<Value> {
        if name == ID_KEY {
            return Some(Value::Str(self.id.clone()));
        }
        self.fields.get(name).cloned()
    }

    /// Project onto exactly `keys`.
    ///
    /// Fields not requested are dropped (`id` is always kept). Requested
    /// fields the event lacks are filled with the kind's default, which fails
    /// for `Id`-kind keys.
    pub fn project(&self, keys: &KeySet) -> Result<Event, CoreError> {
        let mut fields = BTreeMap::new();
        for (name, kind) in keys.iter() {
            if name == ID_KEY {
                continue;
            }
            let value = match self.fields.get(name) {
                Some(v) => v.clone(),
                None => default_for_kind(name, kind)?,
            };
            fields.insert(name.to_string(), value);
        }
        Ok(Event {
            id: self.id.clone(),
            fields,
        })
    }
}
