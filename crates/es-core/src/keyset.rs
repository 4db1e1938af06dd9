//! # KeySets
//!
//! A [`KeySet`] is the schema of an event set: which fields it can report and
//! which kind each one has. It doubles as a *request*: materialising with a
//! keyset asks for exactly those fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ValueKind;

/// Field name → kind. Order is irrelevant; equality compares name/kind pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet {
    keys: BTreeMap<String, ValueKind>,
}

impl KeySet {
    /// The empty keyset: only `id` will be reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.keys.insert(name.into(), kind);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: ValueKind) -> Option<ValueKind> {
        self.keys.insert(name.into(), kind)
    }

    pub fn get(&self, name: &str) -> Option<ValueKind> {
        self.keys.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Right-biased merge: entries of `other` replace same-named entries of `self`.
    pub fn merge(&self, other: &KeySet) -> KeySet {
        let mut keys = self.keys.clone();
        keys.extend(other.keys.iter().map(|(k, v)| (k.clone(), *v)));
        KeySet { keys }
    }
}

impl<S: Into<String>> FromIterator<(S, ValueKind)> for KeySet {
    fn from_iter<I: IntoIterator<Item = (S, ValueKind)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl std::fmt::Display for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, kind)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, kind)?;
        }
        write!(f, "}}")
    }
}
