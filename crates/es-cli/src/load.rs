//! # Loading
//!
//! Each data file is a JSON array of flat objects with an `id`. A file
//! becomes one concrete set named after its file stem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use es_core::{Event, KeySet, Value, ValueKind, ID_KEY};
use es_set::EventSet;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a JSON array of objects: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("row {row} of set '{set}' has no usable id")]
    MissingId { set: String, row: usize },
    #[error("field '{field}' of event '{id}' in set '{set}' is not a flat value")]
    Nested { set: String, id: String, field: String },
    #[error("field '{field}' of event '{id}' in set '{set}' is not a {kind}")]
    Kind {
        set: String,
        id: String,
        field: String,
        kind: ValueKind,
    },
}

type Row = serde_json::Map<String, serde_json::Value>;

/// Load one file as a set named after its stem.
pub fn load_set(
    path: &Path,
    schema_for: impl Fn(&str) -> Option<BTreeMap<String, ValueKind>>,
) -> Result<(String, EventSet), LoadError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<Row> = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let count = rows.len();
    let set = build_set(&name, rows, schema_for(&name).as_ref())?;
    tracing::info!(set = %name, rows = count, path = %path.display(), "loaded event set");
    Ok((name, set))
}

/// Build a concrete set from parsed rows. Declared kinds win; every other
/// field takes the kind of its first non-null value.
pub fn build_set(
    name: &str,
    rows: Vec<Row>,
    schema: Option<&BTreeMap<String, ValueKind>>,
) -> Result<EventSet, LoadError> {
    let mut events = Vec::with_capacity(rows.len());
    for (index, mut row) in rows.into_iter().enumerate() {
        let id = match row.remove(ID_KEY) {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(LoadError::MissingId {
                    set: name.to_string(),
                    row: index,
                })
            }
        };
        let mut event = Event::new(id);
        for (field, json) in row {
            let value = to_value(json).ok_or_else(|| LoadError::Nested {
                set: name.to_string(),
                id: event.id.clone(),
                field: field.clone(),
            })?;
            event.fields.insert(field, value);
        }
        events.push(event);
    }

    let keys = infer_keys(&events, schema);
    for event in &mut events {
        for (field, value) in event.fields.iter_mut() {
            let kind = keys.get(field).unwrap_or(ValueKind::Null);
            *value = std::mem::replace(value, Value::Null)
                .coerce(kind)
                .ok_or_else(|| LoadError::Kind {
                    set: name.to_string(),
                    id: event.id.clone(),
                    field: field.clone(),
                    kind,
                })?;
        }
    }

    Ok(EventSet::concrete(keys, events))
}

fn to_value(json: serde_json::Value) -> Option<Value> {
    Some(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::BigInt(i),
            None => Value::Num(n.as_f64()?),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => return None,
    })
}

fn infer_keys(events: &[Event], schema: Option<&BTreeMap<String, ValueKind>>) -> KeySet {
    let mut keys = KeySet::new();
    for event in events {
        for (field, value) in &event.fields {
            let inferred = match value {
                Value::Null => ValueKind::Null,
                Value::BigInt(_) | Value::Num(_) => ValueKind::Num,
                Value::Str(_) => ValueKind::Str,
                Value::Bool(_) => ValueKind::Bool,
            };
            match keys.get(field) {
                None => {
                    keys.insert(field.clone(), inferred);
                }
                Some(ValueKind::Null) if inferred != ValueKind::Null => {
                    keys.insert(field.clone(), inferred);
                }
                Some(_) => {}
            }
        }
    }
    if let Some(schema) = schema {
        for (field, kind) in schema {
            keys.insert(field.clone(), *kind);
        }
    }
    keys
}
