//! # Output
//!
//! Renders query results and set summaries as tables or JSON.

use std::collections::BTreeSet;

use es_core::{Event, KeySet, ID_KEY};
use es_set::query::QueryResult;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// One line of `es schema`.
#[derive(Debug, Tabled)]
pub struct SchemaRow {
    #[tabled(rename = "Set")]
    pub set: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[tabled(rename = "Keys")]
    pub keys: KeySet,
}

/// `id` first, then every field any returned event carries.
fn columns(events: &[Event]) -> Vec<String> {
    let fields: BTreeSet<&str> = events
        .iter()
        .flat_map(|e| e.fields.keys().map(String::as_str))
        .collect();
    std::iter::once(ID_KEY)
        .chain(fields)
        .map(str::to_string)
        .collect()
}

pub fn result_table(result: &QueryResult) -> String {
    let columns = columns(&result.events);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for event in &result.events {
        builder.push_record(columns.iter().map(|c| {
            event
                .get(c)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
    }
    let mut table = builder.build();
    table.with(Style::psql());
    format!(
        "{}\n({} of {} events from {} in {} ms)",
        table,
        result.events.len(),
        result.total,
        result.sets_searched.join(", "),
        result.query_time_ms
    )
}

pub fn result_json(result: &QueryResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn schema_table(rows: Vec<SchemaRow>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_core::{Value, ValueKind};

    fn result() -> QueryResult {
        QueryResult {
            events: vec![
                Event::new("a").with("num", 97.0).with("char", "a"),
                Event::new("d").with("num", 100.0).with("extra", Value::Null),
            ],
            total: 3,
            query_time_ms: 1,
            sets_searched: vec!["trace_a".into(), "trace_b".into()],
        }
    }

    #[test]
    fn test_columns() {
        assert_eq!(columns(&result().events), vec!["id", "char", "extra", "num"]);
        assert_eq!(columns(&[]), vec!["id"]);
    }

    #[test]
    fn test_result_table() {
        let out = result_table(&result());
        assert!(out.contains("id"));
        assert!(out.contains("97"));
        assert!(out.contains("null"));
        assert!(out.ends_with("(2 of 3 events from trace_a, trace_b in 1 ms)"));
    }

    #[test]
    fn test_result_json() {
        let out = result_json(&result()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total"], 3);
        assert_eq!(parsed["events"][1]["id"], "d");
        assert_eq!(parsed["events"][0]["num"], 97.0);
    }

    #[test]
    fn test_schema_table() {
        let out = schema_table(vec![SchemaRow {
            set: "trace_a".into(),
            rows: 3,
            keys: KeySet::new().with("num", ValueKind::Num),
        }]);
        assert!(out.contains("trace_a"));
        assert!(out.contains("{num: num}"));
    }
}
