//! # Query Executor
//!
//! Turns a parsed [`Query`] into an event set tree over a [`Catalog`] and
//! materialises one page of it.

use std::time::Instant;

use es_core::{KeySet, Value, ValueKind};

use super::{Catalog, Query, QueryError, QueryResult};
use crate::expr::Expr;
use crate::EventSet;

/// The optimised tree for a query plus the keyset it will be projected onto.
#[derive(Debug, Clone)]
pub struct Plan {
    pub set: EventSet,
    pub keys: KeySet,
}

/// Build the tree without evaluating anything.
pub fn plan(query: &Query, catalog: &Catalog) -> Result<Plan, QueryError> {
    let lookup = |name: &String| {
        catalog
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownSet(name.clone()))
    };

    let mut names = query.from.iter();
    let first = names
        .next()
        .ok_or_else(|| QueryError::Parse("FROM names no event sets".into()))?;
    let mut set = lookup(first)?;
    for name in names {
        set = set.union(&lookup(name)?);
    }
    for name in &query.intersect {
        set = set.intersect(&lookup(name)?);
    }

    if let Some(filter) = &query.filter {
        set = set.filter([bind_literals(filter, set.keys())]);
    }

    if !query.order_by.is_empty() {
        // `sort` treats its last spec as dominant; ORDER BY lists the dominant key first.
        set = set.sort(query.order_by.iter().rev().cloned());
    }

    let keys = match &query.select {
        None => set.keys().clone(),
        Some(fields) => fields
            .iter()
            .map(|f| (f.clone(), set.keys().get(f).unwrap_or(ValueKind::Null)))
            .collect(),
    };

    Ok(Plan { set, keys })
}

/// Execute a query against the catalog.
pub async fn execute(
    query: &Query,
    catalog: &Catalog,
    default_limit: usize,
) -> Result<QueryResult, QueryError> {
    let start = Instant::now();
    let Plan { set, keys } = plan(query, catalog)?;

    let total = set.count().await?;
    let page = set
        .materialise(&keys, Some(query.offset), Some(query.limit.unwrap_or(default_limit)))
        .await?;

    tracing::debug!(
        total,
        returned = page.len(),
        plan = %set.kind(),
        "executed query"
    );

    Ok(QueryResult {
        events: page.events().to_vec(),
        total,
        query_time_ms: start.elapsed().as_millis() as u64,
        sets_searched: query
            .from
            .iter()
            .chain(query.intersect.iter())
            .cloned()
            .collect(),
    })
}

/// Integer literals compared against a field are `bigint` only when the
/// field is declared `bigint`; everywhere else they are plain numbers.
fn bind_literals(expr: &Expr, keys: &KeySet) -> Expr {
    match expr {
        Expr::BinOp { op, lhs, rhs } => {
            let field_kind = |e: &Expr| match e {
                Expr::Var { name } => keys.get(name),
                _ => None,
            };
            let rebind = |side: &Expr, other_kind: Option<ValueKind>| match side {
                Expr::Constant {
                    value: Value::BigInt(i),
                } if other_kind != Some(ValueKind::BigInt) => Expr::Constant {
                    value: Value::Num(*i as f64),
                },
                _ => bind_literals(side, keys),
            };
            Expr::BinOp {
                op: *op,
                lhs: Box::new(rebind(lhs, field_kind(rhs))),
                rhs: Box::new(rebind(rhs, field_kind(lhs))),
            }
        }
        Expr::Constant {
            value: Value::BigInt(i),
        } => Expr::Constant {
            value: Value::Num(*i as f64),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse;
    use es_core::Event;

    fn catalog() -> Catalog {
        let keys = KeySet::new()
            .with("num", ValueKind::Num)
            .with("char", ValueKind::Str)
            .with("seq", ValueKind::BigInt);
        let ev = |id: &str, num: f64, seq: i64| {
            Event::new(id).with("num", num).with("char", id).with("seq", seq)
        };
        let mut catalog = Catalog::new();
        catalog.insert(
            "a",
            EventSet::concrete(keys.clone(), vec![ev("a", 97.0, 1), ev("b", 98.0, 2)]),
        );
        catalog.insert(
            "b",
            EventSet::concrete(keys.clone(), vec![ev("b", 98.0, 2), ev("d", 100.0, 4)]),
        );
        catalog.insert(
            "c",
            EventSet::concrete(keys, vec![ev("d", 100.0, 4), ev("b", 98.0, 2), ev("z", 0.0, 9)]),
        );
        catalog
    }

    fn ids(result: &QueryResult) -> Vec<&str> {
        result.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_union_filter_order() {
        let q = parse("SELECT num FROM a, b WHERE num >= 98 ORDER BY num DESC").unwrap();
        let result = execute(&q, &catalog(), 100).await.unwrap();
        assert_eq!(ids(&result), vec!["d", "b"]);
        assert_eq!(result.total, 2);
        assert_eq!(result.sets_searched, vec!["a", "b"]);
        assert_eq!(result.events[0].get("num"), Some(Value::Num(100.0)));
        assert_eq!(result.events[0].get("char"), None);
    }

    #[tokio::test]
    async fn test_bigint_literals_bind_to_declared_kind() {
        let q = parse("FROM a, b WHERE seq = 2").unwrap();
        let result = execute(&q, &catalog(), 100).await.unwrap();
        assert_eq!(ids(&result), vec!["b"]);

        let q = parse("FROM a, b WHERE num = 100").unwrap();
        let result = execute(&q, &catalog(), 100).await.unwrap();
        assert_eq!(ids(&result), vec!["d"]);
    }

    #[tokio::test]
    async fn test_intersect_and_pagination() {
        let q = parse("FROM a, b INTERSECT c LIMIT 1 OFFSET 1").unwrap();
        let result = execute(&q, &catalog(), 100).await.unwrap();
        // Row order follows the intersected set, the last one listed.
        assert_eq!(ids(&result), vec!["b"]);
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn test_first_order_key_dominates() {
        let q = parse("FROM a, b, c ORDER BY char DESC, num").unwrap();
        let result = execute(&q, &catalog(), 2).await.unwrap();
        assert_eq!(ids(&result), vec!["z", "d"]);
        assert_eq!(result.total, 4);
    }

    #[tokio::test]
    async fn test_unknown_set() {
        let q = parse("FROM a, nope").unwrap();
        let err = execute(&q, &catalog(), 10).await.unwrap_err();
        assert!(matches!(err, QueryError::UnknownSet(ref name) if name == "nope"));
    }

    #[test]
    fn test_plan_is_lazy_and_optimised() {
        let q = parse("FROM a, b").unwrap();
        let plan = plan(&q, &catalog()).unwrap();
        // Two concrete sets merge at build time.
        assert!(plan.set.is_concrete());

        let q = parse("SELECT num, missing FROM a WHERE num > 0").unwrap();
        let plan = super::plan(&q, &catalog()).unwrap();
        assert!(plan.set.is_filter());
        assert_eq!(
            plan.keys,
            KeySet::new()
                .with("num", ValueKind::Num)
                .with("missing", ValueKind::Null)
        );
    }
}
