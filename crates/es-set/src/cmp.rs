//! # Comparators
//!
//! Two orderings live here:
//!
//! - [`compare_values`]: what the relational operators (`<`, `>=`, ...) of
//!   the expression algebra see. Partial: absent values and `NaN` compare
//!   with nothing.
//! - [`cmp_from_expr`] / [`cmp_from_sort`]: the total order used to sort
//!   events. Values are ranked first (null, then numeric-like, then
//!   strings) and only compared within a rank.

use std::cmp::Ordering;

use es_core::{Event, Value};
use serde::{Deserialize, Serialize};

use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub expression: Expr,
    pub direction: Direction,
}

pub fn asc(expression: Expr) -> SortSpec {
    SortSpec {
        expression,
        direction: Direction::Asc,
    }
}

pub fn desc(expression: Expr) -> SortSpec {
    SortSpec {
        expression,
        direction: Direction::Desc,
    }
}

// =============================================================================
// Operator semantics
// =============================================================================

/// Strict equality: same value type and same value. `NaN` is unequal to
/// itself; two absent values are equal.
pub fn strict_eq(l: Option<&Value>, r: Option<&Value>) -> bool {
    match (l, r) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[derive(Clone, Copy)]
enum Numeric {
    Float(f64),
    Int(i64),
}

fn to_numeric(v: &Value) -> Numeric {
    match v {
        Value::Null => Numeric::Float(0.0),
        Value::Bool(b) => Numeric::Float(if *b { 1.0 } else { 0.0 }),
        Value::Num(n) => Numeric::Float(*n),
        Value::BigInt(i) => Numeric::Int(*i),
        Value::Str(s) => {
            let t = s.trim();
            if t.is_empty() {
                Numeric::Float(0.0)
            } else {
                Numeric::Float(t.parse().unwrap_or(f64::NAN))
            }
        }
    }
}

/// Exact comparison of an integer against a float.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    // 2^63: every i64 is strictly inside (-2^63 - 1, 2^63).
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    match (i as i128).cmp(&(floor as i128)) {
        Ordering::Equal if f > floor => Some(Ordering::Less),
        o => Some(o),
    }
}

fn cmp_numeric(l: Numeric, r: Numeric) -> Option<Ordering> {
    match (l, r) {
        (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(&b)),
        (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(&b),
        (Numeric::Int(a), Numeric::Float(b)) => cmp_int_float(a, b),
        (Numeric::Float(a), Numeric::Int(b)) => cmp_int_float(b, a).map(Ordering::reverse),
    }
}

/// Code-unit order, so strings sort the way a browser engine sorts them.
fn cmp_str(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Relational comparison. Two strings compare as text; anything else
/// compares numerically (null as 0, booleans as 0/1, numeric strings parsed).
/// `None` when either side is absent or the comparison involves `NaN`.
pub fn compare_values(l: Option<&Value>, r: Option<&Value>) -> Option<Ordering> {
    match (l?, r?) {
        (Value::Str(a), Value::Str(b)) => Some(cmp_str(a, b)),
        (a, b) => cmp_numeric(to_numeric(a), to_numeric(b)),
    }
}

// =============================================================================
// Sort order
// =============================================================================

/// Rank tier of a value: nulls, then numbers/bigints/booleans (and absent
/// values), then strings.
pub fn rank_of(v: Option<&Value>) -> u8 {
    match v {
        Some(Value::Null) => 0,
        Some(Value::Str(_)) => 2,
        _ => 1,
    }
}

/// Total order over two values of any kind.
///
/// Inside the numeric tier `0 == false`, `1 == true` and `0n == 0`. Values
/// that do not compare numerically (absent or `NaN`) sort after every
/// number and tie with each other, which keeps the order total.
pub fn sort_cmp(l: Option<&Value>, r: Option<&Value>) -> Ordering {
    let (lr, rr) = (rank_of(l), rank_of(r));
    if lr != rr {
        return lr.cmp(&rr);
    }
    match (l, r) {
        (Some(Value::Str(a)), Some(Value::Str(b))) => cmp_str(a, b),
        (Some(Value::Null), Some(Value::Null)) => Ordering::Equal,
        _ => {
            let key = |v: Option<&Value>| {
                v.map(to_numeric).filter(|n| !matches!(n, Numeric::Float(f) if f.is_nan()))
            };
            match (key(l), key(r)) {
                (Some(a), Some(b)) => cmp_numeric(a, b).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }
}

/// Ascending comparator over events keyed by `expr`.
pub fn cmp_from_expr(expr: &Expr) -> impl Fn(&Event, &Event) -> Ordering + '_ {
    move |l, r| sort_cmp(expr.execute(l).as_ref(), expr.execute(r).as_ref())
}

/// Comparator for one sort key. Descending swaps the arguments rather than
/// negating the result.
pub fn cmp_from_sort(sort: &SortSpec) -> impl Fn(&Event, &Event) -> Ordering + '_ {
    let cmp = cmp_from_expr(&sort.expression);
    move |l, r| match sort.direction {
        Direction::Asc => cmp(l, r),
        Direction::Desc => cmp(r, l),
    }
}
