//! # Query DSL Parser
//!
//! Parses a query string into a structured [`Query`].
//!
//! Syntax:
//! ```text
//! SELECT * FROM set1, set2 INTERSECT set3 WHERE field > 100 AND other = "value" OR flag = true
//!     ORDER BY field DESC, other LIMIT 100 OFFSET 10
//! ```
//!
//! `AND` binds tighter than `OR`. Literals are quoted strings, integers,
//! floats, `true`, `false` and `null`; a bare word on the right-hand side
//! names another field. Keywords and operators inside a quoted literal
//! are part of the literal.

use es_core::Value;

use super::{Query, QueryError};
use crate::cmp::{Direction, SortSpec};
use crate::expr::{self, BinOp, Expr};

const KEYWORDS: [&str; 7] = [
    "SELECT ", "FROM ", "INTERSECT ", "WHERE ", "ORDER BY ", "LIMIT ", "OFFSET ",
];

/// Parse a raw query string into a [`Query`] struct.
pub fn parse(input: &str) -> Result<Query, QueryError> {
    let input = input.trim();

    let mut query = Query {
        select: None,
        from: Vec::new(),
        intersect: Vec::new(),
        filter: None,
        order_by: Vec::new(),
        limit: None,
        offset: 0,
    };

    if let Some(select) = clause(input, "SELECT ") {
        if select != "*" {
            query.select = Some(split_list(select));
        }
    }

    match clause(input, "FROM ") {
        Some(from) => query.from = split_list(from),
        None => return Err(QueryError::Parse("missing FROM clause".into())),
    }
    if query.from.is_empty() {
        return Err(QueryError::Parse("FROM names no event sets".into()));
    }

    if let Some(intersect) = clause(input, "INTERSECT ") {
        query.intersect = split_list(intersect);
    }

    if let Some(filter) = clause(input, "WHERE ") {
        query.filter = Some(parse_filter(filter)?);
    }

    if let Some(order) = clause(input, "ORDER BY ") {
        query.order_by = parse_order(order)?;
    }

    if let Some(limit) = clause(input, "LIMIT ") {
        let n = limit
            .parse::<usize>()
            .map_err(|_| QueryError::Parse(format!("invalid LIMIT: '{}'", limit)))?;
        query.limit = Some(n);
    }

    if let Some(offset) = clause(input, "OFFSET ") {
        query.offset = offset
            .parse::<usize>()
            .map_err(|_| QueryError::Parse(format!("invalid OFFSET: '{}'", offset)))?;
    }

    Ok(query)
}

/// Text following `keyword`, up to the next keyword.
fn clause<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let pos = find_keyword(input, keyword)?;
    let after = &input[pos + keyword.len()..];
    let end = find_keyword_pos(after);
    Some(after[..end].trim())
}

fn find_keyword_pos(s: &str) -> usize {
    KEYWORDS
        .iter()
        .filter_map(|kw| find_keyword(s, kw))
        .min()
        .unwrap_or(s.len())
}

/// Like [`find_ci`], but only at the start of a word, so `nowhere` never
/// matches `WHERE`.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let hay = s.as_bytes();
    let quoted = quoted_bytes(s);
    find_ci_from(s, keyword, |i| {
        !quoted[i] && (i == 0 || hay[i - 1].is_ascii_whitespace())
    })
}

/// Case-insensitive search for an ASCII pattern outside quoted literals.
/// Returns a byte offset into `s`.
fn find_ci(s: &str, pattern: &str) -> Option<usize> {
    let quoted = quoted_bytes(s);
    find_ci_from(s, pattern, |i| !quoted[i])
}

fn find_ci_from(s: &str, pattern: &str, accept: impl Fn(usize) -> bool) -> Option<usize> {
    let hay = s.as_bytes();
    let pat = pattern.as_bytes();
    if pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len())
        .find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat) && accept(i))
}

/// Marks every byte inside a `'...'` or `"..."` literal, quotes included.
/// An unterminated quote runs to the end of `s`.
fn quoted_bytes(s: &str) -> Vec<bool> {
    let mut open: Option<u8> = None;
    s.bytes()
        .map(|b| match open {
            Some(q) => {
                if b == q {
                    open = None;
                }
                true
            }
            None if b == b'"' || b == b'\'' => {
                open = Some(b);
                true
            }
            None => false,
        })
        .collect()
}

fn is_ident(s: &str) -> bool {
    s.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split on a case-insensitive separator such as `" AND "`.
fn split_ci<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(pos) = find_ci(rest, separator) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + separator.len()..];
    }
    parts.push(rest);
    parts
}

fn parse_filter(s: &str) -> Result<Expr, QueryError> {
    let mut disjuncts = Vec::new();
    for branch in split_ci(s, " OR ") {
        let mut conjuncts = Vec::new();
        for part in split_ci(branch, " AND ") {
            let part = part.trim();
            if part.is_empty() {
                return Err(QueryError::Parse(format!("empty condition in '{}'", s)));
            }
            conjuncts.push(parse_condition(part)?);
        }
        disjuncts.push(fold(conjuncts, expr::and));
    }
    Ok(fold(disjuncts, expr::or))
}

/// Left fold of a non-empty list.
fn fold(mut exprs: Vec<Expr>, combine: fn(Expr, Expr) -> Expr) -> Expr {
    let first = exprs.remove(0);
    exprs.into_iter().fold(first, combine)
}

fn parse_condition(part: &str) -> Result<Expr, QueryError> {
    // Try operators in order of specificity
    let (field, op, value) = if let Some(pos) = find_ci(part, ">=") {
        (&part[..pos], BinOp::Ge, &part[pos + 2..])
    } else if let Some(pos) = find_ci(part, "<=") {
        (&part[..pos], BinOp::Le, &part[pos + 2..])
    } else if let Some(pos) = find_ci(part, "!=") {
        (&part[..pos], BinOp::Ne, &part[pos + 2..])
    } else if let Some(pos) = find_ci(part, ">") {
        (&part[..pos], BinOp::Gt, &part[pos + 1..])
    } else if let Some(pos) = find_ci(part, "<") {
        (&part[..pos], BinOp::Lt, &part[pos + 1..])
    } else if let Some(pos) = find_ci(part, "=") {
        (&part[..pos], BinOp::Eq, &part[pos + 1..])
    } else {
        return Err(QueryError::Parse(format!("cannot parse condition: '{}'", part)));
    };

    let field = field.trim();
    if field.is_empty() {
        return Err(QueryError::Parse(format!("missing field in '{}'", part)));
    }
    let rhs = parse_operand(value.trim())?;
    Ok(Expr::BinOp {
        op,
        lhs: Box::new(expr::v(field)),
        rhs: Box::new(rhs),
    })
}

fn parse_operand(s: &str) -> Result<Expr, QueryError> {
    if s.is_empty() {
        return Err(QueryError::Parse("missing value".into()));
    }
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted {
        return Ok(expr::c(&s[1..s.len() - 1]));
    }
    Ok(match s {
        "true" | "TRUE" => expr::c(true),
        "false" | "FALSE" => expr::c(false),
        "null" | "NULL" => expr::null(),
        _ => match parse_value(s) {
            Some(value) => value,
            None if is_ident(s) => expr::v(s),
            None => return Err(QueryError::Parse(format!("cannot parse value: '{}'", s))),
        },
    })
}

fn parse_value(s: &str) -> Option<Expr> {
    if let Ok(n) = s.parse::<i64>() {
        Some(expr::c(Value::BigInt(n)))
    } else if let Ok(n) = s.parse::<f64>() {
        Some(expr::c(n))
    } else {
        None
    }
}

fn parse_order(s: &str) -> Result<Vec<SortSpec>, QueryError> {
    split_list(s)
        .into_iter()
        .map(|item| {
            let mut words = item.split_whitespace();
            let field = words
                .next()
                .ok_or_else(|| QueryError::Parse("empty ORDER BY key".into()))?;
            let direction = match words.next().map(|w| w.to_ascii_uppercase()).as_deref() {
                None | Some("ASC") => Direction::Asc,
                Some("DESC") => Direction::Desc,
                Some(other) => {
                    return Err(QueryError::Parse(format!(
                        "unknown sort direction '{}'",
                        other
                    )))
                }
            };
            if words.next().is_some() {
                return Err(QueryError::Parse(format!("cannot parse ORDER BY key '{}'", item)));
            }
            Ok(SortSpec {
                expression: expr::v(field),
                direction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{and, c, eq, ge, gt, ne, or, v};

    #[test]
    fn test_simple_query() {
        let q = parse("SELECT * FROM slices WHERE dur > 100 LIMIT 50").unwrap();
        assert_eq!(q.from, vec!["slices"]);
        assert_eq!(q.select, None);
        assert_eq!(q.filter, Some(gt(v("dur"), c(Value::BigInt(100)))));
        assert_eq!(q.limit, Some(50));
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn test_multi_set_query() {
        let q = parse("select id, name from a, b intersect c offset 5").unwrap();
        assert_eq!(q.from, vec!["a", "b"]);
        assert_eq!(q.intersect, vec!["c"]);
        assert_eq!(q.select, Some(vec!["id".to_string(), "name".to_string()]));
        assert_eq!(q.offset, 5);
        assert_eq!(q.limit, None);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let q = parse("FROM e WHERE a >= 1.5 AND b != \"x\" OR flag = true").unwrap();
        assert_eq!(
            q.filter,
            Some(or(
                and(ge(v("a"), c(1.5)), ne(v("b"), c("x"))),
                eq(v("flag"), c(true))
            ))
        );
    }

    #[test]
    fn test_field_to_field_comparison() {
        let q = parse("FROM e WHERE start = end").unwrap();
        assert_eq!(q.filter, Some(eq(v("start"), v("end"))));
    }

    #[test]
    fn test_quoted_number_stays_text() {
        let q = parse("FROM e WHERE name = '100'").unwrap();
        assert_eq!(q.filter, Some(eq(v("name"), c("100"))));
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let q = parse("FROM nowhere WHERE x = 1").unwrap();
        assert_eq!(q.from, vec!["nowhere"]);
        assert!(q.filter.is_some());
    }

    #[test]
    fn test_operators_inside_quotes_are_text() {
        let q = parse("FROM e WHERE char = \"a>b\"").unwrap();
        assert_eq!(q.filter, Some(eq(v("char"), c("a>b"))));

        let q = parse("FROM e WHERE tag != '<=' AND n >= 1").unwrap();
        assert_eq!(
            q.filter,
            Some(and(ne(v("tag"), c("<=")), ge(v("n"), c(Value::BigInt(1)))))
        );
    }

    #[test]
    fn test_keywords_inside_quotes_are_text() {
        let q = parse("FROM e WHERE name = 'x OR y' AND n >= 1").unwrap();
        assert_eq!(
            q.filter,
            Some(and(eq(v("name"), c("x OR y")), ge(v("n"), c(Value::BigInt(1)))))
        );

        let q = parse("FROM e WHERE note = \"a LIMIT b\" LIMIT 2").unwrap();
        assert_eq!(q.filter, Some(eq(v("note"), c("a LIMIT b"))));
        assert_eq!(q.limit, Some(2));

        let q = parse("FROM e WHERE title = ' WHERE x ORDER BY y'").unwrap();
        assert_eq!(q.filter, Some(eq(v("title"), c(" WHERE x ORDER BY y"))));
        assert!(q.order_by.is_empty());
    }

    #[test]
    fn test_order_by() {
        let q = parse("FROM e ORDER BY ts DESC, name LIMIT 3").unwrap();
        assert_eq!(q.order_by.len(), 2);
        assert_eq!(q.order_by[0].expression, v("ts"));
        assert_eq!(q.order_by[0].direction, Direction::Desc);
        assert_eq!(q.order_by[1].direction, Direction::Asc);
        assert_eq!(q.limit, Some(3));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("SELECT *"), Err(QueryError::Parse(_))));
        assert!(matches!(parse("FROM e WHERE a ~ 1"), Err(QueryError::Parse(_))));
        assert!(matches!(parse("FROM e LIMIT many"), Err(QueryError::Parse(_))));
        assert!(matches!(parse("FROM e ORDER BY a SIDEWAYS"), Err(QueryError::Parse(_))));
        assert!(matches!(parse("FROM e WHERE a = 1 AND"), Err(QueryError::Parse(_))));
    }
}
