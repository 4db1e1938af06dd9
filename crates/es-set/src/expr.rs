//! # Expression Algebra
//!
//! A small expression tree shared by filtering and sorting. Every [`Expr`]
//! can be evaluated in memory against one event, lowered to a query
//! fragment for a backing engine, and asked which fields it reads.

use es_core::{format_num, Event, KeySet, Value, ValueKind};
use serde::{Deserialize, Serialize};

use crate::cmp::{compare_values, strict_eq};

/// Binary operators. Comparisons yield booleans; `And`/`Or` yield one of
/// their operands, chosen by truthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

impl BinOp {
    /// Token used when lowering to a query fragment.
    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// In-memory semantics. An absent operand (`None`) compares unequal to
    /// every present value and fails every ordering test.
    pub fn evaluate(self, lhs: Option<Value>, rhs: Option<Value>) -> Option<Value> {
        use std::cmp::Ordering::*;
        let ord = || compare_values(lhs.as_ref(), rhs.as_ref());
        let b = match self {
            Self::Eq => strict_eq(lhs.as_ref(), rhs.as_ref()),
            Self::Ne => !strict_eq(lhs.as_ref(), rhs.as_ref()),
            Self::Gt => ord() == Some(Greater),
            Self::Ge => matches!(ord(), Some(Greater | Equal)),
            Self::Lt => ord() == Some(Less),
            Self::Le => matches!(ord(), Some(Less | Equal)),
            Self::And => {
                return if truthy(lhs.as_ref()) { rhs } else { lhs };
            }
            Self::Or => {
                return if truthy(lhs.as_ref()) { lhs } else { rhs };
            }
        };
        Some(Value::Bool(b))
    }
}

/// Truthiness of a possibly-absent value. Absent is falsy.
pub fn truthy(v: Option<&Value>) -> bool {
    v.is_some_and(Value::is_truthy)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Var { name: String },
    Constant { value: Value },
    BinOp { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    /// Evaluate against one event. Reading a field the event lacks yields
    /// `None` rather than an error.
    pub fn execute(&self, event: &Event) -> Option<Value> {
        match self {
            Self::Var { name } => event.get(name),
            Self::Constant { value } => Some(value.clone()),
            Self::BinOp { op, lhs, rhs } => op.evaluate(lhs.execute(event), rhs.execute(event)),
        }
    }

    /// Lower to a query fragment. `binding` maps a field name to the column
    /// reference the backing engine understands. Binary nodes are wrapped as
    /// `(lhs OP rhs)`. String constants are quoted but not escaped.
    pub fn build_query_fragment<F>(&self, binding: &F) -> String
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::Var { name } => binding(name),
            Self::Constant { value } => match value {
                Value::Null => "NULL".to_string(),
                Value::Str(s) => format!("'{}'", s),
                Value::Bool(true) => "TRUE".to_string(),
                Value::Bool(false) => "FALSE".to_string(),
                Value::Num(n) => format_num(*n),
                Value::BigInt(i) => i.to_string(),
            },
            Self::BinOp { op, lhs, rhs } => format!(
                "({} {} {})",
                lhs.build_query_fragment(binding),
                op.token(),
                rhs.build_query_fragment(binding)
            ),
        }
    }

    /// Fields this expression reads, all typed `Null`: their real kind is
    /// unknown until bound to a set.
    pub fn free_variables(&self) -> KeySet {
        match self {
            Self::Var { name } => KeySet::new().with(name.clone(), ValueKind::Null),
            Self::Constant { .. } => KeySet::new(),
            Self::BinOp { lhs, rhs, .. } => lhs.free_variables().merge(&rhs.free_variables()),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build_query_fragment(&|name: &str| name.to_string()))
    }
}

/// Free variables of a list of expressions.
pub fn free_variables<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> KeySet {
    exprs
        .into_iter()
        .fold(KeySet::new(), |acc, e| acc.merge(&e.free_variables()))
}

// =============================================================================
// Construction helpers
// =============================================================================

pub fn v(name: impl Into<String>) -> Expr {
    Expr::Var { name: name.into() }
}

pub fn c(value: impl Into<Value>) -> Expr {
    Expr::Constant {
        value: value.into(),
    }
}

/// The `null` constant.
pub fn null() -> Expr {
    Expr::Constant { value: Value::Null }
}

fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::BinOp {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Eq, lhs, rhs)
}

pub fn ne(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Ne, lhs, rhs)
}

pub fn gt(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Gt, lhs, rhs)
}

pub fn ge(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Ge, lhs, rhs)
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Lt, lhs, rhs)
}

pub fn le(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Le, lhs, rhs)
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::And, lhs, rhs)
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinOp::Or, lhs, rhs)
}
