//! # Runtime Values
//!
//! A field of an [`Event`](crate::Event) holds one [`Value`]. Values are
//! dynamically typed; the [`ValueKind`] declared for a key in a keyset is a
//! contract the loader is trusted to honour, not something checked here.

use serde::{Deserialize, Serialize};

use crate::ValueKind;

/// A single field value.
///
/// Serialised untagged: `null`, numbers, strings and booleans map onto the
/// matching JSON scalars. JSON integers deserialise as [`Value::BigInt`] and
/// other numbers as [`Value::Num`]; use [`Value::coerce`] to bring a loaded
/// value in line with a declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    BigInt(i64),
    Num(f64),
    Str(String),
}

impl Value {
    /// The runtime kind of this value. Strings always report [`ValueKind::Str`].
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::BigInt(_) => ValueKind::BigInt,
            Self::Num(_) => ValueKind::Num,
            Self::Str(_) => ValueKind::Str,
        }
    }

    /// Truthiness as used by `And`/`Or` and by filters.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::BigInt(i) => *i != 0,
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }

    /// Convert into the representation `kind` declares.
    ///
    /// `Null` passes through for every kind. Returns `None` when the value
    /// cannot represent the kind (e.g. a string declared `num`).
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        match (kind, self) {
            (_, Self::Null) => Some(Self::Null),
            (ValueKind::Null, v) => Some(v),
            (ValueKind::Num, Self::Num(n)) => Some(Self::Num(n)),
            (ValueKind::Num, Self::BigInt(i)) => Some(Self::Num(i as f64)),
            (ValueKind::BigInt, Self::BigInt(i)) => Some(Self::BigInt(i)),
            (ValueKind::BigInt, Self::Num(n))
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 =>
            {
                Some(Self::BigInt(n as i64))
            }
            (ValueKind::Str | ValueKind::Id, Self::Str(s)) => Some(Self::Str(s)),
            (ValueKind::Bool, Self::Bool(b)) => Some(Self::Bool(b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Render a float the way a script engine prints numbers: integral values
/// without a fractional part, exponent form outside `[1e-6, 1e21)`, `NaN`,
/// `Infinity`, `-Infinity`.
pub fn format_num(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exp = format!("{:e}", n);
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        }
    } else {
        n.to_string()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::BigInt(i) => write!(f, "{}", i),
            Self::Num(n) => write!(f, "{}", format_num(*n)),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::BigInt(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
