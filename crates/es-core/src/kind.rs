//! # Value Kinds
//!
//! The closed set of kinds a field may be declared with in a [`KeySet`].
//!
//! [`KeySet`]: crate::KeySet

use serde::{Deserialize, Serialize};

use crate::{CoreError, Value};

/// Schema-level kind of a field.
///
/// `Id` is a schema-only kind: at runtime an identifier is a string, but it
/// can never be synthesised by [`default_for_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Num,
    #[serde(rename = "bigint")]
    BigInt,
    Str,
    Id,
    Bool,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Num => write!(f, "num"),
            Self::BigInt => write!(f, "bigint"),
            Self::Str => write!(f, "str"),
            Self::Id => write!(f, "id"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// The value used to fill a requested key that an event does not carry.
///
/// Fails for [`ValueKind::Id`]: identifiers cannot be made up.
pub fn default_for_kind(key: &str, kind: ValueKind) -> Result<Value, CoreError> {
    match kind {
        ValueKind::Null => Ok(Value::Null),
        ValueKind::Num => Ok(Value::Num(0.0)),
        ValueKind::BigInt => Ok(Value::BigInt(0)),
        ValueKind::Str => Ok(Value::Str(String::new())),
        ValueKind::Bool => Ok(Value::Bool(false)),
        ValueKind::Id => Err(CoreError::UnsupportedDefault {
            key: key.to_string(),
            kind,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        assert_eq!(default_for_kind("a", ValueKind::Null).unwrap(), Value::Null);
        assert_eq!(default_for_kind("a", ValueKind::Num).unwrap(), Value::Num(0.0));
        assert_eq!(default_for_kind("a", ValueKind::BigInt).unwrap(), Value::BigInt(0));
        assert_eq!(
            default_for_kind("a", ValueKind::Str).unwrap(),
            Value::Str(String::new())
        );
        assert_eq!(default_for_kind("a", ValueKind::Bool).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_id_cannot_be_defaulted() {
        let err = default_for_kind("track", ValueKind::Id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedDefault { ref key, kind: ValueKind::Id } if key == "track"
        ));
    }

    #[test]
    fn test_kind_names_round_trip_through_serde() {
        let kind: ValueKind = serde_json::from_str("\"bigint\"").unwrap();
        assert_eq!(kind, ValueKind::BigInt);
        assert_eq!(serde_json::to_string(&ValueKind::Num).unwrap(), "\"num\"");
    }

    #[test]
    fn test_unknown_kind_name_is_rejected() {
        assert!(serde_json::from_str::<ValueKind>("\"float\"").is_err());
    }
}
