//! # es-core — The "Physics" of EVENTSET
//!
//! Defines what an event *is*: the closed set of [`ValueKind`]s a field can
//! be declared with, the runtime [`Value`]s fields hold, the [`KeySet`]
//! schema, and the [`Event`] row itself.
//!
//! Nothing here is lazy or asynchronous. The relational algebra built on top
//! of these types lives in `es-set`.

pub mod event;
pub mod keyset;
pub mod kind;
pub mod value;

pub use event::{Event, ID_KEY};
pub use keyset::KeySet;
pub use kind::{default_for_kind, ValueKind};
pub use value::{format_num, Value};

/// Schema violations raised while shaping events.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A projection needed to synthesise a value for a key whose kind has no default.
    #[error("cannot synthesise a default for key '{key}' of kind {kind}")]
    UnsupportedDefault { key: String, kind: ValueKind },
}
