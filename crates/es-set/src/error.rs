//! Error types for the event set engine.

use es_core::CoreError;

/// Boxed collaborator error, as returned by [`EventSource`](crate::EventSource)
/// implementations backed by something fallible.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A projection asked for a value that cannot be synthesised.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// A backing source failed to materialise.
    #[error("event source failed: {0}")]
    Source(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
