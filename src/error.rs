//! Structured messages handed to [`crate::collaborator::Collaborator::fatal`].
//!
//! None of these are ever returned as values — callers see either a process
//! abort, an out-of-band `error_hook()` call, or a plain `None`/`()` return.
//! `WeakTableError` exists only to give `fatal` (and tests) a structured,
//! `Display`-able message.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeakTableError {
    /// A probe chain returned to its starting bucket without resolving —
    /// the load/displacement invariants promised elsewhere in the table
    /// have been violated.
    #[error("weak table corruption: {0}")]
    Corrupt(String),
    /// A resize would require an allocation request larger than
    /// `isize::MAX` bytes.
    #[error("hash table capacity overflow")]
    CapacityOverflow,
}
