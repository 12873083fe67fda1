//! The collaborators this crate consumes but does not implement.
//!
//! The real runtime answers these questions via the reference-count side
//! table, the object model's message dispatch, and a pair of
//! well-known-symbol diagnostic functions. This crate expresses that
//! boundary as a trait so tests and benchmarks can supply a double without
//! pulling in an actual object runtime.

use crate::disguise::DisguisedPtr;
use core::fmt;

/// Answer to "is this referent currently being destroyed?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyQuery {
    Alive,
    Destroying,
    /// The indirect weak-permission-hook dispatch resolved to the runtime's
    /// "forward" sentinel. The caller couldn't get a real answer either way.
    Unanswerable,
}

/// The object-model hooks `register`/`unregister`/`clear` defer to.
///
/// Every method here runs inside the caller's held lock, so implementations
/// must not block or re-enter the table.
pub trait Collaborator<T> {
    /// Cheap immediate check: is `referent` a tagged pointer rather than a
    /// heap address? Tagged referents are vacuously always-valid and never
    /// enter the table.
    fn is_tagged_pointer(&self, referent: DisguisedPtr<T>) -> bool;

    /// May invoke the referent's class-overridden weak-reference-permission
    /// hook; may report [`DestroyQuery::Unanswerable`].
    fn is_destroying(&self, referent: DisguisedPtr<T>) -> DestroyQuery;

    /// Called on detected misuse: unregistering an unknown referrer, or
    /// clearing a slot that points somewhere unexpected. A well-known symbol
    /// a debugger can break on; otherwise a no-op.
    fn error_hook(&self);

    /// Aborts the process. Called on detected table corruption, or on
    /// registering against a dying referent with `crash_if_dying = true`.
    fn fatal(&self, message: &str) -> !;

    /// Emits a diagnostic without aborting.
    fn inform(&self, message: &str);
}

/// A `Collaborator` that treats every referent as alive, ordinary (never
/// tagged), and routes diagnostics through the `log` facade. Used by tests,
/// benchmarks, and as a documentation example of the trait's contract — not
/// meant for production embedding, since a real runtime always has an
/// actual object model to query.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCollaborator;

impl<T> Collaborator<T> for NullCollaborator {
    #[inline]
    fn is_tagged_pointer(&self, _referent: DisguisedPtr<T>) -> bool {
        false
    }

    #[inline]
    fn is_destroying(&self, _referent: DisguisedPtr<T>) -> DestroyQuery {
        DestroyQuery::Alive
    }

    fn error_hook(&self) {
        log::warn!("weaktable: error_hook invoked");
    }

    fn fatal(&self, message: &str) -> ! {
        log::error!("weaktable: fatal: {}", message);
        panic!("weaktable: fatal: {}", message);
    }

    fn inform(&self, message: &str) {
        log::warn!("weaktable: {}", message);
    }
}

impl fmt::Display for DestroyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestroyQuery::Alive => write!(f, "alive"),
            DestroyQuery::Destroying => write!(f, "destroying"),
            DestroyQuery::Unanswerable => write!(f, "unanswerable"),
        }
    }
}
