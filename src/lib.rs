#![cfg_attr(feature = "nightly", feature(core_intrinsics))]

//! A zeroing weak-reference table: the core data structure behind an
//! ARC-style runtime's weak references.
//!
//! A runtime maintains a many-to-many registration between *referents*
//! (live heap objects a weak reference may target) and *referrers*
//! (storage slots — variables, instance fields — holding a weak pointer).
//! When a referent is destroyed, every referrer slot that still points at
//! it is zeroed, so a later load observes null instead of a dangling
//! address.
//!
//! This crate is the table and the three-operation protocol
//! ([`WeakTable::register`], [`WeakTable::unregister`],
//! [`WeakTable::clear`]) that drive it. It does not implement the
//! surrounding reference-count machinery, the lock that guards a given
//! table instance, the object model, or tagged-pointer detection — those
//! are supplied by the embedding runtime through the [`Collaborator`]
//! trait.
//!
//! Every operation here is a bounded-time, no-lock critical section: the
//! caller is responsible for holding whatever mutex protects the
//! particular [`WeakTable`] instance being called. See the module docs on
//! [`table`] and [`entry`] for the two hash tables' resize policies.

/// Compile-time resize/promotion constants.
pub mod config;
/// The collaborator trait consumed from the embedding runtime.
pub mod collaborator;
/// Reversible pointer disguise.
pub mod disguise;
/// Per-referent referrer set (inline / out-of-line).
mod entry;
/// Fatal/diagnostic error payloads.
pub mod error;
/// Compiler branch hints shared by `entry` and `table`.
mod hint;
/// The register/unregister/clear protocol.
mod registration;
/// The referent-indexed outer hash table.
mod table;

pub use collaborator::{Collaborator, DestroyQuery, NullCollaborator};
pub use disguise::DisguisedPtr;
pub use entry::ReferrerAddr;
pub use error::WeakTableError;
pub use registration::WeakTable;
