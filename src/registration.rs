//! The three public operations mediating between callers and the two
//! tables: `register`, `unregister`, `clear`.

use crate::collaborator::{Collaborator, DestroyQuery};
use crate::disguise::DisguisedPtr;
use crate::entry::{Entry, ReferrerAddr};
use crate::table::Table;

/// One stripe of the runtime's weak-reference side table: a [`Table`] plus
/// the collaborator it consults for destruction state and diagnostics.
/// Callers are expected to hold one `WeakTable` per lock stripe and to
/// already hold that stripe's lock before calling any method here —
/// `WeakTable` itself performs no synchronization.
pub struct WeakTable<T, C> {
    table: Table<T>,
    collaborator: C,
}

impl<T, C: Collaborator<T>> WeakTable<T, C> {
    pub fn new(collaborator: C) -> Self {
        WeakTable {
            table: Table::new(),
            collaborator,
        }
    }

    /// Registers `referrer` as pointing at `referent`.
    ///
    /// Returns `Some(referent)` on success (including the tagged-pointer
    /// and null no-op cases), or `None` if the referent is dying and
    /// `crash_if_dying` is false. Does not write through `referrer` —
    /// the caller writes the weak variable itself.
    pub fn register(
        &mut self,
        referent: DisguisedPtr<T>,
        referrer: ReferrerAddr<T>,
        crash_if_dying: bool,
    ) -> Option<DisguisedPtr<T>> {
        if referent.is_null() || self.collaborator.is_tagged_pointer(referent) {
            return Some(referent);
        }

        match self.collaborator.is_destroying(referent) {
            DestroyQuery::Alive => {}
            // The permission hook dispatched through the forward sentinel
            // and came back with no real answer; registration fails with
            // null unconditionally, independent of `crash_if_dying`.
            DestroyQuery::Unanswerable => return None,
            DestroyQuery::Destroying => {
                if crash_if_dying {
                    self.collaborator.fatal(&format!(
                        "registering a weak reference to a referent ({:?}) that is being destroyed",
                        referent
                    ));
                }
                return None;
            }
        }

        // Two lookups (exists-check, then mutate-or-insert) rather than a
        // single `match` on a mutable borrow: the latter would need to
        // mutate `self.table` again from the `None` arm while the `Some`
        // arm's borrow is still in scope for the match.
        if self.table.lookup(referent).is_some() {
            self.table
                .lookup_mut(referent)
                .expect("just confirmed present")
                .append(referrer);
        } else {
            self.table.maybe_grow();
            self.table.insert(referent, Entry::new(referrer));
        }

        Some(referent)
    }

    /// Removes `referrer` from `referent`'s entry — the weak variable's
    /// backing storage is going away while the referent lives. The weak
    /// variable itself is not modified.
    pub fn unregister(&mut self, referent: DisguisedPtr<T>, referrer: ReferrerAddr<T>) {
        if referent.is_null() {
            return;
        }
        let found = match self.table.lookup_mut(referent) {
            Some(entry) => entry.remove(referrer),
            None => return,
        };
        if !found {
            self.collaborator.inform(&format!(
                "unregister: referrer {:?} was never registered for referent {:?}",
                referrer, referent
            ));
            self.collaborator.error_hook();
            return;
        }
        let now_empty = self
            .table
            .lookup(referent)
            .map(|entry| entry.is_empty())
            .unwrap_or(false);
        if now_empty {
            self.table.remove(referent);
        }
    }

    /// Invoked from `referent`'s destructor. Zeroes every referrer slot
    /// that still points at `referent`, then removes its entry.
    pub fn clear(&mut self, referent: DisguisedPtr<T>) {
        let referrers = match self.table.lookup(referent) {
            Some(entry) => entry.referrers(),
            None => return,
        };

        for referrer in referrers {
            // SAFETY: the referrer's backing storage is guaranteed live by
            // the caller's contract until it is unregistered or zeroed
            // here; `clear` runs under the referent's destruction lock.
            let current = unsafe { referrer.load() };
            if current.is_null() {
                // Already zeroed (e.g. by a concurrent unregister racing
                // this clear); not misuse, nothing to do.
            } else if current == referent.undisguise() {
                unsafe { referrer.store(core::ptr::null()) };
            } else {
                self.collaborator.inform(&format!(
                    "clear: referrer {:?} no longer points at dying referent {:?}",
                    referrer, referent
                ));
                self.collaborator.error_hook();
            }
        }

        self.table.remove(referent);
    }

    /// Whether `referent` currently has any registered referrers. Debug
    /// builds only.
    #[cfg(debug_assertions)]
    pub fn is_registered(&self, referent: DisguisedPtr<T>) -> bool {
        self.table.lookup(referent).is_some()
    }
}
