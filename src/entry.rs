//! Per-referent referrer set — the inline/out-of-line `Entry`.
//!
//! `Entry` is an explicit two-variant enum rather than a bit-packed
//! discriminant overlaid onto an inline slot, at the cost of one extra word
//! per entry. Inline holds exactly 4 slots, promotes to out-of-line on the
//! 5th insert, and never demotes.

use crate::config::{exceeds_max_load, FIRST_OUT_OF_LINE_CAPACITY, INLINE_CAPACITY};
use crate::disguise::DisguisedPtr;
use crate::error::WeakTableError;
use crate::hint::unlikely;

/// The address of a storage slot holding a weak pointer, in disguised form.
/// `T` is the referent's pointee type; the slot itself holds a `*const T`.
pub type ReferrerAddr<T> = DisguisedPtr<*const T>;

impl<T> ReferrerAddr<T> {
    /// Reads the weak pointer currently stored at this slot.
    ///
    /// # Safety
    /// The disguised address must still point at live, appropriately typed
    /// storage — guaranteed by the caller's contract that a referrer's
    /// backing storage outlives its registration (or is unregistered
    /// first).
    #[inline]
    pub unsafe fn load(&self) -> *const T {
        let slot = self.undisguise() as *const *const T;
        *slot
    }

    /// Writes `value` through this slot.
    ///
    /// # Safety
    /// Same contract as [`Self::load`].
    #[inline]
    pub unsafe fn store(&self, value: *const T) {
        let slot = self.undisguise() as *mut *const T;
        *slot = value;
    }
}

#[inline]
fn hash_referrer<T>(referrer: ReferrerAddr<T>) -> u64 {
    use core::hash::Hasher;
    let mut hasher = fxhash::FxHasher::default();
    hasher.write_usize(referrer.as_word());
    hasher.finish()
}

pub(crate) struct OutOfLine<T> {
    buckets: Box<[ReferrerAddr<T>]>,
    mask: usize,
    fill: usize,
    max_displacement: usize,
}

impl<T> OutOfLine<T> {
    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        OutOfLine {
            buckets: vec![ReferrerAddr::NULL; capacity].into_boxed_slice(),
            mask: capacity - 1,
            fill: 0,
            max_displacement: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts `referrer` into an out-of-line table known not to already
    /// contain it, growing first if the post-insert load would exceed ¾.
    fn insert(&mut self, referrer: ReferrerAddr<T>) {
        if exceeds_max_load(self.fill, self.capacity()) {
            self.grow();
        }
        self.insert_no_grow(referrer);
    }

    fn insert_no_grow(&mut self, referrer: ReferrerAddr<T>) {
        let ideal = (hash_referrer(referrer) as usize) & self.mask;
        let mut displacement = 0;
        let mut index = ideal;
        loop {
            if self.buckets[index].is_null() {
                self.buckets[index] = referrer;
                self.fill += 1;
                if displacement > self.max_displacement {
                    self.max_displacement = displacement;
                }
                return;
            }
            displacement += 1;
            index = (index + 1) & self.mask;
            if unlikely(index == ideal) {
                panic!(
                    "{}",
                    WeakTableError::Corrupt(
                        "out-of-line entry probe wrapped with load under bound".into()
                    )
                );
            }
        }
    }

    fn grow(&mut self) {
        let old = core::mem::replace(self, Self::with_capacity(self.capacity() * 2));
        for referrer in old.buckets.iter().copied() {
            if !referrer.is_null() {
                self.insert_no_grow(referrer);
            }
        }
    }

    /// Looks up `referrer`. Returns its bucket index, or `None` if probing
    /// exceeds `max_displacement` without a match.
    fn find(&self, referrer: ReferrerAddr<T>) -> Option<usize> {
        let ideal = (hash_referrer(referrer) as usize) & self.mask;
        let mut displacement = 0;
        let mut index = ideal;
        loop {
            if self.buckets[index] == referrer {
                return Some(index);
            }
            if displacement > self.max_displacement {
                return None;
            }
            displacement += 1;
            index = (index + 1) & self.mask;
            if unlikely(index == ideal) {
                return None;
            }
        }
    }

    fn remove(&mut self, referrer: ReferrerAddr<T>) -> bool {
        match self.find(referrer) {
            Some(index) => {
                self.buckets[index] = ReferrerAddr::NULL;
                self.fill -= 1;
                true
            }
            None => false,
        }
    }

    fn referrers(&self) -> impl Iterator<Item = ReferrerAddr<T>> + '_ {
        self.buckets.iter().copied().filter(|r| !r.is_null())
    }

    fn len(&self) -> usize {
        self.fill
    }
}

pub(crate) enum EntryStorage<T> {
    Inline([ReferrerAddr<T>; INLINE_CAPACITY]),
    OutOfLine(Box<OutOfLine<T>>),
}

/// All referrers currently aimed at one referent.
pub(crate) struct Entry<T> {
    storage: EntryStorage<T>,
}

impl<T> Entry<T> {
    /// A fresh inline entry holding `referrer` in slot 0.
    pub fn new(referrer: ReferrerAddr<T>) -> Self {
        let mut slots = [ReferrerAddr::NULL; INLINE_CAPACITY];
        slots[0] = referrer;
        Entry {
            storage: EntryStorage::Inline(slots),
        }
    }

    pub fn is_out_of_line(&self) -> bool {
        matches!(self.storage, EntryStorage::OutOfLine(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.storage {
            EntryStorage::Inline(slots) => slots.iter().all(|s| s.is_null()),
            EntryStorage::OutOfLine(table) => table.len() == 0,
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            EntryStorage::Inline(slots) => slots.iter().filter(|s| !s.is_null()).count(),
            EntryStorage::OutOfLine(table) => table.len(),
        }
    }

    /// Adds `referrer`. Caller guarantees `referrer` is not already present.
    pub fn append(&mut self, referrer: ReferrerAddr<T>) {
        if let EntryStorage::Inline(slots) = &mut self.storage {
            if let Some(empty) = slots.iter_mut().find(|s| s.is_null()) {
                *empty = referrer;
                return;
            }
            // All 4 inline slots full: promote directly to capacity 8
            // rather than growing a 1-slot out-of-line table repeatedly.
            let mut out = OutOfLine::with_capacity(FIRST_OUT_OF_LINE_CAPACITY);
            for s in slots.iter().copied() {
                out.insert_no_grow(s);
            }
            out.insert_no_grow(referrer);
            self.storage = EntryStorage::OutOfLine(Box::new(out));
            return;
        }
        if let EntryStorage::OutOfLine(table) = &mut self.storage {
            table.insert(referrer);
        }
    }

    /// Removes `referrer` if present. Returns whether it was found.
    pub fn remove(&mut self, referrer: ReferrerAddr<T>) -> bool {
        match &mut self.storage {
            EntryStorage::Inline(slots) => {
                for slot in slots.iter_mut() {
                    if *slot == referrer {
                        *slot = ReferrerAddr::NULL;
                        return true;
                    }
                }
                false
            }
            EntryStorage::OutOfLine(table) => table.remove(referrer),
        }
    }

    /// Every live referrer address currently stored in this entry.
    pub fn referrers(&self) -> Vec<ReferrerAddr<T>> {
        match &self.storage {
            EntryStorage::Inline(slots) => {
                slots.iter().copied().filter(|s| !s.is_null()).collect()
            }
            EntryStorage::OutOfLine(table) => table.referrers().collect(),
        }
    }
}
