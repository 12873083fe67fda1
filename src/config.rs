//! Compile-time constants for the table's resize and promotion policies.
//!
//! These thresholds are hard-coded rather than exposed as a runtime knob —
//! there is nothing in the registration protocol a caller could usefully
//! tune, so this module holds only `const`s, not a configurable struct.

/// Number of inline referrer slots an `Entry` holds before promoting to an
/// out-of-line hash table.
pub const INLINE_CAPACITY: usize = 4;

/// Capacity an `Entry` promotes to on its 5th referrer.
pub const FIRST_OUT_OF_LINE_CAPACITY: usize = 8;

/// Capacity a `Table` grows to on its first insert.
pub const FIRST_TABLE_CAPACITY: usize = 64;

/// Capacity below which a `Table` never shrinks, regardless of load.
pub const MIN_SHRINKABLE_CAPACITY: usize = 1024;

/// Divisor of `capacity` used as the shrink-trigger load threshold
/// (`fill <= capacity / SHRINK_LOAD_DIVISOR`).
pub const SHRINK_LOAD_DIVISOR: usize = 16;

/// Divisor applied to `capacity` when a shrink is triggered
/// (`new_capacity = capacity / SHRINK_FACTOR`).
pub const SHRINK_FACTOR: usize = 8;

/// Numerator/denominator of the max-load fraction shared by both the outer
/// `Table` and out-of-line `Entry` storage (`fill <= numerator/denominator *
/// capacity` must hold after any mutation).
pub const MAX_LOAD_NUMERATOR: usize = 3;
pub const MAX_LOAD_DENOMINATOR: usize = 4;

#[inline]
pub fn exceeds_max_load(fill: usize, capacity: usize) -> bool {
    fill * MAX_LOAD_DENOMINATOR >= capacity * MAX_LOAD_NUMERATOR
}
