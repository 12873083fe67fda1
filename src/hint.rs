//! Compiler branch hints, shared by `entry` and `table`.

cfg_if::cfg_if! {
    if #[cfg(all(feature = "nightly", not(miri)))] {
        pub use core::intrinsics::{likely, unlikely};
    } else {
        #[inline]
        pub fn likely(b: bool) -> bool {
            b
        }

        #[inline]
        pub fn unlikely(b: bool) -> bool {
            b
        }
    }
}
