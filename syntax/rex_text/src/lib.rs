//! Rex text layer - spans and virtual characters.
//!
//! Regex patterns reach the parser as text embedded in some host document
//! (a string literal, an editor buffer), so every character carries the
//! span of original source it was decoded from. This crate provides:
//! - `Span` for compact source locations
//! - `VirtualChar` for one decoded character plus its source span
//! - `VirtualCharSeq` for cheaply sliceable sequences over shared storage
//!
//! Sequences hand out O(1) sub-slices that share one backing allocation,
//! which is what lets downstream token merging be expressed as re-slicing
//! rather than copying.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod chars;
mod span;

pub use chars::{VirtualChar, VirtualCharSeq};
pub use span::{Span, SpanError};
