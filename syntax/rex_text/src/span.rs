//! Source location spans.

use std::fmt;

/// Error when a byte offset does not fit in a `u32` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanError {
    /// The offending byte offset.
    pub offset: usize,
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "byte offset {} (0x{:X}) exceeds u32::MAX (0x{:X})",
            self.offset,
            self.offset,
            u32::MAX
        )
    }
}

impl std::error::Error for SpanError {}

/// Half-open `[start, end)` byte range into the original source text.
///
/// Layout: 8 bytes total. Patterns are embedded in host documents, so
/// offsets are relative to whatever text the caller decoded; the parser
/// never interprets them, it only carries them through.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create a zero-length span at an offset.
    #[inline]
    pub const fn point(offset: u32) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Try to create a span from a byte range.
    ///
    /// Returns an error if either bound exceeds `u32::MAX`.
    #[inline]
    pub fn try_from_range(range: std::ops::Range<usize>) -> Result<Self, SpanError> {
        let start = u32::try_from(range.start).map_err(|_| SpanError {
            offset: range.start,
        })?;
        let end = u32::try_from(range.end).map_err(|_| SpanError { offset: range.end })?;
        Ok(Span { start, end })
    }

    /// Create a span from a byte range.
    ///
    /// # Panics
    /// Panics if either bound exceeds `u32::MAX`. Use `try_from_range` for
    /// fallible conversion when handling untrusted input.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::try_from_range(range).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is zero-length.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if a byte offset falls within this span.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a `std::ops::Range`.
    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::Span;
    crate::static_assert_size!(Span, 8);
}
