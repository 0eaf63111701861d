//! Virtual characters and shared-storage sequences.

use std::fmt;
use std::sync::Arc;

use crate::{Span, SpanError};

/// One decoded character plus the span of source text it came from.
///
/// A "virtual" character because the underlying source may spell it any
/// number of ways (a raw char, an escape sequence in a host string
/// literal, a surrogate pair). The parser only ever sees the decoded
/// form; the span points back at the original spelling.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct VirtualChar {
    pub ch: char,
    pub span: Span,
}

impl VirtualChar {
    /// Create a new virtual character.
    #[inline]
    pub const fn new(ch: char, span: Span) -> Self {
        VirtualChar { ch, span }
    }
}

impl fmt::Debug for VirtualChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.ch, self.span)
    }
}

/// An immutable sequence of virtual characters.
///
/// Sub-slices share the backing allocation, so slicing is O(1) and a
/// token's characters are always a window into the text they were
/// scanned from. Equality and hashing are by content (characters and
/// spans), never by backing identity.
#[derive(Clone)]
pub struct VirtualCharSeq {
    text: Arc<[VirtualChar]>,
    start: usize,
    len: usize,
}

impl VirtualCharSeq {
    /// Decode a string into virtual characters with UTF-8 byte-offset spans.
    ///
    /// # Panics
    /// Panics if the string is longer than `u32::MAX` bytes. Use
    /// `try_from_str` for fallible conversion.
    pub fn from_str(text: &str) -> Self {
        Self::try_from_str(text).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Decode a string into virtual characters with UTF-8 byte-offset spans.
    pub fn try_from_str(text: &str) -> Result<Self, SpanError> {
        let mut chars = Vec::with_capacity(text.len());
        for (offset, ch) in text.char_indices() {
            let span = Span::try_from_range(offset..offset + ch.len_utf8())?;
            chars.push(VirtualChar::new(ch, span));
        }
        Ok(Self::from_chars(chars))
    }

    /// Build a sequence from explicit virtual characters.
    ///
    /// Callers decoding from a host document (string literals with their
    /// own escape syntax) construct characters with whatever spans the
    /// host assigns.
    pub fn from_chars(chars: Vec<VirtualChar>) -> Self {
        let len = chars.len();
        VirtualCharSeq {
            text: chars.into(),
            start: 0,
            len,
        }
    }

    /// Number of characters in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the sequence is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The character at an index, if in bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<VirtualChar> {
        self.as_slice().get(index).copied()
    }

    /// The plain `char` at an index, if in bounds.
    #[inline]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.get(index).map(|vc| vc.ch)
    }

    /// First character, if any.
    #[inline]
    pub fn first(&self) -> Option<VirtualChar> {
        self.as_slice().first().copied()
    }

    /// Last character, if any.
    #[inline]
    pub fn last(&self) -> Option<VirtualChar> {
        self.as_slice().last().copied()
    }

    /// Index of this window's first character in the backing sequence.
    ///
    /// Two slices of the same parse are adjacent exactly when one's
    /// `offset() + len()` equals the other's `offset()`.
    #[inline]
    pub fn offset(&self) -> usize {
        self.start
    }

    /// O(1) sub-slice sharing the backing allocation.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: std::ops::Range<usize>) -> VirtualCharSeq {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "slice {}..{} out of bounds for sequence of length {}",
            range.start,
            range.end,
            self.len
        );
        VirtualCharSeq {
            text: Arc::clone(&self.text),
            start: self.start + range.start,
            len: range.end - range.start,
        }
    }

    /// Source span covered by this sequence.
    ///
    /// An empty sequence reports a zero-length span at its position in
    /// the backing text, so a missing token sliced at the scan position
    /// still points at the right place.
    pub fn span(&self) -> Span {
        if self.len == 0 {
            let offset = match self.text.get(self.start) {
                Some(vc) => vc.span.start,
                None => self.text.last().map_or(0, |vc| vc.span.end),
            };
            return Span::point(offset);
        }
        let first = self.text[self.start].span;
        let last = self.text[self.start + self.len - 1].span;
        first.merge(last)
    }

    /// Iterate the characters.
    pub fn iter(&self) -> impl Iterator<Item = VirtualChar> + '_ {
        self.as_slice().iter().copied()
    }

    /// Collect the decoded characters into a `String`.
    pub fn to_source_string(&self) -> String {
        self.iter().map(|vc| vc.ch).collect()
    }

    #[inline]
    fn as_slice(&self) -> &[VirtualChar] {
        &self.text[self.start..self.start + self.len]
    }
}

impl PartialEq for VirtualCharSeq {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for VirtualCharSeq {}

impl std::hash::Hash for VirtualCharSeq {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl fmt::Debug for VirtualCharSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.to_source_string(), self.span())
    }
}

impl fmt::Display for VirtualCharSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for vc in self.iter() {
            write!(f, "{}", vc.ch)?;
        }
        Ok(())
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{VirtualChar, VirtualCharSeq};
    crate::static_assert_size!(VirtualChar, 12);
    crate::static_assert_size!(VirtualCharSeq, 32);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_from_str_ascii_spans() {
        let seq = VirtualCharSeq::from_str("a|b");
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(0), Some(VirtualChar::new('a', Span::new(0, 1))));
        assert_eq!(seq.get(1), Some(VirtualChar::new('|', Span::new(1, 2))));
        assert_eq!(seq.get(2), Some(VirtualChar::new('b', Span::new(2, 3))));
        assert_eq!(seq.get(3), None);
        assert_eq!(seq.span(), Span::new(0, 3));
    }

    #[test]
    fn test_from_str_multibyte_spans() {
        // 'é' is two bytes in UTF-8; spans are byte ranges.
        let seq = VirtualCharSeq::from_str("aéb");
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(1), Some(VirtualChar::new('é', Span::new(1, 3))));
        assert_eq!(seq.get(2), Some(VirtualChar::new('b', Span::new(3, 4))));
    }

    #[test]
    fn test_slice_shares_content() {
        let seq = VirtualCharSeq::from_str("abcdef");
        let mid = seq.slice(2..5);
        assert_eq!(mid.len(), 3);
        assert_eq!(mid.offset(), 2);
        assert_eq!(mid.to_source_string(), "cde");
        assert_eq!(mid.span(), Span::new(2, 5));

        // Re-slicing a slice stays relative to the slice.
        let inner = mid.slice(1..2);
        assert_eq!(inner.to_source_string(), "d");
        assert_eq!(inner.offset(), 3);
    }

    #[test]
    fn test_empty_slice_keeps_position() {
        let seq = VirtualCharSeq::from_str("abc");
        assert_eq!(seq.slice(0..0).span(), Span::point(0));
        assert_eq!(seq.slice(1..1).span(), Span::point(1));
        // Past the last character the position is the end of the text.
        assert_eq!(seq.slice(3..3).span(), Span::point(3));
        assert!(seq.slice(2..2).is_empty());
    }

    #[test]
    fn test_empty_text() {
        let seq = VirtualCharSeq::from_str("");
        assert!(seq.is_empty());
        assert_eq!(seq.span(), Span::point(0));
        assert_eq!(seq.first(), None);
        assert_eq!(seq.last(), None);
    }

    #[test]
    fn test_content_equality() {
        let a = VirtualCharSeq::from_str("abc");
        let b = VirtualCharSeq::from_str("abc");
        assert_eq!(a, b);

        // Same characters at different source offsets are not equal.
        let shifted = VirtualCharSeq::from_str("xabc").slice(1..4);
        assert_eq!(shifted.to_source_string(), "abc");
        assert_ne!(a, shifted);

        // Slices of independent backings compare by content.
        let c = VirtualCharSeq::from_str("abcdef").slice(0..3);
        assert_eq!(a, c);
    }

    #[test]
    fn test_display_and_char_at() {
        let seq = VirtualCharSeq::from_str("x*");
        assert_eq!(format!("{seq}"), "x*");
        assert_eq!(seq.char_at(1), Some('*'));
        assert_eq!(seq.char_at(2), None);
    }
}
