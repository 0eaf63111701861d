//! Scanner for regex patterns.
//!
//! The scanner is deliberately thin: by default every character becomes its own
//! single-character [`Token`](rex_syntax::Token), classified by what the
//! character could mean to the grammar. Multi-character tokens (numbers,
//! capture names, option runs, category names) exist only as `try_scan_*`
//! entry points that the parser invokes when its position makes them
//! meaningful. Every `try_scan_*` method restores the scanner position when it
//! declines, so the parser can probe freely.
//!
//! Trivia (whitespace and comments) is attached to the front of the next
//! scanned token, and only when the parser allows it at that position.

mod categories;
mod scanner;

pub use categories::is_valid_unicode_category;
pub use scanner::Scanner;

/// Whether `ch` can appear in a capture name.
///
/// This tracks the engine's word-character set: connector `_`, the zero-width
/// joiner and non-joiner, letters, and numeric characters.
#[inline]
pub fn is_word_char(ch: char) -> bool {
    ch == '_' || ch == '\u{200C}' || ch == '\u{200D}' || ch.is_alphabetic() || ch.is_numeric()
}
