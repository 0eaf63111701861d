//! Diagnostics for the Rex regex parser.
//!
//! Pattern errors are data, not control flow: the parser accepts every
//! input and records what was wrong as `Diagnostic` values attached to
//! the tokens that caused them. Hosts that embed the parser collect the
//! diagnostics off the tree and render them however they like; this
//! crate deliberately has no rendering layer.
//!
//! Message text lives in [`messages`] and reproduces the reference
//! engine's strings bit for bit, because hosts surface these alongside
//! the engine's own runtime errors and the two must agree.

use std::cmp::Ordering;
use std::fmt;

use rex_text::Span;

pub mod messages;

/// A single pattern diagnostic: what went wrong and where.
///
/// Equality and hashing are structural, which is what tree-level
/// de-duplication keys on. Ordering is by span, then message; the tree
/// itself keeps first-seen order and only tests sort.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
        }
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.span.start, self.span.end, &self.message).cmp(&(
            other.span.start,
            other.span.end,
            &other.message,
        ))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}
