//! Recursion depth accounting for the parser.
//!
//! Alternations and character classes are the only self-recursive
//! productions, so both check in with the guard on entry. Exceeding the
//! budget is the parser's one hard failure: it unwinds as an error value
//! rather than risking a stack overflow on adversarial nesting like
//! `((((((...`.

use std::error::Error;
use std::fmt;

/// Default nesting budget for [`crate::try_parse`].
///
/// Generous enough that no human-written pattern gets near it; small
/// enough that a pathological input fails quickly.
pub const DEFAULT_DEPTH_LIMIT: usize = 10_000;

/// Below this depth the remaining-stack probe is skipped entirely, so
/// shallow parses never pay for it.
const MAX_UNCHECKED_DEPTH: usize = 20;

/// The pattern nested deeper than the parser's budget.
///
/// Surfaced to callers of [`crate::try_parse`] as `None`: a tree for such
/// an input would itself be too deep to walk safely.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DepthExceeded {
    /// Depth at which the parse gave up.
    pub depth: usize,
}

impl fmt::Display for DepthExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern nesting exceeded the parser budget at depth {}", self.depth)
    }
}

impl Error for DepthExceeded {}

#[derive(Debug)]
pub(crate) struct RecursionGuard {
    depth: usize,
    limit: usize,
}

impl RecursionGuard {
    pub(crate) fn new(limit: usize) -> RecursionGuard {
        RecursionGuard { depth: 0, limit }
    }

    /// Accounts for one recursive production entry. Fails when the depth
    /// budget is spent, or when the host stack is nearly gone regardless
    /// of the configured limit.
    pub(crate) fn enter(&mut self) -> Result<(), DepthExceeded> {
        self.depth += 1;
        if self.depth > self.limit
            || (self.depth > MAX_UNCHECKED_DEPTH && rex_stack::is_stack_near_exhaustion())
        {
            return Err(DepthExceeded { depth: self.depth });
        }
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        debug_assert!(self.depth > 0, "guard exited more often than entered");
        self.depth -= 1;
    }
}
