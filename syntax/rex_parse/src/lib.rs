//! Recursive descent regex parser.
//!
//! [`try_parse`] turns pattern text into a [`Tree`]: a lossless syntax
//! tree with diagnostics attached to the tokens that caused them. The
//! parser accepts anything; malformed syntax degrades into text nodes
//! and missing tokens rather than failing, so editors can highlight and
//! navigate broken patterns. The only way to not get a tree back is
//! nesting deep enough to exhaust the recursion budget.
//!
//! # Two passes
//!
//! Patterns can reference captures declared later (`\2(b)(a)` is fine),
//! so parsing runs twice. The discovery pass parses with empty capture
//! tables to find the declarations; the capture analyzer then assigns
//! numbers; the validating pass re-parses from scratch against the real
//! tables, and its tree is the one returned. The passes can disagree on
//! shape - `\12` is a backreference exactly when group 12 exists,
//! otherwise an octal escape - which is why the second pass starts over
//! instead of patching the first tree. The analyzer only reads capture
//! declarations, and those parse the same way in both shapes.

mod grammar;
mod guard;

#[cfg(test)]
mod tests;

pub use guard::{DepthExceeded, DEFAULT_DEPTH_LIMIT};

use std::collections::BTreeMap;

use rex_diagnostic::{messages, Diagnostic};
use rex_lexer::Scanner;
use rex_syntax::{PatternFlags, Root, Token, TokenKind, Tree};
use rex_text::{Span, VirtualCharSeq};
use tracing::debug;

use crate::guard::RecursionGuard;

/// Parses `text` as a regex pattern under `options`.
///
/// Returns a tree for any realistic input, however broken; `None` means
/// the pattern nested beyond [`DEFAULT_DEPTH_LIMIT`].
pub fn try_parse(text: VirtualCharSeq, options: PatternFlags) -> Option<Tree> {
    try_parse_with_limit(text, options, DEFAULT_DEPTH_LIMIT)
}

/// [`try_parse`] with an explicit recursion budget.
pub fn try_parse_with_limit(
    text: VirtualCharSeq,
    options: PatternFlags,
    depth_limit: usize,
) -> Option<Tree> {
    debug!(len = text.len(), ?options, depth_limit, "discovery pass");
    let discovery = Parser::new(
        text.clone(),
        options,
        depth_limit,
        BTreeMap::new(),
        BTreeMap::new(),
    );
    let discovered = match discovery.parse_root() {
        Ok(root) => root,
        Err(error) => {
            debug!(depth = error.depth, "parse abandoned: nesting too deep");
            return None;
        }
    };

    let (names, numbers) = rex_captures::analyze(&text, &discovered, options);
    debug!(
        names = names.len(),
        numbers = numbers.len(),
        "validating pass"
    );

    let validating = Parser::new(
        text.clone(),
        options,
        depth_limit,
        names.clone(),
        numbers.clone(),
    );
    match validating.parse_root() {
        Ok(root) => Some(Tree::new(text, root, names, numbers)),
        Err(error) => {
            debug!(depth = error.depth, "parse abandoned: nesting too deep");
            None
        }
    }
}

/// Parser state for one pass.
///
/// `current` is the one-token lookahead. Invariant: the scanner always
/// sits just past `current`'s characters (trivia included). Speculative
/// parses save the scanner position, drive the scanner directly, and
/// re-prime `current` when they commit or rewind.
struct Parser {
    scanner: Scanner,
    /// Options in effect at the current position. `(?i)` overwrites this
    /// for the rest of the enclosing sequence; scoped constructs save
    /// and restore around their bodies.
    options: PatternFlags,
    current: Token,
    captures_by_name: BTreeMap<String, Span>,
    captures_by_number: BTreeMap<i32, Span>,
    guard: RecursionGuard,
}

impl Parser {
    fn new(
        text: VirtualCharSeq,
        options: PatternFlags,
        depth_limit: usize,
        captures_by_name: BTreeMap<String, Span>,
        captures_by_number: BTreeMap<i32, Span>,
    ) -> Parser {
        let mut scanner = Scanner::new(text);
        let current = scanner.scan_next_token(true, options);
        Parser {
            scanner,
            options,
            current,
            captures_by_name,
            captures_by_number,
            guard: RecursionGuard::new(depth_limit),
        }
    }

    /// Consumes the whole pattern. Stray close parens become text with
    /// diagnostics rather than stopping the parse, so the expression
    /// always reaches the end of the text.
    fn parse_root(mut self) -> Result<Root, DepthExceeded> {
        let expression = self.parse_alternating_sequences(false, false)?;
        debug_assert_eq!(self.current.kind, TokenKind::EndOfFile);
        Ok(Root {
            expression,
            end_of_file: self.current,
        })
    }

    // --- lookahead plumbing ---------------------------------------------

    /// Returns `current` and scans the next token in its place.
    #[inline]
    fn consume(&mut self, allow_trivia: bool) -> Token {
        let next = self.scanner.scan_next_token(allow_trivia, self.options);
        std::mem::replace(&mut self.current, next)
    }

    /// Re-primes `current` after the scanner was driven directly. The
    /// stale lookahead is dropped; callers that need it take it first.
    #[inline]
    fn refresh(&mut self, allow_trivia: bool) {
        self.current = self.scanner.scan_next_token(allow_trivia, self.options);
    }

    /// Rewinds the scanner and re-primes the lookahead from there.
    fn reload(&mut self, position: usize, allow_trivia: bool) {
        self.scanner.set_position(position);
        self.refresh(allow_trivia);
    }

    /// Scanner position of `current`'s first own character.
    #[inline]
    fn current_start(&self) -> usize {
        self.current.chars.offset() - self.scanner.text().offset()
    }

    /// An empty character window where `current` starts, for missing
    /// tokens: a missing token points at the position the token that
    /// follows the gap begins (the end of the text when at the end).
    fn missing_chars(&self) -> VirtualCharSeq {
        let position = self.current_start();
        self.scanner.text().slice(position..position)
    }

    // --- capture tables -------------------------------------------------

    fn has_capture_number(&self, number: i32) -> bool {
        self.captures_by_number.contains_key(&number)
    }

    fn has_capture_name(&self, name: &str) -> bool {
        self.captures_by_name.contains_key(name)
    }

    fn is_declared_reference(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Number => token
                .number_value()
                .is_some_and(|number| self.has_capture_number(number)),
            _ => self.has_capture_name(&token.chars.to_source_string()),
        }
    }

    /// Attaches the undefined-group diagnostic when a reference token
    /// resolves against neither table. The discovery pass runs with
    /// empty tables, so its diagnostics are throwaway along with its
    /// tree; only the validating pass's verdict survives.
    fn check_reference(&self, token: Token) -> Token {
        match token.kind {
            TokenKind::Number => match token.number_value() {
                Some(number) if !self.has_capture_number(number) => {
                    let span = token.span();
                    token.with_diagnostic_if_none(Diagnostic::new(
                        messages::undefined_group_number(number),
                        span,
                    ))
                }
                _ => token,
            },
            TokenKind::CaptureName => {
                let name = token.chars.to_source_string();
                if self.has_capture_name(&name) {
                    token
                } else {
                    let span = token.span();
                    token.with_diagnostic_if_none(Diagnostic::new(
                        messages::undefined_group_name(&name),
                        span,
                    ))
                }
            }
            _ => token,
        }
    }
}
