//! Tokens and trivia.
//!
//! A token is one unit of pattern syntax plus everything needed for full
//! fidelity: the virtual characters it covers, any whitespace/comment
//! trivia scanned immediately before it, and any diagnostics reported at
//! it. Most tokens cover exactly one character; numbers, capture names,
//! option runs, escape category names and merged text runs are the
//! multi-character exceptions.

use rex_diagnostic::Diagnostic;
use rex_text::{Span, VirtualCharSeq};
use std::fmt;

/// What kind of syntax a token is.
///
/// Punctuation gets one kind per character the grammar distinguishes;
/// everything else is `Text`. Which kind a character scans as depends
/// only on the character, never on grammar context - context decides
/// what the parser *does* with the token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    EndOfFile,
    Text,
    Number,
    CaptureName,
    Options,
    EscapeCategory,
    Bar,
    Dollar,
    Caret,
    Dot,
    Star,
    Plus,
    Question,
    Comma,
    Colon,
    Equals,
    Exclamation,
    LessThan,
    GreaterThan,
    Minus,
    SingleQuote,
    Backslash,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
}

/// Computed payload carried by some tokens.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenValue {
    /// Value of a `Number` token. Accumulated with wrapping 32-bit
    /// arithmetic, matching the engine; overflow is reported as a
    /// diagnostic on the token, not by saturating the value.
    Number(i32),
}

/// What kind of trivia a trivium is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TriviaKind {
    /// Pattern whitespace, only produced under `x` mode.
    Whitespace,
    /// A `(?#...)` comment, or a `#`-to-end-of-line comment in `x` mode.
    Comment,
}

/// A run of non-syntax characters attached to the token that follows.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub chars: VirtualCharSeq,
    pub diagnostics: Vec<Diagnostic>,
}

impl Trivia {
    /// Create clean trivia.
    pub fn new(kind: TriviaKind, chars: VirtualCharSeq) -> Self {
        Trivia {
            kind,
            chars,
            diagnostics: Vec::new(),
        }
    }

    /// Create trivia carrying a diagnostic (e.g. an unterminated comment).
    pub fn with_diagnostic(kind: TriviaKind, chars: VirtualCharSeq, diagnostic: Diagnostic) -> Self {
        Trivia {
            kind,
            chars,
            diagnostics: vec![diagnostic],
        }
    }

    /// Source span of the trivia characters.
    pub fn span(&self) -> Span {
        self.chars.span()
    }
}

/// One token of pattern syntax.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub leading_trivia: Vec<Trivia>,
    pub chars: VirtualCharSeq,
    pub value: Option<TokenValue>,
    pub diagnostics: Vec<Diagnostic>,
    /// True for tokens synthesized where required syntax was absent.
    /// Missing tokens have no characters; their `chars` is an empty
    /// window at the position the syntax should have occupied.
    pub missing: bool,
}

impl Token {
    /// Create a token with no trivia.
    pub fn new(kind: TokenKind, chars: VirtualCharSeq) -> Self {
        Token {
            kind,
            leading_trivia: Vec::new(),
            chars,
            value: None,
            diagnostics: Vec::new(),
            missing: false,
        }
    }

    /// Create a token with leading trivia.
    pub fn with_trivia(kind: TokenKind, leading_trivia: Vec<Trivia>, chars: VirtualCharSeq) -> Self {
        Token {
            kind,
            leading_trivia,
            chars,
            value: None,
            diagnostics: Vec::new(),
            missing: false,
        }
    }

    /// Synthesize a missing token at a position.
    ///
    /// `chars` must be an empty window positioned at the gap.
    pub fn missing(kind: TokenKind, chars: VirtualCharSeq) -> Self {
        debug_assert!(chars.is_empty());
        Token {
            kind,
            leading_trivia: Vec::new(),
            chars,
            value: None,
            diagnostics: Vec::new(),
            missing: true,
        }
    }

    /// Span of the token's own characters (excludes trivia).
    ///
    /// Missing tokens report a zero-length span at their position.
    pub fn span(&self) -> Span {
        self.chars.span()
    }

    /// Span including leading trivia.
    pub fn full_span(&self) -> Span {
        match self.leading_trivia.first() {
            Some(first) => first.span().merge(self.span()),
            None => self.span(),
        }
    }

    /// The numeric value, for `Number` tokens.
    pub fn number_value(&self) -> Option<i32> {
        match self.value {
            Some(TokenValue::Number(n)) => Some(n),
            None => None,
        }
    }

    /// Reinterpret the token as a different kind, keeping everything else.
    ///
    /// Used when grammar context demotes a token (a `*` with nothing to
    /// quantify becomes plain text).
    #[must_use]
    pub fn with_kind(mut self, kind: TokenKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a computed value.
    #[must_use]
    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach a diagnostic unless the token already has one.
    ///
    /// First diagnostic wins: later, usually more derived, errors at the
    /// same token are dropped so the user sees the root cause.
    #[must_use]
    pub fn with_diagnostic_if_none(mut self, diagnostic: Diagnostic) -> Self {
        if self.diagnostics.is_empty() {
            self.diagnostics.push(diagnostic);
        }
        self
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing {
            write!(f, "missing {:?} @ {}", self.kind, self.span())?;
        } else {
            write!(
                f,
                "{:?} {:?} @ {}",
                self.kind,
                self.chars.to_source_string(),
                self.span()
            )?;
        }
        for trivia in &self.leading_trivia {
            write!(f, " [{:?} {:?}]", trivia.kind, trivia.chars.to_source_string())?;
        }
        for diagnostic in &self.diagnostics {
            write!(f, " !{diagnostic}")?;
        }
        Ok(())
    }
}

// Size assertions to prevent accidental regressions
mod size_asserts {
    use super::TokenKind;
    rex_text::static_assert_size!(TokenKind, 1);
}
