use rex_diagnostic::{messages, Diagnostic};
use rex_syntax::{PatternFlags, Token, TokenKind, TokenValue, Trivia, TriviaKind};
use rex_text::{VirtualChar, VirtualCharSeq};

use crate::categories::is_valid_unicode_category;
use crate::is_word_char;

/// Tokenizer over a [`VirtualCharSeq`].
///
/// The scanner owns a position, nothing else. The parser drives it: it decides
/// whether trivia is legal at the current position, which multi-character
/// scans to attempt, and when to rewind. Rewinding is just
/// [`set_position`](Scanner::set_position) with a previously saved
/// [`position`](Scanner::position).
#[derive(Debug)]
pub struct Scanner {
    text: VirtualCharSeq,
    position: usize,
}

impl Scanner {
    pub fn new(text: VirtualCharSeq) -> Self {
        Scanner { text, position: 0 }
    }

    /// The full text being scanned.
    #[inline]
    pub fn text(&self) -> &VirtualCharSeq {
        &self.text
    }

    /// Current position, in characters from the start of the text.
    ///
    /// The position one past the last character is valid; it means the
    /// scanner is at the end.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the scanner to `position`.
    pub fn set_position(&mut self, position: usize) {
        debug_assert!(
            position <= self.text.len(),
            "scanner position {} out of bounds (max {})",
            position,
            self.text.len()
        );
        self.position = position;
    }

    /// An empty window at the current position, for missing tokens. Its span
    /// is the zero-width span right here.
    #[inline]
    pub fn empty_chars(&self) -> VirtualCharSeq {
        self.text.slice(self.position..self.position)
    }

    #[inline]
    fn current(&self) -> Option<VirtualChar> {
        self.text.get(self.position)
    }

    /// Whether the text at the current position starts with `prefix`.
    /// Consumes nothing.
    pub fn is_at(&self, prefix: &str) -> bool {
        prefix
            .chars()
            .enumerate()
            .all(|(i, ch)| self.text.char_at(self.position + i) == Some(ch))
    }

    /// Scans the next token: leading trivia if `allow_trivia`, then one
    /// character, classified. At the end of the text this returns an
    /// end-of-file token with empty characters, so trailing trivia still
    /// ends up owned by a token.
    pub fn scan_next_token(&mut self, allow_trivia: bool, options: PatternFlags) -> Token {
        let leading_trivia = if allow_trivia {
            self.scan_leading_trivia(options)
        } else {
            Vec::new()
        };

        match self.current() {
            None => Token::with_trivia(TokenKind::EndOfFile, leading_trivia, self.empty_chars()),
            Some(vc) => {
                let start = self.position;
                self.position += 1;
                let chars = self.text.slice(start..self.position);
                Token::with_trivia(classify_char(vc.ch), leading_trivia, chars)
            }
        }
    }

    fn scan_leading_trivia(&mut self, options: PatternFlags) -> Vec<Trivia> {
        let mut result = Vec::new();
        loop {
            if let Some(comment) = self.try_scan_comment(options) {
                result.push(comment);
                continue;
            }
            if let Some(whitespace) = self.try_scan_whitespace(options) {
                result.push(whitespace);
                continue;
            }
            break;
        }
        result
    }

    /// Scans a comment if one starts here.
    ///
    /// `(?#...)` comments are recognized under any options; `#` comments
    /// running to the end of the line only under `x` mode. An unterminated
    /// `(?#` comment consumes the rest of the text and carries the
    /// diagnostic on the trivia itself.
    pub fn try_scan_comment(&mut self, options: PatternFlags) -> Option<Trivia> {
        if self.is_at("(?#") {
            let start = self.position;
            while self.current().is_some_and(|vc| vc.ch != ')') {
                self.position += 1;
            }
            if self.current().is_none() {
                let chars = self.text.slice(start..self.position);
                let diagnostic = Diagnostic::new(messages::UNTERMINATED_COMMENT, chars.span());
                return Some(Trivia::with_diagnostic(TriviaKind::Comment, chars, diagnostic));
            }
            self.position += 1;
            let chars = self.text.slice(start..self.position);
            return Some(Trivia::new(TriviaKind::Comment, chars));
        }

        if options.contains(PatternFlags::IGNORE_PATTERN_WHITESPACE)
            && self.current().is_some_and(|vc| vc.ch == '#')
        {
            // The newline is left for the whitespace scan.
            let start = self.position;
            while self.current().is_some_and(|vc| vc.ch != '\n') {
                self.position += 1;
            }
            let chars = self.text.slice(start..self.position);
            return Some(Trivia::new(TriviaKind::Comment, chars));
        }

        None
    }

    fn try_scan_whitespace(&mut self, options: PatternFlags) -> Option<Trivia> {
        if !options.contains(PatternFlags::IGNORE_PATTERN_WHITESPACE) {
            return None;
        }
        let start = self.position;
        while self.current().is_some_and(|vc| is_blank(vc.ch)) {
            self.position += 1;
        }
        if self.position == start {
            return None;
        }
        let chars = self.text.slice(start..self.position);
        Some(Trivia::new(TriviaKind::Whitespace, chars))
    }

    /// Scans a run of decimal digits into a number token.
    ///
    /// The value accumulates with wrapping arithmetic; overflowing `i32`
    /// attaches the too-large diagnostic but keeps the wrapped value, so the
    /// token text is still consumed exactly once.
    pub fn try_scan_number(&mut self) -> Option<Token> {
        const MAX_VALUE_DIV_10: i32 = i32::MAX / 10;
        const MAX_VALUE_MOD_10: i32 = i32::MAX % 10;

        self.current().filter(|vc| vc.ch.is_ascii_digit())?;

        let start = self.position;
        let mut value = 0i32;
        let mut overflowed = false;
        while let Some(digit) = self.current().and_then(|vc| vc.ch.to_digit(10)) {
            self.position += 1;
            let digit = digit as i32;
            if value > MAX_VALUE_DIV_10 || (value == MAX_VALUE_DIV_10 && digit > MAX_VALUE_MOD_10) {
                overflowed = true;
            }
            value = value.wrapping_mul(10).wrapping_add(digit);
        }

        let chars = self.text.slice(start..self.position);
        let mut token =
            Token::new(TokenKind::Number, chars).with_value(TokenValue::Number(value));
        if overflowed {
            let span = token.span();
            token =
                token.with_diagnostic_if_none(Diagnostic::new(messages::CAPTURE_TOO_LARGE, span));
        }
        Some(token)
    }

    /// Scans a run of word characters into a capture name token.
    pub fn try_scan_capture_name(&mut self) -> Option<Token> {
        let start = self.position;
        while self.current().is_some_and(|vc| is_word_char(vc.ch)) {
            self.position += 1;
        }
        if self.position == start {
            return None;
        }
        let chars = self.text.slice(start..self.position);
        Some(Token::new(TokenKind::CaptureName, chars))
    }

    /// A number if digits come first, otherwise a capture name.
    pub fn try_scan_number_or_capture_name(&mut self) -> Option<Token> {
        self.try_scan_number().or_else(|| self.try_scan_capture_name())
    }

    /// Scans a run of option characters (`imnsx` in either case, `+`, `-`).
    pub fn try_scan_options(&mut self) -> Option<Token> {
        let start = self.position;
        while self.current().is_some_and(|vc| is_option_char(vc.ch)) {
            self.position += 1;
        }
        if self.position == start {
            return None;
        }
        let chars = self.text.slice(start..self.position);
        Some(Token::new(TokenKind::Options, chars))
    }

    /// Scans the name inside `\p{...}`. Unknown names are still scanned;
    /// the diagnostic rides on the token.
    pub fn try_scan_escape_category(&mut self) -> Option<Token> {
        let start = self.position;
        while self.current().is_some_and(|vc| is_escape_category_char(vc.ch)) {
            self.position += 1;
        }
        if self.position == start {
            return None;
        }
        let chars = self.text.slice(start..self.position);
        let name = chars.to_source_string();
        let mut token = Token::new(TokenKind::EscapeCategory, chars);
        if !is_valid_unicode_category(&name) {
            let span = token.span();
            token = token
                .with_diagnostic_if_none(Diagnostic::new(messages::unknown_property(&name), span));
        }
        Some(token)
    }

    /// Scans up to three octal digits. The caller has already checked the
    /// first character is an octal digit.
    ///
    /// In ECMAScript mode the scan stops after the digit that brings the
    /// accumulated value to 0x20 or above.
    pub fn scan_octal_characters(&mut self, options: PatternFlags) -> Token {
        let start = self.position;
        let mut value = 0;
        for _ in 0..3 {
            let Some(digit) = self.current().and_then(|vc| vc.ch.to_digit(8)) else {
                break;
            };
            value = value * 8 + digit;
            self.position += 1;
            if options.contains(PatternFlags::ECMASCRIPT) && value >= 0x20 {
                break;
            }
        }
        debug_assert!(self.position > start, "caller checked the first digit");
        Token::new(TokenKind::Text, self.text.slice(start..self.position))
    }

    /// Scans exactly `count` hex digits; fewer attaches the insufficient
    /// digits diagnostic to however much was consumed.
    pub fn scan_hex_characters(&mut self, count: usize) -> Token {
        let start = self.position;
        for _ in 0..count {
            if self.current().is_some_and(|vc| vc.ch.is_ascii_hexdigit()) {
                self.position += 1;
            } else {
                break;
            }
        }
        let chars = self.text.slice(start..self.position);
        let mut token = Token::new(TokenKind::Text, chars);
        if self.position - start != count {
            let span = token.span();
            token = token
                .with_diagnostic_if_none(Diagnostic::new(messages::INSUFFICIENT_HEX_DIGITS, span));
        }
        token
    }

    /// Attempts the `[:name:]` POSIX form. The caller has just consumed the
    /// `[`, so the scanner sits one past it; on success the returned text
    /// token covers the whole `[:name:]` and the position is past the final
    /// `]`. On failure nothing is consumed.
    pub fn try_scan_posix_property(&mut self) -> Option<Token> {
        debug_assert!(self.position > 0, "caller consumed the open bracket");
        debug_assert_eq!(self.text.char_at(self.position - 1), Some('['));

        if !self.current().is_some_and(|vc| vc.ch == ':') {
            return None;
        }
        let mut end = self.position + 1;
        while self.text.char_at(end).is_some_and(is_word_char) {
            end += 1;
        }
        if self.text.char_at(end) == Some(':') && self.text.char_at(end + 1) == Some(']') {
            let start = self.position - 1;
            self.position = end + 2;
            Some(Token::new(TokenKind::Text, self.text.slice(start..self.position)))
        } else {
            None
        }
    }
}

fn classify_char(ch: char) -> TokenKind {
    match ch {
        '|' => TokenKind::Bar,
        '$' => TokenKind::Dollar,
        '^' => TokenKind::Caret,
        '.' => TokenKind::Dot,
        '*' => TokenKind::Star,
        '+' => TokenKind::Plus,
        '?' => TokenKind::Question,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '=' => TokenKind::Equals,
        '!' => TokenKind::Exclamation,
        '<' => TokenKind::LessThan,
        '>' => TokenKind::GreaterThan,
        '-' => TokenKind::Minus,
        '\'' => TokenKind::SingleQuote,
        '\\' => TokenKind::Backslash,
        '{' => TokenKind::OpenBrace,
        '}' => TokenKind::CloseBrace,
        '[' => TokenKind::OpenBracket,
        ']' => TokenKind::CloseBracket,
        '(' => TokenKind::OpenParen,
        ')' => TokenKind::CloseParen,
        _ => TokenKind::Text,
    }
}

fn is_blank(ch: char) -> bool {
    ch == ' ' || ('\u{9}'..='\u{D}').contains(&ch)
}

fn is_option_char(ch: char) -> bool {
    ch == '+' || ch == '-' || PatternFlags::is_option_letter(ch)
}

fn is_escape_category_char(ch: char) -> bool {
    ch == '-' || is_word_char(ch)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use rex_text::Span;

    use super::*;

    fn scanner(text: &str) -> Scanner {
        Scanner::new(VirtualCharSeq::from_str(text))
    }

    #[test]
    fn test_single_char_tokens() {
        let mut s = scanner("a|.)");
        let kinds: Vec<TokenKind> = (0..5)
            .map(|_| s.scan_next_token(true, PatternFlags::default()).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Text,
                TokenKind::Bar,
                TokenKind::Dot,
                TokenKind::CloseParen,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_end_of_file_token_is_empty() {
        let mut s = scanner("a");
        s.scan_next_token(true, PatternFlags::default());
        let eof = s.scan_next_token(true, PatternFlags::default());
        assert_eq!(eof.kind, TokenKind::EndOfFile);
        assert!(eof.chars.is_empty());
        assert_eq!(eof.span(), Span::point(1));
    }

    #[test]
    fn test_no_trivia_outside_x_mode() {
        let mut s = scanner(" a");
        let token = s.scan_next_token(true, PatternFlags::default());
        assert_eq!(token.kind, TokenKind::Text);
        assert_eq!(token.chars.to_source_string(), " ");
        assert!(token.leading_trivia.is_empty());
    }

    #[test]
    fn test_x_mode_whitespace_and_line_comment() {
        let mut s = scanner("  # note\na");
        let token = s.scan_next_token(true, PatternFlags::IGNORE_PATTERN_WHITESPACE);
        assert_eq!(token.kind, TokenKind::Text);
        assert_eq!(token.chars.to_source_string(), "a");
        assert_eq!(token.leading_trivia.len(), 3);
        assert_eq!(token.leading_trivia[0].kind, TriviaKind::Whitespace);
        assert_eq!(token.leading_trivia[1].kind, TriviaKind::Comment);
        assert_eq!(token.leading_trivia[1].chars.to_source_string(), "# note");
        // the newline is whitespace, not part of the comment
        assert_eq!(token.leading_trivia[2].chars.to_source_string(), "\n");
    }

    #[test]
    fn test_paren_comment_without_x_mode() {
        let mut s = scanner("(?#hi)b");
        let token = s.scan_next_token(true, PatternFlags::default());
        assert_eq!(token.chars.to_source_string(), "b");
        assert_eq!(token.leading_trivia.len(), 1);
        assert_eq!(token.leading_trivia[0].kind, TriviaKind::Comment);
        assert_eq!(token.leading_trivia[0].chars.to_source_string(), "(?#hi)");
        assert!(token.leading_trivia[0].diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_paren_comment() {
        let mut s = scanner("(?#oops");
        let token = s.scan_next_token(true, PatternFlags::default());
        assert_eq!(token.kind, TokenKind::EndOfFile);
        let trivia = &token.leading_trivia[0];
        assert_eq!(trivia.chars.to_source_string(), "(?#oops");
        assert_eq!(
            trivia.diagnostics,
            vec![Diagnostic::new(messages::UNTERMINATED_COMMENT, Span::new(0, 7))]
        );
    }

    #[test]
    fn test_trivia_suppressed_when_not_allowed() {
        let mut s = scanner("(?#hi)b");
        let token = s.scan_next_token(false, PatternFlags::default());
        assert_eq!(token.kind, TokenKind::OpenParen);
        assert!(token.leading_trivia.is_empty());
    }

    #[test]
    fn test_scan_number() {
        let mut s = scanner("123a");
        let token = s.try_scan_number().unwrap();
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.number_value(), Some(123));
        assert_eq!(token.chars.to_source_string(), "123");
        assert_eq!(s.position(), 3);
        assert!(s.try_scan_number().is_none());
    }

    #[test]
    fn test_scan_number_overflow_wraps_and_diagnoses() {
        let mut s = scanner("2147483648");
        let token = s.try_scan_number().unwrap();
        assert_eq!(token.number_value(), Some(i32::MIN));
        assert_eq!(
            token.diagnostics,
            vec![Diagnostic::new(messages::CAPTURE_TOO_LARGE, Span::new(0, 10))]
        );
        // the whole digit run is consumed regardless
        assert_eq!(s.position(), 10);
    }

    #[test]
    fn test_scan_capture_name() {
        let mut s = scanner("ab_1>");
        let token = s.try_scan_capture_name().unwrap();
        assert_eq!(token.kind, TokenKind::CaptureName);
        assert_eq!(token.chars.to_source_string(), "ab_1");
        assert!(s.try_scan_capture_name().is_none());
        assert_eq!(s.position(), 4);
    }

    #[test]
    fn test_number_preferred_over_name() {
        let mut s = scanner("12ab");
        let token = s.try_scan_number_or_capture_name().unwrap();
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.chars.to_source_string(), "12");
    }

    #[test]
    fn test_scan_options() {
        let mut s = scanner("imsx-n:");
        let token = s.try_scan_options().unwrap();
        assert_eq!(token.kind, TokenKind::Options);
        assert_eq!(token.chars.to_source_string(), "imsx-n");
        assert!(s.try_scan_options().is_none());
    }

    #[test]
    fn test_scan_escape_category() {
        let mut s = scanner("Lu}");
        let token = s.try_scan_escape_category().unwrap();
        assert_eq!(token.kind, TokenKind::EscapeCategory);
        assert!(token.diagnostics.is_empty());

        let mut s = scanner("Qx}");
        let token = s.try_scan_escape_category().unwrap();
        assert_eq!(
            token.diagnostics,
            vec![Diagnostic::new("Unknown property 'Qx'", Span::new(0, 2))]
        );
    }

    #[test]
    fn test_scan_octal_stops_at_three() {
        let mut s = scanner("1234");
        let token = s.scan_octal_characters(PatternFlags::default());
        assert_eq!(token.chars.to_source_string(), "123");
    }

    #[test]
    fn test_scan_octal_ecmascript_stops_at_0x20() {
        // 4, then 4*8+7 = 39 >= 0x20, stop after the second digit
        let mut s = scanner("477");
        let token = s.scan_octal_characters(PatternFlags::ECMASCRIPT);
        assert_eq!(token.chars.to_source_string(), "47");
    }

    #[test]
    fn test_scan_hex_insufficient() {
        let mut s = scanner("4g");
        let token = s.scan_hex_characters(2);
        assert_eq!(token.chars.to_source_string(), "4");
        assert_eq!(
            token.diagnostics,
            vec![Diagnostic::new(messages::INSUFFICIENT_HEX_DIGITS, Span::new(0, 1))]
        );
    }

    #[test]
    fn test_scan_hex_empty_diagnostic_is_zero_width() {
        let mut s = scanner("ab\\x");
        s.set_position(4);
        let token = s.scan_hex_characters(2);
        assert!(token.chars.is_empty());
        assert_eq!(token.diagnostics[0].span, Span::point(4));
    }

    #[test]
    fn test_posix_property() {
        let mut s = scanner("[:alpha:]x");
        s.set_position(1);
        let token = s.try_scan_posix_property().unwrap();
        assert_eq!(token.chars.to_source_string(), "[:alpha:]");
        assert_eq!(s.position(), 9);
    }

    #[test]
    fn test_posix_property_empty_name() {
        let mut s = scanner("[::]");
        s.set_position(1);
        let token = s.try_scan_posix_property().unwrap();
        assert_eq!(token.chars.to_source_string(), "[::]");
    }

    #[test]
    fn test_posix_property_requires_close() {
        let mut s = scanner("[:alpha:");
        s.set_position(1);
        assert!(s.try_scan_posix_property().is_none());
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_is_at() {
        let s = scanner("(?<");
        assert!(s.is_at("(?"));
        assert!(s.is_at("(?<"));
        assert!(!s.is_at("(?<="));
        assert!(!s.is_at("(!"));
    }

    #[test]
    fn test_set_position_rewinds() {
        let mut s = scanner("abc");
        let saved = s.position();
        s.scan_next_token(false, PatternFlags::default());
        s.scan_next_token(false, PatternFlags::default());
        s.set_position(saved);
        let token = s.scan_next_token(false, PatternFlags::default());
        assert_eq!(token.chars.to_source_string(), "a");
    }
}
