//! `\` escapes.
//!
//! Entered with the backslash already consumed and the lookahead on the
//! character after it. Several forms are speculative: capture escapes,
//! category escapes and backreferences all scan ahead and rewind to
//! just after the backslash's lead-in when the full form is not there,
//! re-reading the same characters as something simpler.

use rex_diagnostic::{messages, Diagnostic};
use rex_lexer::is_word_char;
use rex_syntax::{EscapeNode, Node, PatternFlags, Token, TokenKind, TokenValue};
use tracing::trace;

use crate::Parser;

use super::first_char;

impl Parser {
    /// Sequence-level escape. `allow_trivia` is for the token after the
    /// escape; nothing inside an escape ever carries trivia.
    pub(crate) fn parse_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        if self.current.kind == TokenKind::EndOfFile {
            let span = backslash.span();
            let backslash = backslash
                .with_diagnostic_if_none(Diagnostic::new(messages::ILLEGAL_END_BACKSLASH, span));
            let type_token = Token::missing(TokenKind::Text, self.missing_chars());
            return Node::Escape(EscapeNode::Simple {
                backslash,
                type_token,
            });
        }

        match first_char(&self.current) {
            'b' | 'B' | 'A' | 'G' | 'Z' | 'z' => {
                let type_token = self.consume(allow_trivia);
                Node::Escape(EscapeNode::Anchor {
                    backslash,
                    type_token,
                })
            }
            'w' | 'W' | 's' | 'S' | 'd' | 'D' => {
                let type_token = self.consume(allow_trivia);
                Node::Escape(EscapeNode::CharacterClass {
                    backslash,
                    type_token,
                })
            }
            'p' | 'P' => self.parse_category_escape(backslash, allow_trivia),
            'k' => self.parse_possible_k_capture_escape(backslash, allow_trivia),
            '<' | '\'' => self.parse_possible_capture_escape(backslash, allow_trivia),
            '1'..='9' => self.parse_possible_backreference_escape(backslash, allow_trivia),
            _ => self.parse_char_escape(backslash, allow_trivia),
        }
    }

    /// The single-character escapes: octal, hex, unicode, control,
    /// the simple letters, and plain escaped punctuation. Also the
    /// landing site for every speculative form that rewound.
    pub(crate) fn parse_char_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        let ch = first_char(&self.current);
        match ch {
            '0'..='7' => {
                self.scanner.set_position(self.current_start());
                let digits = self.scanner.scan_octal_characters(self.options);
                self.consume(allow_trivia);
                Node::Escape(EscapeNode::Octal { backslash, digits })
            }
            'a' | 'b' | 'e' | 'f' | 'n' | 'r' | 't' | 'v' => {
                let type_token = self.consume(allow_trivia);
                Node::Escape(EscapeNode::Simple {
                    backslash,
                    type_token,
                })
            }
            'x' => {
                let digits = self.scanner.scan_hex_characters(2);
                let type_token = self.consume(allow_trivia);
                Node::Escape(EscapeNode::Hex {
                    backslash,
                    type_token,
                    digits,
                })
            }
            'u' => {
                let digits = self.scanner.scan_hex_characters(4);
                let type_token = self.consume(allow_trivia);
                Node::Escape(EscapeNode::Unicode {
                    backslash,
                    type_token,
                    digits,
                })
            }
            'c' => self.parse_control_escape(backslash, allow_trivia),
            _ => {
                let type_token = self.consume(allow_trivia).with_kind(TokenKind::Text);
                let type_token = if !self.options.contains(PatternFlags::ECMASCRIPT)
                    && is_word_char(ch)
                {
                    let span = type_token.span();
                    type_token
                        .with_diagnostic_if_none(Diagnostic::new(messages::unrecognized_escape(ch), span))
                } else {
                    type_token
                };
                Node::Escape(EscapeNode::Simple {
                    backslash,
                    type_token,
                })
            }
        }
    }

    /// `\cX`. Lowercase letters fold to upper before the `'@'` offset
    /// test; anything outside `'@'..='_'` and `a..=z` is not a control
    /// character and stays unconsumed.
    fn parse_control_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        debug_assert_eq!(first_char(&self.current), 'c');

        let Some(vc) = self.scanner.text().get(self.scanner.position()) else {
            let type_token = self.consume(allow_trivia);
            let span = type_token.span();
            let type_token =
                type_token.with_diagnostic_if_none(Diagnostic::new(messages::MISSING_CONTROL, span));
            let control = Token::missing(TokenKind::Text, self.missing_chars());
            return Node::Escape(EscapeNode::Control {
                backslash,
                type_token,
                control,
            });
        };

        let folded = if vc.ch.is_ascii_lowercase() {
            vc.ch.to_ascii_uppercase()
        } else {
            vc.ch
        };
        if (folded as u32).wrapping_sub('@' as u32) < 0x20 {
            let control = self.scanner.scan_next_token(false, self.options);
            let type_token = self.consume(allow_trivia);
            Node::Escape(EscapeNode::Control {
                backslash,
                type_token,
                control,
            })
        } else {
            let span = vc.span;
            let type_token = self
                .consume(allow_trivia)
                .with_diagnostic_if_none(Diagnostic::new(messages::UNRECOGNIZED_CONTROL, span));
            let control = Token::missing(TokenKind::Text, self.missing_chars());
            Node::Escape(EscapeNode::Control {
                backslash,
                type_token,
                control,
            })
        }
    }

    /// `\p{Name}` / `\P{Name}`. A structural failure rewinds to just
    /// after the type character and the escape becomes a diagnosed
    /// literal; an unknown but well-braced name stays a category node
    /// with the complaint riding the name token.
    pub(crate) fn parse_category_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        let type_token = self.current.clone();
        let start = self.scanner.position();
        match self.try_scan_category_parts() {
            Ok((open_brace, category, close_brace)) => {
                self.refresh(allow_trivia);
                Node::Escape(EscapeNode::Category {
                    backslash,
                    type_token,
                    open_brace,
                    category,
                    close_brace,
                })
            }
            Err(message) => {
                self.reload(start, allow_trivia);
                let span = type_token.span();
                let type_token = type_token
                    .with_kind(TokenKind::Text)
                    .with_diagnostic_if_none(Diagnostic::new(message, span));
                Node::Escape(EscapeNode::Simple {
                    backslash,
                    type_token,
                })
            }
        }
    }

    /// The `{name}` after `\p`. Err carries which part was wrong; the
    /// caller restores the scanner.
    fn try_scan_category_parts(&mut self) -> Result<(Token, Token, Token), &'static str> {
        if self.scanner.text().len() - self.scanner.position() < 3 {
            return Err(messages::INCOMPLETE_CATEGORY_ESCAPE);
        }
        let open_brace = self.scanner.scan_next_token(false, self.options);
        if open_brace.kind != TokenKind::OpenBrace {
            return Err(messages::MALFORMED_CATEGORY_ESCAPE);
        }
        let Some(category) = self.scanner.try_scan_escape_category() else {
            return Err(messages::UNKNOWN_PROPERTY);
        };
        let close_brace = self.scanner.scan_next_token(false, self.options);
        if close_brace.kind != TokenKind::CloseBrace {
            return Err(messages::INCOMPLETE_CATEGORY_ESCAPE);
        }
        Ok((open_brace, category, close_brace))
    }

    /// `\k<name>` / `\k'name'`. Broken delimiters diagnose and keep the
    /// `k` as literal text. A well-formed reference to a group that was
    /// never declared instead rewinds and rescans `\k` as an ordinary
    /// escape, matching the engine's ECMAScript-driven tolerance; the
    /// ordinary scan supplies its own complaint outside ECMAScript mode.
    fn parse_possible_k_capture_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        let type_token = self.current.clone();
        let type_start = self.current_start();
        let after_type = self.scanner.position();

        if matches!(self.scanner.text().char_at(after_type), Some('<' | '\'')) {
            self.refresh(false);
            if let Some((open, capture, close)) = self.scan_capture_escape_parts(allow_trivia) {
                if self.is_declared_reference(&capture) {
                    return Node::Escape(EscapeNode::KCapture {
                        backslash,
                        type_token,
                        open,
                        capture,
                        close,
                    });
                }
                self.reload(type_start, false);
                return self.parse_char_escape(backslash, allow_trivia);
            }
        }

        let span = backslash.span().merge(type_token.span());
        let backslash = backslash
            .with_diagnostic_if_none(Diagnostic::new(messages::MALFORMED_NAMED_REFERENCE, span));
        self.reload(after_type, allow_trivia);
        Node::Escape(EscapeNode::Simple {
            backslash,
            type_token: type_token.with_kind(TokenKind::Text),
        })
    }

    /// `\<name>` / `\'name'`. Any missing part rewinds to the delimiter
    /// and rescans it as a plain escaped character.
    fn parse_possible_capture_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        let delimiter_start = self.current_start();
        match self.scan_capture_escape_parts(allow_trivia) {
            Some((open, capture, close)) => {
                let capture = self.check_reference(capture);
                Node::Escape(EscapeNode::Capture {
                    backslash,
                    open,
                    capture,
                    close,
                })
            }
            None => {
                self.reload(delimiter_start, false);
                self.parse_char_escape(backslash, allow_trivia)
            }
        }
    }

    /// Open delimiter (the lookahead), a name or number, and the
    /// matching close. On success the lookahead moves past the close;
    /// on decline the scanner is left wherever the scan died and the
    /// caller rewinds.
    fn scan_capture_escape_parts(&mut self, allow_trivia: bool) -> Option<(Token, Token, Token)> {
        let open = self.current.clone();
        debug_assert!(matches!(
            open.kind,
            TokenKind::LessThan | TokenKind::SingleQuote
        ));
        let close_char = if open.kind == TokenKind::LessThan { '>' } else { '\'' };

        let capture = self.scanner.try_scan_number_or_capture_name()?;
        if self.scanner.text().char_at(self.scanner.position()) != Some(close_char) {
            return None;
        }
        let close = self.scanner.scan_next_token(false, self.options);
        self.refresh(allow_trivia);
        Some((open, capture, close))
    }

    fn parse_possible_backreference_escape(&mut self, backslash: Token, allow_trivia: bool) -> Node {
        if self.options.contains(PatternFlags::ECMASCRIPT) {
            self.parse_possible_ecmascript_backreference_escape(backslash, allow_trivia)
        } else {
            self.parse_possible_regular_backreference_escape(backslash, allow_trivia)
        }
    }

    /// `\n` outside ECMAScript mode: one whole number, accepted as a
    /// backreference when it resolves or is a single digit (those always
    /// were references, declared or not), otherwise rewound and rescanned
    /// as an octal or plain escape.
    fn parse_possible_regular_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia: bool,
    ) -> Node {
        let start = self.current_start();
        self.scanner.set_position(start);

        // The lookahead is a digit, so the scan cannot decline.
        let Some(number) = self.scanner.try_scan_number() else {
            self.reload(start, false);
            return self.parse_char_escape(backslash, allow_trivia);
        };

        let accept = number
            .number_value()
            .is_some_and(|n| self.has_capture_number(n) || n <= 9);
        if accept {
            let number = self.check_reference(number);
            self.refresh(allow_trivia);
            Node::Escape(EscapeNode::Backreference { backslash, number })
        } else {
            trace!(start, "backreference declined, rescanning as octal or char escape");
            self.reload(start, false);
            self.parse_char_escape(backslash, allow_trivia)
        }
    }

    /// ECMAScript `\n`: walk the digit run keeping the longest prefix
    /// that names a declared capture; only that prefix is consumed. No
    /// prefix resolving means the run was never a reference at all.
    fn parse_possible_ecmascript_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia: bool,
    ) -> Node {
        let start = self.current_start();
        let text = self.scanner.text().clone();

        let mut value: i32 = 0;
        let mut best: Option<(usize, i32)> = None;
        let mut position = start;
        while let Some(digit) = text.char_at(position).and_then(|ch| ch.to_digit(10)) {
            position += 1;
            value = value.wrapping_mul(10).wrapping_add(digit as i32);
            if self.has_capture_number(value) {
                best = Some((position, value));
            }
        }

        match best {
            Some((end, number)) => {
                let token = Token::new(TokenKind::Number, text.slice(start..end))
                    .with_value(TokenValue::Number(number));
                self.reload(end, allow_trivia);
                Node::Escape(EscapeNode::Backreference {
                    backslash,
                    number: token,
                })
            }
            None => {
                self.reload(start, false);
                self.parse_char_escape(backslash, allow_trivia)
            }
        }
    }
}
