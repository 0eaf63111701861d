//! `(...)` constructs.
//!
//! `parse_grouping` is entered with the lookahead on the open paren.
//! Dispatch works on raw characters after `(?` because the construct
//! headers (`?<name>`, `?imsx-imsx:`, `?(`) are not made of tokens the
//! ordinary scan produces; helpers drive the scanner directly and
//! re-prime the lookahead when the header is decided.

use rex_diagnostic::{messages, Diagnostic};
use rex_syntax::{GroupingNode, Node, PatternFlags, Token, TokenKind};
use tracing::trace;

use crate::guard::DepthExceeded;
use crate::Parser;

impl Parser {
    pub(crate) fn parse_grouping(&mut self) -> Result<Node, DepthExceeded> {
        let start = self.scanner.position();
        let open_paren = self.consume(false);
        debug_assert_eq!(open_paren.kind, TokenKind::OpenParen);

        if self.current.kind == TokenKind::Question {
            self.parse_grouping_construct(open_paren)
        } else {
            // Plain group. The body's first token was scanned without
            // trivia for the `?` check; re-read it with trivia so `x`
            // mode blanks attach inside the group where they belong.
            self.reload(start, true);
            self.parse_simple_grouping(open_paren)
        }
    }

    fn parse_simple_grouping(&mut self, open_paren: Token) -> Result<Node, DepthExceeded> {
        let expression = self.parse_grouping_body(false)?;
        let close_paren = self.parse_grouping_close_paren();
        Ok(Node::Grouping(GroupingNode::Simple {
            open_paren,
            expression: Box::new(expression),
            close_paren,
        }))
    }

    /// A grouping body, with the option set put back once the body ends.
    /// A `(?i)` toggle inside the body reaches to the body's close paren
    /// and no further; only a bare `(?i)` grouping itself escapes this,
    /// and that form never parses a body.
    fn parse_grouping_body(&mut self, is_conditional: bool) -> Result<Node, DepthExceeded> {
        let saved = self.options;
        let expression = self.parse_alternating_sequences(true, is_conditional);
        self.options = saved;
        expression
    }

    /// The close paren of any grouping. When absent a missing token is
    /// synthesized at the gap; the body has already consumed everything
    /// it legally could.
    pub(crate) fn parse_grouping_close_paren(&mut self) -> Token {
        if self.current.kind == TokenKind::CloseParen {
            self.consume(true)
        } else {
            let chars = self.missing_chars();
            let span = chars.span();
            Token::missing(TokenKind::CloseParen, chars)
                .with_diagnostic_if_none(Diagnostic::new(messages::NOT_ENOUGH_CLOSE_PARENS, span))
        }
    }

    /// Dispatch for `(?`. On entry `current` is the question token and
    /// the scanner sits just past it, so raw probes see the construct
    /// header exactly.
    fn parse_grouping_construct(&mut self, open_paren: Token) -> Result<Node, DepthExceeded> {
        debug_assert_eq!(self.current.kind, TokenKind::Question);
        let question = self.current.clone();

        if let Some(options) = self.scanner.try_scan_options() {
            return self.parse_options_grouping(open_paren, question, options);
        }

        match self.scanner.text().char_at(self.scanner.position()) {
            Some('(') => self.parse_conditional_grouping(open_paren, question),
            Some('<') if self.scanner.is_at("<=") || self.scanner.is_at("<!") => {
                self.parse_lookbehind_grouping(open_paren, question)
            }
            Some('<' | '\'') => self.parse_named_capture_grouping(open_paren, question),
            Some(':') => {
                self.consume(false);
                let colon = self.consume(true);
                let expression = self.parse_grouping_body(false)?;
                let close_paren = self.parse_grouping_close_paren();
                Ok(Node::Grouping(GroupingNode::NonCapturing {
                    open_paren,
                    question,
                    colon,
                    expression: Box::new(expression),
                    close_paren,
                }))
            }
            Some('=' | '!') => self.parse_lookahead_grouping(open_paren, question),
            Some('>') => {
                self.consume(false);
                let greater_than = self.consume(true);
                let expression = self.parse_grouping_body(false)?;
                let close_paren = self.parse_grouping_close_paren();
                Ok(Node::Grouping(GroupingNode::Atomic {
                    open_paren,
                    question,
                    greater_than,
                    expression: Box::new(expression),
                    close_paren,
                }))
            }
            _ => {
                // Not a construct the grammar knows. `(?)` gets a pass -
                // the orphaned `?` inside the reparsed body carries the
                // complaint - everything else marks the open paren.
                let open_paren = if self.scanner.is_at(")") {
                    open_paren
                } else {
                    let span = open_paren.span();
                    open_paren.with_diagnostic_if_none(Diagnostic::new(
                        messages::UNRECOGNIZED_GROUPING,
                        span,
                    ))
                };
                self.reload(self.current_start(), true);
                self.parse_simple_grouping(open_paren)
            }
        }
    }

    /// `(?imsx-imsx)` and `(?imsx-imsx:...)`. The options token is
    /// already scanned; what follows decides the shape.
    fn parse_options_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        options: Token,
    ) -> Result<Node, DepthExceeded> {
        if self.scanner.is_at(")") {
            self.consume(false);
            // The toggle applies from here to the end of the enclosing
            // sequence, including the trivia scan after the `)`.
            self.options = self
                .options
                .apply_option_run(options.chars.iter().map(|vc| vc.ch));
            let close_paren = self.consume(true);
            return Ok(Node::Grouping(GroupingNode::SimpleOptions {
                open_paren,
                question,
                options,
                close_paren,
            }));
        }

        if self.scanner.is_at(":") {
            self.consume(false);
            let embedded = self
                .options
                .apply_option_run(options.chars.iter().map(|vc| vc.ch));
            let saved = self.options;
            self.options = embedded;
            let colon = self.consume(true);
            let expression = self.parse_grouping_body(false);
            self.options = saved;
            let expression = expression?;
            let close_paren = self.parse_grouping_close_paren();
            return Ok(Node::Grouping(GroupingNode::NestedOptions {
                open_paren,
                question,
                options,
                colon,
                expression: Box::new(expression),
                close_paren,
            }));
        }

        // `(?im_` - junk after the option letters.
        let span = open_paren.span();
        let open_paren = open_paren
            .with_diagnostic_if_none(Diagnostic::new(messages::UNRECOGNIZED_GROUPING, span));
        self.reload(self.current_start(), true);
        self.parse_simple_grouping(open_paren)
    }

    fn parse_lookahead_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, DepthExceeded> {
        self.consume(false);
        // Lookaheads in a right-to-left pattern still match left to right.
        let saved = self.options;
        self.options = saved & !PatternFlags::RIGHT_TO_LEFT;
        let operator = self.consume(true);
        let expression = self.parse_grouping_body(false);
        self.options = saved;
        let expression = expression?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::Grouping(if operator.kind == TokenKind::Equals {
            GroupingNode::PositiveLookahead {
                open_paren,
                question,
                equals: operator,
                expression: Box::new(expression),
                close_paren,
            }
        } else {
            GroupingNode::NegativeLookahead {
                open_paren,
                question,
                exclamation: operator,
                expression: Box::new(expression),
                close_paren,
            }
        }))
    }

    fn parse_lookbehind_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, DepthExceeded> {
        self.consume(false);
        let less_than = self.consume(false);
        let saved = self.options;
        self.options = saved | PatternFlags::RIGHT_TO_LEFT;
        let operator = self.consume(true);
        let expression = self.parse_grouping_body(false);
        self.options = saved;
        let expression = expression?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::Grouping(if operator.kind == TokenKind::Equals {
            GroupingNode::PositiveLookbehind {
                open_paren,
                question,
                less_than,
                equals: operator,
                expression: Box::new(expression),
                close_paren,
            }
        } else {
            GroupingNode::NegativeLookbehind {
                open_paren,
                question,
                less_than,
                exclamation: operator,
                expression: Box::new(expression),
                close_paren,
            }
        }))
    }

    /// `(?<name>...)`, `(?'name'...)` and the balancing forms. No trivia
    /// is legal anywhere in the header, and the name may also be a
    /// number (declaring that group number directly).
    fn parse_named_capture_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, DepthExceeded> {
        self.consume(false);
        let open = self.current.clone();
        debug_assert!(matches!(
            open.kind,
            TokenKind::LessThan | TokenKind::SingleQuote
        ));
        let close_kind = if open.kind == TokenKind::LessThan {
            TokenKind::GreaterThan
        } else {
            TokenKind::SingleQuote
        };

        let first_capture = self
            .scanner
            .try_scan_number_or_capture_name()
            .map(check_capture_zero);

        if self.scanner.is_at("-") {
            return self.parse_balancing_grouping(open_paren, question, open, close_kind, first_capture);
        }

        let capture = match first_capture {
            Some(token) => token,
            None => self.missing_capture_name(),
        };
        let close = self.scan_capture_close(close_kind);
        self.refresh(true);
        let expression = self.parse_grouping_body(false)?;
        let close_paren = self.parse_grouping_close_paren();
        Ok(Node::Grouping(GroupingNode::Capture {
            open_paren,
            question,
            open,
            capture,
            close,
            expression: Box::new(expression),
            close_paren,
        }))
    }

    /// `(?<first-second>...)`. Only the first part declares; the second
    /// is a reference and must resolve.
    fn parse_balancing_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        open: Token,
        close_kind: TokenKind,
        first_capture: Option<Token>,
    ) -> Result<Node, DepthExceeded> {
        let minus = self.scanner.scan_next_token(false, self.options);
        debug_assert_eq!(minus.kind, TokenKind::Minus);

        let second_capture = match self.scanner.try_scan_number_or_capture_name() {
            Some(token) => self.check_reference(check_capture_zero(token)),
            None => self.missing_capture_name(),
        };
        let close = self.scan_capture_close(close_kind);
        self.refresh(true);
        let expression = self.parse_grouping_body(false)?;
        let close_paren = self.parse_grouping_close_paren();
        Ok(Node::Grouping(GroupingNode::Balancing {
            open_paren,
            question,
            open,
            first_capture,
            minus,
            second_capture,
            close,
            expression: Box::new(expression),
            close_paren,
        }))
    }

    /// A synthesized capture-name token at the scan position, carrying
    /// the invalid-name diagnostic.
    fn missing_capture_name(&self) -> Token {
        let chars = self.scanner.empty_chars();
        let span = chars.span();
        Token::missing(TokenKind::CaptureName, chars)
            .with_diagnostic_if_none(Diagnostic::new(messages::INVALID_GROUP_NAME, span))
    }

    /// The `>` or `'` closing a capture header, or a missing stand-in.
    fn scan_capture_close(&mut self, close_kind: TokenKind) -> Token {
        let save = self.scanner.position();
        let token = self.scanner.scan_next_token(false, self.options);
        if token.kind == close_kind {
            return token;
        }
        self.scanner.set_position(save);
        let chars = self.scanner.empty_chars();
        let span = chars.span();
        Token::missing(close_kind, chars)
            .with_diagnostic_if_none(Diagnostic::new(messages::INVALID_GROUP_NAME, span))
    }

    /// `(?(...)...)`. A condition that is a plain declared capture name
    /// or any number makes a conditional-capture; anything else reparses
    /// as a grouping condition.
    fn parse_conditional_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, DepthExceeded> {
        self.consume(false);
        let inner_open_paren = self.current.clone();
        debug_assert_eq!(inner_open_paren.kind, TokenKind::OpenParen);
        let after_inner = self.scanner.position();

        match self.scanner.try_scan_number_or_capture_name() {
            Some(token) if token.kind == TokenKind::Number && self.scanner.is_at(")") => {
                let capture = self.check_conditional_number(token);
                self.finish_conditional_capture(open_paren, question, inner_open_paren, capture)
            }
            Some(token)
                if token.kind == TokenKind::CaptureName
                    && self.scanner.is_at(")")
                    && self.has_capture_name(&token.chars.to_source_string()) =>
            {
                self.finish_conditional_capture(open_paren, question, inner_open_paren, token)
            }
            _ => {
                trace!(after_inner, "conditional condition reparsed as expression");
                self.scanner.set_position(after_inner);
                self.parse_conditional_expression_grouping(open_paren, question, after_inner)
            }
        }
    }

    fn finish_conditional_capture(
        &mut self,
        open_paren: Token,
        question: Token,
        inner_open_paren: Token,
        capture: Token,
    ) -> Result<Node, DepthExceeded> {
        let inner_close_paren = self.scanner.scan_next_token(false, self.options);
        debug_assert_eq!(inner_close_paren.kind, TokenKind::CloseParen);
        self.refresh(true);
        let result = self.parse_grouping_body(true)?;
        let close_paren = self.parse_grouping_close_paren();
        Ok(Node::Grouping(GroupingNode::ConditionalCapture {
            open_paren,
            question,
            inner_open_paren,
            capture,
            inner_close_paren,
            result: Box::new(result),
            close_paren,
        }))
    }

    fn check_conditional_number(&self, token: Token) -> Token {
        match token.number_value() {
            Some(number) if !self.has_capture_number(number) => {
                let span = token.span();
                token.with_diagnostic_if_none(Diagnostic::new(messages::UNDEFINED_GROUP, span))
            }
            _ => token,
        }
    }

    /// `(?(` followed by a full grouping condition. Conditions that are
    /// comments or would capture are diagnosed up front, on the inner
    /// open paren, before the grouping parse runs; first-wins then keeps
    /// the specific message over anything the reparse would add.
    fn parse_conditional_expression_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        after_inner: usize,
    ) -> Result<Node, DepthExceeded> {
        let inner_start = after_inner - 1;

        let at_comment = self.scanner.is_at("?#");
        let at_capture = self.scanner.is_at("?'")
            || (self.scanner.is_at("?<") && !self.scanner.is_at("?<=") && !self.scanner.is_at("?<!"));
        let comment_span = if at_comment {
            self.scanner.set_position(inner_start);
            self.scanner
                .try_scan_comment(PatternFlags::empty())
                .map(|trivia| trivia.span())
        } else {
            None
        };

        self.reload(inner_start, false);
        if let Some(span) = comment_span {
            self.current = self
                .current
                .clone()
                .with_diagnostic_if_none(Diagnostic::new(messages::ALTERNATION_COMMENT, span));
        } else if at_capture {
            let span = self.current.span();
            self.current = self
                .current
                .clone()
                .with_diagnostic_if_none(Diagnostic::new(messages::ALTERNATION_CAPTURE, span));
        }

        let grouping = self.parse_grouping()?;
        let result = self.parse_grouping_body(true)?;
        let close_paren = self.parse_grouping_close_paren();
        Ok(Node::Grouping(GroupingNode::ConditionalExpression {
            open_paren,
            question,
            grouping: Box::new(grouping),
            result: Box::new(result),
            close_paren,
        }))
    }
}

/// Declaring capture number zero is reserved for the whole match.
fn check_capture_zero(token: Token) -> Token {
    if token.kind == TokenKind::Number && token.number_value() == Some(0) {
        let span = token.span();
        token.with_diagnostic_if_none(Diagnostic::new(messages::CAPTURE_NUMBER_ZERO, span))
    } else {
        token
    }
}
