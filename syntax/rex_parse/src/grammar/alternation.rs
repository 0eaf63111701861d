//! Alternations, sequences, quantifiers and primary expressions.

use rex_diagnostic::{messages, Diagnostic};
use rex_syntax::{
    AlternationNode, AnchorNode, GroupingNode, Node, QuantifierNode, SequenceNode, TextNode, Token,
    TokenKind, WildcardNode,
};
use rex_text::Span;
use tracing::trace;

use crate::guard::DepthExceeded;
use crate::Parser;

/// The scanned pieces of a well-formed `{n}`, `{n,}` or `{n,m}`.
enum QuantifierParts {
    Exact {
        number: Token,
        close_brace: Token,
    },
    OpenRange {
        number: Token,
        comma: Token,
        close_brace: Token,
    },
    ClosedRange {
        first_number: Token,
        comma: Token,
        second_number: Token,
        close_brace: Token,
    },
}

impl Parser {
    /// `a|b|c` - a left-associative chain of sequences. This is one of
    /// the two self-recursive productions (through groupings), so it
    /// checks in with the recursion guard.
    ///
    /// In conditional mode every bar past the first is diagnosed: a
    /// conditional's result has at most a yes-branch and a no-branch.
    pub(crate) fn parse_alternating_sequences(
        &mut self,
        stop_at_close_paren: bool,
        is_conditional: bool,
    ) -> Result<Node, DepthExceeded> {
        self.guard.enter()?;
        let result = self.parse_alternating_sequences_worker(stop_at_close_paren, is_conditional);
        self.guard.exit();
        result
    }

    fn parse_alternating_sequences_worker(
        &mut self,
        stop_at_close_paren: bool,
        is_conditional: bool,
    ) -> Result<Node, DepthExceeded> {
        let mut current = self.parse_sequence(stop_at_close_paren)?;
        while self.current.kind == TokenKind::Bar {
            let mut bar = self.consume(true);
            if is_conditional && matches!(current, Node::Alternation(_)) {
                let span = bar.span();
                bar = bar.with_diagnostic_if_none(Diagnostic::new(messages::TOO_MANY_BARS, span));
            }
            let right = self.parse_sequence(stop_at_close_paren)?;
            current = Node::Alternation(AlternationNode {
                left: Box::new(current),
                bar,
                right: Box::new(right),
            });
        }
        Ok(current)
    }

    /// Elements up to a bar, the end of the text, or - inside a grouping -
    /// the close paren the caller will consume. Adjacent plain text
    /// elements merge into one token afterwards.
    fn parse_sequence(&mut self, stop_at_close_paren: bool) -> Result<Node, DepthExceeded> {
        let mut elements: Vec<Node> = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::EndOfFile | TokenKind::Bar => break,
                TokenKind::CloseParen if stop_at_close_paren => break,
                _ => {}
            }
            let element = self.parse_primary_expression_and_quantifiers(elements.last())?;
            elements.push(element);
        }
        Ok(Node::Sequence(SequenceNode {
            elements: self.merge_text_nodes(elements),
        }))
    }

    /// Collapses runs of single-character text nodes into one node with
    /// one wide token. Only clean text merges: a demoted token keeps its
    /// diagnostic, and a token with leading trivia keeps its position in
    /// the fidelity chain, so both stay unmerged.
    fn merge_text_nodes(&self, elements: Vec<Node>) -> Vec<Node> {
        fn flush(run: &mut Vec<Node>, result: &mut Vec<Node>, parser: &Parser) {
            if run.len() <= 1 {
                result.append(run);
                return;
            }
            let text = parser.scanner.text();
            let base = text.offset();
            let (Some(first), Some(last)) = (text_token(run.first()), text_token(run.last()))
            else {
                result.append(run);
                return;
            };
            let start = first.chars.offset() - base;
            let end = last.chars.offset() + last.chars.len() - base;
            let token = Token::new(TokenKind::Text, text.slice(start..end));
            run.clear();
            result.push(Node::Text(TextNode { token }));
        }

        fn text_token(node: Option<&Node>) -> Option<&Token> {
            match node {
                Some(Node::Text(text)) => Some(&text.token),
                _ => None,
            }
        }

        let mut result = Vec::with_capacity(elements.len());
        let mut run: Vec<Node> = Vec::new();
        for element in elements {
            if is_mergeable_text(&element) {
                run.push(element);
            } else {
                flush(&mut run, &mut result, self);
                result.push(element);
            }
        }
        flush(&mut run, &mut result, self);
        result
    }

    fn parse_primary_expression_and_quantifiers(
        &mut self,
        last: Option<&Node>,
    ) -> Result<Node, DepthExceeded> {
        let current = self.parse_primary_expression(last)?;
        if matches!(current, Node::Grouping(GroupingNode::SimpleOptions { .. })) {
            // Quantifiers cannot bind to an options toggle; a following
            // `*` re-enters here as a primary and gets diagnosed there.
            return Ok(current);
        }
        match self.current.kind {
            TokenKind::Star => {
                let asterisk = self.consume(true);
                Ok(self.try_parse_lazy_quantifier(Node::Quantifier(QuantifierNode::ZeroOrMore {
                    expression: Box::new(current),
                    asterisk,
                })))
            }
            TokenKind::Plus => {
                let plus = self.consume(true);
                Ok(self.try_parse_lazy_quantifier(Node::Quantifier(QuantifierNode::OneOrMore {
                    expression: Box::new(current),
                    plus,
                })))
            }
            TokenKind::Question => {
                let question = self.consume(true);
                Ok(self.try_parse_lazy_quantifier(Node::Quantifier(QuantifierNode::ZeroOrOne {
                    expression: Box::new(current),
                    question,
                })))
            }
            TokenKind::OpenBrace => Ok(self.try_parse_numeric_quantifier(current)),
            _ => Ok(current),
        }
    }

    /// A `?` directly after a quantifier makes it lazy. Only one level:
    /// the `?` after `a*?` is absorbed here, a third quantifier character
    /// lands back in primary position and is diagnosed as nested.
    fn try_parse_lazy_quantifier(&mut self, quantifier: Node) -> Node {
        if self.current.kind != TokenKind::Question {
            return quantifier;
        }
        let question = self.consume(true);
        Node::Quantifier(QuantifierNode::Lazy {
            quantifier: Box::new(quantifier),
            question,
        })
    }

    /// `{` after an expression: a quantifier only if the full `{n}` /
    /// `{n,}` / `{n,m}` shape scans. Otherwise the scanner rewinds and
    /// the brace parses as literal text with no diagnostic.
    fn try_parse_numeric_quantifier(&mut self, expression: Node) -> Node {
        debug_assert_eq!(self.current.kind, TokenKind::OpenBrace);
        let open_brace = self.current.clone();
        let start = self.scanner.position();

        let Some(parts) = self.try_scan_numeric_quantifier_parts() else {
            trace!(start, "quantifier probe declined, brace stays literal");
            self.scanner.set_position(start);
            return expression;
        };
        self.refresh(true);

        let node = match parts {
            QuantifierParts::Exact {
                number,
                close_brace,
            } => Node::Quantifier(QuantifierNode::Exact {
                expression: Box::new(expression),
                open_brace,
                number,
                close_brace,
            }),
            QuantifierParts::OpenRange {
                number,
                comma,
                close_brace,
            } => Node::Quantifier(QuantifierNode::OpenRange {
                expression: Box::new(expression),
                open_brace,
                number,
                comma,
                close_brace,
            }),
            QuantifierParts::ClosedRange {
                first_number,
                comma,
                mut second_number,
                close_brace,
            } => {
                if let (Some(first), Some(second)) =
                    (first_number.number_value(), second_number.number_value())
                {
                    if second < first {
                        let span = second_number.span();
                        second_number = second_number
                            .with_diagnostic_if_none(Diagnostic::new(messages::ILLEGAL_RANGE, span));
                    }
                }
                Node::Quantifier(QuantifierNode::ClosedRange {
                    expression: Box::new(expression),
                    open_brace,
                    first_number,
                    comma,
                    second_number,
                    close_brace,
                })
            }
        };
        self.try_parse_lazy_quantifier(node)
    }

    /// Scans the pieces after an already-consumed `{`. No trivia is
    /// legal between them. Returns `None` without restoring; callers
    /// rewind on their saved position.
    fn try_scan_numeric_quantifier_parts(&mut self) -> Option<QuantifierParts> {
        let first = self.scanner.try_scan_number()?;
        let next = self.scanner.scan_next_token(false, self.options);
        match next.kind {
            TokenKind::CloseBrace => Some(QuantifierParts::Exact {
                number: first,
                close_brace: next,
            }),
            TokenKind::Comma => {
                let second = self.scanner.try_scan_number();
                let close = self.scanner.scan_next_token(false, self.options);
                if close.kind != TokenKind::CloseBrace {
                    return None;
                }
                match second {
                    Some(second_number) => Some(QuantifierParts::ClosedRange {
                        first_number: first,
                        comma: next,
                        second_number,
                        close_brace: close,
                    }),
                    None => Some(QuantifierParts::OpenRange {
                        number: first,
                        comma: next,
                        close_brace: close,
                    }),
                }
            }
            _ => None,
        }
    }

    fn parse_primary_expression(&mut self, last: Option<&Node>) -> Result<Node, DepthExceeded> {
        match self.current.kind {
            TokenKind::Dot => Ok(Node::Wildcard(WildcardNode {
                dot: self.consume(true),
            })),
            TokenKind::Caret => Ok(Node::Anchor(AnchorNode::Start {
                caret: self.consume(true),
            })),
            TokenKind::Dollar => Ok(Node::Anchor(AnchorNode::End {
                dollar: self.consume(true),
            })),
            TokenKind::Backslash => {
                let backslash = self.consume(false);
                Ok(self.parse_escape(backslash, true))
            }
            TokenKind::OpenBracket => self.parse_character_class(),
            TokenKind::OpenParen => self.parse_grouping(),
            TokenKind::CloseParen => {
                // Only reachable at the top level; grouping bodies stop
                // their sequence at a close paren instead.
                let mut token = self.consume(true).with_kind(TokenKind::Text);
                let span = token.span();
                token = token
                    .with_diagnostic_if_none(Diagnostic::new(messages::TOO_MANY_CLOSE_PARENS, span));
                Ok(Node::Text(TextNode { token }))
            }
            TokenKind::Star | TokenKind::Plus | TokenKind::Question => {
                // A quantifier with nothing to bind to. It demotes to
                // text but stays quantifiable itself: in `a**` the
                // diagnosed second `*` is the operand of a third.
                let ch = self.current.chars.char_at(0).unwrap_or('*');
                let mut token = self.consume(true).with_kind(TokenKind::Text);
                let span = token.span();
                token = token.with_diagnostic_if_none(orphan_quantifier_diagnostic(last, ch, span));
                Ok(Node::Text(TextNode { token }))
            }
            TokenKind::OpenBrace => Ok(self.parse_possible_unexpected_numeric_quantifier(last)),
            _ => Ok(Node::Text(TextNode {
                token: self.consume(true).with_kind(TokenKind::Text),
            })),
        }
    }

    /// `{` in primary position. The engine only objects when the braces
    /// would scan as a real quantifier; `{oops}` is plain text. Either
    /// way only the brace is consumed here and the scanner rewinds, so
    /// the interior parses again as ordinary content.
    fn parse_possible_unexpected_numeric_quantifier(&mut self, last: Option<&Node>) -> Node {
        let start = self.scanner.position();
        let well_formed = self.try_scan_numeric_quantifier_parts().is_some();
        self.scanner.set_position(start);

        let mut token = self.consume(true).with_kind(TokenKind::Text);
        if well_formed {
            let span = token.span();
            token = token.with_diagnostic_if_none(orphan_quantifier_diagnostic(last, '{', span));
        }
        Node::Text(TextNode { token })
    }
}

/// Which complaint an out-of-place quantifier gets: following nothing
/// (start of a sequence, or an options toggle) or nesting on another
/// quantifier.
fn orphan_quantifier_diagnostic(last: Option<&Node>, ch: char, span: Span) -> Diagnostic {
    match last {
        None | Some(Node::Grouping(GroupingNode::SimpleOptions { .. })) => {
            Diagnostic::new(messages::QUANTIFIER_AFTER_NOTHING, span)
        }
        _ => Diagnostic::new(messages::nested_quantifier(ch), span),
    }
}

fn is_mergeable_text(node: &Node) -> bool {
    match node {
        Node::Text(text) => {
            text.token.kind == TokenKind::Text
                && !text.token.missing
                && text.token.leading_trivia.is_empty()
                && text.token.diagnostics.is_empty()
        }
        _ => false,
    }
}
