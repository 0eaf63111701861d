//! `[...]` character classes.
//!
//! No trivia is legal anywhere inside a class; every advance here scans
//! raw. The range rules reproduce the engine's quirks exactly: a
//! shorthand class or escaped minus on the left of `-` never opens a
//! range, escaped-minus components after the `-` fold into the right
//! side, and reversed-order detection only runs when both endpoints are
//! clean statically-known characters.

use rex_diagnostic::{messages, Diagnostic};
use rex_syntax::walk::{self, Visitor};
use rex_syntax::{
    ClassNode, EscapeNode, Node, PosixPropertyNode, SequenceNode, TextNode, Token, TokenKind,
};
use rex_text::VirtualCharSeq;

use crate::guard::DepthExceeded;
use crate::Parser;

use super::first_char;

impl Parser {
    pub(crate) fn parse_character_class(&mut self) -> Result<Node, DepthExceeded> {
        self.guard.enter()?;
        let result = self.parse_character_class_worker();
        self.guard.exit();
        result
    }

    fn parse_character_class_worker(&mut self) -> Result<Node, DepthExceeded> {
        let open_bracket = self.consume(false);
        debug_assert_eq!(open_bracket.kind, TokenKind::OpenBracket);
        let caret = if self.current.kind == TokenKind::Caret {
            Some(self.consume(false))
        } else {
            None
        };

        // A `]` before any component is content, not the close.
        let mut components = Vec::new();
        let close_bracket = loop {
            match self.current.kind {
                TokenKind::EndOfFile => {
                    let chars = self.missing_chars();
                    let span = chars.span();
                    break Token::missing(TokenKind::CloseBracket, chars).with_diagnostic_if_none(
                        Diagnostic::new(messages::UNTERMINATED_SET, span),
                    );
                }
                TokenKind::CloseBracket if !components.is_empty() => {
                    break self.consume(true);
                }
                _ => self.parse_class_components_once(&mut components)?,
            }
        };

        let components = Box::new(Node::Sequence(SequenceNode {
            elements: components,
        }));
        Ok(Node::Class(match caret {
            Some(caret) => ClassNode::NegatedCharacterClass {
                open_bracket,
                caret,
                components,
                close_bracket,
            },
            None => ClassNode::CharacterClass {
                open_bracket,
                components,
                close_bracket,
            },
        }))
    }

    /// One component, or one `left - right` range, or a subtraction.
    fn parse_class_components_once(
        &mut self,
        components: &mut Vec<Node>,
    ) -> Result<(), DepthExceeded> {
        let left = self.parse_single_class_component(false);
        if is_range_ineligible(&left) {
            components.push(left);
            return Ok(());
        }

        // A `-` immediately before `]` is a literal.
        if self.current.kind == TokenKind::Minus && !self.scanner.is_at("]") {
            let minus = self.consume(false);
            if self.current.kind == TokenKind::OpenBracket {
                components.push(left);
                components.push(self.parse_class_subtraction(minus)?);
            } else {
                let right = self.parse_right_side_of_range();
                let minus = check_reversed_range(&left, minus, &right);
                components.push(Node::Class(ClassNode::Range {
                    left: Box::new(left),
                    minus,
                    right: Box::new(right),
                }));
            }
        } else {
            components.push(left);
        }
        Ok(())
    }

    /// The engine keeps reading components into the right side of a
    /// range as long as they are escaped minuses, then takes one more;
    /// the last one read supplies the boundary value.
    fn parse_right_side_of_range(&mut self) -> Node {
        let first = self.parse_single_class_component(true);
        if !is_escaped_minus(&first) {
            return first;
        }

        let mut elements = vec![first];
        while self.current.kind != TokenKind::CloseBracket
            && self.current.kind != TokenKind::EndOfFile
        {
            let next = self.parse_single_class_component(true);
            let stop = !is_escaped_minus(&next);
            elements.push(next);
            if stop {
                break;
            }
        }
        if elements.len() == 1 {
            elements.swap_remove(0)
        } else {
            Node::Sequence(SequenceNode { elements })
        }
    }

    fn parse_single_class_component(&mut self, after_range_minus: bool) -> Node {
        // `[:name:]` is recognized just to be skipped whole; the engine
        // gives it no class semantics.
        if self.current.kind == TokenKind::OpenBracket
            && !after_range_minus
            && self.scanner.is_at(":")
        {
            if let Some(token) = self.scanner.try_scan_posix_property() {
                self.refresh(false);
                return Node::PosixProperty(PosixPropertyNode { token });
            }
        }

        if self.current.kind == TokenKind::Backslash
            && self.scanner.position() < self.scanner.text().len()
        {
            let backslash = self.consume(false);
            return self.parse_class_escape(backslash, after_range_minus);
        }

        let token = self.consume(false).with_kind(TokenKind::Text);
        Node::Text(TextNode { token })
    }

    /// Escapes inside a class: like sequence escapes minus anchors,
    /// backreferences and capture references, which have no meaning
    /// here and fall through to their character readings.
    fn parse_class_escape(&mut self, backslash: Token, after_range_minus: bool) -> Node {
        match first_char(&self.current) {
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                let backslash = self.check_class_in_range(backslash, after_range_minus);
                let type_token = self.consume(false);
                Node::Escape(EscapeNode::CharacterClass {
                    backslash,
                    type_token,
                })
            }
            'p' | 'P' => {
                let backslash = self.check_class_in_range(backslash, after_range_minus);
                self.parse_category_escape(backslash, false)
            }
            _ => self.parse_char_escape(backslash, false),
        }
    }

    /// A shorthand class cannot be a range endpoint; the complaint goes
    /// on the backslash, spanning through the type character.
    fn check_class_in_range(&self, backslash: Token, after_range_minus: bool) -> Token {
        if !after_range_minus {
            return backslash;
        }
        let ch = first_char(&self.current);
        let span = backslash.span().merge(self.current.span());
        backslash.with_diagnostic_if_none(Diagnostic::new(messages::cannot_include_class(ch), span))
    }

    /// `-[...]`: a nested class subtracted from the enclosing one. Must
    /// be the final element; anything after it diagnoses the minus.
    fn parse_class_subtraction(&mut self, minus: Token) -> Result<Node, DepthExceeded> {
        let class = self.parse_character_class()?;
        let minus = if self.current.kind != TokenKind::CloseBracket
            && self.current.kind != TokenKind::EndOfFile
        {
            let span = minus.span();
            minus.with_diagnostic_if_none(Diagnostic::new(messages::SUBTRACTION_MUST_BE_LAST, span))
        } else {
            minus
        };
        Ok(Node::Class(ClassNode::Subtraction {
            minus,
            class: Box::new(class),
        }))
    }
}

fn is_range_ineligible(node: &Node) -> bool {
    matches!(
        node,
        Node::Escape(EscapeNode::CharacterClass { .. }) | Node::Escape(EscapeNode::Category { .. })
    ) || is_escaped_minus(node)
}

fn is_escaped_minus(node: &Node) -> bool {
    match node {
        Node::Escape(EscapeNode::Simple { type_token, .. }) => {
            !type_token.missing && type_token.chars.char_at(0) == Some('-')
        }
        _ => false,
    }
}

/// Attach the reversed-order diagnostic to the minus when both range
/// endpoints are statically known and out of order.
fn check_reversed_range(left: &Node, minus: Token, right: &Node) -> Token {
    match (range_component_value(left), range_component_value(right)) {
        (Some(low), Some(high)) if low > high => {
            let span = minus.span();
            minus.with_diagnostic_if_none(Diagnostic::new(messages::REVERSED_RANGE, span))
        }
        _ => minus,
    }
}

/// The character value a range endpoint stands for, when one exists. A
/// component that already carries a diagnostic (or a missing token) is
/// never compared; the engine only checks ordering on clean endpoints.
fn range_component_value(node: &Node) -> Option<u32> {
    if has_problem(node) {
        return None;
    }
    component_value(node)
}

fn component_value(node: &Node) -> Option<u32> {
    match node {
        Node::Text(TextNode { token }) => {
            if token.chars.len() == 1 {
                token.chars.char_at(0).map(|ch| ch as u32)
            } else {
                None
            }
        }
        // Folded `\-` runs: the last component is the boundary.
        Node::Sequence(SequenceNode { elements }) => elements.last().and_then(component_value),
        Node::Escape(escape) => escape_value(escape),
        _ => None,
    }
}

fn escape_value(escape: &EscapeNode) -> Option<u32> {
    match escape {
        EscapeNode::Simple { type_token, .. } => {
            let ch = type_token.chars.char_at(0)?;
            Some(match ch {
                'a' => 0x07,
                'b' => 0x08,
                'e' => 0x1B,
                'f' => 0x0C,
                'n' => 0x0A,
                'r' => 0x0D,
                't' => 0x09,
                'v' => 0x0B,
                _ => ch as u32,
            })
        }
        EscapeNode::Control { control, .. } => {
            let ch = control.chars.char_at(0)?;
            let folded = if ch.is_ascii_lowercase() {
                ch.to_ascii_uppercase()
            } else {
                ch
            };
            Some((folded as u32).wrapping_sub('@' as u32))
        }
        EscapeNode::Octal { digits, .. } => digits_value(&digits.chars, 8),
        EscapeNode::Hex { digits, .. } | EscapeNode::Unicode { digits, .. } => {
            digits_value(&digits.chars, 16)
        }
        _ => None,
    }
}

fn digits_value(chars: &VirtualCharSeq, radix: u32) -> Option<u32> {
    let mut value = 0u32;
    for vc in chars.iter() {
        value = value.wrapping_mul(radix).wrapping_add(vc.ch.to_digit(radix)?);
    }
    Some(value)
}

struct ProblemFinder {
    found: bool,
}

impl Visitor for ProblemFinder {
    fn visit_token(&mut self, token: &Token) {
        walk::walk_token(self, token);
        if token.missing || !token.diagnostics.is_empty() {
            self.found = true;
        }
    }

    fn visit_trivia(&mut self, trivia: &rex_syntax::Trivia) {
        if !trivia.diagnostics.is_empty() {
            self.found = true;
        }
    }
}

fn has_problem(node: &Node) -> bool {
    let mut finder = ProblemFinder { found: false };
    finder.visit_node(node);
    finder.found
}
