//! Generic tree traversal.
//!
//! A single [`Visitor`] trait with `walk_*` companions. Override
//! `visit_*` methods to add behavior at specific points; call the
//! matching `walk_*` to continue into children (or don't, to prune).
//! Node recursion runs under [`ensure_sufficient_stack`], so walking a
//! tree is safe at any depth the parser can produce.

use rex_diagnostic::Diagnostic;
use rex_stack::ensure_sufficient_stack;
use rex_text::VirtualChar;
use rustc_hash::FxHashSet;

use crate::{Node, NodeOrToken, Root, Token, Trivia};

/// Tree visitor.
///
/// The visitor can mutate its own state during traversal; the tree
/// itself stays immutable.
pub trait Visitor {
    /// Visit a node. The default recurses into children in source order.
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    /// Visit a token. The default visits its leading trivia.
    fn visit_token(&mut self, token: &Token) {
        walk_token(self, token);
    }

    /// Visit one trivium.
    fn visit_trivia(&mut self, _trivia: &Trivia) {}
}

/// Visit the expression, then the end-of-file token.
pub fn walk_root<V: Visitor + ?Sized>(visitor: &mut V, root: &Root) {
    visitor.visit_node(&root.expression);
    visitor.visit_token(&root.end_of_file);
}

/// Visit a node's children in source order.
pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) {
    ensure_sufficient_stack(|| {
        for child in node.children() {
            match child {
                NodeOrToken::Node(child_node) => visitor.visit_node(child_node),
                NodeOrToken::Token(token) => visitor.visit_token(token),
            }
        }
    });
}

/// Visit a token's leading trivia.
pub fn walk_token<V: Visitor + ?Sized>(visitor: &mut V, token: &Token) {
    for trivia in &token.leading_trivia {
        visitor.visit_trivia(trivia);
    }
}

struct DiagnosticCollector {
    seen: FxHashSet<Diagnostic>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    fn add_all(&mut self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            if self.seen.insert(diagnostic.clone()) {
                self.diagnostics.push(diagnostic.clone());
            }
        }
    }
}

impl Visitor for DiagnosticCollector {
    fn visit_token(&mut self, token: &Token) {
        // Trivia precedes the token in the source.
        walk_token(self, token);
        self.add_all(&token.diagnostics);
    }

    fn visit_trivia(&mut self, trivia: &Trivia) {
        self.add_all(&trivia.diagnostics);
    }
}

/// Collect every diagnostic in the tree in source order.
///
/// Structural duplicates (same message, same span) are dropped: the two
/// parse passes and token reinterpretation can deposit one logical error
/// in more than one place, and the user should see it once.
pub fn collect_diagnostics(root: &Root) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector {
        seen: FxHashSet::default(),
        diagnostics: Vec::new(),
    };
    walk_root(&mut collector, root);
    collector.diagnostics
}

struct CharCollector {
    chars: Vec<VirtualChar>,
}

impl Visitor for CharCollector {
    fn visit_token(&mut self, token: &Token) {
        walk_token(self, token);
        self.chars.extend(token.chars.iter());
    }

    fn visit_trivia(&mut self, trivia: &Trivia) {
        self.chars.extend(trivia.chars.iter());
    }
}

/// Every virtual character the tree covers, in source order.
///
/// For any tree the parser produces this is exactly the input sequence;
/// tests assert it, hosts may rely on it.
pub fn covered_chars(root: &Root) -> Vec<VirtualChar> {
    let mut collector = CharCollector { chars: Vec::new() };
    walk_root(&mut collector, root);
    collector.chars
}

/// Reproduce the pattern text covered by a tree, trivia included.
pub fn reconstruct_text(root: &Root) -> String {
    covered_chars(root).iter().map(|vc| vc.ch).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rex_diagnostic::messages;
    use rex_text::{Span, VirtualCharSeq};

    use crate::{SequenceNode, TextNode, TokenKind};

    use super::*;

    fn text_node(token: Token) -> Node {
        Node::Text(TextNode { token })
    }

    #[test]
    fn test_collect_deduplicates_but_keeps_order() {
        let text = VirtualCharSeq::from_str("ab");
        let duplicate = Diagnostic::new(messages::TOO_MANY_CLOSE_PARENS, Span::new(0, 1));
        let other = Diagnostic::new(messages::NOT_ENOUGH_CLOSE_PARENS, Span::new(1, 2));

        let root = Root {
            expression: Node::Sequence(SequenceNode {
                elements: vec![
                    text_node(
                        Token::new(TokenKind::Text, text.slice(0..1))
                            .with_diagnostic_if_none(duplicate.clone()),
                    ),
                    text_node(
                        Token::new(TokenKind::Text, text.slice(1..2))
                            .with_diagnostic_if_none(other.clone()),
                    ),
                ],
            }),
            end_of_file: Token::new(TokenKind::EndOfFile, text.slice(2..2))
                .with_diagnostic_if_none(duplicate.clone()),
        };

        let collected = collect_diagnostics(&root);
        assert_eq!(collected, vec![duplicate, other]);
    }

    #[test]
    fn test_covered_chars_includes_trivia() {
        let text = VirtualCharSeq::from_str(" a");
        let trivia = Trivia::new(crate::TriviaKind::Whitespace, text.slice(0..1));
        let root = Root {
            expression: Node::Sequence(SequenceNode {
                elements: vec![text_node(Token::with_trivia(
                    TokenKind::Text,
                    vec![trivia],
                    text.slice(1..2),
                ))],
            }),
            end_of_file: Token::new(TokenKind::EndOfFile, text.slice(2..2)),
        };

        let chars = covered_chars(&root);
        let expected: Vec<VirtualChar> = text.iter().collect();
        assert_eq!(chars, expected);
        assert_eq!(reconstruct_text(&root), " a");
    }
}
