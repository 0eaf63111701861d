//! The parse result.

use std::collections::BTreeMap;

use rex_diagnostic::Diagnostic;
use rex_text::{Span, VirtualCharSeq};

use crate::{walk, Root};

/// A parsed pattern: the text it came from, the full-fidelity root, the
/// collected diagnostics, and the capture tables.
///
/// `diagnostics` is derived from the tree at construction (source order,
/// structurally de-duplicated), so a tree and its diagnostic list can
/// never disagree. The capture tables come from the capture analyzer and
/// always contain capture 0 spanning the whole pattern.
///
/// Trees are plain immutable data: clone freely, share across threads,
/// compare with `==` (parsing is deterministic, so re-parsing the same
/// text under the same options yields an equal tree).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Tree {
    pub text: VirtualCharSeq,
    pub root: Root,
    pub diagnostics: Vec<Diagnostic>,
    pub captures_by_name: BTreeMap<String, Span>,
    pub captures_by_number: BTreeMap<i32, Span>,
}

impl Tree {
    /// Assemble a tree, collecting diagnostics off the root.
    pub fn new(
        text: VirtualCharSeq,
        root: Root,
        captures_by_name: BTreeMap<String, Span>,
        captures_by_number: BTreeMap<i32, Span>,
    ) -> Self {
        let diagnostics = walk::collect_diagnostics(&root);
        Tree {
            text,
            root,
            diagnostics,
            captures_by_name,
            captures_by_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rex_diagnostic::messages;

    use crate::{Node, SequenceNode, Token, TokenKind};

    use super::*;

    #[test]
    fn test_diagnostics_derived_from_root() {
        let text = VirtualCharSeq::from_str("");
        let diagnostic = Diagnostic::new(messages::NOT_ENOUGH_CLOSE_PARENS, Span::point(0));
        let root = Root {
            expression: Node::Sequence(SequenceNode { elements: vec![] }),
            end_of_file: Token::new(TokenKind::EndOfFile, text.slice(0..0))
                .with_diagnostic_if_none(diagnostic.clone()),
        };

        let mut by_number = BTreeMap::new();
        by_number.insert(0, Span::point(0));
        let tree = Tree::new(text, root, BTreeMap::new(), by_number);

        assert_eq!(tree.diagnostics, vec![diagnostic]);
        assert_eq!(tree.captures_by_number.len(), 1);
        assert!(tree.captures_by_name.is_empty());
    }
}
