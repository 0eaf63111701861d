//! Tree shape tests.
//!
//! Every construct the grammar knows, parsed and matched against the
//! node it should produce. Exact diagnostic text and spans live in
//! `diagnostics`; whole-tree guarantees live in `invariants`.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rex_syntax::{
    AnchorNode, ClassNode, EscapeNode, GroupingNode, Node, PatternFlags, QuantifierNode, TokenKind,
    Tree,
};
use rex_text::VirtualCharSeq;

use crate::try_parse;

fn parse(pattern: &str) -> Tree {
    parse_with(pattern, PatternFlags::default())
}

fn parse_with(pattern: &str, options: PatternFlags) -> Tree {
    try_parse(VirtualCharSeq::from_str(pattern), options).unwrap()
}

fn elements(tree: &Tree) -> &[Node] {
    match &tree.root.expression {
        Node::Sequence(sequence) => &sequence.elements,
        other => panic!("expected a sequence at the root, got {other:?}"),
    }
}

fn single(tree: &Tree) -> &Node {
    match elements(tree) {
        [only] => only,
        other => panic!("expected one element, got {}", other.len()),
    }
}

fn source_of(token: &rex_syntax::Token) -> String {
    token.chars.to_source_string()
}

#[test]
fn test_empty_pattern() {
    let tree = parse("");
    assert!(elements(&tree).is_empty());
    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.root.end_of_file.kind, TokenKind::EndOfFile);
}

#[test]
fn test_text_runs_merge_into_one_node() {
    let tree = parse("abc");
    let Node::Text(text) = single(&tree) else {
        panic!("expected a text node");
    };
    assert_eq!(source_of(&text.token), "abc");
}

#[test]
fn test_wildcard_and_anchors() {
    let tree = parse("a.^$");
    let elements = elements(&tree);
    assert_eq!(elements.len(), 4);
    assert!(matches!(elements[0], Node::Text(_)));
    assert!(matches!(elements[1], Node::Wildcard(_)));
    assert!(matches!(elements[2], Node::Anchor(AnchorNode::Start { .. })));
    assert!(matches!(elements[3], Node::Anchor(AnchorNode::End { .. })));
}

#[test]
fn test_alternation_is_left_associative() {
    let tree = parse("a|b|c");
    let Node::Alternation(outer) = &tree.root.expression else {
        panic!("expected an alternation at the root");
    };
    assert!(matches!(&*outer.left, Node::Alternation(_)));
    assert!(matches!(&*outer.right, Node::Sequence(_)));
}

#[test]
fn test_empty_alternation_arm() {
    let tree = parse("a|");
    let Node::Alternation(alternation) = &tree.root.expression else {
        panic!("expected an alternation at the root");
    };
    let Node::Sequence(right) = &*alternation.right else {
        panic!("expected a sequence on the right");
    };
    assert!(right.elements.is_empty());
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_fixed_quantifiers() {
    let tree = parse("a*b+c?");
    let elements = elements(&tree);
    assert_eq!(elements.len(), 3);
    assert!(matches!(
        elements[0],
        Node::Quantifier(QuantifierNode::ZeroOrMore { .. })
    ));
    assert!(matches!(
        elements[1],
        Node::Quantifier(QuantifierNode::OneOrMore { .. })
    ));
    assert!(matches!(
        elements[2],
        Node::Quantifier(QuantifierNode::ZeroOrOne { .. })
    ));
}

#[test]
fn test_lazy_quantifier_wraps() {
    let tree = parse("a*?");
    let Node::Quantifier(QuantifierNode::Lazy { quantifier, .. }) = single(&tree) else {
        panic!("expected a lazy quantifier");
    };
    assert!(matches!(
        &**quantifier,
        Node::Quantifier(QuantifierNode::ZeroOrMore { .. })
    ));
}

#[test]
fn test_numeric_quantifiers() {
    let tree = parse("a{2}");
    let Node::Quantifier(QuantifierNode::Exact { number, .. }) = single(&tree) else {
        panic!("expected an exact quantifier");
    };
    assert_eq!(number.number_value(), Some(2));

    let tree = parse("a{2,}");
    assert!(matches!(
        single(&tree),
        Node::Quantifier(QuantifierNode::OpenRange { .. })
    ));

    let tree = parse("a{2,3}");
    let Node::Quantifier(QuantifierNode::ClosedRange {
        first_number,
        second_number,
        ..
    }) = single(&tree)
    else {
        panic!("expected a closed range quantifier");
    };
    assert_eq!(first_number.number_value(), Some(2));
    assert_eq!(second_number.number_value(), Some(3));
}

#[test]
fn test_failed_numeric_quantifier_is_literal_text() {
    // The `{` probe fails on `b`, so the whole run stays literal and
    // merges with the atom before it.
    let tree = parse("a{2,b}");
    let Node::Text(text) = single(&tree) else {
        panic!("expected a text node");
    };
    assert_eq!(source_of(&text.token), "a{2,b}");
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_grouping_forms() {
    assert!(matches!(
        single(&parse("(a)")),
        Node::Grouping(GroupingNode::Simple { .. })
    ));
    assert!(matches!(
        single(&parse("(?:a)")),
        Node::Grouping(GroupingNode::NonCapturing { .. })
    ));
    assert!(matches!(
        single(&parse("(?>a)")),
        Node::Grouping(GroupingNode::Atomic { .. })
    ));
    assert!(matches!(
        single(&parse("(?=a)")),
        Node::Grouping(GroupingNode::PositiveLookahead { .. })
    ));
    assert!(matches!(
        single(&parse("(?!a)")),
        Node::Grouping(GroupingNode::NegativeLookahead { .. })
    ));
    assert!(matches!(
        single(&parse("(?<=a)")),
        Node::Grouping(GroupingNode::PositiveLookbehind { .. })
    ));
    assert!(matches!(
        single(&parse("(?<!a)")),
        Node::Grouping(GroupingNode::NegativeLookbehind { .. })
    ));
}

#[test]
fn test_named_capture() {
    for pattern in ["(?<name>a)", "(?'name'a)"] {
        let tree = parse(pattern);
        let Node::Grouping(GroupingNode::Capture { capture, .. }) = single(&tree) else {
            panic!("expected a named capture for {pattern}");
        };
        assert_eq!(capture.kind, TokenKind::CaptureName);
        assert_eq!(source_of(capture), "name");
        assert!(tree.captures_by_name.contains_key("name"));
        assert!(tree.diagnostics.is_empty());
    }
}

#[test]
fn test_numbered_capture_declaration() {
    let tree = parse("(?<12>a)");
    let Node::Grouping(GroupingNode::Capture { capture, .. }) = single(&tree) else {
        panic!("expected a capture grouping");
    };
    assert_eq!(capture.kind, TokenKind::Number);
    assert!(tree.captures_by_number.contains_key(&12));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_balancing_group() {
    let tree = parse("(?<y>b)(?<x-y>a)");
    let Node::Grouping(GroupingNode::Balancing {
        first_capture,
        second_capture,
        ..
    }) = &elements(&tree)[1]
    else {
        panic!("expected a balancing group");
    };
    assert_eq!(source_of(first_capture.as_ref().unwrap()), "x");
    assert_eq!(source_of(second_capture), "y");
    assert!(tree.diagnostics.is_empty());
    assert!(tree.captures_by_name.contains_key("x"));
    assert!(tree.captures_by_name.contains_key("y"));
}

#[test]
fn test_options_groupings() {
    let tree = parse("(?i)a");
    assert!(matches!(
        elements(&tree)[0],
        Node::Grouping(GroupingNode::SimpleOptions { .. })
    ));

    let tree = parse("(?i:a)");
    assert!(matches!(
        single(&tree),
        Node::Grouping(GroupingNode::NestedOptions { .. })
    ));
}

#[test]
fn test_inline_options_stop_at_enclosing_group() {
    // `(?x)` inside the group turns whitespace into trivia there, but
    // the space after the close paren is literal text again.
    let tree = parse("((?x)a) b");
    let elements = elements(&tree);
    assert_eq!(elements.len(), 2);
    let Node::Text(text) = &elements[1] else {
        panic!("expected trailing text");
    };
    assert_eq!(source_of(&text.token), " b");
    assert!(text.token.leading_trivia.is_empty());
}

#[test]
fn test_inline_options_reach_end_of_sequence() {
    let tree = parse("(?x)a b");
    let elements = elements(&tree);
    assert_eq!(elements.len(), 3);
    let Node::Text(text) = &elements[2] else {
        panic!("expected a text node");
    };
    assert_eq!(source_of(&text.token), "b");
    assert_eq!(text.token.leading_trivia.len(), 1);
}

#[test]
fn test_conditional_capture_by_number() {
    let tree = parse("(a)(?(1)b|c)");
    let Node::Grouping(GroupingNode::ConditionalCapture {
        capture, result, ..
    }) = &elements(&tree)[1]
    else {
        panic!("expected a conditional capture");
    };
    assert_eq!(capture.number_value(), Some(1));
    assert!(matches!(&**result, Node::Alternation(_)));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_conditional_capture_by_name() {
    let tree = parse("(?<n>a)(?(n)b)");
    assert!(matches!(
        &elements(&tree)[1],
        Node::Grouping(GroupingNode::ConditionalCapture { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_conditional_name_declared_later_still_counts() {
    // The discovery pass sees no captures and parses the condition as an
    // expression; the validating pass knows `n1` and builds the capture
    // form. Only the validating tree is returned.
    let tree = parse("(?(n1)x)(?<n1>y)");
    assert!(matches!(
        &elements(&tree)[0],
        Node::Grouping(GroupingNode::ConditionalCapture { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_undeclared_name_condition_is_an_expression() {
    let tree = parse("(?(n)b)");
    let Node::Grouping(GroupingNode::ConditionalExpression { grouping, .. }) = single(&tree) else {
        panic!("expected a conditional expression");
    };
    assert!(matches!(
        &**grouping,
        Node::Grouping(GroupingNode::Simple { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_number_condition_without_close_paren_is_an_expression() {
    // `1x` cannot be a capture reference, so the inner parens reparse as
    // a plain group, which the capture analyzer does not count.
    let tree = parse("(?(1x)a)");
    assert!(matches!(
        single(&tree),
        Node::Grouping(GroupingNode::ConditionalExpression { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_escape_forms() {
    assert!(matches!(
        single(&parse(r"\d")),
        Node::Escape(EscapeNode::CharacterClass { .. })
    ));
    assert!(matches!(
        single(&parse(r"\A")),
        Node::Escape(EscapeNode::Anchor { .. })
    ));
    assert!(matches!(
        single(&parse(r"\n")),
        Node::Escape(EscapeNode::Simple { .. })
    ));
    assert!(matches!(
        single(&parse(r"\(")),
        Node::Escape(EscapeNode::Simple { .. })
    ));
    assert!(matches!(
        single(&parse(r"\p{Lu}")),
        Node::Escape(EscapeNode::Category { .. })
    ));
}

#[test]
fn test_hex_unicode_and_control_escapes() {
    let tree = parse(r"\x41");
    let Node::Escape(EscapeNode::Hex { digits, .. }) = single(&tree) else {
        panic!("expected a hex escape");
    };
    assert_eq!(source_of(digits), "41");

    let tree = parse(r"\u0041");
    let Node::Escape(EscapeNode::Unicode { digits, .. }) = single(&tree) else {
        panic!("expected a unicode escape");
    };
    assert_eq!(source_of(digits), "0041");

    let tree = parse(r"\cA");
    let Node::Escape(EscapeNode::Control { control, .. }) = single(&tree) else {
        panic!("expected a control escape");
    };
    assert_eq!(source_of(control), "A");
}

#[test]
fn test_octal_escape_consumes_up_to_three_digits() {
    let tree = parse(r"\1017");
    let Node::Escape(EscapeNode::Octal { digits, .. }) = &elements(&tree)[0] else {
        panic!("expected an octal escape");
    };
    assert_eq!(source_of(digits), "101");
}

#[test]
fn test_backreference_when_group_exists_otherwise_octal() {
    let tree = parse(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)\12");
    let Node::Escape(EscapeNode::Backreference { number, .. }) = &elements(&tree)[12] else {
        panic!("expected a backreference");
    };
    assert_eq!(number.number_value(), Some(12));
    assert!(tree.diagnostics.is_empty());

    let tree = parse(r"\12");
    let Node::Escape(EscapeNode::Octal { digits, .. }) = single(&tree) else {
        panic!("expected an octal escape");
    };
    assert_eq!(source_of(digits), "12");
}

#[test]
fn test_forward_reference() {
    let tree = parse(r"\2(b)(a)");
    let Node::Escape(EscapeNode::Backreference { number, .. }) = &elements(&tree)[0] else {
        panic!("expected a backreference");
    };
    assert_eq!(number.number_value(), Some(2));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_ecmascript_backreference_takes_longest_declared_prefix() {
    let tree = parse_with(r"(a)\12", PatternFlags::ECMASCRIPT);
    let elements = elements(&tree);
    assert_eq!(elements.len(), 3);
    let Node::Escape(EscapeNode::Backreference { number, .. }) = &elements[1] else {
        panic!("expected a backreference");
    };
    assert_eq!(source_of(number), "1");
    assert_eq!(number.number_value(), Some(1));
    assert!(matches!(&elements[2], Node::Text(_)));
}

#[test]
fn test_capture_escapes() {
    let tree = parse(r"(?<a>x)\<a>");
    assert!(matches!(
        &elements(&tree)[1],
        Node::Escape(EscapeNode::Capture { .. })
    ));
    assert!(tree.diagnostics.is_empty());

    let tree = parse(r"(?<a>x)\k<a>");
    assert!(matches!(
        &elements(&tree)[1],
        Node::Escape(EscapeNode::KCapture { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_character_class_components_stay_separate() {
    let tree = parse("[abc]");
    let Node::Class(ClassNode::CharacterClass { components, .. }) = single(&tree) else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    assert_eq!(sequence.elements.len(), 3);
}

#[test]
fn test_negated_character_class() {
    let tree = parse("[^a]");
    assert!(matches!(
        single(&tree),
        Node::Class(ClassNode::NegatedCharacterClass { .. })
    ));
}

#[test]
fn test_class_range() {
    let tree = parse("[a-z]");
    let Node::Class(ClassNode::CharacterClass { components, .. }) = single(&tree) else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    assert!(matches!(
        &sequence.elements[0],
        Node::Class(ClassNode::Range { .. })
    ));
}

#[test]
fn test_first_close_bracket_is_content() {
    let tree = parse("[]a]");
    let Node::Class(ClassNode::CharacterClass {
        components,
        close_bracket,
        ..
    }) = single(&tree)
    else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    assert_eq!(sequence.elements.len(), 2);
    assert!(!close_bracket.missing);
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_class_subtraction() {
    let tree = parse("[a-[b]]");
    let Node::Class(ClassNode::CharacterClass { components, .. }) = single(&tree) else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    assert_eq!(sequence.elements.len(), 2);
    assert!(matches!(
        &sequence.elements[1],
        Node::Class(ClassNode::Subtraction { .. })
    ));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_posix_bracket_is_inert() {
    let tree = parse("[[:alpha:]]");
    let Node::Class(ClassNode::CharacterClass { components, .. }) = single(&tree) else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    assert_eq!(sequence.elements.len(), 1);
    assert!(matches!(&sequence.elements[0], Node::PosixProperty(_)));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_escaped_minus_folds_into_range_right_side() {
    let tree = parse(r"[a-\-b]");
    let Node::Class(ClassNode::CharacterClass { components, .. }) = single(&tree) else {
        panic!("expected a character class");
    };
    let Node::Sequence(sequence) = &**components else {
        panic!("expected a component sequence");
    };
    let Node::Class(ClassNode::Range { right, .. }) = &sequence.elements[0] else {
        panic!("expected a range");
    };
    let Node::Sequence(folded) = &**right else {
        panic!("expected the right side to fold into a sequence");
    };
    assert_eq!(folded.elements.len(), 2);
    // `b`, the last folded component, is the effective upper bound, so
    // `a-` through it is not reversed.
    assert!(tree.diagnostics.is_empty());
}
