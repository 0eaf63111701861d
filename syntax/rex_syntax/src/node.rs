//! Syntax nodes.
//!
//! One enum per syntactic category, with a variant per construct the
//! grammar distinguishes. Every variant stores its tokens explicitly -
//! parens, bars, braces, the lot - because the tree must account for
//! every character of the input. `children()` yields nodes and tokens
//! interleaved in source order; concatenating token characters (trivia
//! first) over a whole tree reproduces the pattern text.
//!
//! Children slots that are always a particular variant are typed as
//! `Box<Node>` anyway so that traversal stays uniform; the invariant is
//! noted on the field.

use rex_text::Span;
use smallvec::{smallvec, SmallVec};

use crate::Token;

/// A reference to a child: nodes and tokens interleave in source order.
#[derive(Copy, Clone, Debug)]
pub enum NodeOrToken<'a> {
    Node(&'a Node),
    Token(&'a Token),
}

/// Children buffer. The widest node (a balancing grouping) has nine
/// children, so traversal never allocates.
pub type Children<'a> = SmallVec<[NodeOrToken<'a>; 10]>;

#[inline]
fn t(token: &Token) -> NodeOrToken<'_> {
    NodeOrToken::Token(token)
}

#[inline]
fn n(node: &Node) -> NodeOrToken<'_> {
    NodeOrToken::Node(node)
}

/// The top of a parsed pattern: the expression plus the end-of-file
/// token (which carries any trailing trivia).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Root {
    pub expression: Node,
    pub end_of_file: Token,
}

/// Any expression node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Node {
    Sequence(SequenceNode),
    Alternation(AlternationNode),
    Text(TextNode),
    Wildcard(WildcardNode),
    Anchor(AnchorNode),
    Quantifier(QuantifierNode),
    Grouping(GroupingNode),
    Escape(EscapeNode),
    Class(ClassNode),
    PosixProperty(PosixPropertyNode),
}

impl Node {
    /// Children in source order.
    pub fn children(&self) -> Children<'_> {
        match self {
            Node::Sequence(node) => node.elements.iter().map(n).collect(),
            Node::Alternation(node) => smallvec![n(&node.left), t(&node.bar), n(&node.right)],
            Node::Text(node) => smallvec![t(&node.token)],
            Node::Wildcard(node) => smallvec![t(&node.dot)],
            Node::Anchor(node) => node.children(),
            Node::Quantifier(node) => node.children(),
            Node::Grouping(node) => node.children(),
            Node::Escape(node) => node.children(),
            Node::Class(node) => node.children(),
            Node::PosixProperty(node) => smallvec![t(&node.token)],
        }
    }

    /// Span covered by the node's real tokens.
    ///
    /// Missing tokens contribute nothing; a node made only of missing
    /// tokens (or an empty sequence) has no span. Trivia is excluded.
    pub fn span(&self) -> Option<Span> {
        let mut result: Option<Span> = None;
        let mut stack: SmallVec<[NodeOrToken<'_>; 16]> = smallvec![n(self)];
        while let Some(item) = stack.pop() {
            match item {
                NodeOrToken::Node(node) => stack.extend(node.children()),
                NodeOrToken::Token(token) => {
                    if !token.chars.is_empty() {
                        let span = token.span();
                        result = Some(match result {
                            Some(acc) => acc.merge(span),
                            None => span,
                        });
                    }
                }
            }
        }
        result
    }
}

/// Adjacent elements matched one after another.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SequenceNode {
    pub elements: Vec<Node>,
}

/// `left|right`. Chains are binary and left-associative, so `a|b|c` is
/// `Alternation(Alternation(a, b), c)`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AlternationNode {
    pub left: Box<Node>,
    pub bar: Token,
    /// Always a `Node::Sequence`.
    pub right: Box<Node>,
}

/// A run of literal characters, held as one token.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TextNode {
    pub token: Token,
}

/// `.`
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WildcardNode {
    pub dot: Token,
}

/// `^` and `$`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum AnchorNode {
    Start { caret: Token },
    End { dollar: Token },
}

impl AnchorNode {
    fn children(&self) -> Children<'_> {
        match self {
            AnchorNode::Start { caret } => smallvec![t(caret)],
            AnchorNode::End { dollar } => smallvec![t(dollar)],
        }
    }
}

/// A quantified expression. The quantified expression is the first
/// child; `Lazy` wraps another (always non-lazy) quantifier node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum QuantifierNode {
    /// `e*`
    ZeroOrMore { expression: Box<Node>, asterisk: Token },
    /// `e+`
    OneOrMore { expression: Box<Node>, plus: Token },
    /// `e?`
    ZeroOrOne { expression: Box<Node>, question: Token },
    /// `e{n}`
    Exact {
        expression: Box<Node>,
        open_brace: Token,
        number: Token,
        close_brace: Token,
    },
    /// `e{n,}`
    OpenRange {
        expression: Box<Node>,
        open_brace: Token,
        number: Token,
        comma: Token,
        close_brace: Token,
    },
    /// `e{n,m}`
    ClosedRange {
        expression: Box<Node>,
        open_brace: Token,
        first_number: Token,
        comma: Token,
        second_number: Token,
        close_brace: Token,
    },
    /// `e*?` and friends; `quantifier` is always a `Node::Quantifier`.
    Lazy { quantifier: Box<Node>, question: Token },
}

impl QuantifierNode {
    fn children(&self) -> Children<'_> {
        match self {
            QuantifierNode::ZeroOrMore {
                expression,
                asterisk,
            } => smallvec![n(expression), t(asterisk)],
            QuantifierNode::OneOrMore { expression, plus } => smallvec![n(expression), t(plus)],
            QuantifierNode::ZeroOrOne {
                expression,
                question,
            } => smallvec![n(expression), t(question)],
            QuantifierNode::Exact {
                expression,
                open_brace,
                number,
                close_brace,
            } => smallvec![n(expression), t(open_brace), t(number), t(close_brace)],
            QuantifierNode::OpenRange {
                expression,
                open_brace,
                number,
                comma,
                close_brace,
            } => smallvec![
                n(expression),
                t(open_brace),
                t(number),
                t(comma),
                t(close_brace)
            ],
            QuantifierNode::ClosedRange {
                expression,
                open_brace,
                first_number,
                comma,
                second_number,
                close_brace,
            } => smallvec![
                n(expression),
                t(open_brace),
                t(first_number),
                t(comma),
                t(second_number),
                t(close_brace)
            ],
            QuantifierNode::Lazy {
                quantifier,
                question,
            } => smallvec![n(quantifier), t(question)],
        }
    }
}

/// Every parenthesized construct.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum GroupingNode {
    /// `(e)`
    Simple {
        open_paren: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?imnsx-imnsx)` - toggles options for the rest of the sequence.
    SimpleOptions {
        open_paren: Token,
        question: Token,
        options: Token,
        close_paren: Token,
    },
    /// `(?imnsx-imnsx:e)` - options scoped to the body.
    NestedOptions {
        open_paren: Token,
        question: Token,
        options: Token,
        colon: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?:e)`
    NonCapturing {
        open_paren: Token,
        question: Token,
        colon: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?=e)`
    PositiveLookahead {
        open_paren: Token,
        question: Token,
        equals: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?!e)`
    NegativeLookahead {
        open_paren: Token,
        question: Token,
        exclamation: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?<=e)`
    PositiveLookbehind {
        open_paren: Token,
        question: Token,
        less_than: Token,
        equals: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?<!e)`
    NegativeLookbehind {
        open_paren: Token,
        question: Token,
        less_than: Token,
        exclamation: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?>e)`
    Atomic {
        open_paren: Token,
        question: Token,
        greater_than: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?<name>e)` or `(?'name'e)`; the capture token is a name or a
    /// number.
    Capture {
        open_paren: Token,
        question: Token,
        open: Token,
        capture: Token,
        close: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?<first-second>e)`; `(?<-second>e)` pops without pushing.
    Balancing {
        open_paren: Token,
        question: Token,
        open: Token,
        first_capture: Option<Token>,
        minus: Token,
        second_capture: Token,
        close: Token,
        expression: Box<Node>,
        close_paren: Token,
    },
    /// `(?(name-or-number)result` `)` - tests whether a capture matched.
    ConditionalCapture {
        open_paren: Token,
        question: Token,
        inner_open_paren: Token,
        capture: Token,
        inner_close_paren: Token,
        /// The result alternation.
        result: Box<Node>,
        close_paren: Token,
    },
    /// `(?(e)result` `)` - tests a grouping; `grouping` is always a
    /// `Node::Grouping` carrying its own parens.
    ConditionalExpression {
        open_paren: Token,
        question: Token,
        grouping: Box<Node>,
        result: Box<Node>,
        close_paren: Token,
    },
}

impl GroupingNode {
    fn children(&self) -> Children<'_> {
        match self {
            GroupingNode::Simple {
                open_paren,
                expression,
                close_paren,
            } => smallvec![t(open_paren), n(expression), t(close_paren)],
            GroupingNode::SimpleOptions {
                open_paren,
                question,
                options,
                close_paren,
            } => smallvec![t(open_paren), t(question), t(options), t(close_paren)],
            GroupingNode::NestedOptions {
                open_paren,
                question,
                options,
                colon,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(options),
                t(colon),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::NonCapturing {
                open_paren,
                question,
                colon,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(colon),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::PositiveLookahead {
                open_paren,
                question,
                equals,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(equals),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::NegativeLookahead {
                open_paren,
                question,
                exclamation,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(exclamation),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::PositiveLookbehind {
                open_paren,
                question,
                less_than,
                equals,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(less_than),
                t(equals),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::NegativeLookbehind {
                open_paren,
                question,
                less_than,
                exclamation,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(less_than),
                t(exclamation),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::Atomic {
                open_paren,
                question,
                greater_than,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(greater_than),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::Capture {
                open_paren,
                question,
                open,
                capture,
                close,
                expression,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(open),
                t(capture),
                t(close),
                n(expression),
                t(close_paren)
            ],
            GroupingNode::Balancing {
                open_paren,
                question,
                open,
                first_capture,
                minus,
                second_capture,
                close,
                expression,
                close_paren,
            } => {
                let mut children: Children<'_> = smallvec![t(open_paren), t(question), t(open)];
                if let Some(first) = first_capture {
                    children.push(t(first));
                }
                children.push(t(minus));
                children.push(t(second_capture));
                children.push(t(close));
                children.push(n(expression));
                children.push(t(close_paren));
                children
            }
            GroupingNode::ConditionalCapture {
                open_paren,
                question,
                inner_open_paren,
                capture,
                inner_close_paren,
                result,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                t(inner_open_paren),
                t(capture),
                t(inner_close_paren),
                n(result),
                t(close_paren)
            ],
            GroupingNode::ConditionalExpression {
                open_paren,
                question,
                grouping,
                result,
                close_paren,
            } => smallvec![
                t(open_paren),
                t(question),
                n(grouping),
                n(result),
                t(close_paren)
            ],
        }
    }
}

/// Every backslash construct.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum EscapeNode {
    /// `\a`, `\-`, `\*`: a single escaped character with no further
    /// structure. Also the degraded form of malformed `\p`/`\k` escapes.
    Simple { backslash: Token, type_token: Token },
    /// `\b \B \A \G \z \Z`
    Anchor { backslash: Token, type_token: Token },
    /// `\w \W \s \S \d \D`
    CharacterClass { backslash: Token, type_token: Token },
    /// `\cX`; `control` is missing when no valid control character
    /// followed.
    Control {
        backslash: Token,
        type_token: Token,
        control: Token,
    },
    /// `\xFF`
    Hex {
        backslash: Token,
        type_token: Token,
        digits: Token,
    },
    /// `\u0041`
    Unicode {
        backslash: Token,
        type_token: Token,
        digits: Token,
    },
    /// `\0`, `\012`
    Octal { backslash: Token, digits: Token },
    /// `\1` through whatever captures exist.
    Backreference { backslash: Token, number: Token },
    /// `\<name>` or `\'name'`
    Capture {
        backslash: Token,
        open: Token,
        capture: Token,
        close: Token,
    },
    /// `\k<name>` or `\k'name'`
    KCapture {
        backslash: Token,
        type_token: Token,
        open: Token,
        capture: Token,
        close: Token,
    },
    /// `\p{Name}` or `\P{Name}`
    Category {
        backslash: Token,
        type_token: Token,
        open_brace: Token,
        category: Token,
        close_brace: Token,
    },
}

impl EscapeNode {
    fn children(&self) -> Children<'_> {
        match self {
            EscapeNode::Simple {
                backslash,
                type_token,
            }
            | EscapeNode::Anchor {
                backslash,
                type_token,
            }
            | EscapeNode::CharacterClass {
                backslash,
                type_token,
            } => smallvec![t(backslash), t(type_token)],
            EscapeNode::Control {
                backslash,
                type_token,
                control,
            } => smallvec![t(backslash), t(type_token), t(control)],
            EscapeNode::Hex {
                backslash,
                type_token,
                digits,
            }
            | EscapeNode::Unicode {
                backslash,
                type_token,
                digits,
            } => smallvec![t(backslash), t(type_token), t(digits)],
            EscapeNode::Octal { backslash, digits } => smallvec![t(backslash), t(digits)],
            EscapeNode::Backreference { backslash, number } => {
                smallvec![t(backslash), t(number)]
            }
            EscapeNode::Capture {
                backslash,
                open,
                capture,
                close,
            } => smallvec![t(backslash), t(open), t(capture), t(close)],
            EscapeNode::KCapture {
                backslash,
                type_token,
                open,
                capture,
                close,
            } => smallvec![t(backslash), t(type_token), t(open), t(capture), t(close)],
            EscapeNode::Category {
                backslash,
                type_token,
                open_brace,
                category,
                close_brace,
            } => smallvec![
                t(backslash),
                t(type_token),
                t(open_brace),
                t(category),
                t(close_brace)
            ],
        }
    }
}

/// Character classes and their interior constructs.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClassNode {
    /// `[abc]`; `components` is always a `Node::Sequence`.
    CharacterClass {
        open_bracket: Token,
        components: Box<Node>,
        close_bracket: Token,
    },
    /// `[^abc]`; `components` is always a `Node::Sequence`.
    NegatedCharacterClass {
        open_bracket: Token,
        caret: Token,
        components: Box<Node>,
        close_bracket: Token,
    },
    /// `a-z` inside a class.
    Range {
        left: Box<Node>,
        minus: Token,
        right: Box<Node>,
    },
    /// `-[...]` inside a class; `class` is always a `Node::Class`
    /// character class.
    Subtraction { minus: Token, class: Box<Node> },
}

impl ClassNode {
    fn children(&self) -> Children<'_> {
        match self {
            ClassNode::CharacterClass {
                open_bracket,
                components,
                close_bracket,
            } => smallvec![t(open_bracket), n(components), t(close_bracket)],
            ClassNode::NegatedCharacterClass {
                open_bracket,
                caret,
                components,
                close_bracket,
            } => smallvec![t(open_bracket), t(caret), n(components), t(close_bracket)],
            ClassNode::Range { left, minus, right } => {
                smallvec![n(left), t(minus), n(right)]
            }
            ClassNode::Subtraction { minus, class } => smallvec![t(minus), n(class)],
        }
    }
}

/// `[:alpha:]` - recognized and held as one token so tooling can see
/// it, but semantically a literal `[` as far as the engine cares.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PosixPropertyNode {
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rex_text::VirtualCharSeq;

    use crate::TokenKind;

    use super::*;

    fn token(kind: TokenKind, chars: VirtualCharSeq) -> Token {
        Token::new(kind, chars)
    }

    /// Hand-build the tree for `(a)` and check child order and spans.
    #[test]
    fn test_children_in_source_order() {
        let text = VirtualCharSeq::from_str("(a)");
        let grouping = Node::Grouping(GroupingNode::Simple {
            open_paren: token(TokenKind::OpenParen, text.slice(0..1)),
            expression: Box::new(Node::Sequence(SequenceNode {
                elements: vec![Node::Text(TextNode {
                    token: token(TokenKind::Text, text.slice(1..2)),
                })],
            })),
            close_paren: token(TokenKind::CloseParen, text.slice(2..3)),
        });

        let children = grouping.children();
        assert_eq!(children.len(), 3);
        let spans: Vec<String> = children
            .iter()
            .map(|child| match child {
                NodeOrToken::Token(tok) => format!("{}", tok.span()),
                NodeOrToken::Node(node) => format!("node {:?}", node.span()),
            })
            .collect();
        assert_eq!(spans, vec!["0..1", "node Some(1..2)", "2..3"]);
        assert_eq!(grouping.span(), Some(Span::new(0, 3)));
    }

    #[test]
    fn test_span_skips_missing_tokens() {
        let text = VirtualCharSeq::from_str("[a");
        let class = Node::Class(ClassNode::CharacterClass {
            open_bracket: token(TokenKind::OpenBracket, text.slice(0..1)),
            components: Box::new(Node::Sequence(SequenceNode {
                elements: vec![Node::Text(TextNode {
                    token: token(TokenKind::Text, text.slice(1..2)),
                })],
            })),
            close_bracket: Token::missing(TokenKind::CloseBracket, text.slice(2..2)),
        });
        assert_eq!(class.span(), Some(Span::new(0, 2)));
    }

    #[test]
    fn test_empty_sequence_has_no_span() {
        let node = Node::Sequence(SequenceNode { elements: vec![] });
        assert_eq!(node.span(), None);
        assert!(node.children().is_empty());
    }
}
