//! Capture group analysis.
//!
//! [`analyze`] walks a parsed tree and answers one question: which capture
//! names and numbers does this pattern declare, and over what spans? The
//! parser runs it between its two passes, so that backreferences anywhere in
//! the pattern can be checked against groups declared anywhere else.
//!
//! The rules mirror the engine:
//!
//! * group 0 is always present and covers the whole pattern;
//! * `(?<name>...)` declares `name`, or a number if the name is all digits;
//! * `(?<name-other>...)` declares only the part before the `-`;
//! * a plain `(...)` declares the next automatic number, counting from 1,
//!   unless explicit capture is in effect at its open paren;
//! * a plain group used as the condition of `(?(...)...)` declares nothing,
//!   though groups inside it still do;
//! * the first declaration of a name or number wins;
//! * after the walk, each distinct name also receives the smallest number
//!   not yet taken, in the order the names first appeared.
//!
//! Inline options complicate the automatic numbering: `(?n)` suppresses it
//! for the rest of the enclosing group, and `(?n:...)` for its body. The
//! walk threads the current options the same way the engine's scanner does,
//! including the quirk that `(?n)` set in one alternation arm stays set in
//! the arms after it.

use std::collections::BTreeMap;

use rex_stack::ensure_sufficient_stack;
use rex_syntax::{GroupingNode, Node, NodeOrToken, PatternFlags, Root, Token, TokenKind};
use rex_text::{Span, VirtualCharSeq};
use rustc_hash::FxHashSet;

/// Collects the capture maps for `root`, keyed by name and by number.
///
/// `text` must be the text `root` was parsed from; it provides the span for
/// group 0. `options` are the options the parse started with.
pub fn analyze(
    text: &VirtualCharSeq,
    root: &Root,
    options: PatternFlags,
) -> (BTreeMap<String, Span>, BTreeMap<i32, Span>) {
    let mut collector = Collector {
        names: Vec::new(),
        seen_names: FxHashSet::default(),
        numbers: BTreeMap::new(),
        auto_number: 1,
    };
    collector.numbers.insert(0, text.span());

    let mut current = options;
    collector.collect_node(&root.expression, &mut current);
    collector.finish()
}

struct Collector {
    /// Declared names in first-seen order, for number assignment.
    names: Vec<(String, Span)>,
    seen_names: FxHashSet<String>,
    numbers: BTreeMap<i32, Span>,
    auto_number: i32,
}

impl Collector {
    /// Walks `node`. `options` is mutable on purpose: an inline `(?n)`
    /// changes it for everything after, and only group boundaries restore
    /// it (by handing their bodies a copy).
    fn collect_node(&mut self, node: &Node, options: &mut PatternFlags) {
        ensure_sufficient_stack(|| {
            if let Node::Grouping(grouping) = node {
                self.collect_grouping(node, grouping, options);
                return;
            }
            for child in node.children() {
                if let NodeOrToken::Node(child_node) = child {
                    self.collect_node(child_node, options);
                }
            }
        });
    }

    fn collect_grouping(
        &mut self,
        node: &Node,
        grouping: &GroupingNode,
        options: &mut PatternFlags,
    ) {
        match grouping {
            GroupingNode::SimpleOptions { options: run, .. } => {
                *options = apply_options_token(*options, run);
            }
            GroupingNode::NestedOptions {
                options: run,
                expression,
                ..
            } => {
                let mut inner = apply_options_token(*options, run);
                self.collect_node(expression, &mut inner);
            }
            GroupingNode::Simple { expression, .. } => {
                self.record_auto_number(node, *options);
                let mut inner = *options;
                self.collect_node(expression, &mut inner);
            }
            GroupingNode::Capture {
                capture, expression, ..
            } => {
                self.record_capture_token(capture, node);
                let mut inner = *options;
                self.collect_node(expression, &mut inner);
            }
            GroupingNode::Balancing {
                first_capture,
                expression,
                ..
            } => {
                if let Some(capture) = first_capture {
                    self.record_capture_token(capture, node);
                }
                let mut inner = *options;
                self.collect_node(expression, &mut inner);
            }
            GroupingNode::ConditionalCapture { result, .. } => {
                let mut inner = *options;
                self.collect_node(result, &mut inner);
            }
            GroupingNode::ConditionalExpression {
                grouping: condition,
                result,
                ..
            } => {
                let mut inner = *options;
                if let Node::Grouping(GroupingNode::Simple { expression, .. }) = &**condition {
                    // the condition group itself is not a capture
                    let mut condition_options = inner;
                    self.collect_node(expression, &mut condition_options);
                } else {
                    self.collect_node(condition, &mut inner);
                }
                self.collect_node(result, &mut inner);
            }
            GroupingNode::NonCapturing { expression, .. }
            | GroupingNode::PositiveLookahead { expression, .. }
            | GroupingNode::NegativeLookahead { expression, .. }
            | GroupingNode::PositiveLookbehind { expression, .. }
            | GroupingNode::NegativeLookbehind { expression, .. }
            | GroupingNode::Atomic { expression, .. } => {
                let mut inner = *options;
                self.collect_node(expression, &mut inner);
            }
        }
    }

    fn record_auto_number(&mut self, node: &Node, options: PatternFlags) {
        if options.contains(PatternFlags::EXPLICIT_CAPTURE) {
            return;
        }
        // the counter advances even when the slot is already taken
        let number = self.auto_number;
        self.auto_number += 1;
        if let Some(span) = node.span() {
            self.numbers.entry(number).or_insert(span);
        }
    }

    fn record_capture_token(&mut self, capture: &Token, node: &Node) {
        if capture.missing {
            return;
        }
        let Some(span) = node.span() else { return };
        match capture.kind {
            TokenKind::Number => {
                if let Some(number) = capture.number_value() {
                    self.numbers.entry(number).or_insert(span);
                }
            }
            TokenKind::CaptureName => {
                let name = capture.chars.to_source_string();
                if self.seen_names.insert(name.clone()) {
                    self.names.push((name, span));
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> (BTreeMap<String, Span>, BTreeMap<i32, Span>) {
        let mut by_name = BTreeMap::new();
        let mut current = 1;
        for (name, span) in self.names {
            while self.numbers.contains_key(&current) {
                current += 1;
            }
            self.numbers.insert(current, span);
            by_name.insert(name, span);
            current += 1;
        }
        (by_name, self.numbers)
    }
}

fn apply_options_token(options: PatternFlags, token: &Token) -> PatternFlags {
    options.apply_option_run(token.chars.iter().map(|vc| vc.ch))
}
