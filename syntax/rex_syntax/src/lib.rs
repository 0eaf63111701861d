//! Lossless syntax tree for regex patterns.
//!
//! This crate defines everything a parsed pattern is made of:
//! - `PatternFlags` for the option set a pattern is parsed under
//! - `Token` and `Trivia`, which carry diagnostics inline
//! - the node enums, one per syntactic category
//! - `Tree`, the parse result with its capture tables
//! - a `Visitor` trait and `walk_*` functions for generic traversal
//!
//! # Full fidelity
//!
//! The tree is *lossless*: every character of the input belongs to exactly
//! one token (either as the token's own text or inside its leading trivia),
//! and walking the tree in source order reproduces the input exactly. This
//! holds for arbitrarily malformed patterns; errors never drop text, they
//! only attach diagnostics. Tokens synthesized for missing syntax have no
//! characters and are flagged `missing`.
//!
//! Trees are immutable after construction and safe to share across threads.

mod node;
mod options;
mod token;
mod tree;
pub mod walk;

pub use node::{
    AlternationNode, AnchorNode, Children, ClassNode, EscapeNode, GroupingNode, Node, NodeOrToken,
    PosixPropertyNode, QuantifierNode, Root, SequenceNode, TextNode, WildcardNode,
};
pub use options::PatternFlags;
pub use token::{Token, TokenKind, TokenValue, Trivia, TriviaKind};
pub use tree::Tree;
pub use walk::{walk_node, walk_root, walk_token, Visitor};
