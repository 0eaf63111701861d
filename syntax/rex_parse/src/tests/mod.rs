//! Parser tests.
//!
//! Tests are organized into modules by category:
//! - `parser`: tree shapes for every construct the grammar knows
//! - `diagnostics`: exact diagnostic messages and positions, including
//!   the engine quirks the parser reproduces on purpose
//! - `invariants`: cross-cutting guarantees (lossless coverage, capture
//!   map consistency, the recursion budget) plus property tests

mod parser;
