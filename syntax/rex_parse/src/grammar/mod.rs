//! Grammar productions, as `impl Parser` blocks split by syntactic
//! neighborhood:
//!
//! - [`alternation`]: alternations, sequences, quantifiers, primaries
//! - [`grouping`]: every `(...)` construct
//! - [`escape`]: every `\` construct
//! - [`class`]: character classes, ranges, subtraction
//!
//! Conventions shared by all of them: a production is entered with
//! `current` on its first token; it leaves `current` on the first token
//! after itself. Whether that trailing token may carry trivia depends on
//! where the production sits - trivia is never legal inside a character
//! class, an escape, or a grouping construct header.

mod alternation;
mod class;
mod escape;
mod grouping;

use rex_syntax::Token;

/// First character of a token known to have one. The null fallback is
/// never produced by the scanner, so it simply falls into whatever
/// default arm the caller dispatches to.
pub(crate) fn first_char(token: &Token) -> char {
    token.chars.first().map_or('\0', |vc| vc.ch)
}
