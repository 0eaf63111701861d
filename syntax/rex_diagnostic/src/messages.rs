//! The diagnostic message catalog.
//!
//! Every string here matches the .NET regex engine's corresponding
//! parse error text exactly, punctuation and casing included. Hosts
//! show these next to errors produced by the engine itself, so any
//! drift is user-visible. Think hard before editing; add new messages
//! only for conditions the engine also reports.
//!
//! Messages with no variable part are `const`s; parameterized ones are
//! functions returning the formatted `String`.

pub const TOO_MANY_CLOSE_PARENS: &str = "Too many )'s";
pub const NOT_ENOUGH_CLOSE_PARENS: &str = "Not enough )'s";
pub const TOO_MANY_BARS: &str = "Too many | in (?()|)";
pub const UNRECOGNIZED_GROUPING: &str = "Unrecognized grouping construct";
pub const INVALID_GROUP_NAME: &str =
    "Invalid group name: Group names must begin with a word character";
pub const CAPTURE_NUMBER_ZERO: &str = "Capture number cannot be zero";
pub const UNDEFINED_GROUP: &str = "Reference to undefined group";
pub const ALTERNATION_COMMENT: &str = "Alternation conditions cannot be comments";
pub const ALTERNATION_CAPTURE: &str = "Alternation conditions do not capture and cannot be named";
pub const ILLEGAL_RANGE: &str = "Illegal {x,y} with x > y";
pub const QUANTIFIER_AFTER_NOTHING: &str = "Quantifier {x,y} following nothing";
pub const REVERSED_RANGE: &str = "[x-y] range in reverse order";
pub const SUBTRACTION_MUST_BE_LAST: &str =
    "A subtraction must be the last element in a character class";
pub const UNTERMINATED_SET: &str = "Unterminated [] set";
pub const ILLEGAL_END_BACKSLASH: &str = "Illegal \\ at end of pattern";
pub const MALFORMED_CATEGORY_ESCAPE: &str = "Malformed \\p{X} character escape";
pub const INCOMPLETE_CATEGORY_ESCAPE: &str = "Incomplete \\p{X} character escape";
pub const UNKNOWN_PROPERTY: &str = "Unknown property";
pub const MALFORMED_NAMED_REFERENCE: &str = "Malformed \\k<...> named back reference";
pub const UNRECOGNIZED_CONTROL: &str = "Unrecognized control character";
pub const MISSING_CONTROL: &str = "Missing control character";
pub const INSUFFICIENT_HEX_DIGITS: &str = "Insufficient hexadecimal digits";
pub const CAPTURE_TOO_LARGE: &str =
    "Capture group numbers must be less than or equal to Int32.MaxValue";
pub const UNTERMINATED_COMMENT: &str = "Unterminated (?#...) comment";

/// `Reference to undefined group number {number}`
pub fn undefined_group_number(number: i32) -> String {
    format!("Reference to undefined group number {number}")
}

/// `Reference to undefined group name {name}`
pub fn undefined_group_name(name: &str) -> String {
    format!("Reference to undefined group name {name}")
}

/// `Nested quantifier {ch}`
pub fn nested_quantifier(ch: char) -> String {
    format!("Nested quantifier {ch}")
}

/// `Cannot include class \{ch} in character range`
pub fn cannot_include_class(ch: char) -> String {
    format!("Cannot include class \\{ch} in character range")
}

/// `Unrecognized escape sequence \{ch}`
pub fn unrecognized_escape(ch: char) -> String {
    format!("Unrecognized escape sequence \\{ch}")
}

/// `Unknown property '{name}'`
pub fn unknown_property(name: &str) -> String {
    format!("Unknown property '{name}'")
}
