//! Pattern option flags.

use bitflags::bitflags;

bitflags! {
    /// The option set a pattern is parsed under.
    ///
    /// The first five flags can also be toggled inline with `(?imnsx)`
    /// groups; `RIGHT_TO_LEFT` and `ECMASCRIPT` only ever arrive from the
    /// caller. Options change what the parser accepts (`x` turns on
    /// pattern whitespace and `#` comments, `ECMASCRIPT` changes escape
    /// and backreference rules), so the parser threads its current set
    /// through every scan.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct PatternFlags: u8 {
        /// `i` - case-insensitive matching.
        const IGNORE_CASE = 1 << 0;
        /// `m` - `^` and `$` also match at line boundaries.
        const MULTILINE = 1 << 1;
        /// `n` - plain `(..)` groups do not capture.
        const EXPLICIT_CAPTURE = 1 << 2;
        /// `s` - `.` also matches newline.
        const SINGLELINE = 1 << 3;
        /// `x` - unescaped whitespace is ignored, `#` starts a comment.
        const IGNORE_PATTERN_WHITESPACE = 1 << 4;
        /// The pattern is matched right to left.
        const RIGHT_TO_LEFT = 1 << 5;
        /// ECMAScript-compatible behavior.
        const ECMASCRIPT = 1 << 6;
    }
}

impl PatternFlags {
    /// The flag toggled by an inline option letter, if `ch` is one.
    ///
    /// Both cases are accepted, matching the engine.
    pub fn from_option_letter(ch: char) -> Option<PatternFlags> {
        match ch {
            'i' | 'I' => Some(PatternFlags::IGNORE_CASE),
            'm' | 'M' => Some(PatternFlags::MULTILINE),
            'n' | 'N' => Some(PatternFlags::EXPLICIT_CAPTURE),
            's' | 'S' => Some(PatternFlags::SINGLELINE),
            'x' | 'X' => Some(PatternFlags::IGNORE_PATTERN_WHITESPACE),
            _ => None,
        }
    }

    /// Check if `ch` is an inline option letter.
    pub fn is_option_letter(ch: char) -> bool {
        Self::from_option_letter(ch).is_some()
    }

    /// Applies an inline option run like `im-sx` on top of `self`.
    ///
    /// Letters set flags until a `-` flips the run to clearing; a `+` flips
    /// it back. Characters that are not option letters are ignored; the
    /// scanner only ever produces runs without any.
    #[must_use]
    pub fn apply_option_run(self, run: impl IntoIterator<Item = char>) -> PatternFlags {
        let mut result = self;
        let mut enable = true;
        for ch in run {
            match ch {
                '+' => enable = true,
                '-' => enable = false,
                _ => {
                    if let Some(flag) = Self::from_option_letter(ch) {
                        if enable {
                            result.insert(flag);
                        } else {
                            result.remove(flag);
                        }
                    }
                }
            }
        }
        result
    }
}
