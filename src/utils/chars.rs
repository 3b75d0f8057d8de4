//! Escape-name to codepoint lookup used by the normalizer.
//!
//! The full character table belongs to the document parser. The core only
//! needs the [`CharTable`] seam; [`StandardChars`] covers the special
//! characters that commonly appear in names and one-line descriptions.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Resolves a named escape (`\(em`, `\[bu]`, ...) to a codepoint
pub trait CharTable {
    fn lookup(&self, name: &[u8]) -> Option<u32>;
}

/// Built-in table of common roff special characters
pub struct StandardChars {
    map: FxHashMap<&'static [u8], u32>,
}

const STANDARD: &[(&str, u32)] = &[
    // Dashes and hyphens
    ("em", 0x2014),
    ("en", 0x2013),
    ("hy", 0x2010),
    ("-", 0x2212),
    ("mi", 0x2212),
    // Quotes
    ("lq", 0x201C),
    ("rq", 0x201D),
    ("oq", 0x2018),
    ("cq", 0x2019),
    ("aq", 0x0027),
    ("dq", 0x0022),
    ("Bq", 0x201E),
    ("bq", 0x201A),
    ("Fo", 0x00AB),
    ("Fc", 0x00BB),
    // Punctuation and symbols
    ("bu", 0x2022),
    ("ba", 0x007C),
    ("br", 0x2502),
    ("ul", 0x005F),
    ("rs", 0x005C),
    ("sl", 0x002F),
    ("ti", 0x007E),
    ("ha", 0x005E),
    ("at", 0x0040),
    ("sh", 0x0023),
    ("Do", 0x0024),
    ("co", 0x00A9),
    ("rg", 0x00AE),
    ("tm", 0x2122),
    ("de", 0x00B0),
    ("ps", 0x00B6),
    ("sc", 0x00A7),
    ("dg", 0x2020),
    ("dd", 0x2021),
    ("lh", 0x261C),
    ("rh", 0x261E),
    ("Eu", 0x20AC),
    ("Po", 0x00A3),
    ("Ye", 0x00A5),
    ("ct", 0x00A2),
    // Math
    ("+-", 0x00B1),
    ("mu", 0x00D7),
    ("di", 0x00F7),
    ("<=", 0x2264),
    (">=", 0x2265),
    ("!=", 0x2260),
    ("==", 0x2261),
    ("~=", 0x2245),
    ("~~", 0x2248),
    ("if", 0x221E),
    ("sr", 0x221A),
    ("pl", 0x002B),
    ("eq", 0x003D),
    // Arrows
    ("->", 0x2192),
    ("<-", 0x2190),
    ("<>", 0x2194),
    ("ua", 0x2191),
    ("da", 0x2193),
    ("rA", 0x21D2),
    ("lA", 0x21D0),
    // Greek
    ("*a", 0x03B1),
    ("*b", 0x03B2),
    ("*g", 0x03B3),
    ("*d", 0x03B4),
    ("*m", 0x03BC),
    ("*p", 0x03C0),
    ("*l", 0x03BB),
    ("*s", 0x03C3),
    // Accented letters
    ("'a", 0x00E1),
    ("'e", 0x00E9),
    ("'i", 0x00ED),
    ("'o", 0x00F3),
    ("'u", 0x00FA),
    ("`a", 0x00E0),
    ("`e", 0x00E8),
    (":a", 0x00E4),
    (":o", 0x00F6),
    (":u", 0x00FC),
    (":A", 0x00C4),
    (":O", 0x00D6),
    (":U", 0x00DC),
    ("^a", 0x00E2),
    ("^e", 0x00EA),
    ("~n", 0x00F1),
    ("~N", 0x00D1),
    (",c", 0x00E7),
    (",C", 0x00C7),
    ("ss", 0x00DF),
    ("ae", 0x00E6),
    ("AE", 0x00C6),
    ("/o", 0x00F8),
    ("/O", 0x00D8),
    ("oa", 0x00E5),
    ("oA", 0x00C5),
    // Predefined strings
    ("R", 0x00AE),
    ("Tm", 0x2122),
];

impl StandardChars {
    pub fn new() -> Self {
        let map = STANDARD
            .iter()
            .map(|&(name, cp)| (name.as_bytes(), cp))
            .collect();
        Self { map }
    }
}

impl Default for StandardChars {
    fn default() -> Self {
        Self::new()
    }
}

impl CharTable for StandardChars {
    fn lookup(&self, name: &[u8]) -> Option<u32> {
        self.map.get(name).copied()
    }
}

/// Shared instance of the built-in table
pub fn standard_chars() -> &'static StandardChars {
    static TABLE: OnceLock<StandardChars> = OnceLock::new();
    TABLE.get_or_init(StandardChars::new)
}
