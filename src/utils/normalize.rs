//! Resolution of roff escape sequences into plain text.
//!
//! Keywords and record fields are stored as they come out of the parser and
//! may still contain escapes and the parser's placeholder bytes. Everything
//! read back from a store goes through [`normalize`] before it is matched or
//! displayed.

use crate::utils::chars::{CharTable, standard_chars};
use crate::utils::encoding::{encode_legacy_utf8, legacy_utf8_len};
use memchr::memchr;

/// Placeholder the parser emits for a breakable (soft) hyphen
pub const ASCII_HYPH: u8 = 30;

/// Placeholder the parser emits for a non-breaking space
pub const ASCII_NBRSP: u8 = 31;

/// One decoded escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape<'a> {
    /// Named special character, resolved through the table
    Named(&'a [u8]),
    /// Numbered character
    Number(u32),
    /// Escape standing for a single output byte
    Literal(u8),
    /// Font, size and spacing escapes with no textual content
    Ignore,
}

/// Normalize using the built-in character table
pub fn normalize(input: &[u8]) -> Vec<u8> {
    normalize_with(input, standard_chars())
}

/// Normalize into a `String`, replacing invalid UTF-8 (legacy long forms)
pub fn normalize_lossy(input: &[u8]) -> String {
    let bytes = normalize(input);
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Resolve placeholders and escapes in `input`.
///
/// An unterminated escape ends normalization; the text before it is kept.
pub fn normalize_with(input: &[u8], table: &dyn CharTable) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + 1);
    let mut pos = 0;

    while pos < input.len() {
        let byte = input[pos];
        match byte {
            ASCII_HYPH => {
                out.push(b'-');
                pos += 1;
            }
            ASCII_NBRSP | b'\t' => {
                out.push(b' ');
                pos += 1;
            }
            b'\\' => {
                let Some((escape, consumed)) = parse_escape(&input[pos + 1..]) else {
                    break;
                };
                pos += 1 + consumed;

                let cp = match escape {
                    Escape::Literal(b) => {
                        out.push(b);
                        continue;
                    }
                    Escape::Ignore => continue,
                    Escape::Number(cp) => Some(cp),
                    Escape::Named(name) => table.lookup(name),
                };

                if let Some(cp) = cp {
                    out.reserve_exact(legacy_utf8_len(cp));
                    encode_legacy_utf8(cp, &mut out);
                }
            }
            _ => {
                out.push(byte);
                pos += 1;
            }
        }
    }

    out
}

/// Parse the escape following a backslash.
///
/// Returns the escape and the number of bytes it occupies after the
/// backslash, or `None` if the escape runs off the end of the input.
fn parse_escape(rest: &[u8]) -> Option<(Escape<'_>, usize)> {
    let (&c, _) = rest.split_first()?;

    match c {
        b'(' => Some((Escape::Named(rest.get(1..3)?), 3)),
        b'[' => {
            let (name, consumed) = bracketed(rest, 0)?;
            Some((bracket_escape(name), consumed))
        }
        b'C' => {
            let (name, consumed) = quoted(rest, 1)?;
            Some((Escape::Named(name), consumed))
        }
        b'N' => {
            let (digits, consumed) = quoted(rest, 1)?;
            let escape = std::str::from_utf8(digits)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .map_or(Escape::Ignore, Escape::Number);
            Some((escape, consumed))
        }
        b'*' => match *rest.get(1)? {
            b'(' => Some((Escape::Named(rest.get(2..4)?), 4)),
            b'[' => {
                let (name, consumed) = bracketed(rest, 1)?;
                Some((Escape::Named(name), consumed))
            }
            _ => Some((Escape::Named(&rest[1..2]), 2)),
        },
        b'f' | b'F' => Some((Escape::Ignore, argument(rest, 1)?)),
        b's' => {
            let mut start = 1;
            if matches!(rest.get(1), Some(b'+' | b'-')) {
                start = 2;
            }
            Some((Escape::Ignore, argument(rest, start)?))
        }
        b'e' | b'\\' => Some((Escape::Literal(b'\\'), 1)),
        b'-' => Some((Escape::Literal(b'-'), 1)),
        b'~' | b' ' | b'0' => Some((Escape::Literal(b' '), 1)),
        b'&' | b'|' | b'^' | b'%' | b'c' | b'd' | b'u' | b'r' | b'{' | b'}' | b':' => {
            Some((Escape::Ignore, 1))
        }
        _ => Some((Escape::Named(&rest[..1]), 1)),
    }
}

/// `[name]` starting at `open`; returns the name and bytes consumed
fn bracketed(rest: &[u8], open: usize) -> Option<(&[u8], usize)> {
    let body = rest.get(open + 1..)?;
    let end = memchr(b']', body)?;
    Some((&body[..end], open + 1 + end + 1))
}

/// `'text'` with an arbitrary delimiter at `open`
fn quoted(rest: &[u8], open: usize) -> Option<(&[u8], usize)> {
    let delim = *rest.get(open)?;
    let body = rest.get(open + 1..)?;
    let end = memchr(delim, body)?;
    Some((&body[..end], open + 1 + end + 1))
}

/// Length of a one-character, `(xx` or `[...]` argument starting at `start`
fn argument(rest: &[u8], start: usize) -> Option<usize> {
    match *rest.get(start)? {
        b'(' => {
            rest.get(start + 1..start + 3)?;
            Some(start + 3)
        }
        b'[' => bracketed(rest, start).map(|(_, consumed)| consumed),
        b'\'' => quoted(rest, start).map(|(_, consumed)| consumed),
        _ => Some(start + 1),
    }
}

/// `\[uXXXX]` is a numbered character; any other bracket name is looked up
fn bracket_escape(name: &[u8]) -> Escape<'_> {
    if name.len() >= 5 && name[0] == b'u' {
        let hex = &name[1..];
        if hex.iter().all(u8::is_ascii_hexdigit) {
            if let Some(cp) = std::str::from_utf8(hex)
                .ok()
                .and_then(|s| u32::from_str_radix(s, 16).ok())
            {
                return Escape::Number(cp);
            }
        }
    }
    Escape::Named(name)
}
