use std::io::{self, Write};

/// Largest codepoint the legacy (pre-RFC 3629) UTF-8 scheme can express
pub const MAX_LEGACY_CODEPOINT: u32 = 0x7FFF_FFFF;

/// Number of bytes the legacy UTF-8 encoding of `cp` occupies (1 to 6)
pub fn legacy_utf8_len(cp: u32) -> usize {
    match cp {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        _ => 6,
    }
}

/// Append the legacy UTF-8 encoding of a codepoint.
///
/// Unlike `char::encode_utf8`, surrogates and values above U+10FFFF are
/// encoded as-is using the original 5 and 6 byte forms. Returns the number
/// of bytes written, or 0 if `cp` is out of range.
pub fn encode_legacy_utf8(cp: u32, buf: &mut Vec<u8>) -> usize {
    if cp > MAX_LEGACY_CODEPOINT {
        return 0;
    }

    let len = legacy_utf8_len(cp);
    if len == 1 {
        buf.push(cp as u8);
        return 1;
    }

    // Lead byte: `len` high bits set, then a zero bit, then payload
    let lead_marker: u8 = !(0xFFu8 >> len);
    let shift = 6 * (len - 1);
    buf.push(lead_marker | (cp >> shift) as u8);

    for i in (0..len - 1).rev() {
        buf.push(0x80 | ((cp >> (6 * i)) & 0x3F) as u8);
    }

    len
}

/// Write a u32 in big-endian format
pub fn write_u32_be<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Write a u64 in big-endian format
pub fn write_u64_be<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Read a big-endian u32 at `pos`, if enough bytes remain
pub fn read_u32_be(buf: &[u8], pos: usize) -> Option<u32> {
    let bytes = buf.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

/// Read a big-endian u64 at `pos`, if enough bytes remain
pub fn read_u64_be(buf: &[u8], pos: usize) -> Option<u64> {
    let bytes = buf.get(pos..pos.checked_add(8)?)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}
