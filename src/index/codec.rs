//! Byte layout of the two stores.
//!
//! Both files start with a 4-byte magic and a big-endian format version.
//!
//! Keyword store records:
//!
//! ```text
//! key_len: u32 | keyword bytes, NUL | value_len: u32 | mask: u64 | doc_id: u64
//! ```
//!
//! Document store records, the id being the record's ordinal (from 1):
//!
//! ```text
//! value_len: u32 | kind tag | file NUL category NUL title NUL arch NUL description NUL
//! ```
//!
//! A zero-length document value is a tombstone. All integers are big-endian.

use crate::index::fields::TypeMask;
use crate::index::types::{DocId, DocKind, DocumentRecord};
use crate::utils::encoding::{read_u32_be, read_u64_be};
use crate::utils::normalize::normalize_lossy;
use memchr::memchr;

pub const KEYWORD_MAGIC: &[u8; 4] = b"MXKW";
pub const DOCUMENT_MAGIC: &[u8; 4] = b"MXDS";
pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 8;

/// Exact size of a keyword store value
pub const KEYWORD_VALUE_LEN: usize = 16;

/// Minimum keyword key size: one byte of text plus the terminator
pub const MIN_KEY_LEN: usize = 2;

/// Number of NUL-terminated text fields in a document value
pub const DOCUMENT_FIELDS: usize = 5;

/// File header for a store
pub fn header(magic: &[u8; 4]) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[..4].copy_from_slice(magic);
    out[4..].copy_from_slice(&FORMAT_VERSION.to_be_bytes());
    out
}

/// Validate a store header; returns the offset of the first record
pub fn check_header(buf: &[u8], magic: &[u8; 4]) -> Result<usize, &'static str> {
    if buf.len() < HEADER_LEN {
        return Err("truncated header");
    }
    if &buf[..4] != magic {
        return Err("bad magic");
    }
    match read_u32_be(buf, 4) {
        Some(FORMAT_VERSION) => Ok(HEADER_LEN),
        _ => Err("unsupported format version"),
    }
}

/// Keyword key: the keyword with a NUL terminator
pub fn encode_keyword_key(keyword: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(keyword.len() + 1);
    key.extend(keyword.iter().copied().filter(|&b| b != 0));
    key.push(0);
    key
}

/// Strip and check the terminator of a keyword key
pub fn decode_keyword_key(key: &[u8]) -> Result<&[u8], &'static str> {
    if key.len() < MIN_KEY_LEN {
        return Err("keyword key too short");
    }
    match key.split_last() {
        Some((0, text)) => Ok(text),
        _ => Err("keyword key not terminated"),
    }
}

pub fn encode_keyword_value(mask: TypeMask, doc_id: DocId) -> [u8; KEYWORD_VALUE_LEN] {
    let mut out = [0u8; KEYWORD_VALUE_LEN];
    out[..8].copy_from_slice(&mask.0.to_be_bytes());
    out[8..].copy_from_slice(&u64::from(doc_id).to_be_bytes());
    out
}

/// Decode `(mask, doc_id)`; the id keeps its full on-disk width
pub fn decode_keyword_value(value: &[u8]) -> Result<(TypeMask, u64), &'static str> {
    if value.len() != KEYWORD_VALUE_LEN {
        return Err("keyword value is not 16 bytes");
    }
    let mask = read_u64_be(value, 0).ok_or("keyword value truncated")?;
    let doc_id = read_u64_be(value, 8).ok_or("keyword value truncated")?;
    Ok((TypeMask(mask), doc_id))
}

/// Encode a document value. Fields are written verbatim minus any NUL bytes.
pub fn encode_document(record: &DocumentRecord) -> Vec<u8> {
    let fields = [
        &record.file,
        &record.category,
        &record.title,
        &record.arch,
        &record.description,
    ];
    let len = 1 + fields.iter().map(|f| f.len() + 1).sum::<usize>();

    let mut out = Vec::with_capacity(len);
    out.push(record.kind.tag());
    for field in fields {
        out.extend(field.bytes().filter(|&b| b != 0));
        out.push(0);
    }
    out
}

/// Split a document value into its kind and raw fields
pub fn split_document(value: &[u8]) -> Result<(DocKind, [&[u8]; DOCUMENT_FIELDS]), &'static str> {
    let (&tag, mut rest) = value.split_first().ok_or("empty document value")?;
    let kind = DocKind::from_tag(tag).ok_or("unknown document kind")?;

    let mut fields: [&[u8]; DOCUMENT_FIELDS] = [&[]; DOCUMENT_FIELDS];
    for field in fields.iter_mut() {
        let end = memchr(0, rest).ok_or("document field not terminated")?;
        *field = &rest[..end];
        rest = &rest[end + 1..];
    }
    if !rest.is_empty() {
        return Err("trailing bytes after document fields");
    }
    Ok((kind, fields))
}

/// Decode a document value. `Ok(None)` is a tombstone.
pub fn decode_document(id: DocId, value: &[u8]) -> Result<Option<DocumentRecord>, &'static str> {
    if value.is_empty() {
        return Ok(None);
    }
    let (kind, [file, category, title, arch, description]) = split_document(value)?;
    Ok(Some(DocumentRecord {
        id,
        kind,
        file: normalize_lossy(file),
        category: normalize_lossy(category),
        title: normalize_lossy(title),
        arch: normalize_lossy(arch),
        description: normalize_lossy(description),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: 7,
            kind: DocKind::Man,
            file: "man1/ls.1".to_string(),
            category: "1".to_string(),
            title: "ls".to_string(),
            arch: String::new(),
            description: "list directory contents".to_string(),
        }
    }

    #[test]
    fn test_document_roundtrip() {
        let rec = record();
        let bytes = encode_document(&rec);
        assert_eq!(bytes[0], b'a');
        assert_eq!(decode_document(7, &bytes).unwrap(), Some(rec));
    }

    #[test]
    fn test_document_tombstone() {
        assert_eq!(decode_document(3, &[]).unwrap(), None);
    }

    #[test]
    fn test_document_missing_terminator() {
        let mut bytes = encode_document(&record());
        bytes.pop();
        assert!(decode_document(7, &bytes).is_err());
    }

    #[test]
    fn test_document_bad_tag_and_trailing_bytes() {
        let mut bytes = encode_document(&record());
        bytes[0] = b'z';
        assert_eq!(decode_document(7, &bytes), Err("unknown document kind"));

        let mut bytes = encode_document(&record());
        bytes.push(b'x');
        assert!(decode_document(7, &bytes).is_err());
    }

    #[test]
    fn test_document_fields_are_normalized() {
        let mut rec = record();
        rec.description = "list \\fBdirectory\\fR contents".to_string();
        let decoded = decode_document(7, &encode_document(&rec)).unwrap().unwrap();
        assert_eq!(decoded.description, "list directory contents");
    }

    #[test]
    fn test_keyword_key_rules() {
        assert_eq!(encode_keyword_key(b"ls"), b"ls\0");
        assert_eq!(decode_keyword_key(b"ls\0"), Ok(&b"ls"[..]));
        assert!(decode_keyword_key(b"\0").is_err());
        assert!(decode_keyword_key(b"ls").is_err());
    }

    #[test]
    fn test_keyword_value_layout() {
        let value = encode_keyword_value(TypeMask::NM, 0x0102_0304);
        assert_eq!(&value[..8], &TypeMask::NM.0.to_be_bytes());
        assert_eq!(&value[8..], &[0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(decode_keyword_value(&value), Ok((TypeMask::NM, 0x0102_0304)));
        assert!(decode_keyword_value(&value[..15]).is_err());
    }

    #[test]
    fn test_header_checks() {
        let hdr = header(KEYWORD_MAGIC);
        assert_eq!(check_header(&hdr, KEYWORD_MAGIC), Ok(HEADER_LEN));
        assert!(check_header(&hdr, DOCUMENT_MAGIC).is_err());
        assert!(check_header(&hdr[..6], KEYWORD_MAGIC).is_err());
    }
}
