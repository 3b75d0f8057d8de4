use crate::error::{StoreError, StoreResult};
use crate::index::codec::{
    DOCUMENT_MAGIC, KEYWORD_MAGIC, check_header, decode_document, decode_keyword_key,
    decode_keyword_value,
};
use crate::index::fields::TypeMask;
use crate::index::types::{DOCUMENT_STORE, DocId, DocumentRecord, IndexState, KEYWORD_STORE};
use crate::utils::encoding::read_u32_be;
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only bytes of a store file
enum Backing {
    Mapped(Mmap),
    /// Zero-length file (cannot be mapped on every platform)
    Empty,
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(map) => &map[..],
            Backing::Empty => &[],
        }
    }
}

/// Map a store file. A missing file is `Ok(None)`.
fn map_store(path: &Path) -> StoreResult<Option<Backing>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "store absent");
            return Ok(None);
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let len = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
    if len == 0 {
        return Ok(Some(Backing::Empty));
    }

    let map = unsafe { Mmap::map(&file) }.map_err(|e| StoreError::io(path, e))?;
    Ok(Some(Backing::Mapped(map)))
}

/// One keyword store entry, borrowed from the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyword<'a> {
    /// Keyword without its terminator, not yet normalized
    pub keyword: &'a [u8],
    pub mask: TypeMask,
    pub doc_id: u64,
}

/// Memory-mapped keyword store
pub struct KeywordStore {
    path: PathBuf,
    data: Backing,
    start: usize,
}

impl KeywordStore {
    /// Open the keyword store of a collection root
    pub fn open(root: &Path) -> StoreResult<Option<Self>> {
        Self::open_path(&root.join(KEYWORD_STORE))
    }

    pub fn open_path(path: &Path) -> StoreResult<Option<Self>> {
        let Some(data) = map_store(path)? else {
            return Ok(None);
        };
        let start = check_header(data.bytes(), KEYWORD_MAGIC)
            .map_err(|reason| StoreError::corrupt(path, reason))?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            data,
            start,
        }))
    }

    /// Linear scan over every entry, in key order
    pub fn cursor(&self) -> KeywordCursor<'_> {
        KeywordCursor {
            path: &self.path,
            buf: self.data.bytes(),
            pos: self.start,
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the store file in bytes
    pub fn byte_len(&self) -> usize {
        self.data.bytes().len()
    }
}

/// Sequential reader over a keyword store.
///
/// Yields one error on the first malformed record, then stops.
pub struct KeywordCursor<'a> {
    path: &'a Path,
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> KeywordCursor<'a> {
    fn read_record(&mut self) -> Result<RawKeyword<'a>, &'static str> {
        let buf = self.buf;
        let mut pos = self.pos;

        let key_len = read_u32_be(buf, pos).ok_or("truncated key length")? as usize;
        pos += 4;
        let key = buf.get(pos..pos + key_len).ok_or("truncated key")?;
        pos += key_len;

        let value_len = read_u32_be(buf, pos).ok_or("truncated value length")? as usize;
        pos += 4;
        let value = buf.get(pos..pos + value_len).ok_or("truncated value")?;
        pos += value_len;

        let keyword = decode_keyword_key(key)?;
        let (mask, doc_id) = decode_keyword_value(value)?;

        self.pos = pos;
        Ok(RawKeyword {
            keyword,
            mask,
            doc_id,
        })
    }
}

impl<'a> Iterator for KeywordCursor<'a> {
    type Item = StoreResult<RawKeyword<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.buf.len() {
            return None;
        }

        match self.read_record() {
            Ok(entry) => Some(Ok(entry)),
            Err(reason) => {
                self.done = true;
                Some(Err(StoreError::corrupt(self.path, reason)))
            }
        }
    }
}

/// Memory-mapped document store with an in-memory offset table
pub struct DocumentStore {
    path: PathBuf,
    data: Backing,
    /// (value offset, value length), indexed by id - 1
    offsets: Vec<(usize, usize)>,
}

impl DocumentStore {
    /// Open the document store of a collection root
    pub fn open(root: &Path) -> StoreResult<Option<Self>> {
        Self::open_path(&root.join(DOCUMENT_STORE))
    }

    pub fn open_path(path: &Path) -> StoreResult<Option<Self>> {
        let Some(data) = map_store(path)? else {
            return Ok(None);
        };
        let offsets = scan_offsets(data.bytes()).map_err(|reason| StoreError::corrupt(path, reason))?;

        debug!(path = %path.display(), records = offsets.len(), "opened document store");
        Ok(Some(Self {
            path: path.to_path_buf(),
            data,
            offsets,
        }))
    }

    /// Number of record slots, tombstones included
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Raw value for an id; empty for tombstones, `None` past the end
    pub fn raw(&self, id: u64) -> Option<&[u8]> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        let &(start, len) = self.offsets.get(index)?;
        self.data.bytes().get(start..start + len)
    }

    /// Decoded record for an id; `None` if absent or deleted
    pub fn get(&self, id: u64) -> StoreResult<Option<DocumentRecord>> {
        let Some(value) = self.raw(id) else {
            return Ok(None);
        };
        let Ok(doc_id) = DocId::try_from(id) else {
            return Ok(None);
        };
        decode_document(doc_id, value).map_err(|reason| StoreError::corrupt(&self.path, reason))
    }

    /// Every slot in id order with its raw value
    pub fn raw_records(&self) -> impl Iterator<Item = (DocId, &[u8])> + '_ {
        let bytes = self.data.bytes();
        self.offsets
            .iter()
            .enumerate()
            .map(move |(i, &(start, len))| (i as DocId + 1, &bytes[start..start + len]))
    }

    /// Every live record in id order
    pub fn records(&self) -> StoreResult<Vec<DocumentRecord>> {
        let mut out = Vec::with_capacity(self.offsets.len());
        for (id, value) in self.raw_records() {
            let record =
                decode_document(id, value).map_err(|reason| StoreError::corrupt(&self.path, reason))?;
            out.extend(record);
        }
        Ok(out)
    }

    /// Allocation state implied by the store: tombstones are free ids
    pub fn state(&self) -> IndexState {
        let mut free_ids: Vec<DocId> = self
            .raw_records()
            .filter(|(_, value)| value.is_empty())
            .map(|(id, _)| id)
            .collect();
        // Lowest id on top of the stack
        free_ids.reverse();
        IndexState {
            free_ids,
            next_id: self.offsets.len() as DocId + 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_len(&self) -> usize {
        self.data.bytes().len()
    }
}

/// Walk the length prefixes of a document store
fn scan_offsets(buf: &[u8]) -> Result<Vec<(usize, usize)>, &'static str> {
    let mut pos = check_header(buf, DOCUMENT_MAGIC)?;
    let mut offsets = Vec::new();

    while pos < buf.len() {
        let len = read_u32_be(buf, pos).ok_or("truncated record length")? as usize;
        pos += 4;
        if buf.len() - pos < len {
            return Err("truncated record");
        }
        offsets.push((pos, len));
        pos += len;
    }

    Ok(offsets)
}
