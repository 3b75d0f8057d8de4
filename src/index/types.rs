use crate::index::fields::TypeMask;
use serde::{Deserialize, Serialize};

/// Unique identifier for a document within one index generation
pub type DocId = u32;

/// File name of the keyword store inside a collection root
pub const KEYWORD_STORE: &str = "keywords.db";

/// File name of the document store inside a collection root
pub const DOCUMENT_STORE: &str = "documents.db";

/// Kind of source a document record was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocKind {
    /// Semantic markup
    Mdoc,
    /// Presentational markup
    Man,
    /// Preformatted text
    Formatted,
}

impl DocKind {
    /// Tag byte leading a document store value
    pub fn tag(self) -> u8 {
        match self {
            DocKind::Mdoc => b'd',
            DocKind::Man => b'a',
            DocKind::Formatted => b'c',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'd' => Some(DocKind::Mdoc),
            b'a' => Some(DocKind::Man),
            b'c' => Some(DocKind::Formatted),
            _ => None,
        }
    }
}

/// Document metadata stored in the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocId,
    pub kind: DocKind,
    /// Path relative to the collection root
    pub file: String,
    pub category: String,
    pub title: String,
    /// Empty for machine-independent documents
    pub arch: String,
    pub description: String,
}

/// One keyword of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    /// Keyword text as produced by the parser (may contain escapes)
    pub keyword: Vec<u8>,
    pub mask: TypeMask,
    pub doc_id: DocId,
}

/// Id allocation state carried between builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    /// Ids freed by pruning, reused last-in first-out
    pub free_ids: Vec<DocId>,
    /// Next id to mint when the free list is empty
    pub next_id: DocId,
}

impl Default for IndexState {
    fn default() -> Self {
        Self {
            free_ids: Vec::new(),
            next_id: 1,
        }
    }
}

impl IndexState {
    /// Take an id from the free list, else mint a new one
    pub fn allocate(&mut self) -> DocId {
        match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        }
    }

    /// Return an id to the free list
    pub fn release(&mut self, id: DocId) {
        self.free_ids.push(id);
    }

    /// Number of ids ever minted
    pub fn minted(&self) -> usize {
        self.next_id.saturating_sub(1) as usize
    }
}

/// Options controlling a build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Exclude documents whose metadata disagrees with their location
    #[serde(default)]
    pub strict: bool,
    /// Log every warning, not just a summary
    #[serde(default)]
    pub verbose: bool,
    /// Show a progress bar while adding documents
    #[serde(default)]
    pub progress: bool,
}
