use crate::error::{StoreError, StoreResult};
use crate::index::reader::{DocumentStore, KeywordStore};
use crate::index::types::{DocId, DocumentRecord};
use crate::query::candidates::{Candidate, CandidateSet, Lookup};
use crate::query::expr::{Expression, Term};
use crate::utils::normalize::normalize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Optional category and architecture filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    pub category: Option<String>,
    pub arch: Option<String>,
}

impl Restriction {
    /// Whether a document passes the filter. Case is ignored; documents
    /// without an architecture pass any architecture filter.
    pub fn admits(&self, record: &DocumentRecord) -> bool {
        let category_ok = match &self.category {
            Some(category) => record.category.eq_ignore_ascii_case(category),
            None => true,
        };
        let arch_ok = match &self.arch {
            Some(arch) => record.arch.is_empty() || record.arch.eq_ignore_ascii_case(arch),
            None => true,
        };
        category_ok && arch_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Complete,
    /// A store under `root` failed a structural check; later roots were not
    /// searched
    Corrupt { root: PathBuf, reason: String },
}

#[derive(Debug)]
pub struct SearchResults {
    /// Every candidate collected, matched or not, in discovery order
    pub candidates: Vec<Candidate>,
    pub status: SearchStatus,
}

impl SearchResults {
    pub fn matched(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.matched)
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self.status, SearchStatus::Corrupt { .. })
    }
}

/// Search collection roots in order.
///
/// Roots without stores are skipped. Corruption stops the search and is
/// reported in the status; candidates found up to that point are kept.
pub fn search<P: AsRef<Path>>(roots: &[P], restriction: &Restriction, expr: &Expression) -> SearchResults {
    let terms = expr.terms();
    let mut set = CandidateSet::new();

    for (index, root) in roots.iter().enumerate() {
        let root = root.as_ref();
        set.reset_tree();

        if let Err(e) = search_root(root, index, restriction, expr, &terms, &mut set) {
            warn!(root = %root.display(), error = %e, "search aborted");
            let reason = match e {
                StoreError::Corrupt { reason, .. } => reason,
                StoreError::Io { source, .. } => source.to_string(),
            };
            return SearchResults {
                candidates: set.into_vec(),
                status: SearchStatus::Corrupt {
                    root: root.to_path_buf(),
                    reason,
                },
            };
        }
    }

    SearchResults {
        candidates: set.into_vec(),
        status: SearchStatus::Complete,
    }
}

/// Open a store, treating anything short of corruption as absent
fn open_or_skip<T>(root: &Path, opened: StoreResult<Option<T>>) -> StoreResult<Option<T>> {
    match opened {
        Ok(store) => Ok(store),
        Err(e) if e.is_corrupt() => Err(e),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "skipping unreadable root");
            Ok(None)
        }
    }
}

fn search_root(
    root: &Path,
    index: usize,
    restriction: &Restriction,
    expr: &Expression,
    terms: &[(usize, &Term)],
    set: &mut CandidateSet,
) -> StoreResult<()> {
    let Some(keywords) = open_or_skip(root, KeywordStore::open(root))? else {
        debug!(root = %root.display(), "no keyword store");
        return Ok(());
    };
    let Some(documents) = open_or_skip(root, DocumentStore::open(root))? else {
        debug!(root = %root.display(), "no document store");
        return Ok(());
    };

    let needs_folded = terms.iter().any(|(_, term)| term.matcher.needs_folded());
    let mut hits: Vec<usize> = Vec::with_capacity(terms.len());
    let mut folded: Vec<u8> = Vec::new();
    let mut scanned = 0usize;

    for entry in keywords.cursor() {
        let entry = entry?;
        scanned += 1;

        hits.clear();
        let mut text: Option<Vec<u8>> = None;
        for &(seq, term) in terms {
            if !term.mask.intersects(entry.mask) {
                continue;
            }
            // Normalize once per entry, and only if some term looks at it
            let text = text.get_or_insert_with(|| {
                let text = normalize(entry.keyword);
                if needs_folded {
                    folded.clear();
                    folded.extend(text.iter().map(u8::to_ascii_lowercase));
                }
                text
            });
            if term.matcher.is_match(text, &folded) {
                hits.push(seq);
            }
        }
        if hits.is_empty() {
            continue;
        }

        let Ok(doc_id) = DocId::try_from(entry.doc_id) else {
            return Err(StoreError::corrupt(
                keywords.path(),
                format!("document id {} out of range", entry.doc_id),
            ));
        };
        let slot = match set.lookup(doc_id) {
            Lookup::Found(slot) => slot,
            Lookup::Vacant(link) => {
                let Some(record) = documents.get(entry.doc_id)? else {
                    return Err(StoreError::corrupt(
                        keywords.path(),
                        format!(
                            "keyword `{}` refers to missing document {}",
                            String::from_utf8_lossy(entry.keyword),
                            doc_id
                        ),
                    ));
                };
                if !restriction.admits(&record) {
                    continue;
                }
                set.insert(link, Candidate::new(index, record, expr.term_count()))
            }
        };

        let candidate = &mut set[slot];
        if mark_hits(candidate, &hits) && !candidate.matched {
            candidate.matched = expr.evaluate(&mut candidate.flags);
        }
    }

    debug!(root = %root.display(), scanned, candidates = set.len(), "searched root");
    Ok(())
}

/// Set the flags of `hits`; true if any flag was newly set
fn mark_hits(candidate: &mut Candidate, hits: &[usize]) -> bool {
    let mut changed = false;
    for &seq in hits {
        changed |= !candidate.flags[seq];
        candidate.flags[seq] = true;
    }
    changed
}
