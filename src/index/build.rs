use crate::error::{BuildResult, StoreError, Warning};
use crate::index::codec::{encode_document, split_document};
use crate::index::document::{Content, ParsedDocument};
use crate::index::keywords::{KeywordTable, collect_keywords};
use crate::index::reader::{DocumentStore, KeywordStore};
use crate::index::types::{BuildOptions, DocId, DocKind, DocumentRecord, IndexState, KeywordEntry};
use crate::index::writer::StoreWriter;
use crate::utils::progress::document_bar;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Allocation state to hand to the next incremental build
    pub state: IndexState,
    pub warnings: Vec<Warning>,
    /// Documents written this cycle
    pub added: usize,
    /// Documents removed this cycle, replacements included
    pub pruned: usize,
    /// Documents excluded by strict mode
    pub skipped: usize,
    /// Live documents in the installed stores
    pub documents: usize,
    /// Keyword records in the installed stores
    pub keywords: usize,
}

/// Accumulates one build cycle for a collection root.
///
/// Prunes and adds share the cycle, so ids freed by [`IndexBuilder::prune`]
/// are handed to documents added afterwards. Nothing touches disk until
/// [`IndexBuilder::commit`].
pub struct IndexBuilder {
    root: PathBuf,
    options: BuildOptions,
    state: IndexState,
    /// Raw document values indexed by id - 1; empty slots are tombstones
    documents: Vec<Vec<u8>>,
    keywords: Vec<KeywordEntry>,
    /// Live documents by file path
    files: FxHashMap<String, DocId>,
    scratch: KeywordTable,
    report: BuildReport,
}

impl IndexBuilder {
    /// Start from empty stores; existing ones are replaced on commit
    pub fn create(root: &Path, options: BuildOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            state: IndexState::default(),
            documents: Vec::new(),
            keywords: Vec::new(),
            files: FxHashMap::default(),
            scratch: KeywordTable::new(),
            report: BuildReport::default(),
        }
    }

    /// Start from the stores currently installed under `root`.
    ///
    /// Missing stores are treated as empty. The allocation state is derived
    /// from the document store.
    pub fn open(root: &Path, options: BuildOptions) -> BuildResult<Self> {
        let mut builder = Self::create(root, options);

        if let Some(store) = DocumentStore::open(root)? {
            builder.state = store.state();
            for (id, value) in store.raw_records() {
                if !value.is_empty() {
                    let (_, [file, ..]) =
                        split_document(value).map_err(|reason| StoreError::corrupt(store.path(), reason))?;
                    builder.files.insert(String::from_utf8_lossy(file).into_owned(), id);
                }
                builder.documents.push(value.to_vec());
            }
        }

        if let Some(store) = KeywordStore::open(root)? {
            let mut dangling = 0usize;
            for entry in store.cursor() {
                let entry = entry?;
                match DocId::try_from(entry.doc_id) {
                    Ok(doc_id) if builder.is_live(doc_id) => builder.keywords.push(KeywordEntry {
                        keyword: entry.keyword.to_vec(),
                        mask: entry.mask,
                        doc_id,
                    }),
                    _ => dangling += 1,
                }
            }
            if dangling > 0 {
                warn!(root = %root.display(), dangling, "dropping keywords of missing documents");
            }
        }

        debug!(
            root = %root.display(),
            documents = builder.files.len(),
            keywords = builder.keywords.len(),
            "loaded existing stores"
        );
        Ok(builder)
    }

    /// Adopt allocation state saved from a previous build.
    ///
    /// State that does not fit the loaded stores is ignored in favor of the
    /// state derived from them.
    pub fn with_state(mut self, state: IndexState) -> Self {
        if state.minted() != self.documents.len() {
            warn!(
                expected = self.documents.len(),
                found = state.minted(),
                "prior state does not match the document store, ignoring it"
            );
            return self;
        }

        let mut seen = FxHashSet::default();
        let free_ids: Vec<DocId> = state
            .free_ids
            .into_iter()
            .filter(|&id| !self.is_live(id) && self.slot(id).is_some() && seen.insert(id))
            .collect();
        // Tombstones missing from the saved list stay free too
        let mut extra: Vec<DocId> = self
            .state
            .free_ids
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        extra.extend(free_ids);

        self.state = IndexState {
            free_ids: extra,
            next_id: state.next_id,
        };
        self
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Id of the live document built from `file`
    pub fn lookup(&self, file: &Path) -> Option<DocId> {
        self.files.get(&*file.to_string_lossy()).copied()
    }

    /// Remove documents by file path; returns how many were indexed
    pub fn prune<P: AsRef<Path>>(&mut self, files: &[P]) -> usize {
        let ids: FxHashSet<DocId> = files
            .iter()
            .filter_map(|file| self.files.remove(&*file.as_ref().to_string_lossy()))
            .collect();
        self.remove_ids(&ids);
        ids.len()
    }

    /// Index one document. Returns its id, or `None` when strict mode
    /// excluded it.
    pub fn add(&mut self, doc: &ParsedDocument) -> Option<DocId> {
        let file = doc.file.to_string_lossy().into_owned();

        if let Some(old) = self.files.remove(&file) {
            debug!(file = %file, id = old, "replacing indexed document");
            self.remove_ids(&FxHashSet::from_iter([old]));
        }

        let mut warnings = Vec::new();
        let resolved = resolve_metadata(doc, &file, &mut warnings);

        self.scratch.clear();
        let description = collect_keywords(&doc.content, &mut self.scratch);

        if description.is_none() {
            warnings.push(Warning::MissingDescription { file: file.clone() });
        }
        if !self.scratch.names().any(|name| name.eq_ignore_ascii_case(&resolved.title)) {
            warnings.push(Warning::TitleUnreachable {
                file: file.clone(),
                title: resolved.title.clone(),
            });
        }

        let excluded = self.options.strict && warnings.iter().any(Warning::is_mismatch);
        self.record_warnings(warnings);
        if excluded {
            debug!(file = %file, "strict mode: skipping document with mismatched metadata");
            self.report.skipped += 1;
            return None;
        }

        let id = self.state.allocate();
        let record = DocumentRecord {
            id,
            kind: resolved.kind,
            file: file.clone(),
            category: resolved.category,
            title: resolved.title,
            arch: resolved.arch,
            description: description.unwrap_or_default(),
        };

        let slot = id as usize - 1;
        if slot >= self.documents.len() {
            self.documents.resize(slot + 1, Vec::new());
        }
        self.documents[slot] = encode_document(&record);

        self.keywords.extend(self.scratch.entries().iter().map(|(keyword, mask)| KeywordEntry {
            keyword: keyword.as_bytes().to_vec(),
            mask: *mask,
            doc_id: id,
        }));
        self.files.insert(file, id);
        self.report.added += 1;
        Some(id)
    }

    /// Write and install the stores
    pub fn commit(mut self) -> BuildResult<BuildReport> {
        self.keywords.sort_by(|a, b| a.keyword.cmp(&b.keyword));

        let mut writer = StoreWriter::create(&self.root)?;
        for entry in &self.keywords {
            writer.write_keyword(&entry.keyword, entry.mask, entry.doc_id)?;
        }
        for value in &self.documents {
            writer.write_document(value)?;
        }
        writer.install()?;

        let mut report = self.report;
        report.state = self.state;
        report.documents = self.files.len();
        report.keywords = self.keywords.len();

        info!(
            root = %self.root.display(),
            added = report.added,
            pruned = report.pruned,
            skipped = report.skipped,
            documents = report.documents,
            keywords = report.keywords,
            warnings = report.warnings.len(),
            "index updated"
        );
        Ok(report)
    }

    fn slot(&self, id: DocId) -> Option<&Vec<u8>> {
        self.documents.get((id as usize).checked_sub(1)?)
    }

    fn is_live(&self, id: DocId) -> bool {
        self.slot(id).is_some_and(|value| !value.is_empty())
    }

    fn remove_ids(&mut self, ids: &FxHashSet<DocId>) {
        if ids.is_empty() {
            return;
        }
        for &id in ids {
            if let Some(value) = self.documents.get_mut(id as usize - 1) {
                value.clear();
            }
        }
        self.keywords.retain(|entry| !ids.contains(&entry.doc_id));

        // Release in descending order so the lowest id is reused first
        let mut freed: Vec<DocId> = ids.iter().copied().collect();
        freed.sort_unstable_by(|a, b| b.cmp(a));
        for id in freed {
            self.state.release(id);
        }
        self.report.pruned += ids.len();
    }

    fn record_warnings(&mut self, warnings: Vec<Warning>) {
        for warning in &warnings {
            if self.options.verbose {
                warn!("{}", warning);
            } else {
                debug!("{}", warning);
            }
        }
        self.report.warnings.extend(warnings);
    }
}

/// Build a collection root from parsed documents.
///
/// Without prior state the stores are rebuilt from `documents` alone. With
/// prior state the installed stores are loaded and `documents` are added to
/// them, replacing earlier versions of the same files.
pub fn build_index(
    root: &Path,
    documents: &[ParsedDocument],
    prior_state: Option<IndexState>,
    options: BuildOptions,
) -> BuildResult<BuildReport> {
    let show_progress = options.progress;
    let mut builder = match prior_state {
        Some(state) => IndexBuilder::open(root, options)?.with_state(state),
        None => IndexBuilder::create(root, options),
    };

    let bar = document_bar(documents.len() as u64, show_progress);
    for doc in documents {
        builder.add(doc);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let report = builder.commit()?;
    if !report.warnings.is_empty() {
        info!(count = report.warnings.len(), "build produced warnings");
    }
    Ok(report)
}

/// Remove documents by file path from a collection root
pub fn prune_index<P: AsRef<Path>>(root: &Path, files: &[P], options: BuildOptions) -> BuildResult<BuildReport> {
    let mut builder = IndexBuilder::open(root, options)?;
    let removed = builder.prune(files);
    if removed < files.len() {
        debug!(requested = files.len(), removed, "some files were not indexed");
    }
    builder.commit()
}

struct Resolved {
    kind: DocKind,
    title: String,
    category: String,
    arch: String,
}

/// Settle title, category and architecture, preferring the location when
/// the document's own metadata is empty or disagrees
fn resolve_metadata(doc: &ParsedDocument, file: &str, warnings: &mut Vec<Warning>) -> Resolved {
    let location = &doc.location;
    let location_arch = location.arch.as_deref().unwrap_or("");

    let (kind, meta) = match &doc.content {
        Content::Mdoc { meta, .. } => (DocKind::Mdoc, meta),
        Content::Man { meta, .. } => (DocKind::Man, meta),
        Content::Formatted { .. } => {
            return Resolved {
                kind: DocKind::Formatted,
                title: location.title.trim().to_string(),
                category: location.category.trim().to_string(),
                arch: location_arch.trim().to_string(),
            };
        }
    };

    let category = reconcile(&meta.category, &location.category, warnings, |parsed, location| {
        Warning::CategoryMismatch {
            file: file.to_string(),
            parsed,
            location,
        }
    });
    let arch = reconcile(meta.arch.as_deref().unwrap_or(""), location_arch, warnings, |parsed, location| {
        Warning::ArchMismatch {
            file: file.to_string(),
            parsed,
            location,
        }
    });
    let title = reconcile(&meta.title, &location.title, warnings, |parsed, location| {
        Warning::TitleMismatch {
            file: file.to_string(),
            parsed,
            location,
        }
    });

    Resolved {
        kind,
        title,
        category,
        arch,
    }
}

fn reconcile(
    parsed: &str,
    location: &str,
    warnings: &mut Vec<Warning>,
    mismatch: impl FnOnce(String, String) -> Warning,
) -> String {
    let parsed = parsed.trim();
    let location = location.trim();
    if location.is_empty() || parsed.eq_ignore_ascii_case(location) {
        return parsed.to_string();
    }
    if !parsed.is_empty() {
        warnings.push(mismatch(parsed.to_string(), location.to_string()));
    }
    location.to_string()
}
