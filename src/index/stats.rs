use crate::index::fields::FieldTable;
use crate::index::reader::{DocumentStore, KeywordStore};
use crate::index::types::DocKind;
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Summary of the stores under one collection root
#[derive(Debug, Default)]
pub struct IndexStats {
    pub documents: usize,
    pub tombstones: usize,
    pub keywords: usize,
    pub keyword_bytes: u64,
    pub document_bytes: u64,
    pub by_kind: FxHashMap<&'static str, usize>,
    pub by_category: FxHashMap<String, usize>,
    /// Keyword records per field name
    pub by_field: FxHashMap<&'static str, usize>,
}

/// Gather statistics for a collection root
pub fn collect_stats(root: &Path) -> Result<IndexStats> {
    let documents = DocumentStore::open(root).context("Failed to open document store")?;
    let keywords = KeywordStore::open(root).context("Failed to open keyword store")?;
    let (Some(documents), Some(keywords)) = (documents, keywords) else {
        bail!("No index found under {}", root.display());
    };

    let mut stats = IndexStats {
        keyword_bytes: keywords.byte_len() as u64,
        document_bytes: documents.byte_len() as u64,
        ..IndexStats::default()
    };

    for record in documents.records().context("Failed to read document store")? {
        stats.documents += 1;
        let kind = match record.kind {
            DocKind::Mdoc => "mdoc",
            DocKind::Man => "man",
            DocKind::Formatted => "formatted",
        };
        *stats.by_kind.entry(kind).or_insert(0) += 1;
        *stats.by_category.entry(record.category).or_insert(0) += 1;
    }
    stats.tombstones = documents.len() - stats.documents;

    let fields = FieldTable::standard();
    for entry in keywords.cursor() {
        let entry = entry.context("Failed to read keyword store")?;
        stats.keywords += 1;
        for kind in fields.kinds().iter().filter(|k| k.name != "any") {
            if entry.mask.intersects(kind.mask) {
                *stats.by_field.entry(kind.name).or_insert(0) += 1;
            }
        }
    }

    Ok(stats)
}

/// Display index statistics
pub fn show_stats(root: &Path) -> Result<()> {
    let stats = collect_stats(root)?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Root path:        {}", root.display());
    println!("Documents:        {}", stats.documents);
    println!("Free slots:       {}", stats.tombstones);
    println!("Keywords:         {}", stats.keywords);

    println!();
    println!("Documents by kind:");
    for (kind, count) in sorted_counts(&stats.by_kind) {
        println!("  {:15} {}", kind, count);
    }

    println!();
    println!("Documents by category:");
    let by_category: Vec<_> = sorted_counts(&stats.by_category);
    for (category, count) in by_category.iter().take(15) {
        println!("  {:15} {}", category, count);
    }
    if by_category.len() > 15 {
        println!("  ... and {} more", by_category.len() - 15);
    }

    println!();
    println!("Keywords by field:");
    let by_field = sorted_counts(&stats.by_field);
    for (field, count) in by_field.iter().take(15) {
        println!("  {:15} {}", field, count);
    }
    if by_field.len() > 15 {
        println!("  ... and {} more", by_field.len() - 15);
    }

    println!();
    println!("Keyword store:    {}", format_size(stats.keyword_bytes));
    println!("Document store:   {}", format_size(stats.document_bytes));

    Ok(())
}

/// Counts in descending order, ties broken by name
fn sorted_counts<K: Ord + Clone>(counts: &FxHashMap<K, usize>) -> Vec<(K, usize)> {
    let mut sorted: Vec<_> = counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build::{build_index, prune_index};
    use crate::index::document::{Content, ElementKind, Location, Meta, Node, ParsedDocument};
    use crate::index::types::BuildOptions;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn formatted(file: &str, title: &str) -> ParsedDocument {
        ParsedDocument {
            file: PathBuf::from(file),
            location: Location {
                category: "8".to_string(),
                arch: None,
                title: title.to_string(),
            },
            content: Content::Formatted {
                text: format!("NAME\n     {} - does things\n", title),
            },
        }
    }

    #[test]
    fn test_collect_stats() {
        let dir = TempDir::new().unwrap();
        let mdoc = ParsedDocument {
            file: PathBuf::from("man1/ls.1"),
            location: Location {
                category: "1".to_string(),
                arch: None,
                title: "ls".to_string(),
            },
            content: Content::Mdoc {
                meta: Meta::default(),
                body: vec![Node::element(ElementKind::Nm, &["ls"])],
            },
        };
        let docs = [mdoc, formatted("cat8/a.0", "a"), formatted("cat8/b.0", "b")];
        build_index(dir.path(), &docs, None, BuildOptions::default()).unwrap();
        prune_index(dir.path(), &["cat8/b.0"], BuildOptions::default()).unwrap();

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.by_kind.get("mdoc"), Some(&1));
        assert_eq!(stats.by_category.get("8"), Some(&1));
        // ls (Nm), a (Nm), "does things" (Nd)
        assert_eq!(stats.keywords, 3);
        assert_eq!(stats.by_field.get("Nm"), Some(&2));
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        assert!(collect_stats(dir.path()).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
    }
}
