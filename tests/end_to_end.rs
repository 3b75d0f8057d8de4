//! Build stores from parsed documents, then search them.

use mandex::index::codec::{DOCUMENT_MAGIC, KEYWORD_MAGIC, encode_keyword_key, header};
use mandex::index::{
    BuildOptions, Content, ElementKind, FieldTable, IndexBuilder, Location, Meta, Node, ParsedDocument,
    build_index,
};
use mandex::query::{Restriction, SearchResults, SearchStatus, compile, compile_simple, search};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn page(file: &str, title: &str, category: &str, description: &str) -> ParsedDocument {
    ParsedDocument {
        file: PathBuf::from(file),
        location: Location {
            category: category.to_string(),
            arch: None,
            title: title.to_string(),
        },
        content: Content::Mdoc {
            meta: Meta {
                title: title.to_string(),
                category: category.to_string(),
                arch: None,
            },
            body: vec![Node::block(
                ElementKind::Sh,
                &["NAME"],
                vec![
                    Node::element(ElementKind::Nm, &[title]),
                    Node::element(ElementKind::Nd, &[description]),
                ],
            )],
        },
    }
}

/// Root holding FOO(1) "does a thing" and BAR(8) "does another thing"
fn sample_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    let docs = [
        page("man1/foo.1", "FOO", "1", "does a thing"),
        page("man8/bar.8", "BAR", "8", "does another thing"),
    ];
    build_index(dir.path(), &docs, None, BuildOptions::default()).unwrap();
    dir
}

fn run(roots: &[&Path], restriction: &Restriction, tokens: &[&str]) -> SearchResults {
    let expr = compile(tokens, &FieldTable::standard()).unwrap();
    search(roots, restriction, &expr)
}

fn matched_titles(results: &SearchResults) -> Vec<String> {
    let mut titles: Vec<String> = results.matched().map(|c| c.record.title.clone()).collect();
    titles.sort();
    titles
}

#[test]
fn test_regex_on_names() {
    let root = sample_root();
    let results = run(&[root.path()], &Restriction::default(), &["Nm~^FOO$"]);

    assert_eq!(results.status, SearchStatus::Complete);
    assert_eq!(results.candidates.len(), 1);
    assert_eq!(matched_titles(&results), vec!["FOO"]);
    assert_eq!(results.candidates[0].record.description, "does a thing");
}

#[test]
fn test_or_of_bare_words() {
    let root = sample_root();
    let results = run(&[root.path()], &Restriction::default(), &["FOO", "-o", "BAR"]);
    assert_eq!(matched_titles(&results), vec!["BAR", "FOO"]);
}

#[test]
fn test_category_restriction() {
    let root = sample_root();
    let restriction = Restriction {
        category: Some("1".to_string()),
        arch: None,
    };
    let results = run(&[root.path()], &restriction, &["FOO", "-o", "BAR"]);
    assert_eq!(matched_titles(&results), vec!["FOO"]);
    assert_eq!(results.candidates.len(), 1);
}

#[test]
fn test_and_across_keywords_yields_one_candidate() {
    let root = sample_root();
    let results = run(&[root.path()], &Restriction::default(), &["Nm=foo", "-a", "Nd=thing"]);

    assert_eq!(results.candidates.len(), 2);
    let foo: Vec<_> = results.candidates.iter().filter(|c| c.record.title == "FOO").collect();
    assert_eq!(foo.len(), 1);
    assert!(foo[0].matched);
    assert_eq!(matched_titles(&results), vec!["FOO"]);
}

#[test]
fn test_unmatched_candidates_are_returned() {
    let root = sample_root();
    let results = run(&[root.path()], &Restriction::default(), &["Nd=another", "-a", "Nm=nothing"]);

    assert_eq!(results.candidates.len(), 1);
    assert!(!results.candidates[0].matched);
    assert_eq!(results.matched().count(), 0);
}

#[test]
fn test_whatis_matches_whole_names() {
    let root = sample_root();
    let expr = compile_simple(&["foo"]).unwrap();
    let results = search(&[root.path()], &Restriction::default(), &expr);
    assert_eq!(matched_titles(&results), vec!["FOO"]);

    let expr = compile_simple(&["fo"]).unwrap();
    let results = search(&[root.path()], &Restriction::default(), &expr);
    assert!(results.candidates.is_empty());
}

#[test]
fn test_escapes_are_normalized_before_matching() {
    let dir = TempDir::new().unwrap();
    let doc = page("man1/ls.1", "ls", "1", "list \\fBdirectory\\fR contents");
    build_index(dir.path(), &[doc], None, BuildOptions::default()).unwrap();

    let results = run(&[dir.path()], &Restriction::default(), &["Nd=list directory"]);
    assert_eq!(matched_titles(&results), vec!["ls"]);
    assert_eq!(results.candidates[0].record.description, "list directory contents");
}

#[test]
fn test_roots_are_searched_in_order() {
    let first = sample_root();
    let second = sample_root();
    let missing = first.path().join("nowhere");

    let results = run(
        &[missing.as_path(), first.path(), second.path()],
        &Restriction::default(),
        &["Nm~^FOO$"],
    );

    assert_eq!(results.status, SearchStatus::Complete);
    let roots: Vec<usize> = results.candidates.iter().map(|c| c.root).collect();
    assert_eq!(roots, vec![1, 2]);
    assert!(results.candidates.iter().all(|c| c.doc_id == 1));
}

fn write_keyword_store(root: &Path, key: &[u8], value: &[u8]) {
    let mut bytes = header(KEYWORD_MAGIC).to_vec();
    let key = encode_keyword_key(key);
    bytes.extend_from_slice(&(key.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&key);
    bytes.extend_from_slice(&(value.len() as u32).to_be_bytes());
    bytes.extend_from_slice(value);
    fs::write(root.join("keywords.db"), bytes).unwrap();
}

#[test]
fn test_short_keyword_value_is_corruption() {
    let good = sample_root();
    let bad = TempDir::new().unwrap();
    fs::write(bad.path().join("documents.db"), header(DOCUMENT_MAGIC)).unwrap();
    write_keyword_store(bad.path(), b"foo", &[0u8; 8]);

    let results = run(&[good.path(), bad.path()], &Restriction::default(), &["foo"]);

    assert!(results.is_corrupt());
    match &results.status {
        SearchStatus::Corrupt { root, .. } => assert_eq!(root, bad.path()),
        SearchStatus::Complete => panic!("expected corruption"),
    }
    // Candidates from the healthy root survive
    assert_eq!(matched_titles(&results), vec!["FOO"]);
}

#[test]
fn test_dangling_document_id_is_corruption() {
    let root = sample_root();
    let mut value = u64::MAX.to_be_bytes().to_vec();
    value.extend_from_slice(&42u64.to_be_bytes());
    write_keyword_store(root.path(), b"foo", &value);

    let results = run(&[root.path()], &Restriction::default(), &["foo"]);
    assert!(results.is_corrupt());
    assert!(results.candidates.is_empty());
}

#[test]
fn test_delete_then_add_reuses_id() {
    let root = sample_root();

    let mut builder = IndexBuilder::open(root.path(), BuildOptions::default()).unwrap();
    builder.prune(&["man1/foo.1"]);
    let id = builder.add(&page("man1/baz.1", "BAZ", "1", "does something new"));
    let report = builder.commit().unwrap();

    assert_eq!(id, Some(1));
    assert_eq!(report.documents, 2);

    let results = run(&[root.path()], &Restriction::default(), &["does"]);
    assert_eq!(matched_titles(&results), vec!["BAR", "BAZ"]);
    let baz = results.candidates.iter().find(|c| c.record.title == "BAZ").unwrap();
    assert_eq!(baz.doc_id, 1);
}

fn arch_page(file: &str, title: &str, arch: Option<&str>) -> ParsedDocument {
    let mut doc = page(file, title, "4", "device driver");
    doc.location.arch = arch.map(str::to_string);
    if let Content::Mdoc { meta, .. } = &mut doc.content {
        meta.arch = arch.map(str::to_string);
    }
    doc
}

#[test]
fn test_arch_restriction() {
    let dir = TempDir::new().unwrap();
    let docs = [
        arch_page("man4/amd64/em.4", "em", Some("amd64")),
        arch_page("man4/i386/pcn.4", "pcn", Some("i386")),
        arch_page("man4/null.4", "null", None),
    ];
    build_index(dir.path(), &docs, None, BuildOptions::default()).unwrap();

    let restriction = Restriction {
        category: None,
        arch: Some("AMD64".to_string()),
    };
    let results = run(&[dir.path()], &restriction, &["Nd=driver"]);
    assert_eq!(results.status, SearchStatus::Complete);
    assert_eq!(matched_titles(&results), vec!["em", "null"]);

    let em = results.candidates.iter().find(|c| c.record.title == "em").unwrap();
    assert_eq!(em.record.arch, "amd64");
}

#[test]
fn test_nul_only_keyword_is_not_indexed() {
    let dir = TempDir::new().unwrap();
    let mut doc = page("man1/foo.1", "foo", "1", "does a thing");
    if let Content::Mdoc { body, .. } = &mut doc.content {
        body.push(Node::element(ElementKind::Ev, &["\0"]));
        body.push(Node::element(ElementKind::Ev, &["HO\0ME"]));
    }
    build_index(dir.path(), &[doc], None, BuildOptions::default()).unwrap();

    let results = run(&[dir.path()], &Restriction::default(), &["foo"]);
    assert_eq!(results.status, SearchStatus::Complete);
    assert_eq!(matched_titles(&results), vec!["foo"]);

    let results = run(&[dir.path()], &Restriction::default(), &["Ev=HOME"]);
    assert_eq!(matched_titles(&results), vec!["foo"]);

    // The stores stay loadable for the next build cycle
    assert!(IndexBuilder::open(dir.path(), BuildOptions::default()).is_ok());
}
