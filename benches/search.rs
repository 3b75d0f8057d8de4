//! Performance benchmarks for mandex
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mandex::index::{BuildOptions, Content, ElementKind, FieldTable, Location, Meta, Node, ParsedDocument, build_index};
use mandex::query::{Restriction, compile, search};
use mandex::utils::normalize;
use std::path::PathBuf;
use tempfile::TempDir;

/// Synthetic pages with names, descriptions and a SYNOPSIS section
fn sample_documents(count: usize) -> Vec<ParsedDocument> {
    (0..count)
        .map(|i| {
            let name = format!("tool{}", i);
            ParsedDocument {
                file: PathBuf::from(format!("man{}/{}.{}", i % 9 + 1, name, i % 9 + 1)),
                location: Location {
                    category: (i % 9 + 1).to_string(),
                    arch: None,
                    title: name.clone(),
                },
                content: Content::Mdoc {
                    meta: Meta::default(),
                    body: vec![
                        Node::block(
                            ElementKind::Sh,
                            &["NAME"],
                            vec![
                                Node::element(ElementKind::Nm, &[&name]),
                                Node::element(ElementKind::Nd, &[&format!("process \\fBitem\\fR number {}", i)]),
                            ],
                        ),
                        Node::block(
                            ElementKind::Sh,
                            &["SYNOPSIS"],
                            vec![
                                Node::element(ElementKind::Fl, &["v"]),
                                Node::element(ElementKind::Ar, &["file ..."]),
                                Node::element(ElementKind::Fn, &[&format!("int {}_run", name), "const char *path"]),
                            ],
                        ),
                    ],
                },
            }
        })
        .collect()
}

fn create_benchmark_root(count: usize) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    build_index(dir.path(), &sample_documents(count), None, BuildOptions::default()).expect("Failed to build index");
    dir
}

fn bench_compile(c: &mut Criterion) {
    let fields = FieldTable::standard();
    let queries: Vec<Vec<&str>> = vec![
        vec!["ls"],
        vec!["Nm~^tool1", "-a", "Nd=item"],
        vec!["(", "Fn=run", "-o", "Fa=path", ")", "-a", "-i", "Nm=tool"],
    ];

    let mut group = c.benchmark_group("compile");
    for (i, tokens) in queries.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), tokens, |b, tokens| {
            b.iter(|| compile(black_box(tokens), &fields))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let inputs: [&[u8]; 3] = [
        b"plain keyword text",
        b"\\fBbold\\fR and \\(em dashes \\[u00E9]",
        b"soft\x1ehyphen and\x1fnbsp\tand tab",
    ];

    let mut group = c.benchmark_group("normalize");
    for (i, input) in inputs.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), input, |b, input| {
            b.iter(|| normalize(black_box(input)))
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let docs = sample_documents(500);
    c.bench_function("build_500", |b| {
        b.iter(|| {
            let dir = TempDir::new().expect("Failed to create temp dir");
            build_index(dir.path(), black_box(&docs), None, BuildOptions::default()).expect("Failed to build index")
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let dir = create_benchmark_root(2000);
    let fields = FieldTable::standard();
    let queries: Vec<(&str, Vec<&str>)> = vec![
        ("substring", vec!["tool12"]),
        ("regex", vec!["Nm~^tool1[0-9]$"]),
        ("and", vec!["Nd=item", "-a", "Fn~_run$"]),
        ("miss", vec!["nonexistent"]),
    ];

    let mut group = c.benchmark_group("search");
    for (name, tokens) in &queries {
        let expr = compile(tokens, &fields).expect("Failed to compile");
        group.bench_function(*name, |b| {
            b.iter(|| search(&[dir.path()], &Restriction::default(), black_box(&expr)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_normalize, bench_build, bench_search);
criterion_main!(benches);
