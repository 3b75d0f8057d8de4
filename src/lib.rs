//! # mandex - keyword search for manual pages
//!
//! mandex keeps two stores per collection root: a keyword store mapping
//! every indexed word or phrase to the documents it came from, and a document
//! store holding each page's title, category, architecture and one-line
//! description. Searches stream the keyword store once per root and evaluate
//! a boolean expression incrementally per document.
//!
//! ## Architecture
//!
//! - [`index`] - Store layout, building, pruning and reading
//! - [`query`] - Expression compiler and evaluator
//! - [`output`] - Result formatting
//! - [`utils`] - Escape normalization, encodings, configuration
//! - [`error`] - Error and warning types
//!
//! ## Quick Start
//!
//! ```no_run
//! use mandex::index::{FieldTable, build_index, BuildOptions, ParsedDocument};
//! use mandex::query::{compile, search, Restriction};
//! use std::path::Path;
//!
//! let root = Path::new("/usr/share/man");
//! let documents: Vec<ParsedDocument> = Vec::new();
//! build_index(root, &documents, None, BuildOptions::default()).unwrap();
//!
//! let expr = compile(&["Nm~^ls", "-o", "Nd=directory"], &FieldTable::standard()).unwrap();
//! let results = search(&[root], &Restriction::default(), &expr);
//! for candidate in results.matched() {
//!     println!("{}({}) - {}", candidate.record.title, candidate.record.category, candidate.record.description);
//! }
//! ```

pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;
