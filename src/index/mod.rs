//! Keyword and document stores: layout, reading, writing and building.

pub mod build;
pub mod codec;
pub mod document;
pub mod fields;
pub mod keywords;
pub mod reader;
pub mod stats;
pub mod types;
pub mod writer;

pub use build::{BuildReport, IndexBuilder, build_index, prune_index};
pub use document::{Content, ElementKind, Location, Meta, Node, ParsedDocument};
pub use fields::{FieldKind, FieldTable, TypeMask};
pub use reader::{DocumentStore, KeywordStore};
pub use types::*;
