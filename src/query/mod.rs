//! Search expressions: compiling tokens and evaluating them against stores.

pub mod candidates;
pub mod executor;
pub mod expr;
pub mod parser;

pub use candidates::{Candidate, CandidateSet};
pub use executor::{Restriction, SearchResults, SearchStatus, search};
pub use expr::{Expression, Matcher, Node, NodeKind, Term};
pub use parser::{compile, compile_simple};
