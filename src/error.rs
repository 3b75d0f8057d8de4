//! Error and warning types.
//!
//! - [`QueryError`]: the token sequence is not a valid expression
//! - [`StoreError`]: a store could not be read, or violates its format
//! - [`BuildError`]: the builder could not produce or install new stores
//! - [`Warning`]: advisory findings about a document during a build

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type BuildResult<T> = Result<T, BuildError>;

/// Malformed query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("empty expression")]
    Empty,

    #[error("empty group")]
    EmptyGroup,

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("operator `{0}` is missing an operand")]
    MissingOperand(String),

    #[error("`-i` must be followed by a term")]
    DanglingCaseFlag,

    #[error("groups nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("empty search text in `{0}`")]
    EmptyTerm(String),

    #[error("invalid regular expression `{pattern}`")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure reading a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store exists but violates the on-disk format
    #[error("{}: database corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Unrecoverable build failure
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install {}: {source}", path.display())]
    Install {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Advisory finding about one document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("{file}: category mismatch: document says `{parsed}`, location says `{location}`")]
    CategoryMismatch {
        file: String,
        parsed: String,
        location: String,
    },

    #[error("{file}: architecture mismatch: document says `{parsed}`, location says `{location}`")]
    ArchMismatch {
        file: String,
        parsed: String,
        location: String,
    },

    #[error("{file}: title mismatch: document says `{parsed}`, location says `{location}`")]
    TitleMismatch {
        file: String,
        parsed: String,
        location: String,
    },

    #[error("{file}: title `{title}` is not among the document's names")]
    TitleUnreachable { file: String, title: String },

    #[error("{file}: no description found")]
    MissingDescription { file: String },
}

impl Warning {
    /// Whether strict mode excludes the document
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Warning::CategoryMismatch { .. } | Warning::ArchMismatch { .. } | Warning::TitleMismatch { .. }
        )
    }
}
