//! Parsed documents handed to the builder.
//!
//! Discovery and parsing happen outside this crate. They hand over one
//! [`ParsedDocument`] per file: where the file sits (which implies a
//! category, architecture and title) and either a structural content tree or,
//! for pages the parser could not handle, the preformatted text.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Element kinds of the structural tree.
///
/// Closed set owned by the parser. Kinds the builder has no use for arrive as
/// [`ElementKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    An,
    Ar,
    At,
    Bsx,
    Bx,
    Cd,
    Cm,
    Dv,
    Dx,
    Em,
    Er,
    Ev,
    Fa,
    Fd,
    Fl,
    Fn,
    Fo,
    Ft,
    Fx,
    In,
    Lb,
    Li,
    Lk,
    Ms,
    Mt,
    Nd,
    Nm,
    Nx,
    Ox,
    Pa,
    Rs,
    Sh,
    Ss,
    St,
    Sy,
    Tn,
    Va,
    Vt,
    Xr,
    #[serde(other)]
    Other,
}

/// Node of the structural content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Text(String),
    Element {
        kind: ElementKind,
        /// Arguments on the element's own line (the "head")
        #[serde(default)]
        args: Vec<String>,
        /// Nested content (the "body")
        #[serde(default)]
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn element(kind: ElementKind, args: &[&str]) -> Self {
        Node::Element {
            kind,
            args: args.iter().map(|s| s.to_string()).collect(),
            children: Vec::new(),
        }
    }

    pub fn block(kind: ElementKind, args: &[&str], children: Vec<Node>) -> Self {
        Node::Element {
            kind,
            args: args.iter().map(|s| s.to_string()).collect(),
            children,
        }
    }

    /// All text under this node, words joined by single spaces
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut String) {
        match self {
            Node::Text(text) => push_word(out, text),
            Node::Element { args, children, .. } => {
                for arg in args {
                    push_word(out, arg);
                }
                for child in children {
                    child.flatten_into(out);
                }
            }
        }
    }
}

fn push_word(out: &mut String, word: &str) {
    let word = word.trim();
    if word.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(word);
}

/// Metadata the parser read from the document's own title line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub arch: Option<String>,
}

/// Metadata implied by the file's location (`man1/i386/foo.1`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub category: String,
    #[serde(default)]
    pub arch: Option<String>,
    pub title: String,
}

/// Parsed content of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    /// Semantic markup (mdoc)
    Mdoc { meta: Meta, body: Vec<Node> },
    /// Presentational markup (man)
    Man { meta: Meta, body: Vec<Node> },
    /// Preformatted text the parser could not structure
    Formatted { text: String },
}

/// One discovered and parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Path relative to the collection root
    pub file: PathBuf,
    pub location: Location,
    pub content: Content,
}
