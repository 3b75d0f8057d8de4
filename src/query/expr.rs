//! Compiled search expressions.
//!
//! An expression is a flat list of nodes. Each node says whether it is ANDed
//! with the node after it; a maximal run of ANDed nodes forms a clause, and
//! the expression is true when any clause is. Groups nest a list of their
//! own.
//!
//! Every node, group or term, owns one slot `seq` in the match-flag array of
//! a candidate. Slots are numbered in pre-order, so `term_count` slots cover
//! the whole tree.

use crate::index::fields::TypeMask;
use memchr::memmem;
use regex::bytes::Regex;

/// How a term tests a keyword
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Substring test; `needle` is already lowercased when case-insensitive
    Substring { needle: Vec<u8>, case_sensitive: bool },
    Regex { regex: Regex, case_sensitive: bool },
}

impl Matcher {
    /// Test a normalized keyword. `folded` is `text` in ASCII lowercase.
    #[inline]
    pub fn is_match(&self, text: &[u8], folded: &[u8]) -> bool {
        match self {
            Matcher::Substring {
                needle,
                case_sensitive: true,
            } => memmem::find(text, needle).is_some(),
            Matcher::Substring { needle, .. } => memmem::find(folded, needle).is_some(),
            Matcher::Regex { regex, .. } => regex.is_match(text),
        }
    }

    /// Whether `is_match` reads the folded form
    pub fn needs_folded(&self) -> bool {
        matches!(
            self,
            Matcher::Substring {
                case_sensitive: false,
                ..
            }
        )
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Matcher::Substring {
                    needle: a,
                    case_sensitive: ca,
                },
                Matcher::Substring {
                    needle: b,
                    case_sensitive: cb,
                },
            ) => a == b && ca == cb,
            (
                Matcher::Regex {
                    regex: a,
                    case_sensitive: ca,
                },
                Matcher::Regex {
                    regex: b,
                    case_sensitive: cb,
                },
            ) => a.as_str() == b.as_str() && ca == cb,
            _ => false,
        }
    }
}

/// Leaf test: which fields to look at and how to match them
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub mask: TypeMask,
    pub matcher: Matcher,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Term(Term),
    Group(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Match-flag slot of this node
    pub seq: usize,
    /// ANDed with the following node rather than ORed
    pub and_with_next: bool,
    pub kind: NodeKind,
}

/// A compiled search expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    nodes: Vec<Node>,
    term_count: usize,
}

impl Expression {
    pub(crate) fn new(nodes: Vec<Node>, term_count: usize) -> Self {
        Self { nodes, term_count }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of match-flag slots a candidate needs
    pub fn term_count(&self) -> usize {
        self.term_count
    }

    /// Every term with its slot, in pre-order
    pub fn terms(&self) -> Vec<(usize, &Term)> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<(usize, &'a Term)>) {
            for node in nodes {
                match &node.kind {
                    NodeKind::Term(term) => out.push((node.seq, term)),
                    NodeKind::Group(children) => walk(children, out),
                }
            }
        }
        let mut out = Vec::with_capacity(self.term_count);
        walk(&self.nodes, &mut out);
        out
    }

    /// Evaluate against a candidate's match flags.
    ///
    /// Group results are written back into the group's own slot.
    pub fn evaluate(&self, flags: &mut [bool]) -> bool {
        evaluate_list(&self.nodes, flags)
    }
}

fn evaluate_list(nodes: &[Node], flags: &mut [bool]) -> bool {
    let mut result = false;
    let mut clause = true;

    for node in nodes {
        let value = match &node.kind {
            NodeKind::Term(_) => flags[node.seq],
            NodeKind::Group(children) => {
                let value = evaluate_list(children, flags);
                flags[node.seq] = value;
                value
            }
        };
        clause &= value;
        if !node.and_with_next {
            result |= clause;
            clause = true;
        }
    }

    result
}
