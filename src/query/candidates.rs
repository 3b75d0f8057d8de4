//! Per-search candidate documents.
//!
//! Candidates live in an insertion-ordered arena. An unbalanced binary search
//! tree over arena slots, keyed by document id, finds the candidate for a
//! keyword hit. Ids are only unique within a collection root, so the tree is
//! reset between roots while the arena keeps every candidate.

use crate::index::types::{DocId, DocumentRecord};
use std::ops::{Index, IndexMut};

/// A document hit by at least one keyword
#[derive(Debug, Clone)]
pub struct Candidate {
    pub doc_id: DocId,
    /// Position of the collection root in the searched list
    pub root: usize,
    pub record: DocumentRecord,
    /// Match flags, one per expression slot
    pub flags: Vec<bool>,
    /// The expression has evaluated true for this document
    pub matched: bool,
    left: Option<usize>,
    right: Option<usize>,
}

impl Candidate {
    pub fn new(root: usize, record: DocumentRecord, term_count: usize) -> Self {
        Self {
            doc_id: record.id,
            root,
            record,
            flags: vec![false; term_count],
            matched: false,
            left: None,
            right: None,
        }
    }
}

/// Where a missing id would attach to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Root,
    Left(usize),
    Right(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(usize),
    Vacant(Link),
}

#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    root: Option<usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the tree; candidates already collected stay in the arena
    pub fn reset_tree(&mut self) {
        self.root = None;
    }

    pub fn lookup(&self, doc_id: DocId) -> Lookup {
        let Some(mut slot) = self.root else {
            return Lookup::Vacant(Link::Root);
        };
        loop {
            let node = &self.candidates[slot];
            let next = if doc_id < node.doc_id {
                node.left.ok_or(Link::Left(slot))
            } else if doc_id > node.doc_id {
                node.right.ok_or(Link::Right(slot))
            } else {
                return Lookup::Found(slot);
            };
            match next {
                Ok(child) => slot = child,
                Err(link) => return Lookup::Vacant(link),
            }
        }
    }

    /// Attach a candidate at a link returned by [`CandidateSet::lookup`]
    pub fn insert(&mut self, link: Link, candidate: Candidate) -> usize {
        let slot = self.candidates.len();
        self.candidates.push(candidate);
        match link {
            Link::Root => self.root = Some(slot),
            Link::Left(parent) => self.candidates[parent].left = Some(slot),
            Link::Right(parent) => self.candidates[parent].right = Some(slot),
        }
        slot
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl Index<usize> for CandidateSet {
    type Output = Candidate;

    fn index(&self, slot: usize) -> &Candidate {
        &self.candidates[slot]
    }
}

impl IndexMut<usize> for CandidateSet {
    fn index_mut(&mut self, slot: usize) -> &mut Candidate {
        &mut self.candidates[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::DocKind;

    fn record(id: DocId) -> DocumentRecord {
        DocumentRecord {
            id,
            kind: DocKind::Mdoc,
            file: format!("man1/{}.1", id),
            category: "1".to_string(),
            title: id.to_string(),
            arch: String::new(),
            description: String::new(),
        }
    }

    fn add(set: &mut CandidateSet, root: usize, id: DocId) -> usize {
        match set.lookup(id) {
            Lookup::Found(slot) => slot,
            Lookup::Vacant(link) => set.insert(link, Candidate::new(root, record(id), 2)),
        }
    }

    #[test]
    fn test_lookup_and_insert() {
        let mut set = CandidateSet::new();
        for id in [5, 2, 8, 3, 9] {
            add(&mut set, 0, id);
        }
        assert_eq!(set.len(), 5);

        for (slot, id) in [5, 2, 8, 3, 9].into_iter().enumerate() {
            assert_eq!(set.lookup(id), Lookup::Found(slot));
        }
        assert_eq!(set.lookup(4), Lookup::Vacant(Link::Right(3)));
        assert_eq!(set.lookup(1), Lookup::Vacant(Link::Left(1)));
    }

    #[test]
    fn test_repeated_id_reuses_slot() {
        let mut set = CandidateSet::new();
        let first = add(&mut set, 0, 7);
        set[first].flags[1] = true;
        assert_eq!(add(&mut set, 0, 7), first);
        assert!(set[first].flags[1]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reset_tree_separates_roots() {
        let mut set = CandidateSet::new();
        add(&mut set, 0, 1);
        set.reset_tree();
        assert_eq!(set.lookup(1), Lookup::Vacant(Link::Root));

        let slot = add(&mut set, 1, 1);
        assert_eq!(slot, 1);
        let candidates = set.into_vec();
        assert_eq!(candidates.iter().map(|c| c.root).collect::<Vec<_>>(), vec![0, 1]);
    }
}
