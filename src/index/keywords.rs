//! Keyword extraction from parsed documents.
//!
//! Each element kind maps to a [`Rule`] saying what the element contributes.
//! Hits accumulate in a [`KeywordTable`] that merges the masks of repeated
//! keywords; the builder clears it between documents.

use crate::index::document::{Content, ElementKind, Node};
use crate::index::fields::TypeMask;
use rustc_hash::FxHashMap;

/// Per-document keyword table with mask merging
#[derive(Debug, Default)]
pub struct KeywordTable {
    slots: FxHashMap<String, usize>,
    entries: Vec<(String, TypeMask)>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit; a repeated keyword ORs its mask into the first entry
    pub fn add(&mut self, keyword: &str, mask: TypeMask) {
        // NUL terminates store keys, so it cannot be part of a keyword
        let stripped;
        let keyword = if keyword.contains('\0') {
            stripped = keyword.replace('\0', "");
            stripped.trim()
        } else {
            keyword.trim()
        };
        if keyword.is_empty() {
            return;
        }
        match self.slots.get(keyword) {
            Some(&slot) => self.entries[slot].1 |= mask,
            None => {
                self.slots.insert(keyword.to_string(), self.entries.len());
                self.entries.push((keyword.to_string(), mask));
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.entries.clear();
    }

    /// Merged entries in first-seen order
    pub fn entries(&self) -> &[(String, TypeMask)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mask_of(&self, keyword: &str) -> Option<TypeMask> {
        self.slots.get(keyword).map(|&slot| self.entries[slot].1)
    }

    /// Keywords tagged as document names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, mask)| mask.intersects(TypeMask::NM))
            .map(|(keyword, _)| keyword.as_str())
    }
}

/// What an element contributes to the keyword table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Whole text of the element
    Text(TypeMask),
    /// Whole text, inside SYNOPSIS only
    Synopsis(TypeMask),
    /// Prototype split into name, return type and arguments
    Function,
    /// Name of a multi-line prototype; arguments arrive as children
    FunctionBlock,
    /// `#include <header>` reduced to the header name
    Include,
    /// Variable type, inside SYNOPSIS only, trailing `;` removed
    VarType,
    /// `name(section)`
    CrossRef,
    /// One-line description
    Description,
    /// Section heading; also switches the section context for children
    Heading(TypeMask),
    Skip,
}

fn rule(kind: ElementKind) -> Rule {
    use ElementKind::*;
    match kind {
        An => Rule::Text(TypeMask::AN),
        Ar => Rule::Text(TypeMask::AR),
        At => Rule::Text(TypeMask::AT),
        Bsx => Rule::Text(TypeMask::BSX),
        Bx => Rule::Text(TypeMask::BX),
        Cd => Rule::Text(TypeMask::CD),
        Cm => Rule::Text(TypeMask::CM),
        Dv => Rule::Text(TypeMask::DV),
        Dx => Rule::Text(TypeMask::DX),
        Em => Rule::Text(TypeMask::EM),
        Er => Rule::Text(TypeMask::ER),
        Ev => Rule::Text(TypeMask::EV),
        Fa => Rule::Text(TypeMask::FA),
        Fd => Rule::Include,
        Fl => Rule::Text(TypeMask::FL),
        Fn => Rule::Function,
        Fo => Rule::FunctionBlock,
        Ft => Rule::Synopsis(TypeMask::FT),
        Fx => Rule::Text(TypeMask::FX),
        In => Rule::Synopsis(TypeMask::IN),
        Lb => Rule::Text(TypeMask::LB),
        Li => Rule::Text(TypeMask::LI),
        Lk => Rule::Text(TypeMask::LK),
        Ms => Rule::Text(TypeMask::MS),
        Mt => Rule::Text(TypeMask::MT),
        Nd => Rule::Description,
        Nm => Rule::Text(TypeMask::NM),
        Nx => Rule::Text(TypeMask::NX),
        Ox => Rule::Text(TypeMask::OX),
        Pa => Rule::Text(TypeMask::PA),
        Rs => Rule::Text(TypeMask::RS),
        Sh => Rule::Heading(TypeMask::SH),
        Ss => Rule::Heading(TypeMask::SS),
        St => Rule::Text(TypeMask::ST),
        Sy => Rule::Text(TypeMask::SY),
        Tn => Rule::Text(TypeMask::TN),
        Va => Rule::Text(TypeMask::VA),
        Vt => Rule::VarType,
        Xr => Rule::CrossRef,
        Other => Rule::Skip,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Name,
    Synopsis,
    Other,
}

impl Section {
    fn from_heading(heading: &str) -> Self {
        match heading {
            "NAME" => Section::Name,
            "SYNOPSIS" => Section::Synopsis,
            _ => Section::Other,
        }
    }
}

/// Collect the keywords of one document into `table`.
///
/// Returns the one-line description, if the document has one.
pub fn collect_keywords(content: &Content, table: &mut KeywordTable) -> Option<String> {
    match content {
        Content::Mdoc { body, .. } => {
            let mut walker = MdocWalker {
                table,
                description: None,
            };
            walker.walk(body, Section::Other);
            walker.description
        }
        Content::Man { body, .. } => collect_man(body, table),
        Content::Formatted { text } => collect_formatted(text, table),
    }
}

struct MdocWalker<'a> {
    table: &'a mut KeywordTable,
    description: Option<String>,
}

impl MdocWalker<'_> {
    fn walk(&mut self, nodes: &[Node], section: Section) {
        for node in nodes {
            let Node::Element { kind, args, children } = node else {
                continue;
            };
            let mut child_section = section;

            match rule(*kind) {
                Rule::Text(mask) => self.table.add(&node.flatten(), mask),
                Rule::Synopsis(mask) => {
                    if section == Section::Synopsis {
                        self.table.add(&node.flatten(), mask);
                    }
                }
                Rule::Function => self.function(args),
                Rule::FunctionBlock => {
                    if let Some(name) = args.first() {
                        self.table.add(name, TypeMask::FN);
                    }
                }
                Rule::Include => {
                    if let Some(header) = include_header(&node.flatten()) {
                        self.table.add(header, TypeMask::IN);
                    }
                }
                Rule::VarType => {
                    if section == Section::Synopsis {
                        let text = node.flatten();
                        self.table.add(text.trim_end().trim_end_matches(';'), TypeMask::VT);
                    }
                }
                Rule::CrossRef => match args.as_slice() {
                    [name, sec, ..] => self.table.add(&format!("{}({})", name, sec), TypeMask::XR),
                    [name] => self.table.add(name, TypeMask::XR),
                    [] => {}
                },
                Rule::Description => {
                    let text = node.flatten();
                    self.table.add(&text, TypeMask::ND);
                    if self.description.is_none() && !text.is_empty() {
                        self.description = Some(text);
                    }
                }
                Rule::Heading(mask) => {
                    let heading = args.join(" ");
                    self.table.add(&heading, mask);
                    if *kind == ElementKind::Sh {
                        child_section = Section::from_heading(heading.trim());
                    }
                }
                Rule::Skip => {}
            }

            // Nested elements contribute on their own as well
            self.walk(children, child_section);
        }
    }

    /// `Fn "char *" strdup "const char *"` or `Fn "char *strdup" ...`
    fn function(&mut self, args: &[String]) {
        let Some((proto, params)) = args.split_first() else {
            return;
        };
        let (ret, name) = split_prototype(proto);
        self.table.add(name, TypeMask::FN);
        if !ret.is_empty() {
            self.table.add(ret, TypeMask::FT);
        }
        for param in params {
            self.table.add(param, TypeMask::FA);
        }
    }
}

/// Split `"int *foo"` into `("int *", "foo")`
fn split_prototype(proto: &str) -> (&str, &str) {
    let proto = proto.trim();
    let last_space = proto.rfind(' ').unwrap_or(0);
    let name_start = proto[last_space..]
        .find(|c: char| c != ' ' && c != '*')
        .map_or(proto.len(), |i| last_space + i);
    (proto[..name_start].trim(), &proto[name_start..])
}

fn include_header(text: &str) -> Option<&str> {
    let rest = text.trim().strip_prefix("#include")?.trim();
    let header = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .or_else(|| rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
        .unwrap_or(rest);
    Some(header.trim()).filter(|h| !h.is_empty())
}

/// Names and description from the NAME section of a man page
fn collect_man(body: &[Node], table: &mut KeywordTable) -> Option<String> {
    let section = body.iter().find_map(|node| match node {
        Node::Element {
            kind: ElementKind::Sh,
            args,
            children,
        } if args.join(" ").trim() == "NAME" => Some(children),
        _ => None,
    })?;

    let text = section.iter().map(Node::flatten).collect::<Vec<_>>().join(" ");
    name_line(&text, table)
}

/// Split `name, name \- description`, adding names and description
fn name_line(text: &str, table: &mut KeywordTable) -> Option<String> {
    let (names, description) = ["\\-", " - ", " -- "]
        .iter()
        .find_map(|sep| text.split_once(sep))
        .map_or((text, None), |(names, desc)| (names, Some(desc.trim())));

    for name in names.split(|c: char| c == ',' || c.is_whitespace()) {
        table.add(name, TypeMask::NM);
    }

    let description = description.filter(|d| !d.is_empty())?;
    table.add(description, TypeMask::ND);
    Some(description.to_string())
}

/// Names and description from preformatted text
fn collect_formatted(text: &str, table: &mut KeywordTable) -> Option<String> {
    let plain = strip_overstrike(text);
    let mut lines = plain.lines().skip_while(|line| line.trim() != "NAME");
    lines.next()?;

    let mut joined = String::new();
    for line in lines {
        if line.trim().is_empty() {
            if joined.is_empty() {
                continue;
            }
            break;
        }
        // Next section heading
        if !line.starts_with(char::is_whitespace) {
            break;
        }
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(line.trim());
    }

    if joined.is_empty() {
        return None;
    }
    name_line(&joined, table)
}

/// Remove `x\bx` (bold) and `_\bx` (underline) sequences, keeping the last character
pub fn strip_overstrike(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{8}' {
            out.pop();
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
