//! Field kinds a keyword can originate from.
//!
//! The vocabulary is owned by the document parser; the compiler receives it
//! as a [`FieldTable`] so query field names resolve against the same set the
//! builder used when tagging keywords.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Bitset of field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TypeMask(pub u64);

impl TypeMask {
    pub const NONE: TypeMask = TypeMask(0);
    pub const AN: TypeMask = TypeMask(1 << 0);
    pub const AR: TypeMask = TypeMask(1 << 1);
    pub const AT: TypeMask = TypeMask(1 << 2);
    pub const BSX: TypeMask = TypeMask(1 << 3);
    pub const BX: TypeMask = TypeMask(1 << 4);
    pub const CD: TypeMask = TypeMask(1 << 5);
    pub const CM: TypeMask = TypeMask(1 << 6);
    pub const DV: TypeMask = TypeMask(1 << 7);
    pub const DX: TypeMask = TypeMask(1 << 8);
    pub const EM: TypeMask = TypeMask(1 << 9);
    pub const ER: TypeMask = TypeMask(1 << 10);
    pub const EV: TypeMask = TypeMask(1 << 11);
    pub const FA: TypeMask = TypeMask(1 << 12);
    pub const FL: TypeMask = TypeMask(1 << 13);
    pub const FN: TypeMask = TypeMask(1 << 14);
    pub const FT: TypeMask = TypeMask(1 << 15);
    pub const FX: TypeMask = TypeMask(1 << 16);
    pub const IN: TypeMask = TypeMask(1 << 17);
    pub const LB: TypeMask = TypeMask(1 << 18);
    pub const LI: TypeMask = TypeMask(1 << 19);
    pub const LK: TypeMask = TypeMask(1 << 20);
    pub const MS: TypeMask = TypeMask(1 << 21);
    pub const MT: TypeMask = TypeMask(1 << 22);
    pub const ND: TypeMask = TypeMask(1 << 23);
    pub const NM: TypeMask = TypeMask(1 << 24);
    pub const NX: TypeMask = TypeMask(1 << 25);
    pub const OX: TypeMask = TypeMask(1 << 26);
    pub const PA: TypeMask = TypeMask(1 << 27);
    pub const RS: TypeMask = TypeMask(1 << 28);
    pub const SH: TypeMask = TypeMask(1 << 29);
    pub const SS: TypeMask = TypeMask(1 << 30);
    pub const ST: TypeMask = TypeMask(1 << 31);
    pub const SY: TypeMask = TypeMask(1 << 32);
    pub const TN: TypeMask = TypeMask(1 << 33);
    pub const VA: TypeMask = TypeMask(1 << 34);
    pub const VT: TypeMask = TypeMask(1 << 35);
    pub const XR: TypeMask = TypeMask(1 << 36);

    /// Universal mask: every field kind
    pub const ANY: TypeMask = TypeMask(u64::MAX);

    /// Fields searched when a term names none: names and descriptions
    pub const DEFAULT: TypeMask = TypeMask(Self::NM.0 | Self::ND.0);

    #[inline]
    pub fn intersects(self, other: TypeMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TypeMask {
    type Output = TypeMask;

    fn bitor(self, rhs: TypeMask) -> TypeMask {
        TypeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for TypeMask {
    fn bitor_assign(&mut self, rhs: TypeMask) {
        self.0 |= rhs.0;
    }
}

/// A named field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKind {
    pub name: &'static str,
    pub mask: TypeMask,
}

const STANDARD_FIELDS: &[FieldKind] = &[
    FieldKind { name: "An", mask: TypeMask::AN },
    FieldKind { name: "Ar", mask: TypeMask::AR },
    FieldKind { name: "At", mask: TypeMask::AT },
    FieldKind { name: "Bsx", mask: TypeMask::BSX },
    FieldKind { name: "Bx", mask: TypeMask::BX },
    FieldKind { name: "Cd", mask: TypeMask::CD },
    FieldKind { name: "Cm", mask: TypeMask::CM },
    FieldKind { name: "Dv", mask: TypeMask::DV },
    FieldKind { name: "Dx", mask: TypeMask::DX },
    FieldKind { name: "Em", mask: TypeMask::EM },
    FieldKind { name: "Er", mask: TypeMask::ER },
    FieldKind { name: "Ev", mask: TypeMask::EV },
    FieldKind { name: "Fa", mask: TypeMask::FA },
    FieldKind { name: "Fl", mask: TypeMask::FL },
    FieldKind { name: "Fn", mask: TypeMask::FN },
    FieldKind { name: "Ft", mask: TypeMask::FT },
    FieldKind { name: "Fx", mask: TypeMask::FX },
    FieldKind { name: "In", mask: TypeMask::IN },
    FieldKind { name: "Lb", mask: TypeMask::LB },
    FieldKind { name: "Li", mask: TypeMask::LI },
    FieldKind { name: "Lk", mask: TypeMask::LK },
    FieldKind { name: "Ms", mask: TypeMask::MS },
    FieldKind { name: "Mt", mask: TypeMask::MT },
    FieldKind { name: "Nd", mask: TypeMask::ND },
    FieldKind { name: "Nm", mask: TypeMask::NM },
    FieldKind { name: "Nx", mask: TypeMask::NX },
    FieldKind { name: "Ox", mask: TypeMask::OX },
    FieldKind { name: "Pa", mask: TypeMask::PA },
    FieldKind { name: "Rs", mask: TypeMask::RS },
    FieldKind { name: "Sh", mask: TypeMask::SH },
    FieldKind { name: "Ss", mask: TypeMask::SS },
    FieldKind { name: "St", mask: TypeMask::ST },
    FieldKind { name: "Sy", mask: TypeMask::SY },
    FieldKind { name: "Tn", mask: TypeMask::TN },
    FieldKind { name: "Va", mask: TypeMask::VA },
    FieldKind { name: "Vt", mask: TypeMask::VT },
    FieldKind { name: "Xr", mask: TypeMask::XR },
    FieldKind { name: "any", mask: TypeMask::ANY },
];

/// Name to mask table used by the query compiler
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    kinds: &'static [FieldKind],
}

impl FieldTable {
    /// Table matching the element kinds the builder indexes
    pub fn standard() -> Self {
        Self { kinds: STANDARD_FIELDS }
    }

    pub fn new(kinds: &'static [FieldKind]) -> Self {
        Self { kinds }
    }

    /// Resolve one field name; unknown names mean "any field"
    pub fn resolve(&self, name: &str) -> TypeMask {
        self.kinds
            .iter()
            .find(|k| k.name == name)
            .map(|k| k.mask)
            .unwrap_or(TypeMask::ANY)
    }

    /// Resolve a comma-separated list of field names
    pub fn resolve_list(&self, list: &str) -> TypeMask {
        list.split(',')
            .filter(|name| !name.is_empty())
            .fold(TypeMask::NONE, |mask, name| mask | self.resolve(name))
    }

    pub fn kinds(&self) -> &'static [FieldKind] {
        self.kinds
    }
}

impl Default for FieldTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known() {
        let table = FieldTable::standard();
        assert_eq!(table.resolve("Nm"), TypeMask::NM);
        assert_eq!(table.resolve("Xr"), TypeMask::XR);
    }

    #[test]
    fn test_resolve_unknown_is_any() {
        let table = FieldTable::standard();
        assert_eq!(table.resolve("Bogus"), TypeMask::ANY);
        assert_eq!(table.resolve("nm"), TypeMask::ANY);
    }

    #[test]
    fn test_resolve_list() {
        let table = FieldTable::standard();
        assert_eq!(table.resolve_list("Nm,Nd"), TypeMask::DEFAULT);
        assert_eq!(table.resolve_list("Fn,,Fa"), TypeMask::FN | TypeMask::FA);
    }

    #[test]
    fn test_masks_are_distinct() {
        let table = FieldTable::standard();
        let mut seen = TypeMask::NONE;
        for kind in table.kinds().iter().filter(|k| k.mask != TypeMask::ANY) {
            assert!(!seen.intersects(kind.mask), "{} overlaps", kind.name);
            seen |= kind.mask;
        }
    }
}
