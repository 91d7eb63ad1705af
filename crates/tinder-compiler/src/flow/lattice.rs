//! The nullability lattice and knowledge maps.

use std::collections::BTreeMap;

use bitflags::bitflags;
use tinder_core::SymbolId;

bitflags! {
    /// What the analyzer knows about a value's nullness at a point.
    ///
    /// A 2-bit join-semilattice: intersection is bitwise AND, union is
    /// bitwise OR. The empty set means "no path reaches here".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct IsNull: u8 {
        /// Definitely not null.
        const NO = 0b01;
        /// Definitely null.
        const YES = 0b10;
        /// Could be either.
        const MAYBE = 0b11;
    }
}

/// What the analyzer has proved about each local at a program point.
///
/// Missing entries default to [`IsNull::MAYBE`] when read (nothing is
/// known about a value until something is observed) and to the empty set
/// when joined (an absent fact contributes nothing to a union).
///
/// Backed by an ordered map so that snapshots hash deterministically;
/// the fixed point memoizes on `(node, knowledge)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Knowledge {
    facts: BTreeMap<SymbolId, IsNull>,
}

impl Knowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: SymbolId) -> IsNull {
        self.facts.get(&symbol).copied().unwrap_or(IsNull::MAYBE)
    }

    pub fn set(&mut self, symbol: SymbolId, value: IsNull) {
        self.facts.insert(symbol, value);
    }

    /// Join another snapshot into this one, per symbol.
    pub fn union_with(&mut self, other: &Knowledge) {
        for (&symbol, &value) in &other.facts {
            let entry = self.facts.entry(symbol).or_insert(IsNull::empty());
            *entry |= value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u32) -> SymbolId {
        SymbolId(n)
    }

    #[test]
    fn lattice_operations() {
        assert_eq!(IsNull::NO | IsNull::YES, IsNull::MAYBE);
        assert_eq!(IsNull::MAYBE & IsNull::NO, IsNull::NO);
        assert_eq!(IsNull::NO & IsNull::YES, IsNull::empty());
    }

    #[test]
    fn complement_swaps_branches() {
        assert_eq!(IsNull::NO.complement(), IsNull::YES);
        assert_eq!(IsNull::YES.complement(), IsNull::NO);
        assert_eq!(IsNull::MAYBE.complement(), IsNull::empty());
    }

    #[test]
    fn missing_facts_read_as_maybe() {
        let knowledge = Knowledge::new();
        assert_eq!(knowledge.get(sym(0)), IsNull::MAYBE);
    }

    #[test]
    fn union_joins_per_symbol() {
        let mut a = Knowledge::new();
        a.set(sym(0), IsNull::NO);
        a.set(sym(1), IsNull::NO);

        let mut b = Knowledge::new();
        b.set(sym(0), IsNull::YES);

        a.union_with(&b);
        assert_eq!(a.get(sym(0)), IsNull::MAYBE);
        assert_eq!(a.get(sym(1)), IsNull::NO);
    }

    #[test]
    fn snapshots_compare_and_hash() {
        use rustc_hash::FxHashSet;

        let mut a = Knowledge::new();
        a.set(sym(0), IsNull::NO);
        let mut b = Knowledge::new();
        b.set(sym(0), IsNull::NO);
        assert_eq!(a, b);

        let mut seen = FxHashSet::default();
        assert!(seen.insert(a));
        assert!(!seen.insert(b));
    }
}
