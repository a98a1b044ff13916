//! Static symbol tables: sorted by address, binary-searched by PC.
//!
//! Grounded on `symbolic-debuginfo`'s `Symbol`/`SymbolMap` (base.rs):
//! a symbol's size is unknown from most symbol tables directly and is
//! inferred from the gap to the next symbol's address.

use std::borrow::Cow;

/// One entry from an ELF `.symtab`/`.dynsym`, Mach-O n-list table, or PE
/// export table.
#[derive(Debug, Clone)]
pub struct Symbol<'data> {
    pub name: Cow<'data, str>,
    pub address: u64,
    /// `None` until inferred from the following symbol's address.
    pub size: Option<u64>,
}

impl<'data> Symbol<'data> {
    /// Whether `pc` falls within `[address, address + size)`. A symbol with
    /// no known size is treated as covering only its exact address (the
    /// caller typically only reaches that branch via exact lookup).
    pub fn contains(&self, pc: u64) -> bool {
        match self.size {
            Some(size) => pc >= self.address && pc < self.address + size,
            None => pc == self.address,
        }
    }
}

/// A symbol table sorted ascending by `address`, as required by spec §3
/// ("symbol tables are sorted by value ascending").
#[derive(Debug, Default)]
pub struct SymbolMap<'data> {
    symbols: Vec<Symbol<'data>>,
}

impl<'data> SymbolMap<'data> {
    /// Build a sorted map from unsorted entries, inferring sizes for
    /// consecutive same-address runs by taking the gap to the next distinct
    /// address.
    pub fn from_symbols(mut symbols: Vec<Symbol<'data>>) -> Self {
        dmsort::sort_by_key(&mut symbols, |s| s.address);
        symbols.dedup_by(|a, b| {
            // Keep the first of any exact-address duplicates (common for
            // aliases); `dedup_by` compares adjacent (a is the later one).
            a.address == b.address
        });
        let len = symbols.len();
        for i in 0..len {
            if symbols[i].size.is_none() {
                let next_addr = symbols.get(i + 1).map(|s| s.address);
                if let Some(next) = next_addr {
                    symbols[i].size = Some(next.saturating_sub(symbols[i].address));
                }
            }
        }
        SymbolMap { symbols }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Last symbol whose `address <= pc`, accepted only if `pc` falls within
    /// its (possibly inferred) size, per spec §4.2's ELF lookup rule.
    pub fn lookup(&self, pc: u64) -> Option<&Symbol<'data>> {
        let idx = match self.symbols.binary_search_by_key(&pc, |s| s.address) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let sym = &self.symbols[idx];
        if sym.contains(pc) {
            Some(sym)
        } else {
            None
        }
    }

    /// Exact-address lookup, ignoring size.
    pub fn lookup_exact(&self, pc: u64) -> Option<&Symbol<'data>> {
        self.symbols
            .binary_search_by_key(&pc, |s| s.address)
            .ok()
            .map(|i| &self.symbols[i])
    }

    /// Detaches every name from the borrowed object buffer, producing a map
    /// that can outlive it. Used by the `prioritize_speed` cache layer,
    /// which retains symbol tables for the life of the process after the
    /// originating object's bytes may have been dropped.
    pub fn into_owned(self) -> SymbolMap<'static> {
        SymbolMap {
            symbols: self
                .symbols
                .into_iter()
                .map(|s| Symbol {
                    name: Cow::Owned(s.name.into_owned()),
                    address: s.address,
                    size: s.size,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, address: u64) -> Symbol<'static> {
        Symbol {
            name: Cow::Borrowed(name),
            address,
            size: None,
        }
    }

    #[test]
    fn sorts_and_infers_size() {
        let map = SymbolMap::from_symbols(vec![sym("b", 20), sym("a", 10)]);
        assert_eq!(map.lookup(10).unwrap().name, "a");
        assert_eq!(map.lookup(15).unwrap().name, "a");
        assert_eq!(map.lookup(20).unwrap().name, "b");
    }

    #[test]
    fn lookup_before_first_symbol_misses() {
        let map = SymbolMap::from_symbols(vec![sym("a", 10)]);
        assert!(map.lookup(5).is_none());
    }

    #[test]
    fn p6_range_correctness_boundaries() {
        let map = SymbolMap::from_symbols(vec![sym("a", 10), sym("b", 20)]);
        // "a" covers [10, 20)
        assert!(map.lookup(9).map(|s| s.name.as_ref()) != Some("a"));
        assert_eq!(map.lookup(19).unwrap().name, "a");
        assert_eq!(map.lookup(20).unwrap().name, "b");
    }
}
