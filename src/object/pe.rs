//! PE/COFF object parsing (spec §4.2 "PE").
//!
//! Grounded on `symbolic-debuginfo/src/pe.rs` (`PeObject::test`/`parse`,
//! `image_base`, export-table symbol iteration, `.debug_info`-style section
//! lookup via `.{name}`), trimmed of the embedded Portable PDB handling
//! which belongs to a different spec.

use std::borrow::Cow;

use goblin::pe::PE;
use scroll::{Pread, LE};
use thiserror::Error;

use crate::object::DebugLink;
use crate::symbol::{Symbol, SymbolMap};

#[derive(Debug, Error)]
#[error("invalid PE file: {message}")]
pub struct PeError {
    message: String,
}

impl PeError {
    fn new(message: impl std::fmt::Display) -> Self {
        PeError {
            message: message.to_string(),
        }
    }
}

pub struct PeObject<'data> {
    pe: PE<'data>,
    data: &'data [u8],
    symbols: SymbolMap<'data>,
}

impl<'data> PeObject<'data> {
    pub fn test(data: &[u8]) -> bool {
        matches!(
            data.get(0..2).and_then(|d| d.pread_with::<u16>(0, LE).ok()),
            Some(goblin::pe::header::DOS_MAGIC)
        )
    }

    pub fn parse(data: &'data [u8]) -> Result<Self, PeError> {
        let pe = PE::parse(data).map_err(PeError::new)?;
        let symbols = SymbolMap::from_symbols(
            pe.exports
                .iter()
                .filter_map(|export| {
                    let name = export.name?;
                    Some(Symbol {
                        name: Cow::Borrowed(name),
                        address: export.rva as u64,
                        size: if export.size > 0 {
                            Some(export.size as u64)
                        } else {
                            None
                        },
                    })
                })
                .collect(),
        );
        Ok(PeObject { pe, data, symbols })
    }

    /// `ImageBase` from the optional header (spec's PE32-vs-PE32+ dispatch
    /// is handled by goblin, which normalizes both widths to this field).
    pub fn image_base(&self) -> u64 {
        self.pe.image_base as u64
    }

    pub fn lookup_symbol(&self, object_pc: u64) -> Option<Cow<'data, str>> {
        self.symbols.lookup(object_pc).map(|s| s.name.clone())
    }

    pub fn into_symbols(self) -> SymbolMap<'data> {
        self.symbols
    }

    /// PE debug info (when present at all) is usually in an external PDB
    /// referenced by a CodeView debug directory entry, not a
    /// `.gnu_debuglink`-style link; this crate does not chase PDB
    /// companions (out of scope: spec targets DWARF only), so no debug link
    /// is reported here.
    pub fn debug_link(&self) -> Option<DebugLink> {
        None
    }

    /// Raw bytes of a section named `name` (e.g. `.debug_info`), matching
    /// the ELF naming convention some MinGW/Clang toolchains also use for PE
    /// DWARF sections.
    pub fn section_data(&self, name: &str) -> Option<Cow<'data, [u8]>> {
        let section = self
            .pe
            .sections
            .iter()
            .find(|s| s.name().map(|n| n == name).unwrap_or(false))?;
        let start = section.pointer_to_raw_data as usize;
        let end = start.checked_add(section.virtual_size as usize)?;
        self.data.get(start..end).map(Cow::Borrowed)
    }
}
