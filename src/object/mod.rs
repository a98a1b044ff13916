//! Object-file containers: ELF, Mach-O, PE (spec §4.2).
//!
//! Grounded on `symbolic-debuginfo/src/object.rs`'s enum-dispatch shape
//! (`Object::Elf`/`Object::MachO`/`Object::Pe`, `peek()` magic sniffing),
//! trimmed to the three formats spec.md lists (no Breakpad/PDB/SourceBundle/
//! Wasm — those belong to a different spec).

pub mod elf;
pub mod macho;
pub mod pe;

use thiserror::Error;

use crate::symbol::SymbolMap;

/// The container format detected for a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Elf,
    MachO,
    Pe,
    Unknown,
}

/// Byte order of an object's raw section contents (spec §4.2/§6 "P3"). ELF is
/// the only format of the three that can be big-endian on real-world targets
/// (PowerPC, MIPS BE, s390x); Mach-O and PE are always little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Sniffs the magic bytes of `data` without fully parsing it. Mirrors
/// `symbolic-debuginfo::Object::peek`.
pub fn peek(data: &[u8]) -> FileFormat {
    if elf::ElfObject::test(data) {
        FileFormat::Elf
    } else if macho::MachOObject::test(data) {
        FileFormat::MachO
    } else if pe::PeObject::test(data) {
        FileFormat::Pe
    } else {
        FileFormat::Unknown
    }
}

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Elf(#[from] elf::ElfError),
    #[error(transparent)]
    MachO(#[from] macho::MachOError),
    #[error(transparent)]
    Pe(#[from] pe::PeError),
    #[error("unrecognized object file format")]
    UnknownFormat,
}

/// The one conceptual contract all three formats satisfy (spec §4.2).
pub trait ObjectLike<'data> {
    /// Preferred virtual address of the module's text, per spec's per-format
    /// image-base derivation rules.
    fn image_base(&self) -> u64;

    /// Best-effort static lookup using the object's own symbol table(s).
    fn lookup_symbol(&self, object_pc: u64) -> Option<std::borrow::Cow<'data, str>>;

    /// Name of the debug companion this object points at, if any
    /// (`.gnu_debuglink` on ELF, a `.dSYM` sibling on Mach-O). `None` means
    /// debug info should be looked for directly in this object.
    fn debug_link(&self) -> Option<DebugLink>;
}

/// A reference to an external debug-info file.
#[derive(Debug, Clone)]
pub struct DebugLink {
    pub file_name: String,
    /// Expected CRC-32 (IEEE) of the linked file, when the object records
    /// one (ELF `.gnu_debuglink`).
    pub crc32: Option<u32>,
}

/// Dispatches to one of the three supported object formats.
pub enum Object<'data> {
    Elf(elf::ElfObject<'data>),
    MachO(macho::MachOObject<'data>),
    Pe(pe::PeObject<'data>),
}

impl<'data> Object<'data> {
    pub fn parse(data: &'data [u8]) -> Result<Self, ObjectError> {
        match peek(data) {
            FileFormat::Elf => Ok(Object::Elf(elf::ElfObject::parse(data)?)),
            FileFormat::MachO => Ok(Object::MachO(macho::MachOObject::parse(data)?)),
            FileFormat::Pe => Ok(Object::Pe(pe::PeObject::parse(data)?)),
            FileFormat::Unknown => Err(ObjectError::UnknownFormat),
        }
    }

    pub fn file_format(&self) -> FileFormat {
        match self {
            Object::Elf(_) => FileFormat::Elf,
            Object::MachO(_) => FileFormat::MachO,
            Object::Pe(_) => FileFormat::Pe,
        }
    }

    pub fn image_base(&self) -> u64 {
        match self {
            Object::Elf(o) => o.image_base(),
            Object::MachO(o) => o.image_base(),
            Object::Pe(o) => o.image_base(),
        }
    }

    /// Byte order of this object's raw section data, for callers (the DWARF
    /// loader) that must decode sections in the file's own endianness rather
    /// than assuming the host's.
    pub fn endianness(&self) -> Endianness {
        match self {
            Object::Elf(o) => o.endianness(),
            Object::MachO(_) | Object::Pe(_) => Endianness::Little,
        }
    }

    /// Consumes the object and hands back its symbol table, detached from
    /// the rest of the parsed structure. Used to build a standalone
    /// `SymbolMap` fallback when DWARF has no coverage for a PC (spec §4.6).
    pub fn into_symbols(self) -> SymbolMap<'data> {
        match self {
            Object::Elf(o) => o.into_symbols(),
            Object::MachO(o) => o.into_symbols(),
            Object::Pe(o) => o.into_symbols(),
        }
    }

    pub fn lookup_symbol(&self, object_pc: u64) -> Option<std::borrow::Cow<'data, str>> {
        match self {
            Object::Elf(o) => o.lookup_symbol(object_pc),
            Object::MachO(o) => o.lookup_symbol(object_pc),
            Object::Pe(o) => o.lookup_symbol(object_pc),
        }
    }

    pub fn debug_link(&self) -> Option<DebugLink> {
        match self {
            Object::Elf(o) => o.debug_link(),
            Object::MachO(o) => o.debug_link(),
            Object::Pe(o) => o.debug_link(),
        }
    }

    /// Raw bytes of a named section, decompressing transparently if the
    /// section is flagged compressed (spec §6 "Compression support").
    pub fn section_data(&self, name: &str) -> Option<std::borrow::Cow<'data, [u8]>> {
        match self {
            Object::Elf(o) => o.section_data(name),
            Object::MachO(o) => o.section_data(name),
            Object::Pe(o) => o.section_data(name),
        }
    }
}
