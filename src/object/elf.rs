//! ELF32/64 object parsing (spec §4.2 "ELF").
//!
//! Grounded on `symbolic-debuginfo/src/elf.rs`, but built on goblin's
//! one-shot `Elf::parse` rather than that file's hand-rolled lazy/partial
//! parser: this crate does not need `symbolic-debuginfo`'s
//! continue-on-partial-corruption recovery mode, so the simpler API is
//! enough and keeps the module small.

use std::borrow::Cow;

use flate2::{Decompress, FlushDecompress};
use goblin::elf::program_header::PT_PHDR;
use goblin::elf::section_header::{SHF_COMPRESSED, SHT_NOBITS};
use goblin::elf::Elf;
use thiserror::Error;

use crate::object::{DebugLink, Endianness};
use crate::symbol::{Symbol, SymbolMap};

#[derive(Debug, Error)]
#[error("invalid ELF file: {message}")]
pub struct ElfError {
    message: String,
}

impl ElfError {
    fn new(message: impl Into<String>) -> Self {
        ElfError {
            message: message.into(),
        }
    }
}

pub struct ElfObject<'data> {
    elf: Elf<'data>,
    data: &'data [u8],
    image_base: u64,
    symbols: SymbolMap<'data>,
}

impl<'data> ElfObject<'data> {
    pub fn test(data: &[u8]) -> bool {
        data.get(0..goblin::elf::header::SELFMAG)
            .is_some_and(|magic| magic == goblin::elf::header::ELFMAG)
    }

    pub fn parse(data: &'data [u8]) -> Result<Self, ElfError> {
        let elf = Elf::parse(data).map_err(|e| ElfError::new(e.to_string()))?;

        let image_base = elf
            .program_headers
            .iter()
            .find(|ph| ph.p_type == PT_PHDR)
            .map(|ph| ph.p_vaddr.wrapping_sub(ph.p_offset))
            .unwrap_or(0);

        let mut symbols = Vec::new();
        for table in [&elf.syms, &elf.dynsyms] {
            let strtab = if std::ptr::eq(table, &elf.syms) {
                &elf.strtab
            } else {
                &elf.dynstrtab
            };
            for sym in table.iter() {
                if sym.st_value == 0 || sym.st_name == 0 {
                    continue;
                }
                let name = strtab.get_at(sym.st_name).unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                symbols.push(Symbol {
                    name: Cow::Borrowed(name),
                    address: sym.st_value,
                    size: if sym.st_size > 0 {
                        Some(sym.st_size)
                    } else {
                        None
                    },
                });
            }
        }

        Ok(ElfObject {
            image_base,
            symbols: SymbolMap::from_symbols(symbols),
            elf,
            data,
        })
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    /// The file's actual byte order, read from `e_ident[EI_DATA]` via
    /// goblin's `little_endian` flag — not the host's.
    pub fn endianness(&self) -> Endianness {
        if self.elf.little_endian {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }

    pub fn lookup_symbol(&self, object_pc: u64) -> Option<Cow<'data, str>> {
        self.symbols.lookup(object_pc).map(|s| s.name.clone())
    }

    pub fn into_symbols(self) -> SymbolMap<'data> {
        self.symbols
    }

    pub fn debug_link(&self) -> Option<DebugLink> {
        let (data, _) = self.raw_section(".gnu_debuglink")?;
        let nul = data.iter().position(|&b| b == 0)?;
        let file_name = std::str::from_utf8(&data[..nul]).ok()?.to_string();
        // The name is NUL-padded to a 4-byte boundary, followed by a
        // little-endian CRC-32.
        let crc_start = (nul + 1 + 3) & !3;
        let crc32 = data
            .get(crc_start..crc_start + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        Some(DebugLink { file_name, crc32 })
    }

    fn raw_section(&self, name: &str) -> Option<(&'data [u8], bool)> {
        let shdr = self.elf.section_headers.iter().find(|shdr| {
            self.elf
                .shdr_strtab
                .get_at(shdr.sh_name)
                .is_some_and(|n| n == name)
        })?;
        if shdr.sh_type as u32 == SHT_NOBITS {
            return None;
        }
        let start = shdr.sh_offset as usize;
        let end = start.checked_add(shdr.sh_size as usize)?;
        let bytes = self.data.get(start..end)?;
        let compressed = shdr.sh_flags as u64 & SHF_COMPRESSED as u64 != 0;
        Some((bytes, compressed))
    }

    /// Section bytes, transparently decompressing `SHF_COMPRESSED` sections
    /// (zlib per spec §6; zstd is also accepted since newer linkers can
    /// emit `ELFCOMPRESS_ZSTD`).
    pub fn section_data(&self, name: &str) -> Option<Cow<'data, [u8]>> {
        let (bytes, compressed) = self.raw_section(name)?;
        if !compressed {
            return Some(Cow::Borrowed(bytes));
        }
        // Elf32_Chdr / Elf64_Chdr: { ch_type: u32, [ch_reserved: u32], ch_size, ch_addralign }.
        use goblin::elf::compression_header::{ELFCOMPRESS_ZLIB, ELFCOMPRESS_ZSTD};
        use scroll::Pread;
        let endian = if self.elf.little_endian {
            scroll::Endian::Little
        } else {
            scroll::Endian::Big
        };
        let (ch_type, header_size, ch_size) = if self.elf.is_64 {
            let ch_type: u32 = bytes.pread_with(0, endian).ok()?;
            let ch_size: u64 = bytes.pread_with(8, endian).ok()?;
            (ch_type, 24usize, ch_size as usize)
        } else {
            let ch_type: u32 = bytes.pread_with(0, endian).ok()?;
            let ch_size: u32 = bytes.pread_with(4, endian).ok()?;
            (ch_type, 12usize, ch_size as usize)
        };
        let body = bytes.get(header_size..)?;
        match ch_type {
            ELFCOMPRESS_ZLIB => {
                let mut out = Vec::with_capacity(ch_size);
                let mut decompress = Decompress::new(true);
                decompress
                    .decompress_vec(body, &mut out, FlushDecompress::Finish)
                    .ok()?;
                Some(Cow::Owned(out))
            }
            ELFCOMPRESS_ZSTD => zstd::stream::decode_all(body).ok().map(Cow::Owned),
            _ => None,
        }
    }
}
