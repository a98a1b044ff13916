//! Exercises ELF parsing end to end against a hand-built minimal binary:
//! one `PT_PHDR` program header (image-base derivation) plus `.symtab`,
//! `.strtab`, and `.shstrtab` sections (symbol lookup).

use native_symbolize::object::{FileFormat, Object};

const IMAGE_BASE: u64 = 0x0040_0000;
const MAIN_ADDR: u64 = IMAGE_BASE + 0x1000;
const MAIN_SIZE: u64 = 0x10;

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Builds a minimal, valid little-endian ELF64 executable:
/// layout = [ehdr(64) | phdr(56) | shstrtab(27) | strtab(6) | symtab(48) | shdrs(4*64)].
fn build_minimal_elf() -> Vec<u8> {
    const PHDR_OFF: u64 = 64;
    const SHSTRTAB_OFF: u64 = PHDR_OFF + 56;
    const STRTAB_OFF: u64 = SHSTRTAB_OFF + 27;
    const SYMTAB_OFF: u64 = STRTAB_OFF + 6;
    const SHDRS_OFF: u64 = SYMTAB_OFF + 48;

    let mut out = Vec::new();

    // e_ident
    out.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
    out.push(2); // EI_CLASS = ELFCLASS64
    out.push(1); // EI_DATA = ELFDATA2LSB
    out.push(1); // EI_VERSION
    out.push(0); // EI_OSABI
    out.extend_from_slice(&[0u8; 8]); // EI_ABIVERSION + padding
    push_u16(&mut out, 2); // e_type = ET_EXEC
    push_u16(&mut out, 62); // e_machine = EM_X86_64
    push_u32(&mut out, 1); // e_version
    push_u64(&mut out, MAIN_ADDR); // e_entry
    push_u64(&mut out, PHDR_OFF); // e_phoff
    push_u64(&mut out, SHDRS_OFF); // e_shoff
    push_u32(&mut out, 0); // e_flags
    push_u16(&mut out, 64); // e_ehsize
    push_u16(&mut out, 56); // e_phentsize
    push_u16(&mut out, 1); // e_phnum
    push_u16(&mut out, 64); // e_shentsize
    push_u16(&mut out, 4); // e_shnum
    push_u16(&mut out, 1); // e_shstrndx
    assert_eq!(out.len(), 64);

    // PT_PHDR program header, describing itself.
    push_u32(&mut out, 6); // p_type = PT_PHDR
    push_u32(&mut out, 4); // p_flags = R
    push_u64(&mut out, PHDR_OFF); // p_offset
    push_u64(&mut out, IMAGE_BASE + PHDR_OFF); // p_vaddr
    push_u64(&mut out, IMAGE_BASE + PHDR_OFF); // p_paddr
    push_u64(&mut out, 56); // p_filesz
    push_u64(&mut out, 56); // p_memsz
    push_u64(&mut out, 8); // p_align
    assert_eq!(out.len() as u64, SHSTRTAB_OFF);

    // .shstrtab: "\0.shstrtab\0.symtab\0.strtab\0"
    out.push(0);
    out.extend_from_slice(b".shstrtab\0");
    out.extend_from_slice(b".symtab\0");
    out.extend_from_slice(b".strtab\0");
    assert_eq!(out.len() as u64, STRTAB_OFF);

    // .strtab: "\0main\0"
    out.push(0);
    out.extend_from_slice(b"main\0");
    assert_eq!(out.len() as u64, SYMTAB_OFF);

    // .symtab: null entry + "main" entry.
    out.extend_from_slice(&[0u8; 24]);
    push_u32(&mut out, 1); // st_name -> "main" in .strtab
    out.push(0x12); // st_info
    out.push(0); // st_other
    push_u16(&mut out, 0); // st_shndx
    push_u64(&mut out, MAIN_ADDR); // st_value
    push_u64(&mut out, MAIN_SIZE); // st_size
    assert_eq!(out.len() as u64, SHDRS_OFF);

    // Section headers: NULL, .shstrtab, .symtab, .strtab
    out.extend_from_slice(&[0u8; 64]); // NULL

    push_u32(&mut out, 1); // sh_name -> ".shstrtab"
    push_u32(&mut out, 3); // sh_type = SHT_STRTAB
    push_u64(&mut out, 0); // sh_flags
    push_u64(&mut out, 0); // sh_addr
    push_u64(&mut out, SHSTRTAB_OFF); // sh_offset
    push_u64(&mut out, 27); // sh_size
    push_u32(&mut out, 0); // sh_link
    push_u32(&mut out, 0); // sh_info
    push_u64(&mut out, 1); // sh_addralign
    push_u64(&mut out, 0); // sh_entsize

    push_u32(&mut out, 11); // sh_name -> ".symtab"
    push_u32(&mut out, 2); // sh_type = SHT_SYMTAB
    push_u64(&mut out, 0);
    push_u64(&mut out, 0);
    push_u64(&mut out, SYMTAB_OFF);
    push_u64(&mut out, 48);
    push_u32(&mut out, 3); // sh_link -> .strtab (index 3)
    push_u32(&mut out, 1);
    push_u64(&mut out, 8);
    push_u64(&mut out, 24);

    push_u32(&mut out, 19); // sh_name -> ".strtab"
    push_u32(&mut out, 3); // sh_type = SHT_STRTAB
    push_u64(&mut out, 0);
    push_u64(&mut out, 0);
    push_u64(&mut out, STRTAB_OFF);
    push_u64(&mut out, 6);
    push_u32(&mut out, 0);
    push_u32(&mut out, 0);
    push_u64(&mut out, 1);
    push_u64(&mut out, 0);

    out
}

#[test]
fn peek_detects_elf_magic() {
    let data = build_minimal_elf();
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::Elf);
}

#[test]
fn image_base_derived_from_pt_phdr() {
    let data = build_minimal_elf();
    let object = Object::parse(&data).expect("minimal ELF should parse");
    assert_eq!(object.image_base(), IMAGE_BASE);
}

#[test]
fn symbol_lookup_finds_main() {
    let data = build_minimal_elf();
    let object = Object::parse(&data).expect("minimal ELF should parse");
    let name = object.lookup_symbol(MAIN_ADDR + 4).expect("pc within main's range");
    assert_eq!(name, "main");
    assert!(object.lookup_symbol(MAIN_ADDR + MAIN_SIZE).is_none());
}

#[test]
fn section_data_reads_shstrtab() {
    let data = build_minimal_elf();
    let object = Object::parse(&data).expect("minimal ELF should parse");
    let shstrtab = object.section_data(".shstrtab").expect("section present");
    assert!(shstrtab.starts_with(b"\0.shstrtab\0"));
}
