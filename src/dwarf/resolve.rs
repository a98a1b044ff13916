//! PC -> frame algorithm: CU selection, line lookup, symbol lookup, inline
//! expansion and line-info rotation (spec §4.4.5).

use gimli::read::{AttributeValue, DebuggingInformationEntry};
use gimli::UnitOffset;

use crate::dwarf::line_cache::LineTable;
use crate::dwarf::ranges;
use crate::dwarf::sections::R;
use crate::dwarf::subprogram_cache::{self, SubprogramRange};
use crate::dwarf::unit_cache::UnitCache;
use crate::error::Result;

/// One entry of a flattened inline chain, innermost inline first, physical
/// frame last (spec §4.4.5 step 4; matches "most recent call first" order).
#[derive(Debug, Clone)]
pub struct FlatFrame {
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub is_inline: bool,
}

/// Resolves one object-relative PC against a single compilation unit's
/// caches, returning the flattened, rotated frame chain (never empty once a
/// CU is known to contain the PC: at minimum the physical frame is emitted).
pub fn resolve_in_unit(
    dwarf: &gimli::Dwarf<R>,
    units: &UnitCache,
    line_tables: &mut Vec<Option<LineTable>>,
    subprograms: &mut Vec<Option<Vec<SubprogramRange>>>,
    unit_index: usize,
    pc: u64,
) -> Result<Vec<FlatFrame>> {
    let unit = &units.units[unit_index];

    if line_tables[unit_index].is_none() {
        line_tables[unit_index] = LineTable::build(dwarf, unit)?;
    }
    let line_entry = line_tables[unit_index]
        .as_ref()
        .and_then(|table| table.lookup(pc));
    let (line_file, line, column) = match line_entry {
        Some(entry) => (
            line_tables[unit_index]
                .as_ref()
                .and_then(|t| t.resolve_file(entry.file_index))
                .map(|s| s.to_string()),
            entry.line,
            entry.column,
        ),
        None => (None, None, None),
    };

    if subprograms[unit_index].is_none() {
        subprograms[unit_index] = Some(subprogram_cache::build(dwarf, unit)?);
    }
    let sub_ranges = subprograms[unit_index].as_ref().unwrap();
    let Some(sub_offset) = subprogram_cache::find(sub_ranges, pc) else {
        // No subprogram covers this PC: emit an address-only physical frame
        // with whatever line info we do have.
        return Ok(vec![FlatFrame {
            symbol: String::new(),
            file: line_file,
            line,
            column,
            is_inline: false,
        }]);
    };

    let mut entries = unit.entries_at_offset(sub_offset)?;
    entries.next_entry()?;
    let sub_entry = entries
        .current()
        .ok_or_else(|| crate::error::Error::internal("subprogram DIE vanished"))?;

    let symbol = resolve_symbol_name(dwarf, unit, sub_entry)?.unwrap_or_default();

    // `find_inline_chain` returns inline sites innermost-first (the PC's
    // immediately enclosing inline comes first, its caller next, etc). Each
    // entry's own (file,line,column) is *its own* call-site info
    // (DW_AT_call_*), i.e. where its *caller* invoked it — which is why the
    // rotation below shifts each entry's raw value one slot towards the
    // physical frame.
    let mut chain = find_inline_chain(dwarf, unit, sub_offset, pc)?;

    chain.push(FlatFrame {
        symbol,
        file: line_file,
        line,
        column,
        is_inline: false,
    });
    // chain is now [innermost_inline, ..., outermost_inline, physical],
    // matching spec §4.4.5 step 4's "most recent call first" order with the
    // physical frame at the bottom.

    rotate_line_info(&mut chain);

    Ok(chain)
}

/// Walks the subprogram's subtree via DFS, collecting `DW_TAG_inlined_subroutine`
/// entries whose ranges contain `pc`. DWARF nests inline sites structurally
/// (an inline's DIE children are themselves nested inside its own DIE), so a
/// DFS visits an outer inline before any of its nested inlines, collecting
/// them outer-to-inner; reversed before returning so the result is
/// innermost-first, ready to prepend to the physical frame.
fn find_inline_chain(
    dwarf: &gimli::Dwarf<R>,
    unit: &gimli::Unit<R>,
    parent_offset: UnitOffset,
    pc: u64,
) -> Result<Vec<FlatFrame>> {
    let mut cursor = unit.entries_at_offset(parent_offset)?;
    cursor.next_entry()?;
    let mut outer_to_inner = Vec::new();
    let mut depth: isize = 0;

    while let Some((delta, entry)) = cursor.next_dfs()? {
        depth += delta;
        if depth <= 0 {
            break; // left the subprogram's subtree
        }
        if entry.tag() != gimli::DW_TAG_inlined_subroutine {
            continue;
        }
        let site_ranges = ranges::die_ranges(dwarf, unit, entry)?;
        if !site_ranges.iter().any(|&(lo, hi)| pc >= lo && pc < hi) {
            continue;
        }

        let call_file = call_site_file(dwarf, unit, entry)?;
        let call_line = attr_udata(entry, gimli::DW_AT_call_line);
        let call_column = attr_udata(entry, gimli::DW_AT_call_column);
        let symbol = resolve_symbol_name(dwarf, unit, entry)?.unwrap_or_default();

        outer_to_inner.push(FlatFrame {
            symbol,
            file: call_file,
            line: call_line.map(|v| v as u32),
            column: call_column.map(|v| v as u32),
            is_inline: true,
        });
    }

    outer_to_inner.reverse();
    Ok(outer_to_inner)
}

/// Implements spec §4.4.5 step 5, grounded on the rotation loop in
/// `examples/original_source/src/symbols/symbols_with_libdwarf.cpp`'s
/// `resolve_frames`: DWARF records an inlined subroutine's call-site
/// location (`DW_AT_call_*`) on the callee's own DIE, describing where its
/// *caller* invoked it — one slot off from where a per-frame line belongs.
/// `chain` is innermost-first with the physical frame last. Rotating right
/// by one fixes the offset: the innermost entry takes the physical frame's
/// original (line-table) position, and every other entry takes the
/// pre-rotation value of the entry before it (its more-inner neighbor).
fn rotate_line_info(chain: &mut [FlatFrame]) {
    if chain.len() < 2 {
        return;
    }
    let last = chain.len() - 1;
    let mut carry = (
        chain[last].file.clone(),
        chain[last].line,
        chain[last].column,
    );
    for i in 0..=last {
        let next_carry = (chain[i].file.clone(), chain[i].line, chain[i].column);
        chain[i].file = carry.0;
        chain[i].line = carry.1;
        chain[i].column = carry.2;
        carry = next_carry;
    }
}

fn call_site_file(
    dwarf: &gimli::Dwarf<R>,
    unit: &gimli::Unit<R>,
    entry: &DebuggingInformationEntry<R>,
) -> Result<Option<String>> {
    let Some(attr) = entry.attr_value(gimli::DW_AT_call_file)? else {
        return Ok(None);
    };
    // DW_AT_call_file is a file-table index (Udata/Sdata depending on
    // producer); resolve against the unit's own line program header.
    let index = match attr {
        AttributeValue::Udata(v) => v,
        AttributeValue::Data1(v) => v as u64,
        AttributeValue::Data2(v) => v as u64,
        AttributeValue::Data4(v) => v as u64,
        AttributeValue::Data8(v) => v,
        _ => return Ok(None),
    };
    let Some(program) = unit.line_program.as_ref() else {
        return Ok(None);
    };
    let header = program.header();
    let Some(file) = header.file_names().get(index as usize) else {
        return Ok(None);
    };
    let name = dwarf
        .attr_string(unit, file.path_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((!name.is_empty()).then_some(name))
}

fn attr_udata(entry: &DebuggingInformationEntry<R>, name: gimli::DwAt) -> Option<u64> {
    match entry.attr_value(name).ok()?? {
        AttributeValue::Udata(v) => Some(v),
        AttributeValue::Data1(v) => Some(v as u64),
        AttributeValue::Data2(v) => Some(v as u64),
        AttributeValue::Data4(v) => Some(v as u64),
        AttributeValue::Data8(v) => Some(v),
        _ => None,
    }
}

/// Spec §4.4.5 step 3: `DW_AT_linkage_name` -> `DW_AT_MIPS_linkage_name` ->
/// `DW_AT_name`, else follow `DW_AT_specification`/`DW_AT_abstract_origin`
/// and retry recursively.
fn resolve_symbol_name(
    dwarf: &gimli::Dwarf<R>,
    unit: &gimli::Unit<R>,
    entry: &DebuggingInformationEntry<R>,
) -> Result<Option<String>> {
    resolve_symbol_name_inner(dwarf, unit, entry, 0)
}

fn resolve_symbol_name_inner(
    dwarf: &gimli::Dwarf<R>,
    unit: &gimli::Unit<R>,
    entry: &DebuggingInformationEntry<R>,
    depth: u32,
) -> Result<Option<String>> {
    // DIE reference chains are bounded in practice; bail out rather than
    // loop forever on a malformed cycle.
    if depth > 16 {
        return Ok(None);
    }

    for attr_name in [gimli::DW_AT_linkage_name, gimli::DW_AT_MIPS_linkage_name, gimli::DW_AT_name] {
        if let Some(attr) = entry.attr_value(attr_name)? {
            if let Ok(s) = dwarf.attr_string(unit, attr) {
                let name = s.to_string_lossy().into_owned();
                if !name.is_empty() {
                    return Ok(Some(name));
                }
            }
        }
    }

    for ref_name in [gimli::DW_AT_specification, gimli::DW_AT_abstract_origin] {
        if let Some(attr) = entry.attr_value(ref_name)? {
            if let Some(offset) = unit_ref_offset(attr) {
                let mut cursor = unit.entries_at_offset(offset)?;
                if cursor.next_entry()?.is_some() {
                    if let Some(referenced) = cursor.current() {
                        if let Some(name) = resolve_symbol_name_inner(dwarf, unit, referenced, depth + 1)? {
                            return Ok(Some(name));
                        }
                    }
                }
            }
        }
    }

    Ok(None)
}

fn unit_ref_offset(attr: AttributeValue<R>) -> Option<UnitOffset> {
    match attr {
        AttributeValue::UnitRef(offset) => Some(offset),
        _ => None,
    }
}
