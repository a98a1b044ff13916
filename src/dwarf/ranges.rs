//! Range decoding (spec §4.4.6).
//!
//! The DWARF2-4 `.debug_ranges` vs DWARF5 `.debug_rnglists` dispatch itself
//! is handled by `gimli::Dwarf::{unit_ranges, die_ranges}`, which already
//! implements exactly the opcode switch spec.md describes
//! (`DW_RANGES_ENTRY`/`DW_RANGES_ADDRESS_SELECTION`/`DW_RANGES_END` for
//! DWARF2-4, `offset_pair`/`startx_endx`/`start_end`/`startx_length`/
//! `start_length`/`base_*`/`end_of_list` for DWARF5) — this module only adds
//! the contiguous-range coalescing spec.md calls for on top of gimli's
//! decoded ranges.

use gimli::read::{AttributeValue, DebuggingInformationEntry};

use crate::dwarf::sections::R;
use crate::error::Result;

/// `[low, high)` pairs for a DIE, decoded via `DW_AT_low_pc`/`DW_AT_high_pc`
/// or `DW_AT_ranges`, with contiguous-or-near-contiguous (gap <= 1) pairs
/// coalesced.
pub fn die_ranges(
    dwarf: &gimli::Dwarf<R>,
    unit: &gimli::Unit<R>,
    entry: &DebuggingInformationEntry<R>,
) -> Result<Vec<(u64, u64)>> {
    let mut out = Vec::new();
    let mut iter = dwarf.die_ranges(unit, entry)?;
    while let Some(range) = iter.next()? {
        if range.end > range.begin {
            out.push((range.begin, range.end));
        }
    }
    Ok(coalesce(out))
}

/// Same as [`die_ranges`] but for the compilation unit's own root DIE,
/// which additionally needs the unit's `DW_AT_low_pc`/`_high_pc`/`_ranges`.
pub fn unit_ranges(dwarf: &gimli::Dwarf<R>, unit: &gimli::Unit<R>) -> Result<Vec<(u64, u64)>> {
    let mut out = Vec::new();
    let mut iter = dwarf.unit_ranges(unit)?;
    while let Some(range) = iter.next()? {
        if range.end > range.begin {
            out.push((range.begin, range.end));
        }
    }
    Ok(coalesce(out))
}

fn coalesce(mut ranges: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    ranges.sort_by_key(|&(low, _)| low);
    let mut out: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
    for (low, high) in ranges {
        if let Some(last) = out.last_mut() {
            if low <= last.1.saturating_add(1) {
                last.1 = last.1.max(high);
                continue;
            }
        }
        out.push((low, high));
    }
    out
}

/// Resolves `DW_AT_high_pc`, which may be an absolute address or (DWARF4+)
/// an offset from `low_pc`, into an absolute end address.
pub fn resolve_high_pc(low_pc: u64, attr: AttributeValue<R>) -> Option<u64> {
    match attr {
        AttributeValue::Addr(addr) => Some(addr),
        AttributeValue::Udata(offset) => Some(low_pc.wrapping_add(offset)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::coalesce;

    #[test]
    fn coalesces_contiguous_and_gap_one() {
        let merged = coalesce(vec![(0, 10), (10, 20), (21, 30)]);
        assert_eq!(merged, vec![(0, 30)]);
    }

    #[test]
    fn keeps_disjoint_ranges_separate() {
        let merged = coalesce(vec![(0, 10), (50, 60)]);
        assert_eq!(merged, vec![(0, 10), (50, 60)]);
    }
}
