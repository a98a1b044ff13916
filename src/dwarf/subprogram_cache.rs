//! Per-CU subprogram interval cache (spec §4.4.3).

use gimli::UnitOffset;

use crate::dwarf::ranges;
use crate::dwarf::sections::R;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct SubprogramRange {
    pub low: u64,
    pub high: u64,
    pub die_offset: UnitOffset,
}

/// Sorted by `low` (spec §3 P5). Inlined subroutines are deliberately not
/// included here; they are discovered during per-PC traversal (spec
/// §4.4.3: "Inlined subroutines are not recorded here").
pub fn build(dwarf: &gimli::Dwarf<R>, unit: &gimli::Unit<R>) -> Result<Vec<SubprogramRange>> {
    let mut out = Vec::new();
    let mut cursor = unit.entries();
    while let Some((_, entry)) = cursor.next_dfs()? {
        if entry.tag() != gimli::DW_TAG_subprogram {
            continue;
        }
        for (low, high) in ranges::die_ranges(dwarf, unit, entry)? {
            out.push(SubprogramRange {
                low,
                high,
                die_offset: entry.offset(),
            });
        }
    }
    out.sort_by_key(|r| r.low);
    Ok(out)
}

/// Last entry with `low <= pc`, confirmed by containment (spec §4.4.5
/// step 3).
pub fn find(ranges: &[SubprogramRange], pc: u64) -> Option<UnitOffset> {
    let idx = match ranges.binary_search_by(|r| r.low.cmp(&pc)) {
        Ok(i) => i,
        Err(0) => return None,
        Err(i) => i - 1,
    };
    let r = &ranges[idx];
    (pc >= r.low && pc < r.high).then_some(r.die_offset)
}
