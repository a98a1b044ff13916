//! CU cache and `.debug_aranges` lookup (spec §4.4.2 and the "aranges
//! lookup" cache in spec §3).

use std::collections::HashMap;

use crate::dwarf::ranges;
use crate::dwarf::sections::R;
use crate::error::Result;

/// One `[low, high)` span belonging to a parsed compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct CuRange {
    pub low: u64,
    pub high: u64,
    pub unit_index: usize,
    pub dwarf_version: u16,
}

/// A fast `.debug_aranges` entry, when the section is present.
#[derive(Debug, Clone, Copy)]
pub struct AranOidRange {
    pub low: u64,
    pub high: u64,
    pub unit_index: usize,
}

pub struct UnitCache {
    /// Parsed units, indexed by `unit_index`. `gimli::Unit<R>` is itself
    /// `'static`-compatible (backed by `EndianArcSlice`), so these can be
    /// retained for the resolver's full lifetime with no lifetime games.
    pub units: Vec<gimli::Unit<R>>,
    /// Sorted by `low`, per spec §3's "sorted by low, last-<=-key binary
    /// search" invariant (P5).
    pub ranges: Vec<CuRange>,
    /// `Some` only when `.debug_aranges` was present at open time.
    pub aranges: Option<Vec<AranOidRange>>,
}

impl UnitCache {
    pub fn build(dwarf: &gimli::Dwarf<R>, has_aranges_section: bool) -> Result<Self> {
        let mut units = Vec::new();
        let mut ranges_list = Vec::new();
        let mut offset_to_index: HashMap<usize, usize> = HashMap::new();

        let mut iter = dwarf.units();
        while let Some(header) = iter.next()? {
            let offset = match header.offset().as_debug_info_offset() {
                Some(o) => o.0,
                None => continue, // .debug_types units are out of scope
            };
            let unit = match dwarf.unit(header) {
                Ok(u) => u,
                Err(_) => continue, // recoverable: skip this CU, not the whole object
            };
            let unit_index = units.len();
            let dwarf_version = unit.version();
            offset_to_index.insert(offset, unit_index);

            let spans = ranges::unit_ranges(dwarf, &unit).unwrap_or_default();
            for (low, high) in spans {
                ranges_list.push(CuRange {
                    low,
                    high,
                    unit_index,
                    dwarf_version,
                });
            }
            units.push(unit);
        }

        ranges_list.sort_by_key(|r| r.low);

        let aranges = if has_aranges_section {
            build_aranges(dwarf, &offset_to_index)
        } else {
            None
        };

        Ok(UnitCache {
            units,
            ranges: ranges_list,
            aranges,
        })
    }

    /// Last entry with `low <= pc`, confirmed by `pc < high` (spec §4.4.5
    /// step 1, aranges-miss fallback path).
    pub fn find_by_cu_cache(&self, pc: u64) -> Option<usize> {
        let idx = match self.ranges.binary_search_by(|r| r.low.cmp(&pc)) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let r = &self.ranges[idx];
        (pc >= r.low && pc < r.high).then_some(r.unit_index)
    }

    /// One aranges binary search (spec §4.4.5 step 1, fast path).
    pub fn find_by_aranges(&self, pc: u64) -> Option<usize> {
        let aranges = self.aranges.as_ref()?;
        let idx = match aranges.binary_search_by(|r| r.low.cmp(&pc)) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let r = &aranges[idx];
        if pc >= r.low && pc < r.high {
            Some(r.unit_index)
        } else {
            None
        }
    }
}

fn build_aranges(dwarf: &gimli::Dwarf<R>, offset_to_index: &HashMap<usize, usize>) -> Option<Vec<AranOidRange>> {
    let mut out = Vec::new();
    let mut headers = dwarf.debug_aranges.headers();
    while let Ok(Some(header)) = headers.next() {
        let unit_index = match offset_to_index.get(&header.debug_info_offset().0) {
            Some(&i) => i,
            None => continue,
        };
        let mut entries = header.entries();
        while let Ok(Some(entry)) = entries.next() {
            if entry.length() == 0 {
                continue;
            }
            out.push(AranOidRange {
                low: entry.address(),
                high: entry.address() + entry.length(),
                unit_index,
            });
        }
    }
    if out.is_empty() {
        return None;
    }
    out.sort_by_key(|r| r.low);
    Some(out)
}
