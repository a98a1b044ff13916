//! Per-CU line-table cache (spec §4.4.4).

use std::sync::Arc;

use crate::dwarf::sections::R;
use crate::dwarf::srcfiles::FileTable;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct LineEntry {
    pub pc: u64,
    pub file_index: u64,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

pub struct LineTable {
    /// Sorted by `pc` ascending, one entry per effective PC break: when
    /// multiple rows share a PC, the last one wins (spec §4.4.4).
    entries: Vec<LineEntry>,
    files: FileTable,
}

impl LineTable {
    pub fn build(dwarf: &gimli::Dwarf<R>, unit: &gimli::Unit<R>) -> Result<Option<Self>> {
        let Some(program) = unit.line_program.clone() else {
            return Ok(None);
        };
        let header = program.header().clone();
        let files = FileTable::build(dwarf, unit, &header)?;

        let mut raw = Vec::new();
        let mut rows = program.rows();
        while let Some((_, row)) = rows.next_row()? {
            if row.end_sequence() {
                continue;
            }
            raw.push(LineEntry {
                pc: row.address(),
                file_index: row.file_index(),
                line: row.line().map(|l| l.get() as u32),
                column: match row.column() {
                    gimli::ColumnType::Column(c) => Some(c.get() as u32),
                    gimli::ColumnType::LeftEdge => None,
                },
            });
        }
        raw.sort_by_key(|e| e.pc);
        // "reduced to one entry per effective PC break ... the last wins"
        raw.dedup_by(|later, earlier| {
            if later.pc == earlier.pc {
                *earlier = later.clone();
                true
            } else {
                false
            }
        });

        Ok(Some(LineTable {
            entries: raw,
            files,
        }))
    }

    /// Last entry with `pc <= target` (spec §4.4.5 step 2).
    pub fn lookup(&self, pc: u64) -> Option<&LineEntry> {
        let idx = match self.entries.binary_search_by(|e| e.pc.cmp(&pc)) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        self.entries.get(idx)
    }

    pub fn resolve_file(&self, file_index: u64) -> Option<Arc<str>> {
        self.files.get(file_index)
    }
}
