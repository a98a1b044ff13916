//! Per-CU file-name table (spec §3 "srcfiles_cache"), shared by the line
//! table (file column) and by inline-frame call-site resolution
//! (`DW_AT_call_file`).

use std::sync::Arc;

use crate::dwarf::sections::R;
use crate::error::Result;

/// Maps a DWARF line-program file index to its resolved path string.
/// Built once per CU on first touch (spec: "CU offset -> file-table").
pub struct FileTable {
    files: Vec<(u64, Arc<str>)>,
}

impl FileTable {
    pub fn build(
        dwarf: &gimli::Dwarf<R>,
        unit: &gimli::Unit<R>,
        header: &gimli::LineProgramHeader<R>,
    ) -> Result<Self> {
        let mut files = Vec::new();
        let comp_dir = unit
            .comp_dir
            .as_ref()
            .and_then(|r| r.to_string_lossy().ok())
            .map(|s| s.into_owned());

        for (index, file) in header.file_names().iter().enumerate() {
            let index = index as u64;
            // DWARF5 indexes files starting at 0; DWARF2-4 reserves index 0
            // for "no file" and starts real entries at 1. `file_names()`
            // already reflects the header's own indexing, so `index` here
            // lines up with whatever a `LineRow::file_index()` will return.
            let name = dwarf
                .attr_string(unit, file.path_name())
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            let dir = file
                .directory(header)
                .and_then(|d| dwarf.attr_string(unit, d).ok())
                .map(|s| s.to_string_lossy().into_owned());

            let full = match (dir.as_deref(), comp_dir.as_deref()) {
                _ if name.starts_with('/') || name.starts_with('\\') => name,
                (Some(dir), _) if dir.starts_with('/') || dir.starts_with('\\') => {
                    format!("{dir}/{name}")
                }
                (Some(dir), Some(comp)) => format!("{comp}/{dir}/{name}"),
                (Some(dir), None) => format!("{dir}/{name}"),
                (None, Some(comp)) => format!("{comp}/{name}"),
                (None, None) => name,
            };

            files.push((index, Arc::from(full.into_boxed_str())));
        }
        Ok(FileTable { files })
    }

    pub fn get(&self, file_index: u64) -> Option<Arc<str>> {
        self.files
            .iter()
            .find(|(idx, _)| *idx == file_index)
            .map(|(_, name)| name.clone())
    }
}
