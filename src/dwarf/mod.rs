//! DWARF resolver: ties section loading, CU/subprogram/line caches and the
//! PC -> frame algorithm into one per-object stateful resolver (spec
//! §4.4.7/§4.4.8).

pub mod line_cache;
pub mod ranges;
pub mod resolve;
pub mod sections;
pub mod subprogram_cache;
pub mod srcfiles;
pub mod unit_cache;

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use line_cache::LineTable;
use sections::R;
use subprogram_cache::SubprogramRange;
use unit_cache::UnitCache;

use crate::error::Result;
use crate::frame::ResolvedFrame;
use crate::reader::{ByteSource, FileSource};
use crate::symbol::SymbolMap;

/// The five states from spec §4.4.7. Transitions are monotonic: once a
/// cache is built it is retained for the resolver's lifetime; a failure at
/// any step moves straight to `Poisoned`, after which lookups never retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unopened,
    OpenNoAranges,
    OpenWithAranges,
    CuCacheBuilt,
    Poisoned,
}

pub struct DwarfResolver {
    object_path: PathBuf,
    state: State,
    dwarf: Option<gimli::Dwarf<R>>,
    units: Option<UnitCache>,
    line_tables: Vec<Option<LineTable>>,
    subprograms: Vec<Option<Vec<SubprogramRange>>>,
    /// Bound on how many CUs' line tables stay built at once; `None` is
    /// unbounded (spec §4.5/§4.8 `Config::line_table_lru`).
    line_table_lru: Option<NonZeroUsize>,
    /// Most-recently-used order of built line tables, front = least recent.
    line_table_order: VecDeque<usize>,
    /// The object's own `.symtab`/nlist/export-table symbols, used as a
    /// fallback when DWARF has no coverage for a PC (spec §4.6). Loaded at
    /// most once per resolver, regardless of how many PCs miss.
    symbols: Option<SymbolMap<'static>>,
    symbols_attempted: bool,
}

impl DwarfResolver {
    pub fn new(object_path: impl AsRef<Path>, line_table_lru: Option<NonZeroUsize>) -> Self {
        DwarfResolver {
            object_path: object_path.as_ref().to_path_buf(),
            state: State::Unopened,
            dwarf: None,
            units: None,
            line_tables: Vec::new(),
            subprograms: Vec::new(),
            line_table_lru,
            line_table_order: VecDeque::new(),
            symbols: None,
            symbols_attempted: false,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.state == State::Poisoned
    }

    /// Resolves one object-relative PC into a flattened, rotated chain of
    /// frames (physical last). When `absorb` is `true` (spec §4.8
    /// `Config::absorb_exceptions`), failures degrade to a single partial
    /// frame and poison the resolver only when not scoped to this one PC;
    /// when `false`, the first error is surfaced to the caller instead.
    pub fn resolve_pc(&mut self, raw_pc: u64, object_pc: u64, absorb: bool) -> Result<Vec<ResolvedFrame>> {
        if self.state == State::Poisoned {
            return Ok(vec![self.partial_frame(raw_pc, object_pc)]);
        }

        match self.resolve_pc_inner(object_pc) {
            Ok(Some(chain)) => {
                let mut resolved = chain_to_resolved(chain, raw_pc, object_pc);
                // A CU covered the PC but no subprogram DIE did (e.g. hand-written
                // assembly stubs): the physical frame still carries no name from
                // DWARF, so fall back to the symbol table (spec §4.6).
                if let Some(last) = resolved.last_mut() {
                    if !last.is_inline && last.symbol.is_empty() {
                        last.symbol = self.symbol_name_fallback(object_pc);
                    }
                }
                Ok(resolved)
            }
            Ok(None) => Ok(vec![self.partial_frame(raw_pc, object_pc)]),
            Err(e) => {
                tracing::warn!(object_path = %self.object_path.display(), error = %e, "dwarf resolution failed for pc");
                if !e.is_recoverable_per_pc() {
                    self.state = State::Poisoned;
                }
                if absorb {
                    Ok(vec![self.partial_frame(raw_pc, object_pc)])
                } else {
                    Err(e)
                }
            }
        }
    }

    fn resolve_pc_inner(&mut self, object_pc: u64) -> Result<Option<Vec<resolve::FlatFrame>>> {
        self.ensure_cu_cache()?;
        let dwarf = self.dwarf.as_ref().unwrap();
        let units = self.units.as_ref().unwrap();

        let unit_index = units
            .find_by_aranges(object_pc)
            .or_else(|| units.find_by_cu_cache(object_pc));

        let Some(unit_index) = unit_index else {
            return Ok(None);
        };

        let chain = resolve::resolve_in_unit(
            dwarf,
            units,
            &mut self.line_tables,
            &mut self.subprograms,
            unit_index,
            object_pc,
        )?;
        self.touch_line_table(unit_index);
        self.evict_line_tables();
        Ok(Some(chain))
    }

    /// Records `unit_index` as most-recently-used for LRU eviction purposes.
    fn touch_line_table(&mut self, unit_index: usize) {
        if self.line_table_lru.is_none() {
            return;
        }
        self.line_table_order.retain(|&i| i != unit_index);
        self.line_table_order.push_back(unit_index);
    }

    /// Clears the least-recently-used built line tables once the tracked
    /// count exceeds the configured bound, per `Config::line_table_lru`.
    /// Grounded on backtrace-rs's bounded resolver cache
    /// (`examples/rust-lang-backtrace-rs/src/symbolize/gimli.rs`'s
    /// `Mapping` cache eviction), adapted here to per-CU line tables rather
    /// than whole mappings.
    fn evict_line_tables(&mut self) {
        let Some(bound) = self.line_table_lru else {
            return;
        };
        while self.line_table_order.len() > bound.get() {
            if let Some(evicted) = self.line_table_order.pop_front() {
                if let Some(slot) = self.line_tables.get_mut(evicted) {
                    *slot = None;
                }
            }
        }
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.dwarf.is_some() {
            return Ok(());
        }
        let (dwarf, has_aranges) = sections::load_dwarf(&self.object_path)?;
        self.dwarf = Some(dwarf);
        self.state = if has_aranges {
            State::OpenWithAranges
        } else {
            State::OpenNoAranges
        };
        Ok(())
    }

    fn ensure_cu_cache(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.units.is_some() {
            return Ok(());
        }
        let has_aranges = self.state == State::OpenWithAranges;
        let dwarf = self.dwarf.as_ref().unwrap();
        let units = UnitCache::build(dwarf, has_aranges)?;
        self.line_tables = vec![None; units.units.len()];
        self.subprograms = vec![None; units.units.len()];
        self.units = Some(units);
        self.state = State::CuCacheBuilt;
        Ok(())
    }

    /// Loads and retains the object's own symbol table, on first use only.
    /// A read failure just means the fallback stays empty; it never
    /// poisons the resolver, since DWARF may still work fine.
    fn ensure_symbols(&mut self) {
        if self.symbols_attempted {
            return;
        }
        self.symbols_attempted = true;
        self.symbols = FileSource::open(&self.object_path)
            .and_then(|src| src.read_all())
            .ok()
            .and_then(|data| crate::object::Object::parse(&data).ok())
            .map(|object| object.into_symbols().into_owned());
    }

    /// Best-effort name for `object_pc` from the object's symbol table,
    /// consulted when DWARF has no line/subprogram coverage (spec §4.6).
    fn symbol_name_fallback(&mut self, object_pc: u64) -> String {
        self.ensure_symbols();
        self.symbols
            .as_ref()
            .and_then(|map| map.lookup(object_pc))
            .map(|s| s.name.to_string())
            .unwrap_or_default()
    }

    fn partial_frame(&mut self, raw_pc: u64, object_pc: u64) -> ResolvedFrame {
        let symbol = self.symbol_name_fallback(object_pc);
        let mut frame = ResolvedFrame::partial(raw_pc, object_pc, self.object_path_string());
        frame.symbol = symbol;
        frame
    }

    fn object_path_string(&self) -> String {
        self.object_path.display().to_string()
    }
}

fn chain_to_resolved(chain: Vec<resolve::FlatFrame>, raw_pc: u64, object_pc: u64) -> Vec<ResolvedFrame> {
    let last = chain.len().saturating_sub(1);
    chain
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            if i == last && !f.is_inline {
                ResolvedFrame {
                    raw_pc,
                    object_pc,
                    file: f.file.unwrap_or_default(),
                    symbol: f.symbol,
                    line: f.line,
                    column: f.column,
                    is_inline: false,
                }
            } else {
                ResolvedFrame::inline(f.file.unwrap_or_default(), f.symbol, f.line, f.column)
            }
        })
        .collect()
}
