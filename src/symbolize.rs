//! Symbolization driver: batches PCs by owning module, resolves each one,
//! and stitches the results back into input order (spec §4.6).

use std::path::PathBuf;

use crate::cache::CallCache;
use crate::config::Config;
use crate::error::Result;
use crate::frame::{FramePtr, RawTrace, ResolvedFrame};
use crate::module::{ModuleRecord, ModuleResolver};

pub struct Symbolizer {
    config: Config,
    modules: ModuleResolver,
}

impl Symbolizer {
    pub fn new(config: Config) -> Self {
        Symbolizer {
            config,
            modules: ModuleResolver::new(),
        }
    }

    /// Re-enumerates the process's loaded modules. Not called automatically
    /// (spec §4.3): call this after loading/unloading shared objects.
    pub fn refresh_modules(&self) {
        self.modules.refresh();
    }

    /// Resolves `pcs` into frames. Per `Config::absorb_exceptions` (spec
    /// §4.8): when `true` (the default), a per-PC resolution failure
    /// degrades to a partial frame and resolution continues; when `false`,
    /// the first such error is returned instead (spec.md's "propagation
    /// policy").
    pub fn resolve(&self, pcs: &[FramePtr]) -> Result<Vec<ResolvedFrame>> {
        let mut cache = CallCache::new(self.config.cache_mode, self.config.line_table_lru);
        let mut out = Vec::with_capacity(pcs.len());
        for pc in pcs {
            let raw_pc = pc.0;
            match self.locate(raw_pc) {
                Some((object_path, object_pc)) => {
                    out.extend(cache.resolve(&object_path, raw_pc, object_pc, self.config.absorb_exceptions)?);
                }
                None => out.push(ResolvedFrame::partial(raw_pc, raw_pc, String::new())),
            }
        }
        Ok(out)
    }

    /// Convenience entry point matching the exception-carrying-trace seam
    /// (spec §4.11 / `SPEC_FULL.md` §4.11): `resolve(&RawTrace) ->
    /// Result<Vec<ResolvedFrame>>`.
    pub fn resolve_trace(&self, trace: &RawTrace) -> Result<Vec<ResolvedFrame>> {
        self.resolve(&trace.pcs)
    }

    fn locate(&self, raw_pc: u64) -> Option<(PathBuf, u64)> {
        let (object_path, runtime_base) = self.modules.find(raw_pc)?;
        let preferred_image_base = crate::module::preferred_image_base(&object_path).ok()?;
        let record = ModuleRecord {
            preferred_image_base,
            runtime_base,
            object_path: object_path.clone(),
        };
        Some((PathBuf::from(object_path.as_ref()), record.translate(raw_pc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_empty_trace_is_empty() {
        let symbolizer = Symbolizer::new(Config::default());
        assert!(symbolizer.resolve(&[]).unwrap().is_empty());
    }

    #[test]
    fn unowned_pc_degrades_to_partial_frame() {
        let symbolizer = Symbolizer::new(Config::default());
        // No loaded module will ever claim this address on a real process.
        let frames = symbolizer.resolve(&[FramePtr(u64::MAX)]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].is_inline);
        assert!(frames[0].symbol.is_empty());
    }
}
