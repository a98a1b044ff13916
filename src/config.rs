//! Ambient configuration surface (spec §6 "Configuration", expanded in
//! `SPEC_FULL.md` §4.8). Constructed programmatically by the embedding
//! application; this crate has no CLI of its own.

use std::num::NonZeroUsize;

/// Selects how aggressively DWARF caches and open resolvers are retained
/// across `Symbolizer::resolve` calls. See spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Nothing is retained; every call rebuilds its resolver from scratch.
    PrioritizeMemory,
    /// CU/subprogram/line-table caches are retained for the duration of one
    /// `resolve()` call, then dropped.
    #[default]
    Hybrid,
    /// Caches and resolvers are retained for the life of the process, keyed
    /// by `object_path`.
    PrioritizeSpeed,
}

/// Runtime configuration for a [`crate::symbolize::Symbolizer`].
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_mode: CacheMode,
    /// When `true` (the default), per-PC failures degrade to partial frames
    /// and are logged rather than propagated. When `false`, the first
    /// internal error is surfaced to the caller.
    pub absorb_exceptions: bool,
    /// Optional LRU bound on the line-table cache, evicted by CU offset.
    /// `None` means unbounded.
    pub line_table_lru: Option<NonZeroUsize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_mode: CacheMode::default(),
            absorb_exceptions: true,
            line_table_lru: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.config.cache_mode = mode;
        self
    }

    pub fn absorb_exceptions(mut self, absorb: bool) -> Self {
        self.config.absorb_exceptions = absorb;
        self
    }

    pub fn line_table_lru(mut self, bound: Option<NonZeroUsize>) -> Self {
        self.config.line_table_lru = bound;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.cache_mode, CacheMode::Hybrid);
        assert!(cfg.absorb_exceptions);
        assert_eq!(cfg.line_table_lru, None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = ConfigBuilder::new()
            .cache_mode(CacheMode::PrioritizeSpeed)
            .absorb_exceptions(false)
            .line_table_lru(NonZeroUsize::new(64))
            .build();
        assert_eq!(cfg.cache_mode, CacheMode::PrioritizeSpeed);
        assert!(!cfg.absorb_exceptions);
        assert_eq!(cfg.line_table_lru, NonZeroUsize::new(64));
    }
}
