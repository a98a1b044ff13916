//! Each cache mode must degrade to a single partial frame (never panic, never
//! propagate an error) when the backing object can't be opened at all.

use std::path::Path;

use native_symbolize::cache::CallCache;
use native_symbolize::config::CacheMode;

fn assert_degrades_to_partial(mode: CacheMode) {
    let mut cache = CallCache::new(mode, None);
    let missing = Path::new("/nonexistent/does-not-exist.so");
    let frames = cache.resolve(missing, 0x1234, 0x1000, true).unwrap();
    assert_eq!(frames.len(), 1, "{mode:?} should degrade to one partial frame");
    assert!(!frames[0].is_inline);
}

#[test]
fn prioritize_memory_degrades_gracefully() {
    assert_degrades_to_partial(CacheMode::PrioritizeMemory);
}

#[test]
fn hybrid_degrades_gracefully() {
    assert_degrades_to_partial(CacheMode::Hybrid);
}

#[test]
fn prioritize_speed_degrades_gracefully() {
    assert_degrades_to_partial(CacheMode::PrioritizeSpeed);
}

#[test]
fn hybrid_reuses_resolver_across_calls_on_same_object() {
    let mut cache = CallCache::new(CacheMode::Hybrid, None);
    let missing = Path::new("/nonexistent/does-not-exist.so");
    let first = cache.resolve(missing, 0x1, 0x1, true).unwrap();
    let second = cache.resolve(missing, 0x2, 0x2, true).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}
