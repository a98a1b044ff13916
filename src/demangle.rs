//! The demangling seam (spec Non-goals: demangling is out of scope).
//!
//! `Symbolizer` never calls a `Demangler` itself; callers who want demangled
//! names post-process [`crate::frame::ResolvedFrame::symbol`] with one of
//! `rustc-demangle`, `cpp_demangle`, or `msvc-demangler`, none of which this
//! crate depends on.

/// A pure, side-effect-free mangled-name demangler.
pub trait Demangler {
    /// Returns `None` if `mangled` is not recognized as a mangled name.
    fn demangle(&self, mangled: &str) -> Option<String>;
}

/// A demangler that never demangles anything, useful as a default when an
/// embedder has not wired one in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDemangler;

impl Demangler for NoopDemangler {
    fn demangle(&self, _mangled: &str) -> Option<String> {
        None
    }
}
