//! The data model shared by every component: opaque PCs, per-object frames,
//! and the resolved frames returned to callers.

use std::sync::Arc;

/// An absolute, opaque program-counter value. Never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FramePtr(pub u64);

impl From<u64> for FramePtr {
    fn from(v: u64) -> Self {
        FramePtr(v)
    }
}

impl From<FramePtr> for u64 {
    fn from(v: FramePtr) -> Self {
        v.0
    }
}

/// A PC translated into the coordinate system of the object file that owns
/// it: `object_pc = raw_pc - module_runtime_base + module_preferred_image_base`.
#[derive(Debug, Clone)]
pub struct ObjectFrame {
    pub raw_pc: u64,
    pub object_pc: u64,
    pub object_path: Arc<str>,
}

/// One resolved stack frame. `is_inline == true` implies `raw_pc == 0` and
/// `object_pc == 0` (the frame is synthetic, produced by inline expansion,
/// and is always paired with a physical, non-inline frame for the same call
/// site).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    pub raw_pc: u64,
    pub object_pc: u64,
    pub file: String,
    pub symbol: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub is_inline: bool,
}

impl ResolvedFrame {
    /// A frame carrying only address information: no debug info was
    /// available (or resolution degraded). Never returned as an `Err`.
    pub fn partial(raw_pc: u64, object_pc: u64, file: impl Into<String>) -> Self {
        ResolvedFrame {
            raw_pc,
            object_pc,
            file: file.into(),
            symbol: String::new(),
            line: None,
            column: None,
            is_inline: false,
        }
    }

    pub fn inline(file: impl Into<String>, symbol: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        ResolvedFrame {
            raw_pc: 0,
            object_pc: 0,
            file: file.into(),
            symbol: symbol.into(),
            line,
            column,
            is_inline: true,
        }
    }
}

/// Raw capture produced by the (out-of-scope) unwinder collaborator.
/// The seam exists so embedders can type-check `capture_now() -> RawTrace`
/// against `Symbolizer::resolve(&RawTrace)` even though capture itself is
/// not implemented by this crate.
#[derive(Debug, Clone, Default)]
pub struct RawTrace {
    pub pcs: Vec<FramePtr>,
}

/// Not implemented: belongs to the unwinder collaborator (see spec
/// Non-goals). Kept as a typed seam so the exception-carrying-trace
/// interface in `SPEC_FULL.md` §4.11 type-checks end to end.
pub fn capture_now() -> RawTrace {
    unimplemented!("program-counter capture is an external collaborator, not part of this crate")
}
