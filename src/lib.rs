//! Symbolizes native program counters against ELF, Mach-O, and PE object
//! files and their DWARF debug information.
//!
//! This crate resolves an in-process program-counter stream into structured
//! stack frames: symbol name, source file, line, column, and inlined-call
//! expansion. It does not capture program counters (unwinding is an
//! external collaborator's job, see [`frame::capture_now`]), does not
//! demangle symbol names (see [`demangle::Demangler`]), and does not format
//! traces as text.
//!
//! The entry point is [`symbolize::Symbolizer`]:
//!
//! ```no_run
//! use native_symbolize::{config::Config, frame::FramePtr, symbolize::Symbolizer};
//!
//! let symbolizer = Symbolizer::new(Config::default());
//! let frames = symbolizer.resolve(&[FramePtr::from(0x1000_u64)])?;
//! for frame in frames {
//!     println!("{}:{:?} {}", frame.file, frame.line, frame.symbol);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod demangle;
pub mod dwarf;
pub mod error;
pub mod frame;
pub mod module;
pub mod object;
pub mod reader;
pub mod snippet;
pub mod symbol;
pub mod symbolize;

pub use config::{CacheMode, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use frame::{FramePtr, ObjectFrame, RawTrace, ResolvedFrame};
pub use symbolize::Symbolizer;
