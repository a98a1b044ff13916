//! Module resolver: maps an absolute PC to `(object_path, runtime_base)`
//! (spec §4.3).
//!
//! Grounded on `examples/rust-lang-backtrace-rs/src/symbolize/gimli.rs`'s
//! `native_libraries()` — this seam has no precedent in
//! `symbolic-debuginfo`, which only ever parses objects handed to it by
//! path and never enumerates the live process itself.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// One loaded module as reported by the OS, plus the preferred image base
/// read back from its own object file.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub preferred_image_base: u64,
    pub runtime_base: u64,
    pub object_path: Arc<str>,
}

impl ModuleRecord {
    /// `object_pc = raw_pc - runtime_base + preferred_image_base` (spec §3).
    pub fn translate(&self, raw_pc: u64) -> u64 {
        raw_pc
            .wrapping_sub(self.runtime_base)
            .wrapping_add(self.preferred_image_base)
    }

    pub fn contains(&self, raw_pc: u64, size: u64) -> bool {
        raw_pc >= self.runtime_base && raw_pc < self.runtime_base + size
    }
}

/// One segment of a loaded module: a `(runtime_base, size)` span reported by
/// `dl_iterate_phdr`/`_dyld_*`, used to pick the owning module for a PC
/// before the preferred image base is even known.
#[derive(Debug, Clone, Copy)]
struct LoadedSegment {
    runtime_base: u64,
    size: u64,
}

#[derive(Debug, Clone)]
struct LoadedModule {
    object_path: Arc<str>,
    segments: Vec<LoadedSegment>,
}

/// Enumerates and caches the process's loaded modules, keyed by
/// `object_path`. Per spec §4.3, module lists are "iterated and cached by
/// key" — this resolver does not poll automatically; call [`refresh`] to
/// pick up newly loaded/unloaded modules.
pub struct ModuleResolver {
    modules: RwLock<Vec<LoadedModule>>,
}

impl Default for ModuleResolver {
    fn default() -> Self {
        ModuleResolver::new()
    }
}

impl ModuleResolver {
    pub fn new() -> Self {
        let modules = RwLock::new(Self::enumerate());
        ModuleResolver { modules }
    }

    /// Re-enumerates loaded modules from the OS, replacing the cached list.
    pub fn refresh(&self) {
        *self.modules.write() = Self::enumerate();
    }

    /// Finds the module owning `raw_pc`, if any.
    pub fn find(&self, raw_pc: u64) -> Option<(Arc<str>, u64)> {
        let modules = self.modules.read();
        for module in modules.iter() {
            for seg in &module.segments {
                if raw_pc >= seg.runtime_base && raw_pc < seg.runtime_base + seg.size {
                    return Some((module.object_path.clone(), seg.runtime_base));
                }
            }
        }
        None
    }

    #[cfg(target_os = "linux")]
    fn enumerate() -> Vec<LoadedModule> {
        linux::enumerate()
    }

    #[cfg(target_os = "macos")]
    fn enumerate() -> Vec<LoadedModule> {
        macos::enumerate()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn enumerate() -> Vec<LoadedModule> {
        // No reliable OS hook is wired in for this platform; callers fall
        // back to whatever module info they already have (e.g. passing an
        // explicit object path). Matches backtrace-rs's own Windows gap,
        // which stubs this to an empty list and notes the ASLR caveat.
        Vec::new()
    }
}

/// Reads the preferred image base for `object_path` by opening and peeking
/// the object file, used to turn a [`LoadedModule`] into a full
/// [`ModuleRecord`] once a PC has matched it.
pub fn preferred_image_base(object_path: &str) -> Result<u64> {
    use crate::reader::{ByteSource, FileSource};
    let data = FileSource::open(object_path)?.read_all()?;
    let object = crate::object::Object::parse(&data).map_err(|e| crate::error::Error::format(e.to_string()))?;
    Ok(object.image_base())
}

#[cfg(target_os = "linux")]
mod linux {
    use super::{Arc, LoadedModule, LoadedSegment};
    use std::ffi::CStr;
    use std::os::raw::c_void;

    pub fn enumerate() -> Vec<LoadedModule> {
        let mut modules = Vec::new();
        unsafe {
            libc::dl_iterate_phdr(Some(callback), &mut modules as *mut _ as *mut c_void);
        }
        modules
    }

    unsafe extern "C" fn callback(
        info: *mut libc::dl_phdr_info,
        _size: libc::size_t,
        data: *mut c_void,
    ) -> libc::c_int {
        let modules = &mut *(data as *mut Vec<LoadedModule>);
        let info = &*info;

        let name = if info.dlpi_name.is_null() || *info.dlpi_name == 0 {
            // The main executable reports an empty name; resolve it via
            // /proc/self/exe, matching backtrace-rs's approach.
            std::fs::read_link("/proc/self/exe")
                .ok()
                .and_then(|p| p.to_str().map(|s| s.to_string()))
        } else {
            CStr::from_ptr(info.dlpi_name).to_str().ok().map(|s| s.to_string())
        };

        let Some(name) = name else { return 0 };

        let mut segments = Vec::new();
        for i in 0..info.dlpi_phnum {
            let phdr = &*info.dlpi_phdr.offset(i as isize);
            if phdr.p_type == libc::PT_LOAD {
                segments.push(LoadedSegment {
                    runtime_base: info.dlpi_addr.wrapping_add(phdr.p_vaddr as u64),
                    size: phdr.p_memsz as u64,
                });
            }
        }

        if !segments.is_empty() {
            modules.push(LoadedModule {
                object_path: Arc::from(name),
                segments,
            });
        }

        0
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use super::{Arc, LoadedModule, LoadedSegment};
    use std::ffi::CStr;

    pub fn enumerate() -> Vec<LoadedModule> {
        let mut modules = Vec::new();
        unsafe {
            let count = libc::_dyld_image_count();
            for i in 0..count {
                if let Some(module) = native_module(i) {
                    modules.push(module);
                }
            }
        }
        modules
    }

    unsafe fn native_module(i: u32) -> Option<LoadedModule> {
        let name_ptr = libc::_dyld_get_image_name(i);
        if name_ptr.is_null() {
            return None;
        }
        let name = CStr::from_ptr(name_ptr).to_str().ok()?;
        let header = libc::_dyld_get_image_header(i);
        if header.is_null() {
            return None;
        }
        let slide = libc::_dyld_get_image_vmaddr_slide(i) as u64;

        let mut segments = Vec::new();
        match (*header).magic {
            libc::MH_MAGIC => {
                let mut next_cmd = header.offset(1) as *const libc::load_command;
                for _ in 0..(*header).ncmds {
                    segments.extend(segment32(next_cmd, slide));
                    next_cmd = (next_cmd as usize + (*next_cmd).cmdsize as usize) as *const _;
                }
            }
            libc::MH_MAGIC_64 => {
                let header = header as *const libc::mach_header_64;
                let mut next_cmd = header.offset(1) as *const libc::load_command;
                for _ in 0..(*header).ncmds {
                    segments.extend(segment64(next_cmd, slide));
                    next_cmd = (next_cmd as usize + (*next_cmd).cmdsize as usize) as *const _;
                }
            }
            _ => return None,
        }

        if segments.is_empty() {
            return None;
        }

        Some(LoadedModule {
            object_path: Arc::from(name),
            segments,
        })
    }

    unsafe fn segment32(cmd: *const libc::load_command, slide: u64) -> Option<LoadedSegment> {
        if (*cmd).cmd != libc::LC_SEGMENT {
            return None;
        }
        let cmd = cmd as *const libc::segment_command;
        Some(LoadedSegment {
            runtime_base: (*cmd).vmaddr as u64 + slide,
            size: (*cmd).vmsize as u64,
        })
    }

    unsafe fn segment64(cmd: *const libc::load_command, slide: u64) -> Option<LoadedSegment> {
        if (*cmd).cmd != libc::LC_SEGMENT_64 {
            return None;
        }
        let cmd = cmd as *const libc::segment_command_64;
        Some(LoadedSegment {
            runtime_base: (*cmd).vmaddr as u64 + slide,
            size: (*cmd).vmsize as u64,
        })
    }
}
