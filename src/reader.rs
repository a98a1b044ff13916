//! Random-access byte sources backing object-file parsing (spec §4.1).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// A random-access byte source: a kept-open file, or a borrowed/owned
/// in-memory blob (used for JIT-emitted images and for `.gnu_debuglink`
/// targets already resident in memory).
pub trait ByteSource {
    /// Total length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly `dest.len()` bytes starting at `offset`. Fails with
    /// `Error::Io`/`Error::Format` if the read would straddle EOF.
    fn read(&self, dest: &mut [u8], offset: u64) -> Result<()>;

    /// Read a fixed-size byte array at `offset`, for callers that decode it
    /// with `scroll::Pread` themselves (typed reads live at the call site,
    /// not here, so no lifetime games are needed to hand back a `T`).
    fn read_array<const N: usize>(&self, offset: u64) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read(&mut buf, offset)?;
        Ok(buf)
    }

    /// Read the whole source into an owned buffer.
    fn read_all(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.len() as usize];
        self.read(&mut buf, 0)?;
        Ok(buf)
    }
}

/// A file kept open for the lifetime of the source, with its length cached
/// at construction.
pub struct FileSource {
    file: Mutex<File>,
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::io(path.clone(), e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::io(path.clone(), e))?
            .len();
        Ok(FileSource {
            file: Mutex::new(file),
            path,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read(&self, dest: &mut [u8], offset: u64) -> Result<()> {
        if offset.checked_add(dest.len() as u64).map_or(true, |end| end > self.len) {
            return Err(Error::format(format!(
                "read of {} bytes at offset {offset} straddles EOF ({} total)",
                dest.len(),
                self.len
            )));
        }
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(self.path.clone(), e))?;
        file.read_exact(dest)
            .map_err(|e| Error::io(self.path.clone(), e))?;
        Ok(())
    }
}

/// A borrowed or owned in-memory byte span.
pub struct SliceSource {
    data: Vec<u8>,
}

impl SliceSource {
    pub fn new(data: Vec<u8>) -> Self {
        SliceSource { data }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl ByteSource for SliceSource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, dest: &mut [u8], offset: u64) -> Result<()> {
        let start = offset as usize;
        let end = start
            .checked_add(dest.len())
            .ok_or_else(|| Error::format("offset overflow"))?;
        if end > self.data.len() {
            return Err(Error::format(format!(
                "read of {} bytes at offset {offset} straddles EOF ({} total)",
                dest.len(),
                self.data.len()
            )));
        }
        dest.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reads_in_bounds() {
        let src = SliceSource::new(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 2];
        src.read(&mut buf, 1).unwrap();
        assert_eq!(buf, [2, 3]);
    }

    #[test]
    fn slice_source_rejects_eof_straddle() {
        let src = SliceSource::new(vec![1, 2, 3]);
        let mut buf = [0u8; 2];
        assert!(src.read(&mut buf, 2).is_err());
    }
}
