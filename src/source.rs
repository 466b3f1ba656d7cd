//! Presents an input file (or an arbitrary byte stream) as a contiguous,
//! read-only byte region that the parser borrows field slices out of.
//!
//! Two variants exist: a memory-mapped one for seekable files and a
//! stream-oriented one that buffers an arbitrary `Read` into memory (stdin,
//! pipes, anything that isn't `mmap`-able). Both end up behind the same
//! `as_bytes()` interface so the parser never needs to know which one it's
//! looking at.
//!
//! The logical one-past-end sentinel byte (`0xFF`) is never physically
//! written into the region -- it doesn't need to be, since nothing here
//! mutates mapped memory. Instead [`SourceFile::byte_at`] synthesizes it for
//! any position at or past the region's length: explicit slices and a
//! synthesized sentinel, rather than an in-place null write into a
//! writable-private mapping.
use crate::error::{EngineError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const EOF_SENTINEL: u8 = 0xFF;

enum InputRegion {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl InputRegion {
    fn as_bytes(&self) -> &[u8] {
        match self {
            InputRegion::Mapped(m) => &m[..],
            InputRegion::Buffered(v) => &v[..],
        }
    }
}

/// One opened input, kept alive for the whole run: a retaining mapper may
/// hold records whose borrowed fields point into this region long after the
/// driver has moved on to the next file, so nothing may unmap or drop this
/// until the run ends.
pub struct SourceFile {
    pub display_name: String,
    region: InputRegion,
}

impl SourceFile {
    /// Opens `path` as a read-only memory map.
    pub fn open_mapped(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| EngineError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Safety: the mapping is read-only and this process does not rely on
        // the file being free of concurrent external modification for
        // memory safety -- a torn read would only ever surface as malformed
        // CSV content, reported as a normal parse error, never undefined
        // behavior within this process.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| EngineError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SourceFile {
            display_name: path.display().to_string(),
            region: InputRegion::Mapped(mmap),
        })
    }

    /// Buffers an arbitrary reader (stdin, a pipe, anything not seekable)
    /// into memory up front, then treats it exactly like a mapped file.
    pub fn open_buffered(display_name: impl Into<String>, mut reader: impl Read) -> Result<Self> {
        let display_name = display_name.into();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|source| EngineError::OpenFailed {
            path: PathBuf::from(&display_name),
            source,
        })?;
        Ok(SourceFile { display_name, region: InputRegion::Buffered(buf) })
    }

    pub fn bytes(&self) -> &[u8] {
        self.region.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the byte at `pos`, or the end-of-input sentinel for any
    /// position at or past the logical end of the region.
    #[inline]
    pub fn byte_at(&self, pos: usize) -> u8 {
        self.bytes().get(pos).copied().unwrap_or(EOF_SENTINEL)
    }
}
