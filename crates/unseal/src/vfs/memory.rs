//! In-memory stream for substituted content.
//!
//! When the interception layer rewrites a source, it retires the
//! delegate stream and parks the rewritten bytes here. The handle
//! honors the full stream contract (read, write, seek, eof), so callers
//! cannot tell it apart from a real file positioned at the start.

use super::traits::{OpenMode, StreamHandler};
use std::io::{self, SeekFrom};
use std::path::Path;

/// A seekable in-memory byte stream.
#[derive(Debug, Default)]
pub struct MemoryHandle {
    buf: Vec<u8>,
    pos: usize,
    at_eof: bool,
}

impl MemoryHandle {
    /// An empty writable stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream over `contents`, positioned at the start.
    pub fn with_contents(contents: Vec<u8>) -> Self {
        Self {
            buf: contents,
            pos: 0,
            at_eof: false,
        }
    }

    /// Current buffer contents.
    pub fn contents(&self) -> &[u8] {
        &self.buf
    }
}

impl StreamHandler for MemoryHandle {
    /// Resets to an empty writable stream; the path has no meaning here.
    fn open(&mut self, _path: &Path, _mode: OpenMode) -> io::Result<()> {
        self.buf.clear();
        self.pos = 0;
        self.at_eof = false;
        Ok(())
    }

    fn read(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let end = self.pos.saturating_add(max).min(self.buf.len());
        let start = self.pos.min(end);
        let chunk = self.buf[start..end].to_vec();
        self.pos = end;
        if chunk.len() < max {
            self.at_eof = true;
        }
        Ok(chunk)
    }

    fn eof(&self) -> bool {
        self.at_eof
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(off) => self.pos as i64 + off,
            SeekFrom::End(off) => self.buf.len() as i64 + off,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ));
        }
        // Seeking past the end is allowed, like a real file.
        self.pos = target as usize;
        self.at_eof = false;
        Ok(self.pos as u64)
    }

    fn close(&mut self) {
        self.buf.clear();
        self.pos = 0;
        self.at_eof = false;
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.pos > self.buf.len() {
            self.buf.resize(self.pos, 0);
        }
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(data.len())
    }
}
