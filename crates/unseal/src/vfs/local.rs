//! Native file-access provider.
//!
//! The default delegate: plain blocking `std::fs` access with flock
//! support on the open handle.

use super::traits::{HandlerFactory, Metadata, ModeOp, OpenMode, StreamHandler};
use crate::lock::{lock_file, LockMode};
use std::any::Any;
use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Real-filesystem handler. One instance serves one open file stream or
/// one directory iteration at a time.
#[derive(Debug, Default)]
pub struct NativeHandler {
    file: Option<File>,
    dir: Option<ReadDir>,
    at_eof: bool,
}

impl NativeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no open stream"))
    }
}

fn open_options(mode: OpenMode) -> OpenOptions {
    let mut opts = OpenOptions::new();
    opts.read(mode.reads());
    match mode.op {
        ModeOp::Read => {
            opts.write(mode.update);
        }
        ModeOp::Write => {
            opts.write(true).create(true).truncate(true);
        }
        ModeOp::Append => {
            opts.append(true).create(true);
        }
        ModeOp::CreateNew => {
            opts.write(true).create_new(true);
        }
        ModeOp::Create => {
            opts.write(true).create(true);
        }
    }
    opts
}

impl StreamHandler for NativeHandler {
    fn open(&mut self, path: &Path, mode: OpenMode) -> io::Result<()> {
        let file = open_options(mode).open(path)?;
        self.file = Some(file);
        self.at_eof = false;
        Ok(())
    }

    fn read(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let file = self.file_mut()?;
        let mut buf = vec![0u8; max];
        let mut filled = 0;
        let mut saw_eof = false;
        while filled < max {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {
                    saw_eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        if saw_eof {
            self.at_eof = true;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn eof(&self) -> bool {
        self.file.is_none() || self.at_eof
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.at_eof = false;
        self.file_mut()?.seek(pos)
    }

    fn close(&mut self) {
        // Dropping the handle closes it; the kernel releases any flock.
        self.file = None;
        self.at_eof = false;
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file_mut()?.write(data)
    }

    fn lock(&mut self, mode: LockMode) -> bool {
        match &self.file {
            Some(file) => lock_file(file, mode),
            None => false,
        }
    }

    fn open_dir(&mut self, path: &Path) -> io::Result<()> {
        self.dir = Some(fs::read_dir(path)?);
        Ok(())
    }

    fn read_dir(&mut self) -> io::Result<Option<String>> {
        let dir = self
            .dir
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no open directory"))?;
        match dir.next() {
            Some(entry) => Ok(Some(entry?.file_name().to_string_lossy().into_owned())),
            None => Ok(None),
        }
    }

    fn close_dir(&mut self) {
        self.dir = None;
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let meta = fs::metadata(path)?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Factory for the native provider.
#[derive(Debug, Default)]
pub struct NativeFactory;

impl HandlerFactory for NativeFactory {
    fn create(&self) -> Box<dyn StreamHandler> {
        Box::new(NativeHandler::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
