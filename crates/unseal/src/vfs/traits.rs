//! Core stream-handler traits and types.

use crate::lock::LockMode;
use std::any::Any;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;
use thiserror::Error;

/// Metadata about a file or directory.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// True if this is a directory.
    pub is_dir: bool,
    /// True if this is a regular file.
    pub is_file: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
}

/// Parse error for fopen-style mode strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid open mode {0:?}")]
pub struct InvalidMode(pub String);

/// Primary operation requested by an open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOp {
    /// `r`: read an existing file from the start.
    Read,
    /// `w`: write, truncating or creating.
    Write,
    /// `a`: append, creating if missing.
    Append,
    /// `x`: create new, failing if the file exists.
    CreateNew,
    /// `c`: write without truncation, creating if missing.
    Create,
}

/// An fopen-style open mode (`rb`, `r+`, `wb`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub op: ModeOp,
    /// `+`: both reading and writing.
    pub update: bool,
    /// `b`: binary, no translation. `t` clears it.
    pub binary: bool,
}

impl OpenMode {
    /// `rb`, the only mode the interception layer rewrites.
    pub fn read_binary() -> Self {
        Self {
            op: ModeOp::Read,
            update: false,
            binary: true,
        }
    }

    /// Exact binary read: read-only, binary flag, no update flag.
    ///
    /// Deliberately narrow. `r`, `r+` and every writing mode bypass
    /// rewriting and observe original file content.
    pub fn is_exact_binary_read(&self) -> bool {
        self.op == ModeOp::Read && !self.update && self.binary
    }

    /// Whether the mode grants read access.
    pub fn reads(&self) -> bool {
        self.update || self.op == ModeOp::Read
    }

    /// Whether the mode grants write access.
    pub fn writes(&self) -> bool {
        self.update || self.op != ModeOp::Read
    }
}

impl FromStr for OpenMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let op = match chars.next() {
            Some('r') => ModeOp::Read,
            Some('w') => ModeOp::Write,
            Some('a') => ModeOp::Append,
            Some('x') => ModeOp::CreateNew,
            Some('c') => ModeOp::Create,
            _ => return Err(InvalidMode(s.to_owned())),
        };
        let mut mode = OpenMode {
            op,
            update: false,
            binary: false,
        };
        for c in chars {
            match c {
                '+' => mode.update = true,
                'b' => mode.binary = true,
                't' => mode.binary = false,
                // close-on-exec flag, accepted and ignored
                'e' => {}
                _ => return Err(InvalidMode(s.to_owned())),
            }
        }
        Ok(mode)
    }
}

/// The result handlers report for operations they do not implement.
pub(crate) fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "operation not supported by this handler",
    )
}

/// A file-access handler: one instance per open resource.
///
/// This trait enumerates the full capability set the interception layer
/// requires from a delegate provider. The contract is permissive: a
/// handler reports `ErrorKind::Unsupported` (or `false`) for operations
/// it does not implement instead of panicking, which is what a host
/// runtime expects of a stream handler.
pub trait StreamHandler: Send {
    /// Open a file stream. Failure propagates to the caller as-is.
    fn open(&mut self, path: &Path, mode: OpenMode) -> io::Result<()>;

    /// Read up to `max` bytes from the current position. An empty
    /// result means end of stream.
    fn read(&mut self, max: usize) -> io::Result<Vec<u8>>;

    /// True once a read has hit the end of the stream.
    fn eof(&self) -> bool;

    /// Reposition the stream. Returns the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Close the active stream, releasing any lock. Dropping the
    /// handler closes implicitly; `close` exists so the interception
    /// layer can retire a delegate stream before substituting another.
    fn close(&mut self);

    /// Write bytes at the current position, returning how many were
    /// accepted.
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let _ = data;
        Err(unsupported())
    }

    /// Take an advisory lock on the underlying resource. Returns false
    /// when the handler has no lockable resource. Held locks release
    /// when the stream closes.
    fn lock(&mut self, mode: LockMode) -> bool {
        let _ = mode;
        false
    }

    /// Open a directory for iteration.
    fn open_dir(&mut self, path: &Path) -> io::Result<()> {
        let _ = path;
        Err(unsupported())
    }

    /// Next directory entry name, or `None` when exhausted.
    fn read_dir(&mut self) -> io::Result<Option<String>> {
        Err(unsupported())
    }

    /// Close the directory handle.
    fn close_dir(&mut self) {}

    /// Metadata for a path, independent of any open stream.
    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let _ = path;
        Err(unsupported())
    }
}

/// Constructs handler instances for a scheme.
///
/// Factories are shared; each open gets a fresh handler from `create`.
pub trait HandlerFactory: Send + Sync {
    fn create(&self) -> Box<dyn StreamHandler>;

    /// Downcast support, so activation can probe which factory is
    /// currently installed for a scheme.
    fn as_any(&self) -> &dyn Any;
}
