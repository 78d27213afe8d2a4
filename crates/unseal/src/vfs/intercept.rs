//! Interception layer: decorates a delegate provider with keyword
//! rewriting on eligible reads.
//!
//! The decorator implements the same [`StreamHandler`] capability set as
//! the provider it wraps. Every operation is forwarded; the only place
//! it deviates is `open`, where an eligible binary read is buffered,
//! run through the cached rewrite, and, if anything changed, served
//! from an in-memory stream instead of the delegate.
//!
//! Per-open state machine:
//!
//! ```text
//! Idle → Delegate ─┬→ Delegate (content unchanged, reseeked)
//!                  └→ Substituted (rewritten bytes in memory)
//! ```

use super::local::NativeFactory;
use super::memory::MemoryHandle;
use super::registry::{HandlerRegistry, FILE_SCHEME};
use super::traits::{HandlerFactory, Metadata, OpenMode, StreamHandler};
use crate::cache;
use crate::config::Config;
use crate::lock::LockMode;
use crate::rewriter;
use std::any::Any;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

type SharedConfig = Arc<RwLock<Config>>;

/// Read chunk size when buffering an eligible stream.
const DRAIN_CHUNK: usize = 8192;

/// Install the interception layer for the `file` scheme.
///
/// Idempotent: if the scheme is already handled by an interception
/// factory, nothing changes and a handle to the existing configuration
/// is returned. Otherwise the currently registered factory is recorded
/// as the delegate (native file access when the scheme had none) and
/// the decorator takes its place.
pub fn activate(registry: &mut HandlerRegistry, config: Config) -> Interceptor {
    if let Ok(current) = registry.factory(FILE_SCHEME) {
        if let Some(installed) = current.as_any().downcast_ref::<InterceptFactory>() {
            trace!("interception already active");
            return Interceptor {
                config: installed.config.clone(),
            };
        }
    }

    let delegate: Arc<dyn HandlerFactory> = registry
        .deregister(FILE_SCHEME)
        .unwrap_or_else(|| Arc::new(NativeFactory));
    let config: SharedConfig = Arc::new(RwLock::new(config));
    registry.register(
        FILE_SCHEME,
        Arc::new(InterceptFactory {
            delegate,
            config: config.clone(),
        }),
    );
    debug!("interception layer installed for {FILE_SCHEME:?}");
    Interceptor { config }
}

/// Configuration handle returned by [`activate`].
///
/// Setters may be used at any time between opens. Serializing them
/// against opens running on other threads is the caller's
/// responsibility.
#[derive(Clone)]
pub struct Interceptor {
    config: SharedConfig,
}

impl Interceptor {
    /// Replace the whitelist of path patterns.
    pub fn set_whitelist<I, S>(&self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut config) = self.config.write() {
            config.set_whitelist(patterns);
        }
    }

    /// Set the cache directory, or disable caching with `None`.
    pub fn set_cache_dir(&self, dir: Option<PathBuf>) {
        if let Ok(mut config) = self.config.write() {
            config.set_cache_dir(dir);
        }
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .map(|config| config.clone())
            .unwrap_or_default()
    }
}

/// Factory for the decorating handler. Holds the delegate factory it
/// displaced and the shared configuration.
pub struct InterceptFactory {
    delegate: Arc<dyn HandlerFactory>,
    config: SharedConfig,
}

impl HandlerFactory for InterceptFactory {
    fn create(&self) -> Box<dyn StreamHandler> {
        Box::new(InterceptHandler {
            delegate_factory: self.delegate.clone(),
            config: self.config.clone(),
            active: Active::Idle,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Which stream currently backs the open handle.
enum Active {
    Idle,
    /// Delegate stream (also used for directory handles).
    Delegate(Box<dyn StreamHandler>),
    /// In-memory stream over rewritten bytes.
    Substituted(MemoryHandle),
}

/// Per-open decorator. Forwards everything to the active stream.
pub struct InterceptHandler {
    delegate_factory: Arc<dyn HandlerFactory>,
    config: SharedConfig,
    active: Active,
}

impl InterceptHandler {
    fn active_handler(&mut self) -> io::Result<&mut dyn StreamHandler> {
        match &mut self.active {
            Active::Idle => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no open stream",
            )),
            Active::Delegate(handler) => Ok(handler.as_mut()),
            Active::Substituted(handle) => Ok(handle),
        }
    }
}

/// Read a stream to exhaustion.
fn drain(handler: &mut dyn StreamHandler) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    while !handler.eof() {
        let chunk = handler.read(DRAIN_CHUNK)?;
        if chunk.is_empty() {
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

impl StreamHandler for InterceptHandler {
    fn open(&mut self, path: &Path, mode: OpenMode) -> io::Result<()> {
        let mut inner = self.delegate_factory.create();
        inner.open(path, mode)?;

        let eligible = self
            .config
            .read()
            .map(|config| config.is_eligible(path, mode))
            .unwrap_or(false);
        trace!(path = %path.display(), eligible, "open intercepted");
        if !eligible {
            self.active = Active::Delegate(inner);
            return Ok(());
        }

        // Buffer the whole stream. A failed drain keeps the delegate
        // stream; the open itself still succeeds.
        let original = match drain(inner.as_mut()) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), %err, "buffering failed, serving original");
                let _ = inner.seek(SeekFrom::Start(0));
                self.active = Active::Delegate(inner);
                return Ok(());
            }
        };

        // Common case: no keyword anywhere in the file. Skip the cache
        // lookup entirely, no disk I/O beyond the read we already did.
        if !rewriter::contains_keyword(&original) {
            inner.seek(SeekFrom::Start(0))?;
            self.active = Active::Delegate(inner);
            return Ok(());
        }

        let cache_dir = self
            .config
            .read()
            .ok()
            .and_then(|config| config.cache_dir().map(Path::to_path_buf));
        let rewritten = cache::cached_rewrite(cache_dir.as_deref(), &original);

        if rewritten == original {
            inner.seek(SeekFrom::Start(0))?;
            self.active = Active::Delegate(inner);
        } else {
            debug!(path = %path.display(), "serving rewritten source");
            inner.close();
            self.active = Active::Substituted(MemoryHandle::with_contents(rewritten));
        }
        Ok(())
    }

    fn read(&mut self, max: usize) -> io::Result<Vec<u8>> {
        self.active_handler()?.read(max)
    }

    fn eof(&self) -> bool {
        match &self.active {
            Active::Idle => true,
            Active::Delegate(handler) => handler.eof(),
            Active::Substituted(handle) => handle.eof(),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.active_handler()?.seek(pos)
    }

    fn close(&mut self) {
        if let Ok(handler) = self.active_handler() {
            handler.close();
        }
        self.active = Active::Idle;
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.active_handler()?.write(data)
    }

    fn lock(&mut self, mode: LockMode) -> bool {
        self.active_handler()
            .map(|handler| handler.lock(mode))
            .unwrap_or(false)
    }

    /// Directories are never content-eligible; delegate verbatim.
    fn open_dir(&mut self, path: &Path) -> io::Result<()> {
        let mut inner = self.delegate_factory.create();
        inner.open_dir(path)?;
        self.active = Active::Delegate(inner);
        Ok(())
    }

    fn read_dir(&mut self) -> io::Result<Option<String>> {
        self.active_handler()?.read_dir()
    }

    fn close_dir(&mut self) {
        if let Ok(handler) = self.active_handler() {
            handler.close_dir();
        }
        self.active = Active::Idle;
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.delegate_factory.create().stat(path)
    }
}
