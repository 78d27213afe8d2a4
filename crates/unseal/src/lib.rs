//! unseal: load PHP sources with `final`/`readonly` disabled.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes the PHP source subset using logos
//! - **Rewriter**: Drops keyword tokens, preserving every other byte
//! - **Cache**: Content-addressed store for rewritten sources
//! - **Config**: Whitelist and cache-directory settings
//! - **VFS**: Stream-handler abstraction with the interception layer
//!
//! # Usage
//!
//! ```no_run
//! use unseal::{activate, Config, HandlerRegistry, OpenMode, StreamHandler, FILE_SCHEME};
//!
//! let mut registry = HandlerRegistry::with_native();
//! let interceptor = activate(&mut registry, Config::default());
//! interceptor.set_cache_dir(Some("/tmp/unseal-cache".into()));
//!
//! let mut handler = registry.handler(FILE_SCHEME).unwrap();
//! handler
//!     .open("src/Model.php".as_ref(), OpenMode::read_binary())
//!     .unwrap();
//! // reads now observe the source without final/readonly
//! ```
//!
//! Files on disk are never modified; substitution happens on the open
//! handle. Only exact binary reads (`rb`) of whitelisted `.php` paths
//! are rewritten; every other mode observes original content.

pub mod cache;
pub mod config;
pub mod filter;
pub mod lexer;
pub mod lock;
pub mod rewriter;
pub mod vfs;

pub use cache::{cached_rewrite, content_key};
pub use config::{Config, SOURCE_EXTENSION};
pub use lock::{FileLock, LockMode};
pub use rewriter::{contains_keyword, rewrite, rewrite_bytes};
pub use vfs::{
    activate, HandlerFactory, HandlerRegistry, Interceptor, MemoryHandle, Metadata, NativeFactory,
    NativeHandler, OpenMode, RegistryError, StreamHandler, FILE_SCHEME,
};
