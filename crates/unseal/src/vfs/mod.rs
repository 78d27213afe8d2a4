//! Virtual file-access layer.
//!
//! A provider abstraction over file streams:
//!
//! - **NativeHandler**: real filesystem access (the default delegate)
//! - **MemoryHandle**: in-memory stream for substituted content
//! - **InterceptHandler**: the rewriting decorator
//! - **HandlerRegistry**: explicit scheme → provider selection
//!
//! # Design
//!
//! The interception layer is a decorator implementing the same
//! [`StreamHandler`] capability set as the provider it wraps. It is
//! installed with [`activate`], which records whatever previously
//! handled the `file` scheme as its delegate and forwards every
//! operation there, substituting rewritten content only on eligible
//! read opens.

mod intercept;
mod local;
mod memory;
mod registry;
mod traits;

pub use intercept::{activate, InterceptFactory, InterceptHandler, Interceptor};
pub use local::{NativeFactory, NativeHandler};
pub use memory::MemoryHandle;
pub use registry::{HandlerRegistry, RegistryError, FILE_SCHEME};
pub use traits::{HandlerFactory, InvalidMode, Metadata, ModeOp, OpenMode, StreamHandler};
