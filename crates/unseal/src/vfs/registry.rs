//! Handler registry: scheme → provider factory.
//!
//! Provider selection happens through this explicit table passed around
//! at startup, not through a process-global handler list. The
//! interception layer installs itself here, displacing (and wrapping)
//! whatever handled the scheme before.

use super::local::NativeFactory;
use super::traits::{HandlerFactory, StreamHandler};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Scheme for plain local file access.
pub const FILE_SCHEME: &str = "file";

/// Errors from handler lookup.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No provider was ever registered for the scheme. This is a usage
    /// error, typically `activate` was never called, and is distinct
    /// from every I/O failure.
    #[error("no handler registered for scheme {0:?}; was activate() called?")]
    UnknownScheme(String),
}

/// Explicit provider-selection table.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn HandlerFactory>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("schemes", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry: no scheme resolves until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the native provider handling `file`.
    pub fn with_native() -> Self {
        let mut registry = Self::new();
        registry.register(FILE_SCHEME, Arc::new(NativeFactory));
        registry
    }

    /// Install `factory` for `scheme`, returning the displaced factory
    /// if the scheme was already handled.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        factory: Arc<dyn HandlerFactory>,
    ) -> Option<Arc<dyn HandlerFactory>> {
        self.handlers.insert(scheme.into(), factory)
    }

    /// Remove and return the factory for `scheme`.
    pub fn deregister(&mut self, scheme: &str) -> Option<Arc<dyn HandlerFactory>> {
        self.handlers.remove(scheme)
    }

    /// The factory currently installed for `scheme`.
    pub fn factory(&self, scheme: &str) -> Result<&Arc<dyn HandlerFactory>, RegistryError> {
        self.handlers
            .get(scheme)
            .ok_or_else(|| RegistryError::UnknownScheme(scheme.to_owned()))
    }

    /// A fresh handler instance for `scheme`.
    pub fn handler(&self, scheme: &str) -> Result<Box<dyn StreamHandler>, RegistryError> {
        Ok(self.factory(scheme)?.create())
    }
}
