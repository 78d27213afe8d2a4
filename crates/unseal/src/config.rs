//! Runtime configuration for the interception layer.
//!
//! A `Config` is an explicit value constructed once and injected into
//! the layer at activation; there is no process-global state. The
//! [`Interceptor`](crate::vfs::Interceptor) handle returned by
//! `activate` exposes the same setters for adjustments between opens.

use crate::vfs::OpenMode;
use std::path::{Path, PathBuf};

/// The source-file extension eligible for rewriting.
pub const SOURCE_EXTENSION: &str = "php";

/// Whitelist and cache settings.
#[derive(Debug, Clone)]
pub struct Config {
    whitelist: Vec<String>,
    cache_dir: Option<PathBuf>,
}

impl Default for Config {
    /// Matches every path; caching disabled.
    fn default() -> Self {
        Self {
            whitelist: vec!["*".to_owned()],
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whitelist with an ordered list of glob patterns.
    /// Patterns are written with `/` separators; an empty list makes no
    /// path eligible.
    pub fn set_whitelist<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = patterns.into_iter().map(Into::into).collect();
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Set the cache directory, or disable caching with `None`. The
    /// directory must already exist; entries are created flat inside it.
    pub fn set_cache_dir(&mut self, dir: Option<PathBuf>) {
        self.cache_dir = dir;
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Whether an open should go through the rewriter.
    pub fn is_eligible(&self, path: &Path, mode: OpenMode) -> bool {
        crate::filter::is_eligible(self, path, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_everything() {
        let config = Config::default();
        assert_eq!(config.whitelist(), ["*"]);
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn setters_replace_values() {
        let mut config = Config::new();
        config.set_whitelist(["src/*.php", "lib/*.php"]);
        assert_eq!(config.whitelist().len(), 2);

        config.set_cache_dir(Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.cache_dir(), Some(Path::new("/tmp/cache")));
        config.set_cache_dir(None);
        assert!(config.cache_dir().is_none());
    }
}
