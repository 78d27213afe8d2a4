//! Eligibility filter: which opens are candidates for rewriting.

use crate::config::{Config, SOURCE_EXTENSION};
use crate::vfs::OpenMode;
use std::path::Path;
use unseal_glob::{glob_match, normalize_separators};

/// True when an open should go through the rewriter: an exact binary
/// read (`rb`) of a source file whose path the whitelist admits.
///
/// Write, append, update and text-mode opens bypass interception and
/// observe original content. This asymmetry is intentional: only loads
/// are rewritten, tools that modify sources must see the real file.
pub fn is_eligible(config: &Config, path: &Path, mode: OpenMode) -> bool {
    mode.is_exact_binary_read()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
        && matches_whitelist(config.whitelist(), path)
}

/// Test a path against whitelist patterns in order; first glob match
/// wins, no match means not eligible. Patterns and the candidate are
/// normalized to `/` separators, so configuration written with `/`
/// matches Windows-style paths too.
pub fn matches_whitelist(patterns: &[String], path: &Path) -> bool {
    let lossy = path.to_string_lossy();
    let candidate = normalize_separators(&lossy);
    patterns
        .iter()
        .any(|pattern| glob_match(&normalize_separators(pattern), &candidate))
}
