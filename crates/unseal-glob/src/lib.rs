//! unseal-glob: Glob matching for whitelist path patterns.
//!
//! Provides:
//! - **glob_match**: Shell-style glob pattern matching (`*`, `?`, `[...]`)
//! - **normalize_separators**: Windows → POSIX path separator normalization
//!
//! Unlike path-aware globbing, `*` here matches across `/`, so a single
//! `*` pattern matches every path. This mirrors plain fnmatch semantics,
//! which is what whitelist patterns are written against.

mod glob;

pub use glob::{contains_wildcards, glob_match, normalize_separators};
