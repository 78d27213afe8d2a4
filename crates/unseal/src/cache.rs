//! Content-addressable cache for rewritten sources.
//!
//! One file per entry in a flat directory; the filename is the lowercase
//! hex SHA-1 of the *original* bytes, the content is the full rewritten
//! text. Entries are write-once: creation uses exclusive create, so at
//! most one writer wins per digest, and every loser holds byte-identical
//! content anyway. Readers take a shared advisory lock, the winning
//! writer an exclusive one; both release when the handle closes.

use crate::lock::{FileLock, LockMode};
use crate::rewriter;
use sha1::{Digest, Sha1};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Hex digest used as the cache filename for `content`.
pub fn content_key(content: &[u8]) -> String {
    hex::encode(Sha1::digest(content))
}

/// Rewrite `content`, consulting and maintaining the cache when a cache
/// directory is configured.
///
/// Never fails: cache I/O problems downgrade to a miss, and the rewrite
/// result is always returned from memory. Persistence is best-effort.
pub fn cached_rewrite(cache_dir: Option<&Path>, content: &[u8]) -> Vec<u8> {
    let Some(dir) = cache_dir else {
        return rewriter::rewrite_bytes(content);
    };

    let entry = dir.join(content_key(content));
    if let Some(hit) = read_entry(&entry) {
        debug!(entry = %entry.display(), "cache hit");
        return hit;
    }

    let rewritten = rewriter::rewrite_bytes(content);
    write_entry(&entry, &rewritten);
    rewritten
}

/// Read a cache entry under a shared lock.
///
/// Any failure is a miss, not an error: missing file, permissions, or
/// an empty file left by a writer that created the entry but has not
/// filled it yet.
fn read_entry(path: &Path) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let _lock = FileLock::acquire(&file, LockMode::Shared);
    let mut buf = Vec::new();
    (&file).read_to_end(&mut buf).ok()?;
    if buf.is_empty() { None } else { Some(buf) }
}

/// Persist a cache entry, write-once.
///
/// Exclusive create: losing the race to a concurrent writer is fine,
/// both sides derived the same bytes from the same original.
fn write_entry(path: &Path, data: &[u8]) {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(entry = %path.display(), %err, "cache entry not persisted");
            return;
        }
    };
    let _lock = FileLock::acquire(&file, LockMode::Exclusive);
    if let Err(err) = (&file).write_all(data) {
        debug!(entry = %path.display(), %err, "cache entry write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn key_is_lowercase_hex_sha1() {
        let key = content_key(b"hello");
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(key, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn same_content_same_key() {
        assert_eq!(content_key(b"<?php final"), content_key(b"<?php final"));
        assert_ne!(content_key(b"<?php final"), content_key(b"<?php Final"));
    }

    #[test]
    fn no_cache_dir_rewrites_directly() {
        let src = b"<?php final class A {}";
        assert_eq!(cached_rewrite(None, src), rewriter::rewrite_bytes(src));
    }

    #[test]
    fn miss_persists_entry_named_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let src = b"<?php final class A {}";

        let out = cached_rewrite(Some(dir.path()), src);
        assert_eq!(out, rewriter::rewrite_bytes(src));

        let entry = dir.path().join(content_key(src));
        assert_eq!(fs::read(&entry).unwrap(), out);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn hit_returns_persisted_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = b"<?php final class A {}";
        cached_rewrite(Some(dir.path()), src);

        // Plant different bytes in the entry to prove the second call
        // reads the file rather than rewriting again.
        let entry = dir.path().join(content_key(src));
        fs::write(&entry, b"planted").unwrap();
        assert_eq!(cached_rewrite(Some(dir.path()), src), b"planted");
    }

    #[test]
    fn empty_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let src = b"<?php final class A {}";
        let entry = dir.path().join(content_key(src));
        fs::write(&entry, b"").unwrap();

        // The pre-created empty entry blocks persistence (write-once),
        // but the in-memory result is still correct.
        assert_eq!(cached_rewrite(Some(dir.path()), src), rewriter::rewrite_bytes(src));
        assert_eq!(fs::read(&entry).unwrap(), b"");
    }

    #[test]
    fn unreadable_cache_dir_is_a_miss() {
        let src = b"<?php final class A {}";
        let missing = Path::new("/nonexistent/unseal-cache");
        assert_eq!(cached_rewrite(Some(missing), src), rewriter::rewrite_bytes(src));
    }
}
