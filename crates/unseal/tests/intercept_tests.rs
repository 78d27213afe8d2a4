//! End-to-end interception tests through the public API.

use std::fs;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use unseal::{
    activate, content_key, Config, HandlerRegistry, OpenMode, StreamHandler, FILE_SCHEME,
};

const SOURCE: &str = "<?php final class Order { public readonly int $id; }";
const REWRITTEN: &str = "<?php  class Order { public  int $id; }";

fn fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn read_all(handler: &mut dyn StreamHandler) -> Vec<u8> {
    let mut out = Vec::new();
    while !handler.eof() {
        let chunk = handler.read(1024).unwrap();
        if chunk.is_empty() {
            break;
        }
        out.extend_from_slice(&chunk);
    }
    out
}

fn open_and_read(registry: &HandlerRegistry, path: &Path, mode: &str) -> Vec<u8> {
    let mut handler = registry.handler(FILE_SCHEME).unwrap();
    handler.open(path, mode.parse().unwrap()).unwrap();
    read_all(handler.as_mut())
}

#[test]
fn transparent_substitution() {
    let mut registry = HandlerRegistry::with_native();
    activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);

    assert_eq!(open_and_read(&registry, &path, "rb"), REWRITTEN.as_bytes());
    // Disk content is never touched.
    assert_eq!(fs::read(&path).unwrap(), SOURCE.as_bytes());
}

#[test]
fn repeated_loads_hit_the_cache() {
    let mut registry = HandlerRegistry::with_native();
    let interceptor = activate(&mut registry, Config::default());

    let cache = tempfile::tempdir().unwrap();
    interceptor.set_cache_dir(Some(cache.path().to_path_buf()));

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);

    assert_eq!(open_and_read(&registry, &path, "rb"), REWRITTEN.as_bytes());

    // Plant different bytes in the cache entry; a second load must come
    // from the cache, not from a fresh rewrite.
    let entry = cache.path().join(content_key(SOURCE.as_bytes()));
    fs::write(&entry, "<?php /* cached */").unwrap();
    assert_eq!(open_and_read(&registry, &path, "rb"), b"<?php /* cached */");
}

#[test]
fn untouched_sources_skip_the_cache() {
    let mut registry = HandlerRegistry::with_native();
    let interceptor = activate(&mut registry, Config::default());

    let cache = tempfile::tempdir().unwrap();
    interceptor.set_cache_dir(Some(cache.path().to_path_buf()));

    let dir = tempfile::tempdir().unwrap();
    let src = "<?php class Plain { public int $x; }";
    let path = fixture(dir.path(), "Plain.php", src);

    assert_eq!(open_and_read(&registry, &path, "rb"), src.as_bytes());
    // No keyword, no cache entry.
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn write_modes_see_original_content() {
    let mut registry = HandlerRegistry::with_native();
    activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);

    for mode in ["r", "rb+", "r+b", "ab"] {
        let mut handler = registry.handler(FILE_SCHEME).unwrap();
        handler.open(&path, mode.parse().unwrap()).unwrap();
        if mode.starts_with('r') {
            assert_eq!(read_all(handler.as_mut()), SOURCE.as_bytes(), "mode {mode}");
        }
        handler.close();
    }
}

#[test]
fn whitelist_scopes_interception() {
    let mut registry = HandlerRegistry::with_native();
    let interceptor = activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let mocked = fixture(dir.path(), "mocked/Order.php", SOURCE);
    let real = fixture(dir.path(), "real/Order.php", SOURCE);
    interceptor.set_whitelist([format!("{}/mocked/*.php", dir.path().display())]);

    assert_eq!(open_and_read(&registry, &mocked, "rb"), REWRITTEN.as_bytes());
    assert_eq!(open_and_read(&registry, &real, "rb"), SOURCE.as_bytes());
}

#[test]
fn non_source_extensions_pass_through() {
    let mut registry = HandlerRegistry::with_native();
    activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "notes.txt", "final readonly notes");

    assert_eq!(
        open_and_read(&registry, &path, "rb"),
        b"final readonly notes"
    );
}

#[test]
fn substituted_handle_behaves_like_a_file() {
    let mut registry = HandlerRegistry::with_native();
    activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);

    let mut handler = registry.handler(FILE_SCHEME).unwrap();
    handler.open(&path, OpenMode::read_binary()).unwrap();

    // Partial reads, seek back, full re-read.
    let head = handler.read(6).unwrap();
    assert_eq!(head, b"<?php ");
    handler.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(read_all(handler.as_mut()), REWRITTEN.as_bytes());
    assert!(handler.eof());
}

#[test]
fn malformed_sources_are_served_verbatim() {
    let mut registry = HandlerRegistry::with_native();
    activate(&mut registry, Config::default());

    let dir = tempfile::tempdir().unwrap();
    let src = "<?php final class Broken { $s = \"unterminated";
    let path = fixture(dir.path(), "Broken.php", src);

    assert_eq!(open_and_read(&registry, &path, "rb"), src.as_bytes());
}

#[test]
fn activation_survives_reconfiguration() {
    let mut registry = HandlerRegistry::with_native();
    let first = activate(&mut registry, Config::default());
    first.set_whitelist(["nothing/*.php"]);

    // Re-activating neither resets the whitelist nor stacks decorators.
    let second = activate(&mut registry, Config::default());
    assert_eq!(second.config().whitelist(), ["nothing/*.php"]);

    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);
    assert_eq!(open_and_read(&registry, &path, "rb"), SOURCE.as_bytes());

    second.set_whitelist(["*"]);
    assert_eq!(open_and_read(&registry, &path, "rb"), REWRITTEN.as_bytes());
}

#[test]
fn shared_cache_between_registries() {
    // Two registries with separate activations model two processes
    // sharing one cache directory.
    let cache = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "Order.php", SOURCE);

    for _ in 0..2 {
        let mut registry = HandlerRegistry::with_native();
        let interceptor = activate(&mut registry, Config::default());
        interceptor.set_cache_dir(Some(cache.path().to_path_buf()));
        assert_eq!(open_and_read(&registry, &path, "rb"), REWRITTEN.as_bytes());
    }

    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 1);
}
