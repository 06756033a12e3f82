// src/fingerprint.rs

//! Content digests for build layers.
//!
//! Every layer digest chains the previous layer's digest with the content it
//! adds, so two builds share a digest for a layer only if everything below
//! it matched too.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Collect every file below `root`, as sorted `/`-separated relative paths.
pub fn list_tree(fs: &dyn FileSystem, root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    files.push((rel_str, path));
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Digest of a directory tree: relative paths and contents, in sorted order.
///
/// A missing directory hashes like an empty one.
pub fn compute_tree_hash(fs: &dyn FileSystem, root: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    if fs.is_dir(root) {
        for (rel, path) in list_tree(fs, root)? {
            let file_hash = compute_file_hash(fs, &path)?;
            hasher.update(rel.as_bytes());
            hasher.update(&[0]);
            hasher.update(file_hash.as_bytes());
        }
    }
    let hash = hasher.finalize().to_hex().to_string();
    debug!(root = ?root, hash = %hash, "computed tree hash");
    Ok(hash)
}

/// Chain a parent layer digest with the digest of the content a layer adds.
pub fn chain_digest(parent: Option<&str>, content: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(parent.unwrap_or("").as_bytes());
    hasher.update(&[0]);
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Digest of an in-memory value, e.g. a rendered environment.
pub fn digest_str(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}
