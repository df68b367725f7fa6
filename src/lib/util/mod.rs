//! Small cross-cutting utilities: hashing, atomic writes, locking,
//! subprocess helpers, and the diagnostics/error types.

pub mod diag;
pub mod errors;
pub mod lock;
pub mod process;

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use self::errors::{ErrorKind, Res};

/// Render a SHA-256 digest as a lowercase hex string.
pub fn hexify_hash(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 checksum of a file's contents, hex-encoded.
pub fn checksum_file(path: &Path) -> Res<String> {
    let mut file = File::open(path).map_err(|_| ErrorKind::Io(path.to_path_buf()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|_| ErrorKind::Io(path.to_path_buf()))?;
    Ok(hexify_hash(&hasher.finalize()))
}

/// SHA-256 checksum of an in-memory buffer, hex-encoded.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hexify_hash(&hasher.finalize())
}

/// Abbreviate a full hex checksum to its first `n` characters, as used for
/// cache directory names (`hash16`) and repository state directories
/// (`hash12`).
pub fn abbreviate(hash: &str, n: usize) -> String {
    hash.chars().take(n).collect()
}

/// Write `contents` to `path`, creating parent directories as needed. Used
/// by generated manifests and scaffolding (`cli::new`).
pub fn write(path: &Path, contents: &[u8]) -> Res<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|_| ErrorKind::Io(parent.to_path_buf()))?;
    }
    let mut f = File::create(path).map_err(|_| ErrorKind::Io(path.to_path_buf()))?;
    f.write_all(contents)
        .map_err(|_| ErrorKind::Io(path.to_path_buf()))?;
    Ok(())
}

/// Write `contents` to a sibling temporary file, then atomically rename it
/// onto `path`. This is the "stash then rename then update row" discipline
/// from spec §4.2/§5: every fetched artifact lands under an auto-removing
/// name until promoted.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Res<()> {
    let tmp = sibling_tmp_path(path);
    write(&tmp, contents)?;
    fs::rename(&tmp, path).map_err(|_| ErrorKind::Io(path.to_path_buf()))?;
    Ok(())
}

pub fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
