//! Fetch: bind an archive to a selected package (spec §4.2 "Fetch").

use slog::Logger;
use std::path::{Path, PathBuf};

use super::selected::SelectedPackage;
use super::state::{PackageState, Transition};
use crate::util::errors::{ErrorKind, Res};
use crate::util::{checksum_file, sibling_tmp_path, write_atomic};

/// Fetch `archive` (already downloaded to a temp location by
/// `repository::fetch`) into the configuration, stashing and restoring
/// any existing archive of the same name on failure (spec §4.2).
pub fn fetch(
    selected: &mut SelectedPackage,
    archive_src: &Path,
    dest_dir: &Path,
    expected_sha256: &str,
    shared_src: bool,
    log: &Logger,
) -> Res<()> {
    let checksum = checksum_file(archive_src)?;
    if checksum != expected_sha256 {
        return Err(ErrorKind::ChecksumMismatch(
            selected.name.to_string(),
            expected_sha256.to_string(),
            checksum,
        )
        .into());
    }

    let dest = dest_dir.join(format!("{}-{}.tar.gz", selected.name, selected.version));
    let stash = selected.archive.clone().map(|existing| {
        let stash_path = sibling_tmp_path(&existing);
        (existing, stash_path)
    });

    if let Some((existing, stash_path)) = &stash {
        if let Err(e) = std::fs::rename(existing, stash_path) {
            slog::warn!(log, "unable to stash existing archive"; "error" => e.to_string());
        }
    }

    let bytes = std::fs::read(archive_src).map_err(|_| ErrorKind::Io(archive_src.to_path_buf()))?;
    if let Err(e) = write_atomic(&dest, &bytes) {
        if let Some((existing, stash_path)) = &stash {
            if std::fs::rename(stash_path, existing).is_err() {
                selected.state = PackageState::Broken;
            }
        }
        return Err(e);
    }

    super::state::check_transition(selected.name.as_str(), selected.state, Transition::Fetch, PackageState::Fetched)?;
    selected.state = PackageState::Fetched;
    selected.archive = Some(dest);
    selected.purge_archive = !shared_src;

    if let Some((_, stash_path)) = &stash {
        let _ = std::fs::remove_file(stash_path);
    }

    Ok(())
}

pub fn archive_file_name(name: &str, version: &str) -> PathBuf {
    PathBuf::from(format!("{}-{}.tar.gz", name, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Name, Version};
    use std::str::FromStr;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn fetch_rejects_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        std::fs::write(&archive, b"hello").unwrap();

        let mut sel = SelectedPackage::new(1, Name::from_str("libfoo").unwrap(), Version::from_str("1.0.0").unwrap());
        let result = fetch(&mut sel, &archive, dir.path(), "deadbeef", false, &logger());
        assert!(result.is_err());
        assert_eq!(sel.state, PackageState::Transient);
    }

    #[test]
    fn fetch_succeeds_with_matching_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        std::fs::write(&archive, b"hello").unwrap();
        let checksum = checksum_file(&archive).unwrap();

        let mut sel = SelectedPackage::new(1, Name::from_str("libfoo").unwrap(), Version::from_str("1.0.0").unwrap());
        fetch(&mut sel, &archive, dir.path(), &checksum, false, &logger()).unwrap();
        assert_eq!(sel.state, PackageState::Fetched);
        assert!(sel.archive.unwrap().exists());
    }
}
