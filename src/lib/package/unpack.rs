//! Unpack: extract an archive, or adopt an external directory (spec
//! §4.2 "Unpack").

use slog::Logger;
use std::path::{Path, PathBuf};

use super::selected::SelectedPackage;
use super::state::{PackageState, Transition};
use crate::driver::ArchiveTool;
use crate::manifest::package::PackageManifest;
use crate::util::errors::Res;

/// Unpack from the package's already-fetched archive into
/// `<cfg>/<name>-<version>/` (spec §4.2).
pub fn unpack_from_archive(
    selected: &mut SelectedPackage,
    archive_tool: &dyn ArchiveTool,
    cfg_dir: &Path,
    log: &Logger,
) -> Res<()> {
    let from_state = selected.state;
    let archive = selected
        .archive
        .clone()
        .ok_or_else(|| crate::util::errors::ErrorKind::Logic("no archive to unpack".to_string()))?;

    let dest = cfg_dir.join(format!("{}-{}", selected.name, selected.version));
    archive_tool.extract(&archive, &dest, log)?;

    super::state::check_transition(selected.name.as_str(), from_state, Transition::Unpack, PackageState::Unpacked)?;
    selected.state = PackageState::Unpacked;
    selected.src_root = Some(dest);
    selected.purge_src = true;

    Ok(())
}

/// Whether any of `manifest`'s depends alternatives carries a clause
/// that requires reading the package's buildfiles (spec §4.2: "if any
/// dependency alternative contains a buildfile clause").
fn has_buildfile_clause(manifest: &PackageManifest) -> bool {
    manifest.depends.iter().any(|entry| {
        entry.alternatives.iter().any(|alt| {
            alt.clauses.enable.is_some()
                || alt.clauses.reflect.is_some()
                || alt.clauses.has_prefer_accept()
                || alt.clauses.has_require()
        })
    })
}

/// Adopt an external source directory (spec §4.2: "From a directory
/// (external package)").
pub fn unpack_from_directory(
    selected: &mut SelectedPackage,
    external_dir: &Path,
    manifest: &PackageManifest,
    subprojects: &[String],
    build_dir_names: (&str, &str),
) -> Res<()> {
    let from_state = selected.state;
    super::state::check_transition(selected.name.as_str(), from_state, Transition::Unpack, PackageState::Unpacked)?;

    selected.state = PackageState::Unpacked;
    selected.src_root = Some(external_dir.to_path_buf());
    selected.purge_src = false;

    let mut sorted_subprojects = subprojects.to_vec();
    sorted_subprojects.sort();
    let mut buf = format!("{}\n{}\n", manifest.name, manifest.version);
    for sp in &sorted_subprojects {
        buf.push_str(sp);
        buf.push('\n');
    }
    selected.manifest_checksum = Some(crate::util::checksum_bytes(buf.as_bytes()));

    if has_buildfile_clause(manifest) {
        selected.buildfiles_checksum = Some(buildfiles_checksum(external_dir, build_dir_names)?);
    }

    Ok(())
}

/// Checksum the bootstrap/root/config `*.build` files, using either the
/// standard `build/` directory or the alternative `build2/` naming
/// (spec §4.2).
fn buildfiles_checksum(src_root: &Path, build_dir_names: (&str, &str)) -> Res<String> {
    let (standard, alternative) = build_dir_names;
    let build_dir = if src_root.join(standard).is_dir() {
        src_root.join(standard)
    } else {
        src_root.join(alternative)
    };

    let mut names = vec!["bootstrap.build", "root.build", "config.build"];
    names.sort();

    let mut buf = Vec::new();
    for name in names {
        let path = build_dir.join(name);
        if let Ok(bytes) = std::fs::read(&path) {
            buf.extend_from_slice(&bytes);
        }
    }
    Ok(crate::util::checksum_bytes(&buf))
}

pub fn archive_dest_dir(cfg_dir: &Path, name: &str, version: &str) -> PathBuf {
    cfg_dir.join(format!("{}-{}", name, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::package::PackageManifest;
    use crate::types::{Name, Version};
    use std::str::FromStr;

    fn sample_manifest() -> PackageManifest {
        PackageManifest::parse("name: libfoo\nversion: 1.0.0\n").unwrap()
    }

    #[test]
    fn unpack_from_directory_computes_manifest_checksum() {
        let mut sel = SelectedPackage::new(1, Name::from_str("libfoo").unwrap(), Version::from_str("1.0.0").unwrap());
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        unpack_from_directory(&mut sel, dir.path(), &manifest, &[], ("build", "build2")).unwrap();
        assert_eq!(sel.state, PackageState::Unpacked);
        assert!(!sel.purge_src);
        assert!(sel.manifest_checksum.is_some());
        assert!(sel.buildfiles_checksum.is_none());
    }
}
