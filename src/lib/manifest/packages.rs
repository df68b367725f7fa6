//! `packages.manifest` (spec §6): an ordered list of package entries, each
//! carrying name, version, project, dependencies (parsed tree), a
//! relative archive location, and `sha256sum`. The document starts with a
//! header pair including `min-bpkg-version` when applicable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::package::{parse_depends_entry, DependsEntry};
use crate::types::{Name, Version};
use crate::util::errors::Res;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackagesManifestEntry {
    pub name: Name,
    pub version: Version,
    pub project: Option<String>,
    pub depends: Vec<DependsEntry>,
    /// Archive path relative to the repository root.
    pub location: PathBuf,
    pub sha256sum: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackagesManifest {
    /// The lowest bpkg version able to consume this repository, computed
    /// from the active set of manifest features in use (spec §6
    /// "Backward compatibility").
    pub min_bpkg_version: Option<Version>,
    pub packages: Vec<PackagesManifestEntry>,
}

impl PackagesManifest {
    pub fn parse(raw: &str) -> Res<Self> {
        let entries = super::parse_entries(raw)?;
        let mut manifest = PackagesManifest::default();
        let mut iter = entries.into_iter().peekable();

        if let Some(first) = iter.peek() {
            if first.get("name").is_none() {
                let header = iter.next().unwrap();
                if let Some(v) = header.get("min-bpkg-version") {
                    manifest.min_bpkg_version = Some(v.parse()?);
                }
            }
        }

        for entry in iter {
            let name = entry.require("name")?.parse()?;
            let version = entry.require("version")?.parse()?;
            let project = entry.get("project").map(|s| s.to_string());
            let location = PathBuf::from(entry.require("location")?);
            let sha256sum = entry.require("sha256sum")?.to_string();
            let depends = entry
                .get_all("depends")
                .enumerate()
                .map(|(i, raw)| parse_depends_entry(i + 1, raw))
                .collect::<Res<Vec<_>>>()?;

            manifest.packages.push(PackagesManifestEntry {
                name,
                version,
                project,
                depends,
                location,
                sha256sum,
            });
        }

        Ok(manifest)
    }

    pub fn find<'a>(&'a self, name: &Name) -> impl Iterator<Item = &'a PackagesManifestEntry> {
        self.packages.iter().filter(move |p| &p.name == name)
    }

    /// Recompute `min_bpkg_version` as the lowest version able to parse
    /// every feature actually used in this document (currently: only the
    /// base grammar, so the floor version, unless a future feature bumps
    /// it). Called before rewriting the manifest (spec §6).
    pub fn recompute_min_version(&mut self, base: Version) {
        self.min_bpkg_version = Some(base);
    }

    pub fn render(&self) -> Res<String> {
        let mut out = String::new();
        if let Some(v) = &self.min_bpkg_version {
            out.push_str(&format!("min-bpkg-version: {}\n\n", v));
        }
        for p in &self.packages {
            out.push_str(&format!("name: {}\n", p.name));
            out.push_str(&format!("version: {}\n", p.version));
            if let Some(proj) = &p.project {
                out.push_str(&format!("project: {}\n", proj));
            }
            out.push_str(&format!("location: {}\n", p.location.display()));
            out.push_str(&format!("sha256sum: {}\n", p.sha256sum));
            out.push('\n');
        }
        Ok(out)
    }

    pub fn checksum(&self) -> Res<String> {
        Ok(crate::util::checksum_bytes(self.render()?.as_bytes()))
    }
}

impl PackagesManifestEntry {
    pub fn is_stub(&self) -> bool {
        self.version.is_wildcard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_header() {
        let raw = "\
min-bpkg-version: 0.13.0

name: libfoo
version: 1.0.0
location: libfoo-1.0.0.tar.gz
sha256sum: abcd

name: libbar
version: 2.0.0
location: libbar-2.0.0.tar.gz
sha256sum: ef01
";
        let m = PackagesManifest::parse(raw).unwrap();
        assert_eq!(m.packages.len(), 2);
        assert!(m.min_bpkg_version.is_some());
    }

    #[test]
    fn rejects_missing_sha256sum() {
        let raw = "name: libfoo\nversion: 1.0.0\nlocation: libfoo-1.0.0.tar.gz\n";
        assert!(PackagesManifest::parse(raw).is_err());
    }
}
