//! Imaginary availability sources (spec §4.5): packages that don't live
//! in any real repository fragment but still need to answer
//! `find_available` queries — the existing-packages registry (packages
//! named on the command line as directories or archives) and stub
//! packages injected for user-specified system packages.

use crate::manifest::package::DependsEntry;
use crate::types::{Name, Version};

/// A package supplied directly on the command line rather than through
/// a repository fragment (spec §4.5 "existing-packages registry"). It
/// behaves as an imaginary complement of every real repository in its
/// configuration and is always queried first.
#[derive(Clone, Debug)]
pub struct ExistingPackage {
    pub name: Name,
    pub version: Version,
    pub depends: Vec<DependsEntry>,
    /// The directory or archive path the user named, for `configure`.
    pub source: std::path::PathBuf,
}

/// A synthetic `available_package` row at the wildcard version, used
/// only once nothing else matches a system-package dependency (spec
/// §4.5 "Stubs").
#[derive(Clone, Debug)]
pub struct StubPackage {
    pub name: Name,
}

impl StubPackage {
    pub fn version(&self) -> Version {
        Version::wildcard()
    }
}

/// The full imaginary set consulted by `query::find_available` before
/// (existing packages) and after (stubs) the real repository graphs.
#[derive(Clone, Debug, Default)]
pub struct ImaginaryRegistry {
    existing: Vec<ExistingPackage>,
    stubs: Vec<StubPackage>,
}

impl ImaginaryRegistry {
    pub fn new() -> Self {
        ImaginaryRegistry::default()
    }

    pub fn add_existing(&mut self, pkg: ExistingPackage) {
        self.existing.push(pkg);
    }

    pub fn add_stub(&mut self, name: Name) {
        if !self.stubs.iter().any(|s| s.name == name) {
            self.stubs.push(StubPackage { name });
        }
    }

    pub fn existing_matching<'a>(&'a self, name: &'a Name) -> impl Iterator<Item = &'a ExistingPackage> {
        self.existing.iter().filter(move |p| &p.name == name)
    }

    pub fn stub_matching<'a>(&'a self, name: &'a Name) -> Option<&'a StubPackage> {
        self.stubs.iter().find(|s| &s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_registers_only_once_per_name() {
        let mut reg = ImaginaryRegistry::new();
        let name: Name = "libfoo".parse().unwrap();
        reg.add_stub(name.clone());
        reg.add_stub(name.clone());
        assert_eq!(reg.stubs.len(), 1);
    }

    #[test]
    fn stub_version_is_wildcard() {
        let name: Name = "libfoo".parse().unwrap();
        let stub = StubPackage { name };
        assert!(stub.version().is_wildcard());
    }
}
