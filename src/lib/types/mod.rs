//! C1 — domain model: names, versions, constraints, and repository
//! locations. Leaf types with no dependency on the rest of the crate.

pub mod location;
pub mod name;
pub mod uuid;
pub mod version;

pub use self::location::{RepositoryKind, RepositoryLocation};
pub use self::name::Name;
pub use self::uuid::{ConfigUuid, SessionId};
pub use self::version::{satisfies_constraint, satisfies_version, Version, VersionConstraint};

use serde::{Deserialize, Serialize};

/// `(name, version)` — the primary key of an available package (spec §3).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: Name,
    pub version: Version,
}

impl PackageKey {
    pub fn new(name: Name, version: Version) -> Self {
        PackageKey { name, version }
    }
}

impl std::fmt::Display for PackageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}
