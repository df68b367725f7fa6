//! `repositories.manifest` (spec §6): for a pkg repository, a list of
//! *role* entries with complement/prerequisite locations and an optional
//! base entry carrying a PEM certificate.

use serde::{Deserialize, Serialize};

use super::{parse_entries, Entry};
use crate::types::RepositoryLocation;
use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryRole {
    Complement,
    Prerequisite,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRoleEntry {
    pub location: RepositoryLocation,
    pub role: RepositoryRole,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoriesManifest {
    /// PEM certificate of the base (this) repository, present iff the
    /// repository is signed (spec §4.3).
    pub certificate_pem: Option<String>,
    pub roles: Vec<RepositoryRoleEntry>,
}

impl RepositoriesManifest {
    pub fn parse(raw: &str) -> Res<Self> {
        let entries = parse_entries(raw)?;
        let mut manifest = RepositoriesManifest::default();

        for entry in entries {
            if let Some(cert) = entry.get("certificate") {
                manifest.certificate_pem = Some(cert.replace("\\n", "\n"));
                continue;
            }

            if let Some(loc) = entry.get("location") {
                let role = match entry.get("role") {
                    Some("complement") | None => RepositoryRole::Complement,
                    Some("prerequisite") => RepositoryRole::Prerequisite,
                    Some(other) => {
                        return Err(ErrorKind::InvalidManifestFile(format!(
                            "unknown repository role `{}`",
                            other
                        ))
                        .into())
                    }
                };
                let location: RepositoryLocation = loc
                    .parse()
                    .map_err(|_| ErrorKind::InvalidManifestFile(format!("bad location `{}`", loc)))?;
                manifest.roles.push(RepositoryRoleEntry { location, role });
            }
        }

        Ok(manifest)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(cert) = &self.certificate_pem {
            let e = Entry {
                fields: vec![("certificate".to_string(), cert.replace('\n', "\\n"))],
            };
            out.push_str(&super::render_entry(&e));
            out.push('\n');
        }
        for role in &self.roles {
            let role_str = match role.role {
                RepositoryRole::Complement => "complement",
                RepositoryRole::Prerequisite => "prerequisite",
            };
            let e = Entry {
                fields: vec![
                    ("location".to_string(), role.location.to_string()),
                    ("role".to_string(), role_str.to_string()),
                ],
            };
            out.push_str(&super::render_entry(&e));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_and_certificate() {
        let raw = "\
certificate: -----BEGIN CERTIFICATE-----\\nMIIB...\\n-----END CERTIFICATE-----

location: pkg+https://example.org/math
role: complement

location: pkg+https://example.org/extra
role: prerequisite
";
        let m = RepositoriesManifest::parse(raw).unwrap();
        assert!(m.certificate_pem.is_some());
        assert_eq!(m.roles.len(), 2);
        assert_eq!(m.roles[1].role, RepositoryRole::Prerequisite);
    }
}
