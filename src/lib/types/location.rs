//! Repository locations: typed URLs with scheme-specific canonical names
//! (spec §3, C1/C4).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::util::errors::{ErrorKind, Res};
use crate::util::hexify_hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryKind {
    Pkg,
    Dir,
    Git,
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RepositoryKind::Pkg => "pkg",
            RepositoryKind::Dir => "dir",
            RepositoryKind::Git => "git",
        };
        write!(f, "{}", s)
    }
}

/// A typed repository URL. `Pkg` and `Git`/`Dir` correspond to
/// archive-based vs. directory-/version-control-based repositories (spec
/// §3: "a location is either archive-based or directory-based/
/// version-control-based").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLocation {
    pub kind: RepositoryKind,
    #[serde(with = "url_compat")]
    pub url: Url,
}

mod url_compat {
    use serde::{Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S: Serializer>(url: &Url, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Url, D::Error> {
        let s = String::deserialize(d)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl RepositoryLocation {
    pub fn is_archive_based(&self) -> bool {
        self.kind == RepositoryKind::Pkg
    }

    pub fn is_local(&self) -> bool {
        self.url.scheme() == "file"
    }

    /// The canonical name used as the repository's primary key (spec §3):
    /// host + normalized path for remote locations, an abbreviated
    /// SHA-256 of a canonicalized form for git, lowercased on Windows for
    /// local paths.
    pub fn canonical_name(&self) -> String {
        match self.kind {
            RepositoryKind::Git => {
                let canon = self.canonicalized_git_string();
                format!("git:{}", hexify_hash(canon.as_bytes()).chars().take(16).collect::<String>())
            }
            _ => {
                if self.is_local() {
                    let path = self.url.path();
                    let path = if cfg!(windows) {
                        path.to_lowercase()
                    } else {
                        path.to_string()
                    };
                    format!("{}:{}", self.kind, path)
                } else {
                    let host = self.url.host_str().unwrap_or("");
                    let mut path = self.url.path().trim_end_matches('/').to_string();
                    if path.is_empty() {
                        path.push('/');
                    }
                    format!("{}:{}{}", self.kind, host, path)
                }
            }
        }
    }

    fn canonicalized_git_string(&self) -> String {
        let mut s = self.url.as_str().to_string();
        if s.ends_with(".git") {
            s.truncate(s.len() - 4);
        }
        if cfg!(windows) && self.is_local() {
            s = s.to_lowercase();
        }
        s
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}+{}", self.kind, self.url)
    }
}

impl FromStr for RepositoryLocation {
    type Err = failure::Error;

    fn from_str(s: &str) -> Res<Self> {
        let mut parts = s.splitn(2, '+');
        let kind = parts.next().unwrap_or("");
        let rest = parts.next().ok_or(ErrorKind::InvalidSourceUrl)?;

        let kind = match kind {
            "pkg" => RepositoryKind::Pkg,
            "dir" => RepositoryKind::Dir,
            "git" => RepositoryKind::Git,
            _ => return Err(ErrorKind::InvalidSourceUrl.into()),
        };

        let url = Url::parse(rest).map_err(|_| ErrorKind::InvalidSourceUrl)?;
        Ok(RepositoryLocation { kind, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location_roundtrip() {
        let l = RepositoryLocation::from_str("pkg+https://example.org/repo").unwrap();
        let l2 = RepositoryLocation::from_str(&l.to_string()).unwrap();
        assert_eq!(l, l2);
    }

    #[test]
    fn git_canonical_name_is_hash12_ish() {
        let l = RepositoryLocation::from_str("git+https://example.org/foo.git").unwrap();
        let name = l.canonical_name();
        assert!(name.starts_with("git:"));
        assert_eq!(name.len(), 4 + 16);
    }
}
