//! Configuration of a repository source (spec §1/§6 ambient stack):
//! `RepositorySourceConfig` (`secure` flag + declared complement URLs)
//! for a `pkg`/`dir`/`git` repository.

use failure::{Error, ResultExt};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::util::errors::ErrorKind;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RepositorySourceConfig {
    pub repository: RepositorySourceInner,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RepositorySourceInner {
    /// Whether fetches against this repository require a verified
    /// signature (spec §4.3 "Authentication (pkg)").
    #[serde(default)]
    pub secure: bool,
    /// Complement repository URLs declared by this repository's own
    /// configuration, in addition to whatever `repositories.manifest`
    /// itself carries.
    #[serde(default)]
    pub complements: Vec<String>,
}

impl Default for RepositorySourceInner {
    fn default() -> Self {
        RepositorySourceInner {
            secure: false,
            complements: vec![],
        }
    }
}

impl FromStr for RepositorySourceConfig {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        toml::from_str(raw)
            .context(ErrorKind::InvalidIndex(
                "malformed repository source configuration".to_string(),
            ))
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secure_flag_and_complements() {
        let raw = "\
[repository]
secure = true
complements = [\"pkg+https://example.org/extra\"]
";
        let cfg = RepositorySourceConfig::from_str(raw).unwrap();
        assert!(cfg.repository.secure);
        assert_eq!(cfg.repository.complements.len(), 1);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(RepositorySourceConfig::from_str("not = [valid").is_err());
    }
}
