//! Configuration UUIDs and fetch-cache session ids (spec §3, §4.4).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid as RawUuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigUuid(pub RawUuid);

impl ConfigUuid {
    pub fn generate() -> Self {
        ConfigUuid(RawUuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        RawUuid::parse_str(s).ok().map(ConfigUuid)
    }
}

impl fmt::Display for ConfigUuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fetch-cache session id (spec §4.4): one per process invocation,
/// injectable via `BPKG_FETCH_CACHE_SESSION` so a sequence of cooperating
/// runs can share one revalidation window.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(RawUuid::new_v4().to_string())
    }

    pub fn from_env_or_generate(var: &str) -> Self {
        std::env::var(var)
            .ok()
            .filter(|s| !s.is_empty())
            .map(SessionId)
            .unwrap_or_else(Self::generate)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
