//! Fetch cache mode and session plumbing (spec §4.4, §6 environment
//! variables).

use crate::types::SessionId;

/// `BPKG_FETCH_CACHE` (spec §6): on/off/no-src/no-trust/offline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMode {
    On,
    Off,
    NoSrc,
    NoTrust,
    Offline,
}

impl CacheMode {
    pub fn from_env_value(v: &str) -> Self {
        match v {
            "off" => CacheMode::Off,
            "no-src" => CacheMode::NoSrc,
            "no-trust" => CacheMode::NoTrust,
            "offline" => CacheMode::Offline,
            _ => CacheMode::On,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("BPKG_FETCH_CACHE")
            .ok()
            .map(|v| Self::from_env_value(&v))
            .unwrap_or(CacheMode::On)
    }

    pub fn is_offline(self) -> bool {
        matches!(self, CacheMode::Offline)
    }

    pub fn shares_src(self) -> bool {
        !matches!(self, CacheMode::NoSrc | CacheMode::Off)
    }

    pub fn trusts_cache(self) -> bool {
        !matches!(self, CacheMode::NoTrust | CacheMode::Off)
    }
}

/// Resolve this process's fetch cache session id (spec §4.4: "The same
/// session id can be injected via environment variable to disable
/// revalidation across a sequence of cooperating runs").
pub fn session_id() -> SessionId {
    SessionId::from_env_or_generate("BPKG_FETCH_CACHE_SESSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_mode() {
        assert_eq!(CacheMode::from_env_value("off"), CacheMode::Off);
        assert_eq!(CacheMode::from_env_value("no-src"), CacheMode::NoSrc);
        assert_eq!(CacheMode::from_env_value("no-trust"), CacheMode::NoTrust);
        assert_eq!(CacheMode::from_env_value("offline"), CacheMode::Offline);
        assert_eq!(CacheMode::from_env_value("anything-else"), CacheMode::On);
    }

    #[test]
    fn offline_mode_disables_network_use() {
        assert!(CacheMode::Offline.is_offline());
        assert!(!CacheMode::On.is_offline());
    }
}
