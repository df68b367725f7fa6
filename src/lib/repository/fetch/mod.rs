//! Fetch pipelines (spec §4.3): one per repository kind, each producing
//! `Fragment`s that get wired into the `RepositoryGraph`. The network
//! transport and VCS client are external collaborators (spec §1); this
//! layer only sequences the calls and turns their results into the
//! domain model.

pub mod git;
pub mod pkg;

use crate::util::errors::Res;

/// Seam to the network transport (spec §1: "the fetch transport
/// (HTTP/git)" is out of scope for the core). `pkg.rs` fetches through
/// this trait so offline mode and the fetch cache can intercept without
/// either depending on a concrete HTTP client.
pub trait Transport {
    /// Fetch `url`'s full body. An optional HTTP proxy is the
    /// transport's own concern (spec §4.3).
    fn fetch(&self, url: &str) -> Res<Vec<u8>>;
}

/// Offline mode fails fast (spec §4.3 "Offline mode") rather than
/// attempting any network I/O.
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn fetch(&self, url: &str) -> Res<Vec<u8>> {
        Err(crate::util::errors::ErrorKind::Offline(url.to_string()).into())
    }
}
