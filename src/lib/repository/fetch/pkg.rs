//! `pkg` (archive-based) repository fetch pipeline (spec §4.3).
//!
//! Sequence: `repositories.manifest`, then `packages.manifest`, then
//! `signature.manifest` (if the repository is signed), then per-package
//! archives fetched lazily on demand. `Transport` is the external
//! collaborator seam (HTTP or local-directory reads both implement it).

use slog::Logger;

use super::Transport;
use crate::manifest::packages::PackagesManifest;
use crate::manifest::repositories::RepositoriesManifest;
use crate::manifest::signature::SignatureManifest;
use crate::repository::auth::{self, Certificate, SignatureVerifier, TrustCache, TrustPrompt};
use crate::util::errors::Res;

pub struct PkgRepositoryContents {
    pub repositories: RepositoriesManifest,
    pub packages: PackagesManifest,
    pub signature: Option<SignatureManifest>,
}

/// Fetch and parse the three top-level manifests of a `pkg` repository
/// rooted at `base_url` (spec §4.3 "Fetch pipeline" / "pkg").
pub fn fetch_manifests(transport: &dyn Transport, base_url: &str) -> Res<PkgRepositoryContents> {
    let repositories_raw = transport.fetch(&join(base_url, "repositories.manifest"))?;
    let repositories = RepositoriesManifest::parse(&String::from_utf8_lossy(&repositories_raw))?;

    let packages_raw = transport.fetch(&join(base_url, "packages.manifest"))?;
    let packages = PackagesManifest::parse(&String::from_utf8_lossy(&packages_raw))?;

    let signature = if repositories.certificate_pem.is_some() {
        let sig_raw = transport.fetch(&join(base_url, "signature.manifest"))?;
        Some(SignatureManifest::parse(&String::from_utf8_lossy(&sig_raw))?)
    } else {
        None
    };

    Ok(PkgRepositoryContents {
        repositories,
        packages,
        signature,
    })
}

/// Authenticate and checksum-verify a signed repository's
/// `packages.manifest` against its certificate (spec §4.3 steps 1-4).
/// No-op (`Ok`) for unsigned repositories, whose trust decision is
/// instead recorded as `TrustDecision::Dummy` by the caller so future
/// runs don't re-prompt (spec §4.4 `pkg_repository_auth`).
#[allow(clippy::too_many_arguments)]
pub fn authenticate_and_verify(
    contents: &PkgRepositoryContents,
    canonical_name: &str,
    cert: &Certificate,
    now: chrono::DateTime<chrono::Utc>,
    trust_cache: &mut dyn TrustCache,
    dependent_trust: &[String],
    prompt: &mut dyn TrustPrompt,
    verifier: &dyn SignatureVerifier,
    log: &Logger,
) -> Res<()> {
    auth::authenticate(cert, canonical_name, now, trust_cache, dependent_trust, prompt, log)?;

    let signature = contents
        .signature
        .as_ref()
        .ok_or_else(|| crate::util::errors::ErrorKind::InvalidManifestFile(
            "signed repository missing signature.manifest".to_string(),
        ))?;
    let checksum = contents.packages.checksum()?;
    auth::verify_packages_checksum(cert, &signature.signature_bytes()?, &checksum, verifier)
}

/// Fetch a single package archive on demand (spec §4.3: "on-demand
/// per-package archive fetches").
pub fn fetch_archive(
    transport: &dyn Transport,
    base_url: &str,
    relative_location: &std::path::Path,
) -> Res<Vec<u8>> {
    transport.fetch(&join(base_url, &relative_location.to_string_lossy()))
}

fn join(base: &str, suffix: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeTransport(RefCell<HashMap<String, Vec<u8>>>);
    impl Transport for FakeTransport {
        fn fetch(&self, url: &str) -> Res<Vec<u8>> {
            self.0
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| crate::util::errors::ErrorKind::Offline(url.to_string()).into())
        }
    }

    #[test]
    fn fetch_manifests_unsigned_repository() {
        let mut files = HashMap::new();
        files.insert(
            "https://example.org/repo/repositories.manifest".to_string(),
            b"".to_vec(),
        );
        files.insert(
            "https://example.org/repo/packages.manifest".to_string(),
            b"name: libfoo\nversion: 1.0.0\nlocation: libfoo-1.0.0.tar.gz\nsha256sum: ab\n".to_vec(),
        );
        let transport = FakeTransport(RefCell::new(files));

        let contents = fetch_manifests(&transport, "https://example.org/repo").unwrap();
        assert!(contents.signature.is_none());
        assert_eq!(contents.packages.packages.len(), 1);
    }

    #[test]
    fn signed_repository_requires_signature_manifest() {
        let mut files = HashMap::new();
        files.insert(
            "https://example.org/repo/repositories.manifest".to_string(),
            b"certificate: -----BEGIN CERTIFICATE-----\\nAA\\n-----END CERTIFICATE-----\n".to_vec(),
        );
        files.insert(
            "https://example.org/repo/packages.manifest".to_string(),
            b"name: libfoo\nversion: 1.0.0\nlocation: libfoo-1.0.0.tar.gz\nsha256sum: ab\n".to_vec(),
        );
        files.insert(
            "https://example.org/repo/signature.manifest".to_string(),
            b"sha256sum: ab\nsignature: aGVsbG8=\n".to_vec(),
        );
        let transport = FakeTransport(RefCell::new(files));

        let contents = fetch_manifests(&transport, "https://example.org/repo").unwrap();
        assert!(contents.signature.is_some());
    }
}
