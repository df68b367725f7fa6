//! Certificate trust decisions for `pkg` repositories (spec §4.3).
//!
//! The actual cryptography — parsing a PEM certificate, recovering its
//! public key, and using it to decrypt a signature — is an external
//! collaborator (spec §1, "cryptographic signature primitives"); this
//! module only implements the *decision* logic around that primitive: CN
//! scope matching, the trust-cache lookup/prompt/persist sequence, and the
//! expiry warning window, exactly as `auth.hxx`/`rep-info.cxx` do it in
//! the original.

use chrono::{DateTime, Duration, Utc};
use slog::Logger;

use crate::util::diag::{DiagRecord, Severity};
use crate::util::errors::{ErrorKind, Res};

/// A certificate's relevant fields, already extracted by the external
/// crypto collaborator (spec §1): we never parse PEM ourselves.
#[derive(Clone, Debug)]
pub struct Certificate {
    pub common_name: String,
    pub fingerprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub public_key_der: Vec<u8>,
}

/// Certificates expiring sooner than this produce a warning but still
/// verify (spec §4.3).
pub const EXPIRY_WARNING_WINDOW_DAYS: i64 = 61; // ~2 months

impl Certificate {
    /// Expired *at validation time*. Signing-time expiry is irrelevant
    /// (spec §4.3: "verify as long as not expired at validation time").
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }

    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        !self.expired_at(now) && self.not_after - now < Duration::days(EXPIRY_WARNING_WINDOW_DAYS)
    }

    /// Does this certificate's CN cover `canonical_name` as a scope
    /// prefix (spec §4.3 step 2)? The original treats CN as a `/`-
    /// separated prefix of the repository's canonical name.
    pub fn covers(&self, canonical_name: &str) -> bool {
        canonical_name == self.common_name
            || canonical_name.starts_with(&format!("{}/", self.common_name))
    }
}

/// A previously recorded (or freshly made) trust decision for a
/// fingerprint, persisted in the fetch cache's `pkg_repository_auth`
/// table (spec §4.4, `cache::store::PkgRepositoryAuth`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustDecision {
    Trusted,
    /// The repository carries no certificate at all; recorded so future
    /// runs don't re-prompt for an unsigned repository.
    Dummy,
}

/// Persisted trust decisions, keyed by certificate fingerprint. Backed by
/// `cache::store` in the full system; kept as a trait here so
/// `repository::auth` doesn't depend on the cache crate module directly.
pub trait TrustCache {
    fn lookup(&self, fingerprint: &str) -> Option<TrustDecision>;
    fn record(&mut self, fingerprint: &str, cn: &str, expiry: DateTime<Utc>, decision: TrustDecision);
}

/// Asks the interactive collaborator (spec §1, "the interactive prompt
/// UI") whether to trust a certificate. Returns `false` on any non-yes
/// answer, matching the original's "persist the decision on YES" (a NO
/// is never persisted).
pub trait TrustPrompt {
    fn confirm(&mut self, cert: &Certificate, canonical_name: &str) -> bool;
}

/// Verifies a recovered signature's raw SHA-256 digest against a
/// certificate's public key. The actual RSA decrypt/compare is external;
/// this trait is the seam `repository::fetch::pkg` calls through.
pub trait SignatureVerifier {
    fn recover_digest(&self, cert: &Certificate, signature: &[u8]) -> Res<Vec<u8>>;
}

/// Runs the four-step pkg repository authentication sequence (spec
/// §4.3). `dependent_trust` is the set of fingerprints declared trusted
/// by a dependent repository's own manifest (accepted without prompting
/// or persisting, per step 3).
pub fn authenticate(
    cert: &Certificate,
    canonical_name: &str,
    now: DateTime<Utc>,
    trust_cache: &mut dyn TrustCache,
    dependent_trust: &[String],
    prompt: &mut dyn TrustPrompt,
    log: &Logger,
) -> Res<()> {
    if cert.expired_at(now) {
        return Err(ErrorKind::CertificateExpired(canonical_name.to_string()).into());
    }
    if cert.expires_soon(now) {
        DiagRecord::new(canonical_name, Severity::Warning, "certificate expires soon")
            .info(format!("expires {}", cert.not_after))
            .emit(log);
    }

    if !cert.covers(canonical_name) {
        return Err(
            ErrorKind::CertificateScopeMismatch(cert.common_name.clone(), canonical_name.to_string())
                .into(),
        );
    }

    if let Some(decision) = trust_cache.lookup(&cert.fingerprint) {
        return match decision {
            TrustDecision::Trusted | TrustDecision::Dummy => Ok(()),
        };
    }

    if dependent_trust.iter().any(|f| f == &cert.fingerprint) {
        // Accepted without persisting (spec §4.3 step 3).
        return Ok(());
    }

    if prompt.confirm(cert, canonical_name) {
        trust_cache.record(&cert.fingerprint, &cert.common_name, cert.not_after, TrustDecision::Trusted);
        Ok(())
    } else {
        Err(ErrorKind::UntrustedRepository(canonical_name.to_string()).into())
    }
}

/// Verifies that `packages.manifest`'s checksum matches the digest
/// recovered from `signature.manifest` via the certificate (spec §4.3
/// step 4). Call after `authenticate` succeeds.
pub fn verify_packages_checksum(
    cert: &Certificate,
    signature_bytes: &[u8],
    packages_manifest_checksum: &str,
    verifier: &dyn SignatureVerifier,
) -> Res<()> {
    let recovered = verifier.recover_digest(cert, signature_bytes)?;
    let recovered_hex = crate::util::hexify_hash(&recovered);
    if recovered_hex != packages_manifest_checksum {
        return Err(ErrorKind::ChecksumMismatch(
            "packages.manifest".to_string(),
            packages_manifest_checksum.to_string(),
            recovered_hex,
        )
        .into());
    }
    Ok(())
}
