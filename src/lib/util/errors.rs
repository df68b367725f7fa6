//! The error taxonomy used throughout the crate.
//!
//! Every fallible operation returns `Result<T, failure::Error>` (aliased
//! below as `Res<T>`) and attaches one `ErrorKind` variant via
//! `failure::ResultExt::context`. The variants correspond 1:1 to the kinds
//! in the error-handling design: user-input, precondition, io, subprocess,
//! integrity, state, transient, logic.

use failure::Fail;
use std::path::PathBuf;

pub type Res<T> = Result<T, failure::Error>;

#[derive(Debug, Fail)]
pub enum ErrorKind {
    // -- user-input --
    #[fail(display = "invalid package name: {}", _0)]
    InvalidPackageName(String),
    #[fail(display = "invalid version: {}", _0)]
    InvalidVersion(String),
    #[fail(display = "invalid version constraint: {}", _0)]
    InvalidConstraint(String),
    #[fail(display = "invalid package id")]
    InvalidPackageId,
    #[fail(display = "invalid repository location")]
    InvalidSourceUrl,
    #[fail(display = "unknown package: {}", _0)]
    UnknownPackage(String),

    // -- precondition --
    #[fail(display = "configuration directory {} is not empty", _0.display())]
    ConfigDirNotEmpty(PathBuf),
    #[fail(display = "package {} already exists, use --replace to overwrite", _0)]
    PackageExists(String),
    #[fail(display = "refusing to operate on broken package {} without --force", _0)]
    BrokenRequiresForce(String),
    #[fail(display = "configuration {} is busy", _0.display())]
    ConfigBusy(PathBuf),
    #[fail(display = "illegal state transition for {}: {:?} -> {}", _0, _1, _2)]
    IllegalTransition(String, &'static str, &'static str),

    // -- io --
    #[fail(display = "unable to read {}", _0.display())]
    Io(PathBuf),
    #[fail(display = "manifest not found at {}", _0.display())]
    MissingManifest(PathBuf),

    // -- subprocess --
    #[fail(display = "{} exited with non-zero status", _0)]
    SubprocessFailed(String),
    #[fail(display = "unable to spawn {}", _0)]
    SubprocessSpawn(String),

    // -- integrity --
    #[fail(
        display = "checksum mismatch for {}: expected {}, got {}",
        _0, _1, _2
    )]
    ChecksumMismatch(String, String, String),
    #[fail(display = "invalid manifest file: {}", _0)]
    InvalidManifestFile(String),
    #[fail(display = "invalid repository index: {}", _0)]
    InvalidIndex(String),
    #[fail(display = "invalid signature for {}", _0)]
    InvalidSignature(String),
    #[fail(display = "certificate for {} has expired", _0)]
    CertificateExpired(String),
    #[fail(display = "certificate common name {} does not match repository scope {}", _0, _1)]
    CertificateScopeMismatch(String, String),
    #[fail(display = "repository {} not trusted", _0)]
    UntrustedRepository(String),

    // -- state --
    #[fail(display = "package {} is broken", _0)]
    Broken(String),
    #[fail(
        display = "configuration schema version {} is outside supported range [{}, {}]",
        found, base, current
    )]
    SchemaVersionUnsupported {
        found: u32,
        base: u32,
        current: u32,
    },
    #[fail(display = "dependency cycle detected between {} and {}", _0, _1)]
    NegotiationCycle(String, String),
    #[fail(display = "no alternative satisfies dependency: {}", _0)]
    UnsatisfiableDepends(String),

    // -- transient --
    #[fail(display = "network fetch failed for {}: offline or unreachable", _0)]
    Transient(String),
    #[fail(display = "offline mode: no cached entry for {}", _0)]
    Offline(String),

    // -- logic --
    #[fail(display = "internal invariant violated: {}", _0)]
    Logic(String),
}
