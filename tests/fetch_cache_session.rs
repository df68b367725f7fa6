//! Integration test for spec §8 scenario S5 (fetch cache revalidation):
//! a cache hit in a fresh session asks the caller to revalidate; a
//! second fresh session repeats that; a second lookup within the same
//! session is served without revalidation.

use std::path::Path;

use bpkg::cache::store::{FetchCache, MetadataLookup};
use bpkg::types::SessionId;

fn logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

#[test]
fn s5_revalidation_is_session_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FetchCache::open(dir.path(), logger()).unwrap();
    let url = "https://example.org/pkg-repo";

    let s1 = SessionId::generate();
    assert!(matches!(cache.load_pkg_repository_metadata(url, &s1).unwrap(), MetadataLookup::Cold));

    cache
        .save_pkg_repository_metadata(
            url,
            "00",
            &s1,
            Path::new("pkg/metadata/00/repositories.manifest"),
            "abc123",
            Path::new("pkg/metadata/00/packages.manifest"),
            "def456",
        )
        .unwrap();

    // Same session: already validated, no checksums needed.
    match cache.load_pkg_repository_metadata(url, &s1).unwrap() {
        MetadataLookup::Validated { .. } => {}
        _ => panic!("expected a validated hit within the same session"),
    }

    // A fresh session must be asked to revalidate against the cached
    // checksums rather than trusting the entry outright.
    let s2 = SessionId::generate();
    match cache.load_pkg_repository_metadata(url, &s2).unwrap() {
        MetadataLookup::NeedsRevalidation { repositories_checksum, packages_checksum } => {
            assert_eq!(repositories_checksum, "abc123");
            assert_eq!(packages_checksum, "def456");
        }
        _ => panic!("expected a stale entry to require revalidation in a new session"),
    }

    // Re-saving under s2 (as if revalidation succeeded) makes subsequent
    // lookups within s2 validated-only again.
    cache
        .save_pkg_repository_metadata(
            url,
            "00",
            &s2,
            Path::new("pkg/metadata/00/repositories.manifest"),
            "abc123",
            Path::new("pkg/metadata/00/packages.manifest"),
            "def456",
        )
        .unwrap();
    match cache.load_pkg_repository_metadata(url, &s2).unwrap() {
        MetadataLookup::Validated { .. } => {}
        _ => panic!("expected s2's second lookup to be validated, no revalidation requested"),
    }
}

#[test]
fn session_id_env_injection_disables_revalidation_across_runs() {
    let var = "BPKG_FETCH_CACHE_SESSION_TEST_S5";
    std::env::set_var(var, "fixed-session-id");
    let a = SessionId::from_env_or_generate(var);
    let b = SessionId::from_env_or_generate(var);
    assert_eq!(a, b);
    std::env::remove_var(var);
}
