//! `git` repository fetch pipeline (spec §4.3).
//!
//! The VCS client itself is an external collaborator (spec §1); this
//! module sequences `ls-remote` (or its cache), ref filtering, and fetch
//! through the `GitRemote` trait and turns the result into one
//! `repository::fragment::Fragment` per matched ref, each carrying a
//! commit, timestamp, and friendly name, exactly as spec §4.3 describes.
//! A real implementation backs `GitRemote` with `git2`.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::repository::fragment::{Fragment, FragmentId};
use crate::util::errors::Res;
use crate::util::hexify_hash;

/// A single ref advertised by a remote, as returned by `ls-remote`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRef {
    pub name: String, // e.g. "refs/heads/master" or "refs/tags/v1.0.0"
    pub commit: String,
}

/// A fetched commit's metadata, used to populate a `Fragment`.
#[derive(Clone, Debug)]
pub struct CommitInfo {
    pub commit: String,
    pub authored_at: DateTime<Utc>,
}

/// Seam to the git client (spec §1: "the fetch transport (HTTP/git)").
pub trait GitRemote {
    fn ls_remote(&self, url: &str) -> Res<Vec<RemoteRef>>;
    /// Fetch only `refs` into the working clone at `state_dir`.
    fn fetch_refs(&self, url: &str, state_dir: &std::path::Path, refs: &[RemoteRef]) -> Res<()>;
    fn commit_info(&self, state_dir: &std::path::Path, commit: &str) -> Res<CommitInfo>;
}

/// The state directory for a git repository's checkouts is named by a
/// 12-char SHA-256 abbreviation of its canonical name (spec §4.3).
pub fn state_dir_name(canonical_name: &str) -> String {
    crate::util::abbreviate(&hexify_hash(canonical_name.as_bytes()), 12)
}

/// Parse the `#`-fragment reference filter off a git repository URL
/// (spec §4.3: "fragment-encoded reference filters"). An empty filter
/// matches every branch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefFilter {
    patterns: Vec<String>,
}

impl RefFilter {
    pub fn parse(fragment: Option<&str>) -> Self {
        match fragment {
            None | Some("") => RefFilter::default(),
            Some(f) => RefFilter {
                patterns: f.split(',').map(|s| s.trim().to_string()).collect(),
            },
        }
    }

    pub fn matches(&self, short_name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p == short_name || p == "*")
    }
}

fn short_name(remote_ref: &str) -> Option<&str> {
    remote_ref
        .strip_prefix("refs/heads/")
        .or_else(|| remote_ref.strip_prefix("refs/tags/"))
}

/// Resolve which refs satisfy `filter`, preferring a cached `ls-remote`
/// result when `cached` is provided and the caller hasn't requested a
/// refresh (spec §4.3: "through a cached `ls-remote` result when
/// available").
pub fn resolve_matching_refs(
    remote: &dyn GitRemote,
    url: &str,
    filter: &RefFilter,
    cached: Option<&[RemoteRef]>,
) -> Res<Vec<RemoteRef>> {
    let all = match cached {
        Some(refs) => refs.to_vec(),
        None => remote.ls_remote(url)?,
    };
    Ok(all
        .into_iter()
        .filter(|r| short_name(&r.name).map(|n| filter.matches(n)).unwrap_or(false))
        .collect())
}

/// Fetch the matched refs and produce one fragment per ref (spec §4.3:
/// "produce one git fragment per matched ref with a commit, timestamp,
/// and friendly name").
pub fn fetch_fragments(
    remote: &dyn GitRemote,
    url: &str,
    state_dir: &std::path::Path,
    matched: &[RemoteRef],
    next_id: &mut dyn FnMut() -> FragmentId,
) -> Res<Vec<Fragment>> {
    remote.fetch_refs(url, state_dir, matched)?;

    let mut fragments = Vec::new();
    // Dedup by commit: branches/tags pointing at the same commit share a
    // fragment (spec §4.3: "a fragment belongs to one or more
    // repositories (git branches/tags share a fragment)").
    let mut by_commit: BTreeMap<String, Vec<&RemoteRef>> = BTreeMap::new();
    for r in matched {
        by_commit.entry(r.commit.clone()).or_default().push(r);
    }

    for (commit, refs) in by_commit {
        let info = remote.commit_info(state_dir, &commit)?;
        let friendly_name = refs
            .first()
            .and_then(|r| short_name(&r.name))
            .map(|s| s.to_string());

        fragments.push(Fragment {
            id: next_id(),
            repositories: Default::default(),
            commit: Some(info.commit),
            friendly_name,
            complements: Default::default(),
            prerequisites: Default::default(),
            packages: vec![],
        });
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeRemote;
    impl GitRemote for FakeRemote {
        fn ls_remote(&self, _url: &str) -> Res<Vec<RemoteRef>> {
            Ok(vec![
                RemoteRef { name: "refs/heads/master".to_string(), commit: "aaa".to_string() },
                RemoteRef { name: "refs/heads/dev".to_string(), commit: "bbb".to_string() },
                RemoteRef { name: "refs/tags/v1.0.0".to_string(), commit: "aaa".to_string() },
            ])
        }
        fn fetch_refs(&self, _url: &str, _dir: &std::path::Path, _refs: &[RemoteRef]) -> Res<()> {
            Ok(())
        }
        fn commit_info(&self, _dir: &std::path::Path, commit: &str) -> Res<CommitInfo> {
            Ok(CommitInfo {
                commit: commit.to_string(),
                authored_at: Utc::now(),
            })
        }
    }

    #[test]
    fn ref_filter_matches_named_branch_only() {
        let filter = RefFilter::parse(Some("master"));
        assert!(filter.matches("master"));
        assert!(!filter.matches("dev"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = RefFilter::parse(None);
        assert!(filter.matches("anything"));
    }

    #[test]
    fn fragments_dedup_refs_sharing_a_commit() {
        let remote = FakeRemote;
        let filter = RefFilter::default();
        let matched = resolve_matching_refs(&remote, "https://example.org/repo.git", &filter, None).unwrap();
        assert_eq!(matched.len(), 3);

        let mut counter = 0u64;
        let mut next_id = || {
            let id = FragmentId(counter);
            counter += 1;
            id
        };
        let fragments =
            fetch_fragments(&remote, "https://example.org/repo.git", std::path::Path::new("/tmp"), &matched, &mut next_id)
                .unwrap();
        // master and v1.0.0 share commit "aaa"; dev is commit "bbb".
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn state_dir_name_is_12_chars() {
        assert_eq!(state_dir_name("git:example.org/repo").len(), 12);
    }
}
