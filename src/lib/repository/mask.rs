//! Repository masking (spec §4.3, §9): pretend a set of repositories
//! doesn't exist for the duration of a run, without touching storage.
//!
//! Grounded on the `bpkg` original's `rep-mask.cxx` technique: actually
//! remove the masked repositories (recursively, through complement and
//! prerequisite edges, stopping short of anything still reachable from an
//! unmasked repository) inside a scratch transaction, record what's left
//! as "unmasked", then throw the transaction away. Here we don't need a
//! real transaction since the graph is in memory — we compute the masked
//! set on a *clone* and only ever consult the resulting tables. Masking is
//! always idempotent (spec invariant 9): recomputing with the same input
//! set yields the same tables.

use indexmap::IndexSet;

use super::fragment::{FragmentId, RepositoryGraph};
use crate::types::ConfigUuid;

/// A repository, identified for masking purposes either by its canonical
/// name or by its location URL (spec §4.3: "can be specified either as
/// repository location canonical names or URLs").
#[derive(Clone, Debug)]
pub enum RepositoryRef {
    CanonicalName(String),
    Url(String),
}

/// A mask computed for one configuration's repository graph: the set of
/// repository canonical names and fragment ids that remain unmasked.
#[derive(Clone, Debug, Default)]
pub struct RepositoryMask {
    pub config: Option<ConfigUuid>,
    unmasked_repositories: IndexSet<String>,
    unmasked_fragments: IndexSet<FragmentId>,
}

impl RepositoryMask {
    pub fn repository_masked(&self, canonical_name: &str) -> bool {
        !self.unmasked_repositories.contains(canonical_name)
    }

    pub fn fragment_masked(&self, id: FragmentId) -> bool {
        !self.unmasked_fragments.contains(&id)
    }
}

fn resolve_repo_name(graph: &RepositoryGraph, r: &RepositoryRef) -> Option<String> {
    match r {
        RepositoryRef::CanonicalName(n) => graph.repository(n).map(|r| r.canonical_name.clone()),
        RepositoryRef::Url(u) => graph
            .repositories()
            .find(|repo| repo.location.url.as_str() == u)
            .map(|r| r.canonical_name.clone()),
    }
}

/// Which other repositories does `name` reach via complement or
/// prerequisite edges, aggregated across all the fragments it currently
/// exposes?
fn repo_edges(graph: &RepositoryGraph, name: &str) -> IndexSet<String> {
    let mut out = IndexSet::new();
    if let Some(repo) = graph.repository(name) {
        for &fid in &repo.fragments {
            if let Some(f) = graph.fragment(fid) {
                for &c in f.complements.iter().chain(f.prerequisites.iter()) {
                    if let Some(cf) = graph.fragment(c) {
                        for r in &cf.repositories {
                            out.insert(r.clone());
                        }
                    }
                }
            }
        }
    }
    out
}

/// Compute the mask for `graph` given the repositories requested to be
/// masked. Fails (returns `Err` with the unresolved refs) if any requested
/// repository doesn't exist.
pub fn compute_mask(
    graph: &RepositoryGraph,
    requested: &[RepositoryRef],
    config: Option<ConfigUuid>,
) -> Result<RepositoryMask, Vec<String>> {
    let mut masked: IndexSet<String> = IndexSet::new();
    let mut not_found = Vec::new();

    for r in requested {
        match resolve_repo_name(graph, r) {
            Some(name) => {
                masked.insert(name);
            }
            None => not_found.push(format!("{:?}", r)),
        }
    }

    if !not_found.is_empty() {
        return Err(not_found);
    }

    // Cascade: mask a repository reached (complement/prerequisite) from
    // an already-masked one, unless some other still-unmasked repository
    // also reaches it.
    let all_names: Vec<String> = graph.repositories().map(|r| r.canonical_name.clone()).collect();
    loop {
        let mut changed = false;
        for name in &all_names {
            if masked.contains(name) {
                continue;
            }
            let referrers: Vec<&String> = all_names
                .iter()
                .filter(|other| repo_edges(graph, other).contains(name))
                .collect();
            if referrers.is_empty() {
                continue;
            }
            if referrers.iter().all(|r| masked.contains(*r)) {
                masked.insert(name.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let unmasked_repositories: IndexSet<String> =
        all_names.into_iter().filter(|n| !masked.contains(n)).collect();

    let mut unmasked_fragments = IndexSet::new();
    for name in &unmasked_repositories {
        if let Some(repo) = graph.repository(name) {
            for &fid in &repo.fragments {
                unmasked_fragments.insert(fid);
            }
        }
    }

    Ok(RepositoryMask {
        config,
        unmasked_repositories,
        unmasked_fragments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fragment::{Fragment, Repository};
    use crate::types::RepositoryLocation;
    use indexmap::IndexSet as ISet;
    use std::str::FromStr;

    fn loc(s: &str) -> RepositoryLocation {
        RepositoryLocation::from_str(s).unwrap()
    }

    fn build_graph() -> RepositoryGraph {
        let mut g = RepositoryGraph::new();
        let f_a = FragmentId(0);
        let f_b = FragmentId(1);

        let mut fa = Fragment {
            id: f_a,
            repositories: ISet::new(),
            commit: None,
            friendly_name: None,
            complements: ISet::new(),
            prerequisites: ISet::new(),
            packages: vec![],
        };
        fa.repositories.insert("a".to_string());
        fa.complements.insert(f_b);

        let mut fb = Fragment {
            id: f_b,
            repositories: ISet::new(),
            commit: None,
            friendly_name: None,
            complements: ISet::new(),
            prerequisites: ISet::new(),
            packages: vec![],
        };
        fb.repositories.insert("b".to_string());

        g.add_fragment(fa);
        g.add_fragment(fb);

        g.add_repository(Repository {
            canonical_name: "a".to_string(),
            location: loc("pkg+https://example.org/a"),
            fragments: vec![f_a],
        });
        g.add_repository(Repository {
            canonical_name: "b".to_string(),
            location: loc("pkg+https://example.org/b"),
            fragments: vec![f_b],
        });
        g
    }

    #[test]
    fn masking_cascades_to_exclusive_complement() {
        let g = build_graph();
        let mask = compute_mask(&g, &[RepositoryRef::CanonicalName("a".to_string())], None).unwrap();
        assert!(mask.repository_masked("a"));
        assert!(mask.repository_masked("b")); // only reachable from a
        assert!(mask.fragment_masked(FragmentId(0)));
        assert!(mask.fragment_masked(FragmentId(1)));
    }

    #[test]
    fn masking_is_idempotent() {
        let g = build_graph();
        let m1 = compute_mask(&g, &[RepositoryRef::CanonicalName("a".to_string())], None).unwrap();
        let m2 = compute_mask(&g, &[RepositoryRef::CanonicalName("a".to_string())], None).unwrap();
        assert_eq!(m1.unmasked_repositories, m2.unmasked_repositories);
    }

    #[test]
    fn unresolved_repository_is_an_error() {
        let g = build_graph();
        let err = compute_mask(&g, &[RepositoryRef::CanonicalName("nope".to_string())], None);
        assert!(err.is_err());
    }
}
