//! Repository/fragment arena (spec §3, §4.3, Design Notes "Cyclic
//! pointer graphs"): repositories and the fragments (snapshots) they
//! expose form a cyclic graph through complement/prerequisite edges.
//! Rather than storing real back-references, we store an arena of
//! `Repository`/`Fragment` entities plus index-based edges and always
//! walk with an explicit visited set.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::types::{PackageKey, RepositoryLocation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId(pub u64);

/// A snapshot of a repository at a particular commit/revision (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    /// Canonical names of the repositories that currently expose this
    /// fragment (git branches/tags of the same remote share a fragment).
    pub repositories: IndexSet<String>,
    pub commit: Option<String>,
    pub friendly_name: Option<String>,
    /// Followed recursively during resolution.
    pub complements: IndexSet<FragmentId>,
    /// Followed one level only.
    pub prerequisites: IndexSet<FragmentId>,
    pub packages: Vec<PackageKey>,
}

/// `(name, location, ordered fragments)` (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Repository {
    pub canonical_name: String,
    pub location: RepositoryLocation,
    pub fragments: Vec<FragmentId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RepositoryGraph {
    repositories: IndexMap<String, Repository>,
    fragments: IndexMap<FragmentId, Fragment>,
    next_id: u64,
}

impl RepositoryGraph {
    pub fn new() -> Self {
        RepositoryGraph::default()
    }

    pub fn add_repository(&mut self, repo: Repository) {
        self.repositories.insert(repo.canonical_name.clone(), repo);
    }

    pub fn new_fragment_id(&mut self) -> FragmentId {
        let id = FragmentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_fragment(&mut self, fragment: Fragment) {
        self.fragments.insert(fragment.id, fragment);
    }

    pub fn repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.get(name)
    }

    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.values()
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(&id)
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values()
    }

    /// The complement closure of `root`: `root` plus every fragment
    /// reachable by recursively following complement edges. Cyclic graphs
    /// are handled with an explicit visited set (spec §4.3/Design Notes).
    pub fn complement_closure(&self, root: FragmentId) -> IndexSet<FragmentId> {
        let mut visited = IndexSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(f) = self.fragments.get(&id) {
                for &c in &f.complements {
                    if !visited.contains(&c) {
                        stack.push(c);
                    }
                }
            }
        }
        visited
    }

    /// Fragments "visible" from `root`: the complement closure, plus the
    /// prerequisites of each of those (prerequisites are not followed
    /// recursively — spec §4.3).
    pub fn visible_fragments(&self, root: FragmentId) -> IndexSet<FragmentId> {
        let complements = self.complement_closure(root);
        let mut visible = complements.clone();
        for id in complements {
            if let Some(f) = self.fragments.get(&id) {
                for &p in &f.prerequisites {
                    visible.insert(p);
                }
            }
        }
        visible
    }

    /// Is `candidate` (identified by the fragments it's available from)
    /// really available given `root`'s visibility? (spec §4.3 "Fragment
    /// filtering for candidate selection".)
    pub fn is_visible(&self, root: FragmentId, candidate_fragments: &[FragmentId]) -> bool {
        let visible = self.visible_fragments(root);
        candidate_fragments.iter().any(|f| visible.contains(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(id: u64) -> Fragment {
        Fragment {
            id: FragmentId(id),
            repositories: IndexSet::new(),
            commit: None,
            friendly_name: None,
            complements: IndexSet::new(),
            prerequisites: IndexSet::new(),
            packages: vec![],
        }
    }

    #[test]
    fn complement_walk_terminates_on_cycle() {
        let mut g = RepositoryGraph::new();
        let mut a = frag(0);
        let mut b = frag(1);
        a.complements.insert(FragmentId(1));
        b.complements.insert(FragmentId(0)); // cycle back to a
        g.add_fragment(a);
        g.add_fragment(b);

        let closure = g.complement_closure(FragmentId(0));
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn prerequisites_not_followed_recursively() {
        // a -complement-> b -prerequisite-> c -prerequisite-> d
        // c is visible from a (one level via b), d must not be.
        let mut g = RepositoryGraph::new();
        let mut a = frag(0);
        let mut b = frag(1);
        let mut c = frag(2);
        let d = frag(3);
        a.complements.insert(FragmentId(1));
        b.prerequisites.insert(FragmentId(2));
        c.prerequisites.insert(FragmentId(3));
        g.add_fragment(a);
        g.add_fragment(b);
        g.add_fragment(c);
        g.add_fragment(d);

        let visible = g.visible_fragments(FragmentId(0));
        assert!(visible.contains(&FragmentId(1)));
        assert!(visible.contains(&FragmentId(2)));
        assert!(!visible.contains(&FragmentId(3)));
    }
}
