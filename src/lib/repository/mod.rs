//! C4 — repository model and fetch pipeline: the fragment/repository
//! graph, masking, certificate authentication, and per-kind fetch
//! pipelines (spec §4.3).

pub mod auth;
pub mod fetch;
pub mod fragment;
pub mod mask;

pub use fragment::{Fragment, FragmentId, Repository, RepositoryGraph};
pub use mask::{compute_mask, RepositoryMask, RepositoryRef};
