//! Purge: remove on-disk artifacts and erase the row (spec §4.2
//! "Purge").

use super::selected::SelectedPackage;
use super::state::{PackageState, Substate, Transition};
use crate::util::errors::{ErrorKind, Res};

/// Purge `selected` (spec §4.2). System-substate packages are erased
/// unconditionally regardless of state. A broken package is refused
/// unless `force`, in which case the filesystem is checked to confirm
/// no artifact actually remains before proceeding.
pub fn purge(selected: &SelectedPackage, force: bool) -> Res<PurgeActions> {
    if selected.substate == Substate::System {
        return Ok(PurgeActions {
            remove_src: false,
            remove_archive: false,
            erase_row: true,
        });
    }

    if selected.state == PackageState::Broken {
        if !force {
            return Err(ErrorKind::BrokenRequiresForce(selected.name.to_string()).into());
        }
        if let Some(src) = &selected.src_root {
            if src.exists() {
                return Err(ErrorKind::Logic(format!(
                    "refusing to purge {}: source directory still present on disk",
                    selected.name
                ))
                .into());
            }
        }
        if let Some(archive) = &selected.archive {
            if archive.exists() {
                return Err(ErrorKind::Logic(format!(
                    "refusing to purge {}: archive still present on disk",
                    selected.name
                ))
                .into());
            }
        }
        return Ok(PurgeActions {
            remove_src: false,
            remove_archive: false,
            erase_row: true,
        });
    }

    super::state::check_transition(selected.name.as_str(), selected.state, Transition::Purge, PackageState::Transient)?;

    Ok(PurgeActions {
        remove_src: selected.purge_src,
        remove_archive: selected.purge_archive,
        erase_row: true,
    })
}

/// What the caller must actually do on disk/in the database; kept
/// separate from `purge` so callers can apply it inside their own
/// transaction (spec §4.2/§5 crash-safety discipline).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurgeActions {
    pub remove_src: bool,
    pub remove_archive: bool,
    pub erase_row: bool,
}

impl PurgeActions {
    pub fn apply(&self, selected: &SelectedPackage) -> Res<()> {
        if self.remove_src {
            if let Some(src) = &selected.src_root {
                if src.exists() {
                    std::fs::remove_dir_all(src).map_err(|_| ErrorKind::Io(src.clone()))?;
                }
            }
        }
        if self.remove_archive {
            if let Some(archive) = &selected.archive {
                if archive.exists() {
                    std::fs::remove_file(archive).map_err(|_| ErrorKind::Io(archive.clone()))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Name, Version};
    use std::str::FromStr;

    fn pkg() -> SelectedPackage {
        let mut p = SelectedPackage::new(1, Name::from_str("libfoo").unwrap(), Version::from_str("1.0.0").unwrap());
        p.state = PackageState::Unpacked;
        p
    }

    #[test]
    fn broken_without_force_is_refused() {
        let mut p = pkg();
        p.state = PackageState::Broken;
        assert!(purge(&p, false).is_err());
    }

    #[test]
    fn system_substate_erased_unconditionally() {
        let mut p = pkg();
        p.substate = Substate::System;
        p.state = PackageState::Broken;
        let actions = purge(&p, false).unwrap();
        assert!(actions.erase_row);
    }

    #[test]
    fn unpacked_purge_removes_owned_artifacts() {
        let p = pkg();
        let actions = purge(&p, false).unwrap();
        assert!(actions.remove_src);
        assert!(actions.erase_row);
    }
}
