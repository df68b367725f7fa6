//! Package state and substate, and the legal-transition table (spec §3
//! "Package state").

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageState {
    Transient,
    Fetched,
    Unpacked,
    Configured,
    Broken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Substate {
    None,
    System,
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PackageState::Transient => "transient",
            PackageState::Fetched => "fetched",
            PackageState::Unpacked => "unpacked",
            PackageState::Configured => "configured",
            PackageState::Broken => "broken",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for PackageState {
    type Err = failure::Error;
    fn from_str(s: &str) -> Res<Self> {
        Ok(match s {
            "transient" => PackageState::Transient,
            "fetched" => PackageState::Fetched,
            "unpacked" => PackageState::Unpacked,
            "configured" => PackageState::Configured,
            "broken" => PackageState::Broken,
            other => return Err(ErrorKind::Logic(format!("unknown package state `{}`", other)).into()),
        })
    }
}

impl fmt::Display for Substate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Substate::None => "none",
            Substate::System => "system",
        })
    }
}

impl std::str::FromStr for Substate {
    type Err = failure::Error;
    fn from_str(s: &str) -> Res<Self> {
        Ok(match s {
            "none" => Substate::None,
            "system" => Substate::System,
            other => return Err(ErrorKind::Logic(format!("unknown substate `{}`", other)).into()),
        })
    }
}

/// The operation driving a transition, used only to select the right
/// arm of the table below (spec §3's transition diagram).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Fetch,
    Unpack,
    Configure,
    Disfigure,
    Purge,
    Fail,
}

/// Is `from -{op}-> to` a legal transition (spec §3)?
pub fn is_legal(from: PackageState, op: Transition, to: PackageState) -> bool {
    use PackageState::*;
    use Transition::*;
    match (from, op, to) {
        (Transient, Fetch, Fetched) => true,
        (Transient, Unpack, Unpacked) => true,
        (Fetched, Unpack, Unpacked) => true,
        (Unpacked, Configure, Configured) => true,
        (Configured, Disfigure, Unpacked) => true,
        (Configured, Purge, Transient) => true,
        (Fetched, Purge, Transient) => true,
        (Unpacked, Purge, Transient) => true,
        (_, Fail, Broken) => true,
        _ => false,
    }
}

/// Validate and describe a transition as an error if illegal (spec §3).
pub fn check_transition(name: &str, from: PackageState, op: Transition, to: PackageState) -> Res<()> {
    if is_legal(from, op, to) {
        Ok(())
    } else {
        Err(ErrorKind::IllegalTransition(
            name.to_string(),
            state_name(from),
            state_name(to),
        )
        .into())
    }
}

fn state_name(s: PackageState) -> &'static str {
    match s {
        PackageState::Transient => "transient",
        PackageState::Fetched => "fetched",
        PackageState::Unpacked => "unpacked",
        PackageState::Configured => "configured",
        PackageState::Broken => "broken",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PackageState::*;
    use Transition::*;

    #[test]
    fn fetch_then_unpack_then_configure_is_legal() {
        assert!(is_legal(Transient, Fetch, Fetched));
        assert!(is_legal(Fetched, Unpack, Unpacked));
        assert!(is_legal(Unpacked, Configure, Configured));
    }

    #[test]
    fn configure_then_disfigure_returns_to_unpacked() {
        assert!(is_legal(Configured, Disfigure, Unpacked));
    }

    #[test]
    fn cannot_configure_straight_from_transient() {
        assert!(!is_legal(Transient, Configure, Configured));
    }

    #[test]
    fn any_state_can_fail_to_broken() {
        assert!(is_legal(Configured, Fail, Broken));
        assert!(is_legal(Fetched, Fail, Broken));
    }
}
