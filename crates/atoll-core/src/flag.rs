//! Permission flags.
//!
//! A flag names an action that can happen inside a region's protected area.
//! Each region stores the minimum [`Rank`](crate::Rank) required to perform
//! the action; a negative threshold disables the action for everyone.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Identifier for a permission gate on a region.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagId(Cow<'static, str>);

/// Only owners/members may break blocks.
pub const BREAK_BLOCKS: FlagId = FlagId(Cow::Borrowed("break-blocks"));
/// Only owners/members may place blocks.
pub const PLACE_BLOCKS: FlagId = FlagId(Cow::Borrowed("place-blocks"));
/// Gate on opening containers.
pub const OPEN_CONTAINERS: FlagId = FlagId(Cow::Borrowed("open-containers"));
/// Gate on player-versus-player combat.
pub const PVP: FlagId = FlagId(Cow::Borrowed("pvp"));

impl FlagId {
    /// Create a flag id from an arbitrary name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The flag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FlagId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl core::fmt::Display for FlagId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_and_owned_ids_compare_by_name() {
        assert_eq!(BREAK_BLOCKS, FlagId::new("break-blocks"));
        assert_ne!(BREAK_BLOCKS, PLACE_BLOCKS);
        assert_eq!(PVP.as_str(), "pvp");
    }
}
