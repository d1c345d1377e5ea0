//! Rank ordering for region membership.

use serde::{Deserialize, Serialize};

/// A player's standing within a region's membership.
///
/// Ranks are a total order over an integer scale so that permission gates
/// can sit at arbitrary thresholds between the named levels. The named
/// constants satisfy `BANNED < VISITOR < MEMBER < OWNER`; anything below
/// [`Rank::VISITOR`] counts as disallowed when used as a flag threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(i32);

impl Rank {
    /// Banned from the region entirely.
    pub const BANNED: Self = Self(-1);
    /// Default standing of any player with no membership entry.
    pub const VISITOR: Self = Self(0);
    /// Full team member.
    pub const MEMBER: Self = Self(900);
    /// The region owner (team leader). Highest rank.
    pub const OWNER: Self = Self(1000);

    /// Create a rank at an arbitrary point on the scale.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw scale value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// True when this rank meets or exceeds `threshold`.
    #[must_use]
    pub const fn meets(self, threshold: Self) -> bool {
        self.0 >= threshold.0
    }
}

impl core::fmt::Display for Rank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::BANNED => f.write_str("banned"),
            Self::VISITOR => f.write_str("visitor"),
            Self::MEMBER => f.write_str("member"),
            Self::OWNER => f.write_str("owner"),
            Self(value) => write!(f, "rank({value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_ranks_are_ordered() {
        assert!(Rank::BANNED < Rank::VISITOR);
        assert!(Rank::VISITOR < Rank::MEMBER);
        assert!(Rank::MEMBER < Rank::OWNER);
    }

    #[test]
    fn test_meets_is_inclusive() {
        assert!(Rank::MEMBER.meets(Rank::MEMBER));
        assert!(Rank::OWNER.meets(Rank::MEMBER));
        assert!(!Rank::VISITOR.meets(Rank::MEMBER));
    }

    #[test]
    fn test_custom_ranks_sit_between_named_levels() {
        let trusted = Rank::new(500);
        assert!(trusted > Rank::VISITOR);
        assert!(trusted < Rank::MEMBER);
        assert_eq!(format!("{trusted}"), "rank(500)");
        assert_eq!(format!("{}", Rank::OWNER), "owner");
    }
}
