//! Atoll core types.
//!
//! A [`Region`] is a player-owned rectangular claim in the world. The outer
//! rectangle (island space) is used for coarse containment; the inner
//! protected area is where per-flag permission checks apply. Membership is a
//! map from player to [`Rank`], and every permission gate is a minimum rank.

pub mod flag;
pub mod id;
pub mod rank;
pub mod region;
pub mod settings;

pub use flag::FlagId;
pub use id::{PlayerId, RegionId};
pub use rank::Rank;
pub use region::Region;
pub use settings::Settings;
