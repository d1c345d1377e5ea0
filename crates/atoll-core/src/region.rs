//! The region record: geometry, ownership, membership, and flags.

use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::{FlagId, PlayerId, Rank, RegionId};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// A player-owned rectangular claim ("island").
///
/// Two concentric rectangles share the anchor point `(center_x, center_z)`:
/// the island space (half-width `range`) used for coarse containment, and
/// the protected area (half-width `protection_range`, never larger) where
/// per-flag permission checks are enforced.
///
/// Geometry is fixed at creation; only membership, flags, and state booleans
/// mutate afterwards. Queries about unknown players never fail: a player with
/// no membership entry is a [`Rank::VISITOR`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    id: RegionId,
    center_x: i32,
    center_z: i32,
    range: i32,
    min_x: i32,
    min_z: i32,
    protection_range: i32,
    min_protected_x: i32,
    min_protected_z: i32,
    name: String,
    owner: Option<PlayerId>,
    members: HashMap<PlayerId, Rank>,
    flags: HashMap<FlagId, Rank>,
    locked: bool,
    spawn: bool,
    purge_protected: bool,
    created_ms: u64,
    updated_ms: u64,
}

impl Region {
    /// Create a region anchored at `(center_x, center_z)`.
    ///
    /// `protection_range` is clamped into `1..=range` so the protected area
    /// never outgrows the island space. The owner, if given, is promoted to
    /// [`Rank::OWNER`] immediately.
    #[must_use]
    pub fn new(
        center_x: i32,
        center_z: i32,
        owner: Option<PlayerId>,
        range: i32,
        protection_range: i32,
    ) -> Self {
        let range = range.max(1);
        let protection_range = protection_range.clamp(1, range);
        let now = now_ms();
        let mut region = Self {
            id: RegionId::random(),
            center_x,
            center_z,
            range,
            min_x: center_x - range,
            min_z: center_z - range,
            protection_range,
            min_protected_x: center_x - protection_range,
            min_protected_z: center_z - protection_range,
            name: String::new(),
            owner: None,
            members: HashMap::new(),
            flags: HashMap::new(),
            locked: false,
            spawn: false,
            purge_protected: false,
            created_ms: now,
            updated_ms: now,
        };
        region.set_owner(owner);
        region
    }

    /// Stable unique identifier.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Anchor x coordinate.
    #[must_use]
    pub const fn center_x(&self) -> i32 {
        self.center_x
    }

    /// Anchor z coordinate.
    #[must_use]
    pub const fn center_z(&self) -> i32 {
        self.center_z
    }

    /// Island-space half-width.
    #[must_use]
    pub const fn range(&self) -> i32 {
        self.range
    }

    /// Minimum x corner of the island space.
    #[must_use]
    pub const fn min_x(&self) -> i32 {
        self.min_x
    }

    /// Minimum z corner of the island space.
    #[must_use]
    pub const fn min_z(&self) -> i32 {
        self.min_z
    }

    /// Protected-area half-width.
    #[must_use]
    pub const fn protection_range(&self) -> i32 {
        self.protection_range
    }

    /// Minimum x corner of the protected area.
    #[must_use]
    pub const fn min_protected_x(&self) -> i32 {
        self.min_protected_x
    }

    /// Minimum z corner of the protected area.
    #[must_use]
    pub const fn min_protected_z(&self) -> i32 {
        self.min_protected_z
    }

    /// Current owner, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Display name (may be empty).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.touch();
    }

    #[must_use]
    pub const fn is_spawn(&self) -> bool {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: bool) {
        self.spawn = spawn;
        self.touch();
    }

    #[must_use]
    pub const fn is_purge_protected(&self) -> bool {
        self.purge_protected
    }

    pub fn set_purge_protected(&mut self, purge_protected: bool) {
        self.purge_protected = purge_protected;
        self.touch();
    }

    /// Creation time, milliseconds since the Unix epoch.
    #[must_use]
    pub const fn created_ms(&self) -> u64 {
        self.created_ms
    }

    /// Last update time, milliseconds since the Unix epoch.
    #[must_use]
    pub const fn updated_ms(&self) -> u64 {
        self.updated_ms
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_ms = now_ms();
    }

    // ---- membership ----

    /// The player's rank, or [`Rank::VISITOR`] when they have no entry.
    #[must_use]
    pub fn rank_of(&self, player: PlayerId) -> Rank {
        self.members.get(&player).copied().unwrap_or(Rank::VISITOR)
    }

    /// True iff the player's entry is exactly [`Rank::BANNED`].
    #[must_use]
    pub fn is_banned(&self, player: PlayerId) -> bool {
        self.members.get(&player) == Some(&Rank::BANNED)
    }

    /// Ban a player. A current member or even the owner is simply
    /// overwritten; banning twice is a no-op.
    pub fn ban(&mut self, player: PlayerId) {
        self.members.insert(player, Rank::BANNED);
        self.touch();
    }

    /// Lift a ban by dropping the membership entry. Unbanning a player who
    /// was never banned succeeds as a no-op.
    pub fn unban(&mut self, player: PlayerId) {
        self.members.remove(&player);
        self.touch();
    }

    /// Add a team member at [`Rank::MEMBER`]. A banned player is thereby
    /// unbanned.
    pub fn add_member(&mut self, player: PlayerId) {
        self.members.insert(player, Rank::MEMBER);
        self.touch();
    }

    /// Drop a player's membership entry entirely.
    pub fn remove_member(&mut self, player: PlayerId) {
        self.members.remove(&player);
        self.touch();
    }

    /// Set a player's rank to an arbitrary value.
    pub fn set_rank(&mut self, player: PlayerId, rank: Rank) {
        self.members.insert(player, rank);
        self.touch();
    }

    /// Reassign ownership.
    ///
    /// Any stale [`Rank::OWNER`] entry is demoted to [`Rank::MEMBER`] first,
    /// then the new owner's entry is promoted (created if absent), so exactly
    /// one entry holds the owner rank afterwards. `None` clears the owner
    /// field without touching member entries.
    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.owner = owner;
        let Some(owner) = owner else {
            return;
        };
        for rank in self.members.values_mut() {
            if *rank == Rank::OWNER {
                *rank = Rank::MEMBER;
            }
        }
        self.members.insert(owner, Rank::OWNER);
        self.touch();
    }

    /// Players at [`Rank::MEMBER`] or above, owner included.
    #[must_use]
    pub fn member_set(&self) -> HashSet<PlayerId> {
        self.members
            .iter()
            .filter(|(_, rank)| rank.meets(Rank::MEMBER))
            .map(|(player, _)| *player)
            .collect()
    }

    /// Players at [`Rank::BANNED`] or below.
    #[must_use]
    pub fn banned_set(&self) -> HashSet<PlayerId> {
        self.members
            .iter()
            .filter(|(_, rank)| **rank <= Rank::BANNED)
            .map(|(player, _)| *player)
            .collect()
    }

    /// Clear all membership entries and the owner field. Used when the team
    /// dissolves; geometry and flags are kept.
    pub fn clear_team(&mut self) {
        self.members.clear();
        self.owner = None;
        self.touch();
    }

    // ---- flags ----

    /// Minimum rank required for `flag`.
    ///
    /// An unset flag is defaulted to [`Rank::MEMBER`] and the default is
    /// stored, so the first read mutates the region and callers must persist
    /// afterwards. The `&mut` receiver keeps that side effect visible.
    pub fn flag_rank(&mut self, flag: &FlagId) -> Rank {
        *self
            .flags
            .entry(flag.clone())
            .or_insert(Rank::MEMBER)
    }

    /// Set the minimum rank for `flag`. A rank below [`Rank::VISITOR`]
    /// disables the action for everyone.
    pub fn set_flag(&mut self, flag: FlagId, rank: Rank) {
        self.flags.insert(flag, rank);
        self.touch();
    }

    /// Whether the flagged action is enabled at all on this region.
    pub fn is_allowed(&mut self, flag: &FlagId) -> bool {
        self.flag_rank(flag).meets(Rank::VISITOR)
    }

    /// Whether `player` meets the flag's rank threshold.
    pub fn is_player_allowed(&mut self, player: PlayerId, flag: &FlagId) -> bool {
        self.rank_of(player).meets(self.flag_rank(flag))
    }

    // ---- geometry ----

    /// Whether `(x, z)` lies in the island space (half-open bounds).
    #[must_use]
    pub const fn in_island_space(&self, x: i32, z: i32) -> bool {
        x >= self.min_x
            && x < self.min_x + self.range * 2
            && z >= self.min_z
            && z < self.min_z + self.range * 2
    }

    /// Whether `(x, z)` lies in the protected area (half-open bounds).
    #[must_use]
    pub const fn in_protected_area(&self, x: i32, z: i32) -> bool {
        x >= self.min_protected_x
            && x < self.min_protected_x + self.protection_range * 2
            && z >= self.min_protected_z
            && z < self.min_protected_z + self.protection_range * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::new(0, 0, Some(PlayerId::random()), 100, 50)
    }

    #[test]
    fn test_geometry_bounds_are_half_open() {
        let region = region();
        assert_eq!(region.min_x(), -100);
        assert_eq!(region.min_z(), -100);
        assert!(region.in_island_space(10, 10));
        assert!(region.in_island_space(-100, -100));
        assert!(!region.in_island_space(100, 0));
        assert!(!region.in_island_space(250, 250));

        assert!(region.in_protected_area(10, 10));
        assert!(region.in_protected_area(-50, 49));
        assert!(!region.in_protected_area(50, 0));
        assert!(!region.in_protected_area(99, 99));
    }

    #[test]
    fn test_protection_range_clamped_to_island_range() {
        let region = Region::new(0, 0, None, 100, 400);
        assert_eq!(region.protection_range(), 100);
        assert_eq!(region.min_protected_x(), -100);
    }

    #[test]
    fn test_unknown_player_is_visitor() {
        let region = region();
        let stranger = PlayerId::random();
        assert_eq!(region.rank_of(stranger), Rank::VISITOR);
        assert!(!region.is_banned(stranger));
    }

    #[test]
    fn test_set_owner_demotes_previous_owner() {
        let first = PlayerId::random();
        let second = PlayerId::random();
        let mut region = Region::new(0, 0, Some(first), 100, 50);

        region.set_owner(Some(second));
        assert_eq!(region.owner(), Some(second));
        assert_eq!(region.rank_of(first), Rank::MEMBER);
        assert_eq!(region.rank_of(second), Rank::OWNER);

        // Idempotent: repeating leaves exactly one owner-ranked entry.
        region.set_owner(Some(second));
        let owners: Vec<_> = region
            .member_set()
            .into_iter()
            .filter(|p| region.rank_of(*p) == Rank::OWNER)
            .collect();
        assert_eq!(owners, vec![second]);
    }

    #[test]
    fn test_set_owner_none_keeps_member_entries() {
        let owner = PlayerId::random();
        let mut region = Region::new(0, 0, Some(owner), 100, 50);
        region.set_owner(None);
        assert_eq!(region.owner(), None);
        // The stale entry is untouched; dissolving a team goes through
        // clear_team instead.
        assert_eq!(region.rank_of(owner), Rank::OWNER);
    }

    #[test]
    fn test_ban_round_trip() {
        let mut region = region();
        let target = PlayerId::random();

        region.ban(target);
        assert!(region.is_banned(target));
        region.ban(target);
        assert!(region.is_banned(target));

        region.unban(target);
        assert!(!region.is_banned(target));
        // Unbanning a never-banned player is a no-op success.
        region.unban(PlayerId::random());
    }

    #[test]
    fn test_ban_overwrites_member_rank() {
        let mut region = region();
        let member = PlayerId::random();
        region.add_member(member);
        region.ban(member);
        assert!(region.is_banned(member));
        assert!(!region.member_set().contains(&member));
        assert!(region.banned_set().contains(&member));
    }

    #[test]
    fn test_flag_first_read_sets_member_default() {
        let mut region = region();
        assert_eq!(region.flag_rank(&crate::flag::PVP), Rank::MEMBER);
        region.set_flag(crate::flag::PVP, Rank::VISITOR);
        assert_eq!(region.flag_rank(&crate::flag::PVP), Rank::VISITOR);
    }

    #[test]
    fn test_negative_flag_rank_disables_action() {
        let mut region = region();
        region.set_flag(crate::flag::PVP, Rank::new(-2));
        assert!(!region.is_allowed(&crate::flag::PVP));
        // Untouched flags stay enabled via the MEMBER default.
        assert!(region.is_allowed(&crate::flag::BREAK_BLOCKS));
    }

    #[test]
    fn test_is_player_allowed_is_monotonic_in_rank() {
        let mut region = region();
        let visitor = PlayerId::random();
        let member = PlayerId::random();
        region.add_member(member);

        for flag in [crate::flag::BREAK_BLOCKS, crate::flag::OPEN_CONTAINERS] {
            if region.is_player_allowed(visitor, &flag) {
                assert!(region.is_player_allowed(member, &flag));
            }
        }
        assert!(region.is_player_allowed(member, &crate::flag::BREAK_BLOCKS));
        assert!(!region.is_player_allowed(visitor, &crate::flag::BREAK_BLOCKS));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut region = region();
        region.set_name("home");
        region.ban(PlayerId::random());
        let json = serde_json::to_string(&region).unwrap();
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), region.id());
        assert_eq!(back.owner(), region.owner());
        assert_eq!(back.min_x(), region.min_x());
        assert_eq!(back.member_set(), region.member_set());
        assert_eq!(back.banned_set(), region.banned_set());
    }
}
