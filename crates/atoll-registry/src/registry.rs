//! The region registry: authoritative region collection plus three indices.

use atoll_core::{PlayerId, Region, RegionId};
use atoll_store::{RegionStore, StoreResult};
use hashbrown::{HashMap, HashSet};
use thiserror::Error;
use tracing::{error, warn};

/// Structured report for a rejected insert: two regions claimed the same
/// grid slot. Non-fatal; the losing record is expected to be corrected or
/// removed out-of-band.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "region at ({denied_x}, {denied_z}) conflicts with accepted region at ({incumbent_x}, {incumbent_z})"
)]
pub struct InsertConflict {
    /// The rejected region.
    pub denied: RegionId,
    pub denied_owner: Option<PlayerId>,
    pub denied_x: i32,
    pub denied_z: i32,
    /// The region that keeps the slot.
    pub incumbent: RegionId,
    pub incumbent_owner: Option<PlayerId>,
    pub incumbent_x: i32,
    pub incumbent_z: i32,
}

/// Owns every region and keeps three indices consistent:
///
/// 1. anchor point → region (bijective),
/// 2. player → region (owners and members; at most one region per player),
/// 3. the ordered [`RegionGrid`](crate::RegionGrid) for point containment.
///
/// This is a plain value with `&mut` mutation; callers serialize writes
/// (a single `RwLock` around the registry is the intended discipline —
/// geometry is immutable after creation, so readers never observe a
/// half-moved region).
#[derive(Debug, Default)]
pub struct RegionRegistry {
    regions: HashMap<RegionId, Region>,
    by_center: HashMap<(i32, i32), RegionId>,
    by_player: HashMap<PlayerId, RegionId>,
    grid: crate::RegionGrid,
}

impl RegionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region in all three indices.
    ///
    /// If the grid slot or the anchor point is already taken the region is
    /// rejected: nothing is registered, the conflict is logged, and the
    /// report names both parties. Existing lookups are unaffected.
    pub fn insert(&mut self, region: Region) -> Result<RegionId, InsertConflict> {
        let id = region.id();
        let slot_holder = match self.grid.insert(region.min_x(), region.min_z(), id) {
            Ok(()) => None,
            Err(conflict) => Some(conflict.incumbent),
        };
        let incumbent_id =
            slot_holder.or_else(|| self.by_center.get(&(region.center_x(), region.center_z())).copied());

        if let Some(incumbent_id) = incumbent_id {
            if slot_holder.is_none() {
                // Anchor collision with a different corner: undo the grid entry.
                self.grid.remove(region.min_x(), region.min_z());
            }
            let incumbent = self.regions.get(&incumbent_id);
            if incumbent.is_none() {
                error!(region = %incumbent_id, "grid slot holder missing from the registry");
            }
            let conflict = InsertConflict {
                denied: id,
                denied_owner: region.owner(),
                denied_x: region.center_x(),
                denied_z: region.center_z(),
                incumbent: incumbent_id,
                incumbent_owner: incumbent.and_then(Region::owner),
                incumbent_x: incumbent.map_or(region.min_x(), Region::center_x),
                incumbent_z: incumbent.map_or(region.min_z(), Region::center_z),
            };
            warn!(
                denied = %conflict.denied,
                denied_owner = ?conflict.denied_owner,
                incumbent = %conflict.incumbent,
                incumbent_owner = ?conflict.incumbent_owner,
                "duplicate or overlapping regions: {conflict}"
            );
            return Err(conflict);
        }

        self.by_center
            .insert((region.center_x(), region.center_z()), id);
        if let Some(owner) = region.owner() {
            self.by_player.insert(owner, id);
        }
        for member in region.member_set() {
            self.by_player.insert(member, id);
        }
        self.regions.insert(id, region);
        Ok(id)
    }

    /// The region whose island space contains `(x, z)`, if any.
    ///
    /// The grid's double-floor entry is only a candidate; containment is
    /// confirmed before returning, so a near-miss on one axis never yields
    /// a false positive.
    #[must_use]
    pub fn lookup_at(&self, x: i32, z: i32) -> Option<&Region> {
        let id = self.grid.floor(x, z)?;
        let region = self.regions.get(&id)?;
        region.in_island_space(x, z).then_some(region)
    }

    /// The region this player owns or belongs to.
    #[must_use]
    pub fn lookup_player(&self, player: PlayerId) -> Option<&Region> {
        self.regions.get(self.by_player.get(&player)?)
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Mutable access for membership/flag edits. Geometry must not change.
    #[must_use]
    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    /// Mutable access to the region a player owns or belongs to.
    #[must_use]
    pub fn lookup_player_mut(&mut self, player: PlayerId) -> Option<&mut Region> {
        let id = *self.by_player.get(&player)?;
        self.regions.get_mut(&id)
    }

    /// True when the player maps to a region they own themselves.
    #[must_use]
    pub fn has_island(&self, player: PlayerId) -> bool {
        self.lookup_player(player)
            .is_some_and(|region| region.owner() == Some(player))
    }

    /// The owner of the player's team, if the player has one.
    #[must_use]
    pub fn owner_of_team(&self, player: PlayerId) -> Option<PlayerId> {
        self.lookup_player(player)?.owner()
    }

    /// Member set of the player's region; empty when they have none.
    #[must_use]
    pub fn members_of(&self, player: PlayerId) -> HashSet<PlayerId> {
        self.lookup_player(player)
            .map(Region::member_set)
            .unwrap_or_default()
    }

    /// Bind a player to a region in the player index without touching the
    /// region's own membership map.
    pub fn attach_player(&mut self, player: PlayerId, id: RegionId) {
        self.by_player.insert(player, id);
    }

    /// Drop a player from the player index only.
    pub fn detach_player(&mut self, player: PlayerId) {
        self.by_player.remove(&player);
    }

    /// Remove a player from their team.
    ///
    /// An owner leaving dissolves the team: the region's membership map and
    /// owner field are cleared. A plain member is just dropped. Returns the
    /// affected region id so the caller can persist it.
    pub fn remove_player(&mut self, player: PlayerId) -> Option<RegionId> {
        let id = self.by_player.remove(&player)?;
        if let Some(region) = self.regions.get_mut(&id) {
            if region.owner() == Some(player) {
                region.clear_team();
            } else {
                region.remove_member(player);
            }
        }
        Some(id)
    }

    /// Remove a region from every index.
    ///
    /// Ownership and membership are cleared on the returned record as a
    /// defensive reset. An index that should have held the region but did
    /// not is a consistency fault and is logged loudly, not papered over.
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let Some(mut region) = self.regions.remove(&id) else {
            error!(region = %id, "attempted to remove a region not in the registry");
            return None;
        };
        if self
            .by_center
            .remove(&(region.center_x(), region.center_z()))
            .is_none()
        {
            error!(region = %id, "region missing from the anchor index");
        }
        if self.grid.remove(region.min_x(), region.min_z()).is_none() {
            error!(region = %id, "region missing from the grid index");
        }
        self.by_player.retain(|_, bound| *bound != id);
        if region.owner().is_some() {
            region.clear_team();
        }
        Some(region)
    }

    /// Populate the registry from the store at startup. Regions whose grid
    /// slot is already claimed are skipped (and reported by `insert`);
    /// returns how many were accepted.
    pub fn populate(&mut self, store: &dyn RegionStore) -> StoreResult<usize> {
        let mut accepted = 0;
        for region in store.load_all()? {
            if self.insert(region).is_ok() {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.by_center.clear();
        self.by_player.clear();
        self.grid.clear();
    }
}
