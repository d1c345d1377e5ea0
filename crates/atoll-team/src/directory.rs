//! Player directory: the membership and rank service façade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use atoll_core::{PlayerId, Rank, Region, RegionId, Settings};
use atoll_registry::{InsertConflict, RegionRegistry};
use atoll_store::{RegionStore, StoreResult};
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::Notifier;

/// Why a region claim was refused. Validation failures, never fatal.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The player already owns a region.
    #[error("player already has an island")]
    AlreadyHasIsland,
    /// The chosen anchor collides with an existing region.
    #[error(transparent)]
    Conflict(#[from] InsertConflict),
}

/// Per-player bookkeeping, materialized on first reference.
struct PlayerRecord {
    resets_left: i32,
    ban_bypass: bool,
    invite_cooldowns: HashMap<(i32, i32), Instant>,
}

impl PlayerRecord {
    fn new(settings: &Settings) -> Self {
        Self {
            resets_left: settings.reset_limit,
            ban_bypass: false,
            invite_cooldowns: HashMap::new(),
        }
    }
}

struct Shared {
    registry: RwLock<RegionRegistry>,
    players: Mutex<HashMap<PlayerId, PlayerRecord>>,
    store: Arc<dyn RegionStore>,
    notifier: Arc<dyn Notifier>,
    settings: Settings,
}

/// One-stop shop for player and team state.
///
/// Cheap to clone; clones share the registry, the player table, and the
/// collaborators. The registry sits behind a `RwLock` so reads run
/// concurrently while every mutation serializes (the registry itself is a
/// plain value). Persistence is fire-and-forget: a failed save is logged
/// and does not roll back the in-memory mutation.
///
/// Every query for an unknown player materializes a default record first;
/// the side effect is deliberate and [`Self::ensure_player`] exposes it
/// directly. All mutating calls are idempotent under repetition.
#[derive(Clone)]
pub struct PlayerDirectory {
    shared: Arc<Shared>,
}

impl PlayerDirectory {
    /// Build a directory around an already-populated registry.
    #[must_use]
    pub fn new(
        registry: RegionRegistry,
        store: Arc<dyn RegionStore>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: RwLock::new(registry),
                players: Mutex::new(HashMap::new()),
                store,
                notifier,
                settings,
            }),
        }
    }

    /// Load every stored region and build the directory. The one startup
    /// call to the store; duplicate-corner records are skipped with a
    /// conflict report.
    pub fn open(
        store: Arc<dyn RegionStore>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> StoreResult<Self> {
        let mut registry = RegionRegistry::new();
        let accepted = registry.populate(store.as_ref())?;
        info!(regions = accepted, "region registry populated");
        Ok(Self::new(registry, store, notifier, settings))
    }

    /// Write every region back and drop all in-memory state.
    pub fn close(&self) -> StoreResult<()> {
        self.save_all()?;
        self.shared.registry.write().clear();
        self.shared.players.lock().clear();
        Ok(())
    }

    /// Save every region, propagating the first failure.
    pub fn save_all(&self) -> StoreResult<()> {
        let registry = self.shared.registry.read();
        for region in registry.iter() {
            self.shared.store.save(region)?;
        }
        Ok(())
    }

    /// Configuration the directory was opened with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.shared.notifier.as_ref()
    }

    /// Display name, resolved by the notification collaborator.
    #[must_use]
    pub fn name_of(&self, player: PlayerId) -> String {
        self.shared.notifier.name_of(player)
    }

    /// Run a closure under the registry read lock.
    pub fn with_regions<R>(&self, f: impl FnOnce(&RegionRegistry) -> R) -> R {
        f(&self.shared.registry.read())
    }

    /// Run a closure under the registry write lock. Mutations to region
    /// records made here are the caller's to persist.
    pub fn with_regions_mut<R>(&self, f: impl FnOnce(&mut RegionRegistry) -> R) -> R {
        f(&mut self.shared.registry.write())
    }

    // ---- player records ----

    fn with_record<R>(&self, player: PlayerId, f: impl FnOnce(&mut PlayerRecord) -> R) -> R {
        let mut players = self.shared.players.lock();
        let record = players
            .entry(player)
            .or_insert_with(|| PlayerRecord::new(&self.shared.settings));
        f(record)
    }

    /// Materialize the player's record if it does not exist yet. The
    /// get-or-insert-default that every read-through query performs.
    pub fn ensure_player(&self, player: PlayerId) {
        self.with_record(player, |_| ());
    }

    /// Whether a record has been materialized for this player.
    #[must_use]
    pub fn is_known(&self, player: PlayerId) -> bool {
        self.shared.players.lock().contains_key(&player)
    }

    /// Island resets the player has left.
    #[must_use]
    pub fn resets_left(&self, player: PlayerId) -> i32 {
        self.with_record(player, |record| record.resets_left)
    }

    pub fn set_resets_left(&self, player: PlayerId, resets: i32) {
        self.with_record(player, |record| record.resets_left = resets);
    }

    /// Reset-limit policy: restore every known player to `limit` resets.
    pub fn clear_resets(&self, limit: i32) {
        for record in self.shared.players.lock().values_mut() {
            record.resets_left = limit;
        }
    }

    /// Grant or revoke the ban-bypass privilege.
    pub fn set_ban_bypass(&self, player: PlayerId, bypass: bool) {
        self.with_record(player, |record| record.ban_bypass = bypass);
    }

    /// Start the re-invitation cooldown for an island anchor. Called when
    /// the player leaves or is kicked from the team there.
    pub fn start_invite_cooldown(&self, player: PlayerId, center: (i32, i32)) {
        self.with_record(player, |record| {
            record.invite_cooldowns.insert(center, Instant::now());
        });
    }

    /// Time left before the player may be re-invited to the island at
    /// `center`, or `None` once the cooldown has lapsed (expired entries
    /// are dropped on read).
    pub fn invite_cooldown_remaining(
        &self,
        player: PlayerId,
        center: (i32, i32),
    ) -> Option<Duration> {
        let cooldown = self.shared.settings.invite_cooldown();
        self.with_record(player, |record| {
            let started = record.invite_cooldowns.get(&center)?;
            let remaining = cooldown
                .checked_sub(started.elapsed())
                .filter(|left| !left.is_zero());
            if remaining.is_none() {
                record.invite_cooldowns.remove(&center);
            }
            remaining
        })
    }

    // ---- team queries ----

    /// True when the player owns a region themselves.
    #[must_use]
    pub fn has_island(&self, player: PlayerId) -> bool {
        self.ensure_player(player);
        self.shared.registry.read().has_island(player)
    }

    /// True when the player's region has more than one member.
    #[must_use]
    pub fn in_team(&self, player: PlayerId) -> bool {
        self.ensure_player(player);
        self.shared.registry.read().members_of(player).len() > 1
    }

    /// Owner of the player's team, if any.
    #[must_use]
    pub fn team_owner(&self, player: PlayerId) -> Option<PlayerId> {
        self.ensure_player(player);
        self.shared.registry.read().owner_of_team(player)
    }

    // ---- membership & rank mutations ----

    /// Ban `target` from the actor's region. `false` when the actor has no
    /// region; re-banning is a no-op success.
    pub fn ban(&self, actor: PlayerId, target: PlayerId) -> bool {
        self.ensure_player(actor);
        self.ensure_player(target);
        let snapshot = {
            let mut registry = self.shared.registry.write();
            let Some(region) = registry.lookup_player_mut(actor) else {
                return false;
            };
            region.ban(target);
            region.clone()
        };
        self.persist(&snapshot);
        true
    }

    /// Lift a ban on the actor's region. `false` when the actor has no
    /// region; unbanning a never-banned player is a no-op success.
    pub fn unban(&self, actor: PlayerId, target: PlayerId) -> bool {
        self.ensure_player(actor);
        self.ensure_player(target);
        let snapshot = {
            let mut registry = self.shared.registry.write();
            let Some(region) = registry.lookup_player_mut(actor) else {
                return false;
            };
            region.unban(target);
            region.clone()
        };
        self.persist(&snapshot);
        true
    }

    /// Whether `target` is banned from the actor's region. Short-circuits
    /// `false` when the target holds the bypass privilege or the actor has
    /// no region.
    #[must_use]
    pub fn is_banned(&self, actor: PlayerId, target: PlayerId) -> bool {
        self.ensure_player(actor);
        if self.with_record(target, |record| record.ban_bypass) {
            return false;
        }
        self.shared
            .registry
            .read()
            .lookup_player(actor)
            .is_some_and(|region| region.is_banned(target))
    }

    /// The target's rank on the actor's region; VISITOR when the actor has
    /// no region at all.
    #[must_use]
    pub fn rank_of(&self, actor: PlayerId, target: PlayerId) -> Rank {
        self.ensure_player(actor);
        self.shared
            .registry
            .read()
            .lookup_player(actor)
            .map_or(Rank::VISITOR, |region| region.rank_of(target))
    }

    /// Set the target's rank on the actor's region. `false` when the actor
    /// has no region.
    pub fn set_rank(&self, actor: PlayerId, target: PlayerId, rank: Rank) -> bool {
        self.ensure_player(actor);
        self.ensure_player(target);
        let snapshot = {
            let mut registry = self.shared.registry.write();
            let Some(region) = registry.lookup_player_mut(actor) else {
                return false;
            };
            region.set_rank(target, rank);
            region.clone()
        };
        self.persist(&snapshot);
        true
    }

    /// Remove the player from their team and start the re-invitation
    /// cooldown for that island. `false` when they had no team region.
    pub fn remove_from_team(&self, player: PlayerId) -> bool {
        self.ensure_player(player);
        let snapshot;
        let center;
        {
            let mut registry = self.shared.registry.write();
            let Some(region) = registry.lookup_player(player) else {
                return false;
            };
            center = (region.center_x(), region.center_z());
            let Some(id) = registry.remove_player(player) else {
                return false;
            };
            snapshot = registry.region(id).cloned();
        }
        if let Some(region) = &snapshot {
            self.persist(region);
        }
        self.start_invite_cooldown(player, center);
        true
    }

    // ---- region lifecycle ----

    /// Claim a new region anchored at `(center_x, center_z)`, with geometry
    /// from the configured distance and protection range.
    pub fn claim(
        &self,
        player: PlayerId,
        center_x: i32,
        center_z: i32,
    ) -> Result<RegionId, ClaimError> {
        self.ensure_player(player);
        let snapshot;
        let id;
        {
            let mut registry = self.shared.registry.write();
            if registry.has_island(player) {
                return Err(ClaimError::AlreadyHasIsland);
            }
            let region = Region::new(
                center_x,
                center_z,
                Some(player),
                self.shared.settings.island_distance,
                self.shared.settings.protection_range,
            );
            id = registry.insert(region)?;
            snapshot = registry.region(id).cloned();
        }
        if let Some(region) = &snapshot {
            self.persist(region);
        }
        Ok(id)
    }

    /// Delete the owner's region from the registry and the store. World
    /// terrain is untouched. `false` when the player owns nothing.
    pub fn purge(&self, owner: PlayerId) -> bool {
        self.ensure_player(owner);
        let removed = {
            let mut registry = self.shared.registry.write();
            let Some(id) = registry
                .lookup_player(owner)
                .filter(|region| region.owner() == Some(owner))
                .map(Region::id)
            else {
                return false;
            };
            registry.remove(id)
        };
        let Some(region) = removed else {
            return false;
        };
        if let Err(err) = self.shared.store.delete(region.id()) {
            warn!(region = %region.id(), %err, "failed to delete region record");
        }
        true
    }

    fn persist(&self, region: &Region) {
        if let Err(err) = self.shared.store.save(region) {
            warn!(region = %region.id(), %err, "failed to save region");
        }
    }
}

#[cfg(test)]
mod tests {
    use atoll_store::MemoryStore;

    use crate::RecordingNotifier;

    use super::*;

    fn directory(settings: Settings) -> (PlayerDirectory, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let directory =
            PlayerDirectory::new(RegionRegistry::new(), store.clone(), notifier, settings);
        (directory, store)
    }

    #[test]
    fn test_records_materialize_on_first_reference() {
        let (directory, _) = directory(Settings::default());
        let player = PlayerId::random();

        assert!(!directory.is_known(player));
        assert_eq!(directory.resets_left(player), 2);
        assert!(directory.is_known(player));
    }

    #[test]
    fn test_reset_bookkeeping() {
        let (directory, _) = directory(Settings::default());
        let a = PlayerId::random();
        let b = PlayerId::random();

        directory.set_resets_left(a, 0);
        directory.ensure_player(b);
        directory.clear_resets(5);
        assert_eq!(directory.resets_left(a), 5);
        assert_eq!(directory.resets_left(b), 5);
    }

    #[test]
    fn test_claim_then_queries() {
        let (directory, store) = directory(Settings::default());
        let owner = PlayerId::random();

        let id = directory.claim(owner, 0, 0).unwrap();
        assert!(directory.has_island(owner));
        assert!(!directory.in_team(owner));
        assert_eq!(directory.team_owner(owner), Some(owner));
        assert!(store.exists(id));

        assert!(matches!(
            directory.claim(owner, 1000, 1000),
            Err(ClaimError::AlreadyHasIsland)
        ));
        let other = PlayerId::random();
        assert!(matches!(
            directory.claim(other, 0, 0),
            Err(ClaimError::Conflict(_))
        ));
    }

    #[test]
    fn test_ban_unban_and_bypass() {
        let (directory, _) = directory(Settings::default());
        let owner = PlayerId::random();
        let target = PlayerId::random();

        // No region yet: validation failure, nothing changes.
        assert!(!directory.ban(owner, target));
        assert!(!directory.is_banned(owner, target));

        directory.claim(owner, 0, 0).unwrap();
        assert!(directory.ban(owner, target));
        assert!(directory.ban(owner, target));
        assert!(directory.is_banned(owner, target));

        directory.set_ban_bypass(target, true);
        assert!(!directory.is_banned(owner, target));
        directory.set_ban_bypass(target, false);
        assert!(directory.is_banned(owner, target));

        assert!(directory.unban(owner, target));
        assert!(!directory.is_banned(owner, target));
        assert!(directory.unban(owner, target));
    }

    #[test]
    fn test_rank_read_write() {
        let (directory, _) = directory(Settings::default());
        let owner = PlayerId::random();
        let member = PlayerId::random();

        assert_eq!(directory.rank_of(owner, member), Rank::VISITOR);
        directory.claim(owner, 0, 0).unwrap();
        assert!(directory.set_rank(owner, member, Rank::MEMBER));
        assert_eq!(directory.rank_of(owner, member), Rank::MEMBER);
        assert_eq!(directory.rank_of(owner, owner), Rank::OWNER);
    }

    #[test]
    fn test_remove_from_team_starts_cooldown() {
        let (directory, _) = directory(Settings::default());
        let owner = PlayerId::random();
        let member = PlayerId::random();

        directory.claim(owner, 0, 0).unwrap();
        directory.with_regions_mut(|registry| {
            let id = registry.lookup_player(owner).map(Region::id).unwrap();
            registry.region_mut(id).unwrap().add_member(member);
            registry.attach_player(member, id);
        });
        assert!(directory.in_team(owner));

        assert!(directory.remove_from_team(member));
        assert!(!directory.in_team(owner));
        let remaining = directory.invite_cooldown_remaining(member, (0, 0));
        assert!(remaining.is_some_and(|left| left <= Duration::from_secs(3600)));
        // No team region: nothing to leave.
        assert!(!directory.remove_from_team(member));
    }

    #[test]
    fn test_cooldown_expires_with_zero_duration() {
        let settings = Settings {
            invite_cooldown_secs: 0,
            ..Settings::default()
        };
        let (directory, _) = directory(settings);
        let player = PlayerId::random();

        directory.start_invite_cooldown(player, (0, 0));
        assert_eq!(directory.invite_cooldown_remaining(player, (0, 0)), None);
        // Unknown anchors never have a cooldown.
        assert_eq!(directory.invite_cooldown_remaining(player, (99, 99)), None);
    }

    #[test]
    fn test_purge_removes_registry_and_store() {
        let (directory, store) = directory(Settings::default());
        let owner = PlayerId::random();
        let member = PlayerId::random();

        let id = directory.claim(owner, 0, 0).unwrap();
        assert!(!directory.purge(member));
        assert!(directory.purge(owner));
        assert!(!store.exists(id));
        assert!(!directory.has_island(owner));
        assert!(directory.with_regions(RegionRegistry::is_empty));
        assert!(!directory.purge(owner));
    }

    #[test]
    fn test_open_and_close_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let owner = PlayerId::random();
        store
            .save(&Region::new(0, 0, Some(owner), 200, 100))
            .unwrap();

        let directory =
            PlayerDirectory::open(store.clone(), notifier, Settings::default()).unwrap();
        assert!(directory.has_island(owner));

        directory.close().unwrap();
        assert!(directory.with_regions(RegionRegistry::is_empty));
        assert_eq!(store.len(), 1);
    }
}
