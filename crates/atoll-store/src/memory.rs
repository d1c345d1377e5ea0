//! In-memory store.

use atoll_core::{Region, RegionId};
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::{RegionStore, StoreError, StoreResult};

/// A store that keeps every record in memory. Nothing survives a restart;
/// used by tests and throwaway servers.
#[derive(Default)]
pub struct MemoryStore {
    regions: Mutex<HashMap<RegionId, Region>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.lock().is_empty()
    }
}

impl RegionStore for MemoryStore {
    fn exists(&self, id: RegionId) -> bool {
        self.regions.lock().contains_key(&id)
    }

    fn load(&self, id: RegionId) -> StoreResult<Region> {
        self.regions
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn save(&self, region: &Region) -> StoreResult<()> {
        self.regions.lock().insert(region.id(), region.clone());
        Ok(())
    }

    fn delete(&self, id: RegionId) -> StoreResult<()> {
        self.regions.lock().remove(&id);
        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<Region>> {
        Ok(self.regions.lock().values().cloned().collect())
    }
}
