//! Region persistence.
//!
//! The registry never serializes regions itself; it talks to a
//! [`RegionStore`]. Two implementations ship here: [`MemoryStore`] for tests
//! and ephemeral servers, and [`JsonStore`] keeping one JSON file per region.

mod error;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::JsonStore;
pub use memory::MemoryStore;

use atoll_core::{Region, RegionId};

/// Durable storage for region records.
///
/// Implementations take `&self`; they are expected to synchronize
/// internally so the registry can call them from its critical section
/// without holding storage locks.
pub trait RegionStore: Send + Sync {
    /// Whether a record exists for `id`.
    fn exists(&self, id: RegionId) -> bool;

    /// Load one region.
    fn load(&self, id: RegionId) -> StoreResult<Region>;

    /// Write a region, replacing any previous record.
    fn save(&self, region: &Region) -> StoreResult<()>;

    /// Remove a region's record. Deleting an absent record is a no-op.
    fn delete(&self, id: RegionId) -> StoreResult<()>;

    /// Load every stored region. Called once at startup to populate the
    /// registry.
    fn load_all(&self) -> StoreResult<Vec<Region>>;
}
