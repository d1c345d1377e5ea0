//! Atoll spatial registry.
//!
//! Maps 2-D world coordinates to the owning region and keeps the
//! region-per-player index consistent with team membership. Point lookups
//! run in O(log W + log H) over the distinct grid keys via predecessor
//! searches on a two-level ordered map; overlap conflicts on insert are
//! detected deterministically and reported, never silently resolved.

pub mod grid;
pub mod registry;

pub use grid::{GridConflict, RegionGrid};
pub use registry::{InsertConflict, RegionRegistry};
