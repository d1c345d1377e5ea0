//! Two-level ordered grid keyed by a region's minimum corner.

use std::collections::BTreeMap;

use atoll_core::RegionId;

/// An occupied grid slot. Carries the incumbent so callers can produce a
/// report naming both parties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConflict {
    /// Region already registered at the slot.
    pub incumbent: RegionId,
    /// Contested minimum x corner.
    pub min_x: i32,
    /// Contested minimum z corner.
    pub min_z: i32,
}

/// Ordered index from `(min_x, min_z)` corners to regions.
///
/// Rows are keyed by `min_x`, columns within a row by `min_z`. A point
/// lookup takes the floor row for `x` and the floor column for `z` inside
/// it; that double-floor entry is the only candidate that can contain the
/// point when regions do not overlap, but it is a candidate only — callers
/// must still confirm containment against the region's own bounds.
#[derive(Debug, Default)]
pub struct RegionGrid {
    rows: BTreeMap<i32, BTreeMap<i32, RegionId>>,
    len: usize,
}

impl RegionGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` at its minimum corner.
    ///
    /// An occupied slot is never overwritten: the losing region is rejected
    /// with a [`GridConflict`] and the index is unchanged.
    pub fn insert(&mut self, min_x: i32, min_z: i32, id: RegionId) -> Result<(), GridConflict> {
        let row = self.rows.entry(min_x).or_default();
        if let Some(&incumbent) = row.get(&min_z) {
            return Err(GridConflict {
                incumbent,
                min_x,
                min_z,
            });
        }
        row.insert(min_z, id);
        self.len += 1;
        Ok(())
    }

    /// Predecessor search: the entry with the greatest `min_x <= x`, then
    /// within that row the greatest `min_z <= z`.
    #[must_use]
    pub fn floor(&self, x: i32, z: i32) -> Option<RegionId> {
        let (_, row) = self.rows.range(..=x).next_back()?;
        let (_, &id) = row.range(..=z).next_back()?;
        Some(id)
    }

    /// Remove the entry at exactly `(min_x, min_z)`, pruning the row if it
    /// becomes empty.
    pub fn remove(&mut self, min_x: i32, min_z: i32) -> Option<RegionId> {
        let row = self.rows.get_mut(&min_x)?;
        let removed = row.remove(&min_z)?;
        if row.is_empty() {
            self.rows.remove(&min_x);
        }
        self.len -= 1;
        Some(removed)
    }

    /// Number of registered corners.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.len = 0;
    }
}
