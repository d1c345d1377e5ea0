//! JSON file store: one `<region-id>.json` per region.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use atoll_core::{Region, RegionId};
use tracing::warn;

use crate::{RegionStore, StoreError, StoreResult};

/// A store backed by a directory of pretty-printed JSON files.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: RegionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl RegionStore for JsonStore {
    fn exists(&self, id: RegionId) -> bool {
        self.path_for(id).is_file()
    }

    fn load(&self, id: RegionId) -> StoreResult<Region> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, region: &Region) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(region)?;
        fs::write(self.path_for(region.id()), bytes)?;
        Ok(())
    }

    fn delete(&self, id: RegionId) -> StoreResult<()> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Scans the directory. Files that fail to decode are skipped with a
    /// warning rather than aborting the whole load; stray junk in the data
    /// directory must not take the server down.
    fn load_all(&self) -> StoreResult<Vec<Region>> {
        let mut regions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<Region>(&bytes) {
                Ok(region) => regions.push(region),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping undecodable region file");
                }
            }
        }
        Ok(regions)
    }
}
