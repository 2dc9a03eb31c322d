//! Regions: disjoint clusters of chunks ticked as one unit.

use std::fmt;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{ChunkKey, ChunkSet};

/// Index of a region within one tick's batch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

impl RegionId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region#{}", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cluster of chunks plus the entities standing in them.
///
/// Regions built in the same tick never share a chunk key, so each one can be
/// handed to its own worker without locking world state.
pub struct Region<E> {
    pub id: RegionId,
    pub chunks: ChunkSet,
    /// Entities assigned to this region (filled by entity assignment).
    pub entities: Vec<E>,
}

impl<E> Region<E> {
    /// Create a region with no entities.
    #[must_use]
    pub fn new(id: RegionId, chunks: ChunkSet) -> Self {
        Self {
            id,
            chunks,
            entities: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains(&key)
    }

    /// Number of chunk keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// A region with no chunk keys has nothing to tick.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl<E> fmt::Debug for Region<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("chunks", &self.chunks.len())
            .field("entities", &self.entities.len())
            .finish()
    }
}

/// Chunk key → owning region lookup.
#[derive(Default)]
pub struct RegionIndex {
    map: HashMap<ChunkKey, RegionId, FxBuildHasher>,
}

impl RegionIndex {
    /// Build the lookup for a set of disjoint regions.
    #[must_use]
    pub fn build<E>(regions: &[Region<E>], capacity: usize) -> Self {
        let mut map = HashMap::with_capacity_and_hasher(capacity, FxBuildHasher);
        for region in regions {
            for &key in &region.chunks {
                map.insert(key, region.id);
            }
        }
        Self { map }
    }

    /// Region covering `key`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, key: ChunkKey) -> Option<RegionId> {
        self.map.get(&key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
