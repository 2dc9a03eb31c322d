//! Entity assignment: one pass over the tracked entities per tick.

use rct_spatial::{Region, RegionIndex};

use crate::tracked::{EntitySource, GuardedIter};
use crate::world::TickEntity;

/// Everything one tick will process.
///
/// Built fresh every tick and consumed by it.
pub struct TickBatch<E> {
    /// Disjoint regions with their entities.
    pub regions: Vec<Region<E>>,
    /// Entities whose chunk is in no region.
    pub unassigned: Vec<E>,
}

impl<E> TickBatch<E> {
    /// Total entities across all regions.
    #[must_use]
    pub fn region_entities(&self) -> usize {
        self.regions.iter().map(|r| r.entities.len()).sum()
    }
}

impl<E> Default for TickBatch<E> {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            unassigned: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for TickBatch<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickBatch")
            .field("regions", &self.regions)
            .field("unassigned", &self.unassigned.len())
            .finish()
    }
}

/// Put every tracked entity into the region covering its chunk, or into
/// `unassigned`.
///
/// Runs on the calling thread: the source only allows one traversal at a
/// time. No entity is dropped.
pub fn assign_entities<E, S>(
    mut regions: Vec<Region<E>>,
    index: &RegionIndex,
    source: &S,
) -> TickBatch<E>
where
    E: TickEntity,
    S: EntitySource<E> + ?Sized,
{
    let mut unassigned = Vec::new();
    let mut iter = source.iter_guarded();

    for entity in iter.by_ref() {
        let key = entity.chunk_pos().key();
        match index
            .get(key)
            .and_then(|id| regions.get_mut(id.index()))
        {
            Some(region) => region.entities.push(entity),
            None => unassigned.push(entity),
        }
    }

    iter.finished_iterating();

    TickBatch {
        regions,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracked::TrackedEntities;
    use rct_spatial::{ChunkPos, cluster_regions, window};

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Mob {
        id: u32,
        pos: ChunkPos,
    }

    impl TickEntity for Mob {
        fn chunk_pos(&self) -> ChunkPos {
            self.pos
        }
        fn is_removed(&self) -> bool {
            false
        }
        fn vehicle(&self) -> Option<Self> {
            None
        }
        fn has_passenger(&self, _passenger: &Self) -> bool {
            false
        }
        fn stop_riding(&self) {}
        fn check_despawn(&self) {}
    }

    fn mob(id: u32, x: i32, z: i32) -> Mob {
        Mob {
            id,
            pos: ChunkPos::new(x, z),
        }
    }

    #[test]
    fn test_entities_follow_their_chunk() {
        let regions = cluster_regions(vec![window(0, 0, 2), window(100, 100, 2)]);
        let index = RegionIndex::build(&regions, 50);

        let tracked = TrackedEntities::new();
        tracked.insert(mob(1, 1, 1));
        tracked.insert(mob(2, 99, 102));
        tracked.insert(mob(3, -2, 2));
        tracked.insert(mob(4, 50, 50));

        let batch = assign_entities(regions, &index, &tracked);

        let ids = |r: &Region<Mob>| r.entities.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&batch.regions[0]), vec![1, 3]);
        assert_eq!(ids(&batch.regions[1]), vec![2]);
        assert_eq!(batch.unassigned, vec![mob(4, 50, 50)]);
        assert_eq!(batch.region_entities(), 3);
    }

    #[test]
    fn test_no_regions_everything_unassigned() {
        let regions: Vec<Region<Mob>> = Vec::new();
        let index = RegionIndex::build(&regions, 0);

        let tracked = TrackedEntities::new();
        for id in 0..5 {
            tracked.insert(mob(id, id as i32, 0));
        }

        let batch = assign_entities(regions, &index, &tracked);
        assert!(batch.regions.is_empty());
        assert_eq!(batch.unassigned.len(), 5);
    }

    #[test]
    fn test_traversal_released_after_assignment() {
        let regions: Vec<Region<Mob>> = cluster_regions(vec![window(0, 0, 1)]);
        let index = RegionIndex::build(&regions, 9);
        let tracked = TrackedEntities::new();
        tracked.insert(mob(1, 0, 0));

        let _batch = assign_entities(regions, &index, &tracked);

        // Would deadlock if the traversal guard were still held
        assert!(tracked.insert(mob(2, 0, 0)));
    }
}
