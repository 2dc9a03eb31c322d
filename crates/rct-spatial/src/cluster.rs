//! Merging overlapping view windows into disjoint regions.
//!
//! Each agent's window is a hyperedge over chunk keys. Two agents end up in
//! the same region iff a chain of pairwise-intersecting windows connects
//! them:
//!
//! ```text
//!   A ──overlaps── B ──overlaps── C        A and C never touch,
//!   └──────────── one region ───────┘      but share a region via B
//! ```
//!
//! Sets are visited in input order. Each unmerged set seeds a region, then
//! full passes over the later unmerged sets absorb anything that intersects
//! the growing region until a pass changes nothing. The repeated passes
//! are needed when the link to an earlier set only appears after a later
//! set has been absorbed. Cost is quadratic in agent count, not in world
//! size.

use crate::{ChunkSet, Region, RegionId};

/// Cluster per-agent key sets into pairwise-disjoint regions.
///
/// Region ids are dense (`0..n`) in the order their seed set appeared.
/// Every region starts with no entities. No sets yields no regions.
#[must_use]
pub fn cluster_regions<E>(sets: Vec<ChunkSet>) -> Vec<Region<E>> {
    let mut pending: Vec<Option<ChunkSet>> = sets.into_iter().map(Some).collect();
    let mut regions = Vec::new();

    for i in 0..pending.len() {
        let Some(mut chunks) = pending[i].take() else {
            continue;
        };

        loop {
            let mut changed = false;

            for slot in &mut pending[i + 1..] {
                let overlaps = slot.as_ref().is_some_and(|set| !chunks.is_disjoint(set));
                if overlaps {
                    if let Some(set) = slot.take() {
                        chunks.extend(set);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        regions.push(Region::new(RegionId(regions.len() as u32), chunks));
    }

    regions
}
