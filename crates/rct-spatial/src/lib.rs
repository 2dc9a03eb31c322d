//! Regionized Chunk Partitioning
//!
//! Splits the chunks around connected players into disjoint regions that
//! can be ticked in parallel without sharing any chunk.
//!
//! # Pipeline
//!
//! ```text
//! player positions ──► ViewWindow per player ──► cluster_regions ──► Region[]
//!                      (2r+1)^2 ChunkKeys        transitive merge     disjoint
//! ```

mod cluster;
mod key;
mod region;
mod window;

pub use cluster::cluster_regions;
pub use key::{CHUNK_SHIFT, ChunkKey, ChunkPos};
pub use region::{Region, RegionId, RegionIndex};
pub use window::{ChunkSet, ViewWindow, chebyshev_distance, max_chunks, window};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChunkKey, ChunkPos, ChunkSet, Region, RegionId, RegionIndex, ViewWindow, cluster_regions,
        window,
    };
}
