//! Collaborators the coordinator drives but does not own.
//!
//! What a chunk or entity tick actually does lives behind these traits. The
//! coordinator only decides which thread calls them and how often.

use rct_spatial::{ChunkKey, ChunkPos};

/// Anything that keeps the chunks around it ticking (a connected player).
///
/// The window radius is the world's [`TickSettings::tick_view_distance`],
/// not a per-agent view distance.
///
/// [`TickSettings::tick_view_distance`]: crate::TickSettings::tick_view_distance
pub trait Agent: Sync {
    /// Snapshot of the chunk the agent currently stands in.
    fn chunk_pos(&self) -> ChunkPos;
}

impl Agent for ChunkPos {
    fn chunk_pos(&self) -> ChunkPos {
        *self
    }
}

/// Handle to a loaded chunk.
pub trait LoadedChunk {
    fn key(&self) -> ChunkKey;
}

/// Handle to a tracked entity.
///
/// A handle may go stale between assignment and its tick (removed, moved,
/// dismounted); every method must tolerate that.
pub trait TickEntity: Clone + Send {
    /// Chunk the entity is in right now.
    fn chunk_pos(&self) -> ChunkPos;

    fn is_removed(&self) -> bool;

    /// Vehicle the entity is riding, if any.
    fn vehicle(&self) -> Option<Self>;

    /// Whether `passenger` is still listed as riding this entity.
    fn has_passenger(&self, passenger: &Self) -> bool;

    /// Force a dismount.
    fn stop_riding(&self);

    /// Give the entity a chance to despawn before it ticks.
    fn check_despawn(&self);
}

/// The world being ticked.
///
/// Methods take `&self` and are called from several region workers at
/// once; the implementation synchronizes its own lookup tables. Workers
/// never pass the same chunk or entity concurrently.
pub trait TickWorld: Sync {
    type Chunk: LoadedChunk + Send;
    type Entity: TickEntity;

    /// Resolve a key to a loaded chunk. `None` means "not loaded"; the key
    /// is skipped.
    fn chunk(&self, key: ChunkKey) -> Option<Self::Chunk>;

    /// Advance one chunk.
    fn tick_chunk(&self, chunk: &Self::Chunk, random_tick_speed: u32);

    /// Whether the tick-rate manager has frozen this entity.
    fn is_entity_frozen(&self, entity: &Self::Entity) -> bool;

    /// Advance one entity that is not riding anything.
    fn tick_entity(&self, entity: &Self::Entity);
}
