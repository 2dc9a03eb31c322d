//! Regionized chunk ticking.
//!
//! Each tick, the chunks around connected players are grouped into disjoint
//! regions ([`rct_spatial`]), tracked entities are assigned to the region
//! they stand in, and every region is ticked on its own worker. Whatever
//! the regions did not cover (chunks away from players, chunks of a failed
//! region, entities outside every region) is ticked sequentially afterwards.
//!
//! # Example
//!
//! ```ignore
//! use rct_tick::{RegionTicker, RegionTickingConfig, TickSettings, TrackedEntities};
//!
//! let ticker = RegionTicker::start(RegionTickingConfig::default())?;
//!
//! // Every server tick:
//! let summary = ticker.tick(
//!     &world,
//!     &player_chunks,
//!     &tracked,
//!     &loaded_chunks,
//!     TickSettings::new(view_distance, random_tick_speed),
//!     spawn_task,
//! );
//!
//! // On shutdown:
//! ticker.shutdown()?;
//! ```

mod assign;
mod config;
mod coordinator;
mod deferred;
mod entity;
mod error;
mod executor;
mod tracked;
mod world;

pub use assign::{TickBatch, assign_entities};
pub use config::{DEFAULT_THREAD_COUNT, MAX_THREAD_COUNT, RegionTickingConfig, TickSettings};
pub use coordinator::{RegionTicker, TickSummary};
pub use deferred::DeferredTask;
pub use entity::{EntityTick, tick_entity};
pub use error::{TickError, TickResult};
pub use executor::RegionExecutor;
pub use tracked::{EntitySource, GuardedIter, TrackedEntities, TrackedIter};
pub use world::{Agent, LoadedChunk, TickEntity, TickWorld};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Agent, DeferredTask, EntitySource, LoadedChunk, RegionTicker, RegionTickingConfig,
        TickEntity, TickSettings, TickSummary, TickWorld, TrackedEntities,
    };
}
