//! Parallel tick coordinator.
//!
//! # Tick Execution Model
//!
//! ```text
//! Tick N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Phase 1: View window per player (parallel, pool)           │
//! │  Phase 2: Cluster windows into disjoint regions             │
//! │  Phase 3: Assign tracked entities (guarded, sequential)     │
//! │  Phase 4: One task per region: chunks, then entities       │
//! │  Phase 5: Barrier (failed regions logged, not cancelled)    │
//! │  Phase 6: Fallback: loaded chunks no region reported        │
//! │  Phase 7: Unassigned entities                               │
//! │  Phase 8: Join deferred task                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases 6–8 run on the calling thread after every region task is done.
//! Chunks a failed region already ticked count as ticked; the rest are
//! picked up by phase 6. Its entities are not ticked again this tick.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rct_spatial::{
    ChunkSet, Region, RegionId, RegionIndex, ViewWindow, cluster_regions, max_chunks,
};
use rustc_hash::FxBuildHasher;
use tracing::{debug, debug_span, error, trace, warn};

use crate::assign::{TickBatch, assign_entities};
use crate::config::{RegionTickingConfig, TickSettings};
use crate::deferred::DeferredTask;
use crate::entity::tick_entity;
use crate::error::{TickError, TickResult, panic_message};
use crate::executor::RegionExecutor;
use crate::tracked::{EntitySource, GuardedIter};
use crate::world::{Agent, LoadedChunk, TickEntity, TickWorld};

/// Counts describing one finished tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Regions dispatched to workers.
    pub regions: usize,
    /// Regions whose task panicked.
    pub failed_regions: usize,
    /// Chunks ticked by region tasks.
    pub region_chunks: usize,
    /// Chunks ticked by the sequential pass.
    pub fallback_chunks: usize,
    /// Entities handed to region tasks that completed.
    pub region_entities: usize,
    /// Entities that belonged to a failed region and were not ticked.
    pub skipped_entities: usize,
    /// Entities ticked by the sequential pass.
    pub unassigned_entities: usize,
}

/// Result of one region task.
enum RegionOutcome {
    Ticked {
        region: RegionId,
        chunks: ChunkSet,
        entities: usize,
    },
    Failed {
        region: RegionId,
        /// Chunks ticked before the panic.
        chunks: ChunkSet,
        entities: usize,
        error: TickError,
    },
}

impl RegionOutcome {
    const fn region(&self) -> RegionId {
        match self {
            Self::Ticked { region, .. } | Self::Failed { region, .. } => *region,
        }
    }
}

/// Ticks a world by running disjoint player regions on an owned pool.
#[derive(Debug)]
pub struct RegionTicker {
    config: RegionTickingConfig,
    executor: RegionExecutor,
}

impl RegionTicker {
    /// Validate `config` and start a pool for it.
    pub fn start(config: RegionTickingConfig) -> TickResult<Self> {
        let config = config.validated();
        let executor = RegionExecutor::start(&config)?;
        Ok(Self::new(config, executor))
    }

    /// Use an already running pool.
    ///
    /// The pool keeps its own size; `executor_thread_count` only applies to
    /// pools built by [`RegionTicker::start`].
    #[must_use]
    pub fn new(config: RegionTickingConfig, executor: RegionExecutor) -> Self {
        let config = config.validated();
        if config.executor_thread_count != executor.threads() {
            warn!(
                configured = config.executor_thread_count,
                threads = executor.threads(),
                "Region executor size differs from configured thread count"
            );
        }
        Self { config, executor }
    }

    #[must_use]
    pub const fn config(&self) -> &RegionTickingConfig {
        &self.config
    }

    #[must_use]
    pub const fn executor(&self) -> &RegionExecutor {
        &self.executor
    }

    /// Stop the pool, waiting at most the configured shutdown timeout.
    pub fn shutdown(self) -> TickResult<()> {
        let timeout = self.config.shutdown_timeout();
        self.executor.shutdown(timeout)
    }

    /// Run one tick and block until it, and `deferred`, are done.
    ///
    /// Every chunk in `loaded` is ticked once, by a region task or by the
    /// fallback pass. Every tracked entity is offered to [`tick_entity`]
    /// once, unless its region task failed.
    pub fn tick<W, A, S, D>(
        &self,
        world: &W,
        agents: &[A],
        entities: &S,
        loaded: &[W::Chunk],
        settings: TickSettings,
        deferred: D,
    ) -> TickSummary
    where
        W: TickWorld,
        A: Agent,
        S: EntitySource<W::Entity> + ?Sized,
        D: DeferredTask,
    {
        let start = Instant::now();

        let summary = if self.config.enable {
            let batch = self.build_batch(agents, entities, settings.tick_view_distance);
            let TickBatch {
                regions,
                unassigned,
            } = batch;

            let dispatched = regions.iter().filter(|r| !r.is_empty()).count();
            let outcomes = self.dispatch(world, regions, settings.random_tick_speed);

            let mut summary = TickSummary {
                regions: dispatched,
                ..TickSummary::default()
            };
            finish_ticking(
                world,
                outcomes,
                &unassigned,
                loaded,
                settings.random_tick_speed,
                &mut summary,
            );
            summary
        } else {
            tick_sequential(world, entities, loaded, settings.random_tick_speed)
        };

        if let Err(e) = deferred.join() {
            error!(error = %e, "Deferred task failed");
        }

        debug!(?summary, elapsed = ?start.elapsed(), "Tick complete");
        summary
    }

    /// Phases 1–3: windows, regions and entity assignment.
    pub fn build_batch<A, E, S>(&self, agents: &[A], entities: &S, view_distance: u32) -> TickBatch<E>
    where
        A: Agent,
        E: TickEntity,
        S: EntitySource<E> + ?Sized,
    {
        let sets: Vec<ChunkSet> = self.executor.install(|| {
            agents
                .par_iter()
                .map(|agent| ViewWindow::new(agent.chunk_pos(), view_distance).to_set())
                .collect()
        });

        let regions: Vec<Region<E>> = cluster_regions(sets);
        let index = RegionIndex::build(
            &regions,
            max_chunks(view_distance).saturating_mul(regions.len()),
        );

        trace!(
            agents = agents.len(),
            regions = regions.len(),
            indexed = index.len(),
            "Computed player regions"
        );

        assign_entities(regions, &index, entities)
    }

    /// Phases 4–5: one task per non-empty region, joined before returning.
    fn dispatch<W: TickWorld>(
        &self,
        world: &W,
        regions: Vec<Region<W::Entity>>,
        random_tick_speed: u32,
    ) -> Vec<RegionOutcome> {
        let (tx, rx) = crossbeam_channel::unbounded();

        self.executor.pool().scope(|scope| {
            for region in regions.into_iter().filter(|r| !r.is_empty()) {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let id = region.id;
                    let entities = region.entities.len();
                    let mut chunks =
                        ChunkSet::with_capacity_and_hasher(region.len(), FxBuildHasher);

                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        tick_region(world, &region, random_tick_speed, &mut chunks);
                    }));

                    let outcome = match result {
                        Ok(()) => RegionOutcome::Ticked {
                            region: id,
                            chunks,
                            entities,
                        },
                        Err(payload) => RegionOutcome::Failed {
                            region: id,
                            chunks,
                            entities,
                            error: TickError::RegionTaskPanicked {
                                region: id,
                                message: panic_message(&*payload),
                            },
                        },
                    };

                    // The receiver outlives the scope
                    let _ = tx.send(outcome);
                });
            }
        });
        drop(tx);

        let mut outcomes: Vec<RegionOutcome> = rx.try_iter().collect();
        outcomes.sort_by_key(RegionOutcome::region);
        outcomes
    }
}

/// Body of one region task. Every chunk is added to `ticked` as soon as its
/// tick returns, so the set stays accurate if a later tick panics.
fn tick_region<W: TickWorld>(
    world: &W,
    region: &Region<W::Entity>,
    random_tick_speed: u32,
    ticked: &mut ChunkSet,
) {
    let _span = debug_span!(
        "region_tick",
        region = %region.id,
        chunks = region.len(),
        entities = region.entities.len()
    )
    .entered();

    let mut resolved = Vec::with_capacity(region.len());
    for &key in &region.chunks {
        if let Some(chunk) = world.chunk(key) {
            resolved.push((key, chunk));
        }
    }

    for (key, chunk) in &resolved {
        world.tick_chunk(chunk, random_tick_speed);
        ticked.insert(*key);
    }
    for entity in &region.entities {
        tick_entity(world, entity);
    }
}

/// Phases 6–7 on the calling thread.
fn finish_ticking<W: TickWorld>(
    world: &W,
    outcomes: Vec<RegionOutcome>,
    unassigned: &[W::Entity],
    loaded: &[W::Chunk],
    random_tick_speed: u32,
    summary: &mut TickSummary,
) {
    let mut ticked = ChunkSet::with_capacity_and_hasher(loaded.len(), FxBuildHasher);

    for outcome in outcomes {
        match outcome {
            RegionOutcome::Ticked {
                chunks, entities, ..
            } => {
                summary.region_chunks += chunks.len();
                summary.region_entities += entities;
                ticked.extend(chunks);
            }
            RegionOutcome::Failed {
                region,
                chunks,
                entities,
                error,
            } => {
                summary.failed_regions += 1;
                summary.region_chunks += chunks.len();
                summary.skipped_entities += entities;
                error!(
                    %region,
                    %error,
                    ticked = chunks.len(),
                    "Error during region chunk ticking"
                );
                ticked.extend(chunks);
            }
        }
    }

    for chunk in loaded {
        if !ticked.contains(&chunk.key()) {
            world.tick_chunk(chunk, random_tick_speed);
            summary.fallback_chunks += 1;
        }
    }

    for entity in unassigned {
        tick_entity(world, entity);
    }
    summary.unassigned_entities = unassigned.len();
}

/// Tick everything on the calling thread, without regions.
fn tick_sequential<W, S>(
    world: &W,
    entities: &S,
    loaded: &[W::Chunk],
    random_tick_speed: u32,
) -> TickSummary
where
    W: TickWorld,
    S: EntitySource<W::Entity> + ?Sized,
{
    for chunk in loaded {
        world.tick_chunk(chunk, random_tick_speed);
    }

    // Snapshot first: entity ticks may spawn or remove entities
    let mut iter = entities.iter_guarded();
    let snapshot: Vec<W::Entity> = iter.by_ref().collect();
    iter.finished_iterating();

    for entity in &snapshot {
        tick_entity(world, entity);
    }

    TickSummary {
        fallback_chunks: loaded.len(),
        unassigned_entities: snapshot.len(),
        ..TickSummary::default()
    }
}
