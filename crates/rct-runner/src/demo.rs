//! Synthetic world for the runner.
//!
//! Players wander across an unbounded plane and keep the chunks around them
//! loaded. A small spawn area near the origin stays loaded regardless, so
//! there are always chunks for the fallback pass. Mobs wander, age and
//! despawn; some carry a rider.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use hashbrown::HashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rct_spatial::{ChunkKey, ChunkPos, ViewWindow, chebyshev_distance};
use rct_tick::{LoadedChunk, TickEntity, TickWorld, TrackedEntities};
use rustc_hash::FxBuildHasher;

const BLOCKS_PER_CHUNK: f64 = 16.0;
/// Chunks kept loaded beyond the tick view distance.
const LOAD_MARGIN: u32 = 2;
/// Radius of the always-loaded area around the origin.
const SPAWN_RADIUS: u32 = 3;
/// Share of spawned mobs that get a rider.
const RIDER_CHANCE: f64 = 0.2;

// ============================================================================
// Chunks
// ============================================================================

#[derive(Default)]
struct ChunkState {
    ticks: AtomicU64,
    random_ticks: AtomicU64,
}

/// Handle to a loaded demo chunk.
#[derive(Clone)]
pub struct DemoChunk {
    key: ChunkKey,
    state: Arc<ChunkState>,
}

impl LoadedChunk for DemoChunk {
    fn key(&self) -> ChunkKey {
        self.key
    }
}

// ============================================================================
// Mobs
// ============================================================================

struct Mob {
    id: u32,
    /// Block coordinates.
    pos: Mutex<(f64, f64)>,
    age: AtomicU32,
    lifetime: u32,
    removed: AtomicBool,
    vehicle: Mutex<Option<Weak<Mob>>>,
    passengers: Mutex<Vec<DemoEntity>>,
    rng: Mutex<StdRng>,
}

/// Shared handle to a demo mob.
#[derive(Clone)]
pub struct DemoEntity(Arc<Mob>);

impl DemoEntity {
    fn spawn(id: u32, pos: (f64, f64), lifetime: u32, seed: u64) -> Self {
        Self(Arc::new(Mob {
            id,
            pos: Mutex::new(pos),
            age: AtomicU32::new(0),
            lifetime,
            removed: AtomicBool::new(false),
            vehicle: Mutex::new(None),
            passengers: Mutex::new(Vec::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }))
    }

    /// Seat `self` on `vehicle`.
    pub fn mount(&self, vehicle: &Self) {
        *self.0.vehicle.lock() = Some(Arc::downgrade(&vehicle.0));
        vehicle.0.passengers.lock().push(self.clone());
    }

    fn wander(&self) {
        let (dx, dz) = {
            let mut rng = self.0.rng.lock();
            (rng.gen_range(-4.0..=4.0), rng.gen_range(-4.0..=4.0))
        };
        let mut pos = self.0.pos.lock();
        pos.0 += dx;
        pos.1 += dz;
    }

    /// Move the riders along with this mob. Returns how many were carried.
    fn carry_passengers(&self) -> usize {
        let pos = *self.0.pos.lock();
        let passengers = self.0.passengers.lock().clone();
        for passenger in &passengers {
            *passenger.0.pos.lock() = pos;
            passenger.0.age.fetch_add(1, Ordering::Relaxed);
        }
        passengers.len()
    }
}

impl PartialEq for DemoEntity {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for DemoEntity {}

impl Hash for DemoEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl TickEntity for DemoEntity {
    fn chunk_pos(&self) -> ChunkPos {
        let (x, z) = *self.0.pos.lock();
        ChunkPos::from_world(x, z)
    }

    fn is_removed(&self) -> bool {
        self.0.removed.load(Ordering::Acquire)
    }

    fn vehicle(&self) -> Option<Self> {
        self.0
            .vehicle
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(DemoEntity)
    }

    fn has_passenger(&self, passenger: &Self) -> bool {
        self.0.passengers.lock().iter().any(|p| p == passenger)
    }

    fn stop_riding(&self) {
        // Our lock is released before the vehicle's is taken
        let vehicle = self.0.vehicle.lock().take();
        if let Some(vehicle) = vehicle.and_then(|v| v.upgrade()) {
            vehicle.passengers.lock().retain(|p| p != self);
        }
    }

    fn check_despawn(&self) {
        if self.0.age.load(Ordering::Relaxed) < self.0.lifetime {
            return;
        }
        if self.0.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        let passengers = std::mem::take(&mut *self.0.passengers.lock());
        for passenger in passengers {
            *passenger.0.vehicle.lock() = None;
        }
    }
}

/// Spawn `count` mobs around random `centers`, mounting a rider on some.
///
/// Returns the number of tracked entities added, riders included.
pub fn spawn_batch(
    tracked: &TrackedEntities<DemoEntity>,
    next_id: &AtomicU32,
    rng: &mut StdRng,
    centers: &[ChunkPos],
    count: usize,
) -> usize {
    if centers.is_empty() {
        return 0;
    }

    let mut added = 0;
    for _ in 0..count {
        let center = centers[rng.gen_range(0..centers.len())];
        let pos = (
            f64::from(center.x) * BLOCKS_PER_CHUNK + rng.gen_range(-64.0..64.0),
            f64::from(center.z) * BLOCKS_PER_CHUNK + rng.gen_range(-64.0..64.0),
        );

        let id = next_id.fetch_add(1, Ordering::Relaxed);
        let mob = DemoEntity::spawn(id, pos, rng.gen_range(40..400), rng.r#gen());

        if rng.gen_bool(RIDER_CHANCE) {
            let rider_id = next_id.fetch_add(1, Ordering::Relaxed);
            let rider = DemoEntity::spawn(rider_id, pos, u32::MAX, rng.r#gen());
            rider.mount(&mob);
            added += usize::from(tracked.insert(rider));
        }
        added += usize::from(tracked.insert(mob));
    }
    added
}

/// Stop tracking removed mobs. Returns how many were dropped.
pub fn reap(tracked: &TrackedEntities<DemoEntity>) -> usize {
    let removed: Vec<DemoEntity> = tracked.iter().filter(TickEntity::is_removed).collect();
    for entity in &removed {
        tracked.remove(entity);
    }
    removed.len()
}

/// Spawns new mobs on a background thread while a tick runs.
pub struct Spawner {
    tracked: Arc<TrackedEntities<DemoEntity>>,
    next_id: Arc<AtomicU32>,
    seed: u64,
}

impl Spawner {
    pub fn new(tracked: Arc<TrackedEntities<DemoEntity>>, next_id: Arc<AtomicU32>, seed: u64) -> Self {
        Self {
            tracked,
            next_id,
            seed,
        }
    }

    /// Start spawning `count` mobs around `centers`. Join the handle to wait.
    pub fn spawn(&self, centers: Vec<ChunkPos>, count: usize, tick: u64) -> JoinHandle<usize> {
        let tracked = Arc::clone(&self.tracked);
        let next_id = Arc::clone(&self.next_id);
        let seed = self.seed ^ tick.rotate_left(32);

        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            spawn_batch(&tracked, &next_id, &mut rng, &centers, count)
        })
    }
}

// ============================================================================
// World
// ============================================================================

/// Running totals over every tick so far.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorldStats {
    pub loaded_chunks: usize,
    pub chunk_ticks: u64,
    pub random_ticks: u64,
    pub entity_ticks: u64,
    pub passenger_ticks: u64,
}

pub struct DemoWorld {
    chunks: HashMap<ChunkKey, DemoChunk, FxBuildHasher>,
    /// Block coordinates.
    players: Vec<(f64, f64)>,
    rng: StdRng,
    entity_ticks: AtomicU64,
    passenger_ticks: AtomicU64,
}

impl DemoWorld {
    /// Place `players` uniformly within `spread` blocks of the origin.
    pub fn new(players: usize, spread: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let spread = spread.max(1.0);
        let players = (0..players)
            .map(|_| (rng.gen_range(-spread..spread), rng.gen_range(-spread..spread)))
            .collect();

        Self {
            chunks: HashMap::default(),
            players,
            rng,
            entity_ticks: AtomicU64::new(0),
            passenger_ticks: AtomicU64::new(0),
        }
    }

    /// Chunk each player stands in.
    pub fn agents(&self) -> Vec<ChunkPos> {
        self.players
            .iter()
            .map(|&(x, z)| ChunkPos::from_world(x, z))
            .collect()
    }

    /// Move every player a few blocks.
    pub fn move_players(&mut self) {
        for (x, z) in &mut self.players {
            *x += self.rng.gen_range(-8.0..=8.0);
            *z += self.rng.gen_range(-8.0..=8.0);
        }
    }

    /// Load chunks near players and unload the rest, keeping the spawn
    /// area. Returns `(loaded, unloaded)` counts for this call.
    pub fn refresh_loaded(&mut self, view_distance: u32) -> (usize, usize) {
        let radius = view_distance.saturating_add(LOAD_MARGIN);
        let agents = self.agents();
        let spawn = ViewWindow::new(ChunkPos::default(), SPAWN_RADIUS);

        let before = self.chunks.len();
        self.chunks.retain(|key, _| {
            let pos = key.pos();
            spawn.contains(pos)
                || agents
                    .iter()
                    .any(|&agent| chebyshev_distance(agent, pos) <= u64::from(radius))
        });
        let unloaded = before - self.chunks.len();

        let mut loaded = 0;
        let windows = agents
            .iter()
            .map(|&agent| ViewWindow::new(agent, radius))
            .chain(std::iter::once(spawn));
        for view in windows {
            for key in view.keys() {
                self.chunks.entry(key).or_insert_with(|| {
                    loaded += 1;
                    DemoChunk {
                        key,
                        state: Arc::default(),
                    }
                });
            }
        }

        (loaded, unloaded)
    }

    pub fn loaded(&self) -> Vec<DemoChunk> {
        self.chunks.values().cloned().collect()
    }

    /// Where new mobs appear: around players and the spawn area.
    pub fn spawn_centers(&self) -> Vec<ChunkPos> {
        let mut centers = self.agents();
        centers.push(ChunkPos::default());
        centers
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn stats(&self) -> WorldStats {
        let (chunk_ticks, random_ticks) =
            self.chunks.values().fold((0, 0), |(ticks, random), chunk| {
                (
                    ticks + chunk.state.ticks.load(Ordering::Relaxed),
                    random + chunk.state.random_ticks.load(Ordering::Relaxed),
                )
            });

        WorldStats {
            loaded_chunks: self.chunks.len(),
            chunk_ticks,
            random_ticks,
            entity_ticks: self.entity_ticks.load(Ordering::Relaxed),
            passenger_ticks: self.passenger_ticks.load(Ordering::Relaxed),
        }
    }
}

impl TickWorld for DemoWorld {
    type Chunk = DemoChunk;
    type Entity = DemoEntity;

    fn chunk(&self, key: ChunkKey) -> Option<DemoChunk> {
        self.chunks.get(&key).cloned()
    }

    fn tick_chunk(&self, chunk: &DemoChunk, random_tick_speed: u32) {
        chunk.state.ticks.fetch_add(1, Ordering::Relaxed);
        chunk
            .state
            .random_ticks
            .fetch_add(u64::from(random_tick_speed), Ordering::Relaxed);
    }

    fn is_entity_frozen(&self, _entity: &DemoEntity) -> bool {
        false
    }

    fn tick_entity(&self, entity: &DemoEntity) {
        entity.wander();
        entity.0.age.fetch_add(1, Ordering::Relaxed);
        let carried = entity.carry_passengers();

        self.entity_ticks.fetch_add(1, Ordering::Relaxed);
        self.passenger_ticks
            .fetch_add(carried as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rct_tick::{RegionTicker, RegionTickingConfig, TickSettings};

    fn mob(id: u32, lifetime: u32) -> DemoEntity {
        DemoEntity::spawn(id, (0.0, 0.0), lifetime, u64::from(id))
    }

    #[test]
    fn test_despawn_dismounts_riders() {
        let horse = mob(1, 0);
        let rider = mob(2, u32::MAX);
        rider.mount(&horse);
        assert!(horse.has_passenger(&rider));

        horse.check_despawn();

        assert!(horse.is_removed());
        assert!(rider.vehicle().is_none());
        assert!(!horse.has_passenger(&rider));
    }

    #[test]
    fn test_stop_riding_detaches_both_sides() {
        let horse = mob(1, 100);
        let rider = mob(2, 100);
        rider.mount(&horse);

        rider.stop_riding();

        assert!(rider.vehicle().is_none());
        assert!(!horse.has_passenger(&rider));
    }

    #[test]
    fn test_refresh_keeps_spawn_area_loaded() {
        let mut world = DemoWorld::new(0, 100.0, 7);
        let (loaded, unloaded) = world.refresh_loaded(4);

        assert_eq!(loaded, 49);
        assert_eq!(unloaded, 0);
        assert!(world.chunk(ChunkKey::new(3, -3)).is_some());
        assert!(world.chunk(ChunkKey::new(4, 0)).is_none());
    }

    #[test]
    fn test_refresh_unloads_far_chunks() {
        let mut world = DemoWorld::new(1, 1.0, 7);
        world.players[0] = (5_000.0, 5_000.0);
        world.refresh_loaded(2);
        let far = world.chunks.len();

        world.players[0] = (-5_000.0, -5_000.0);
        let (loaded, unloaded) = world.refresh_loaded(2);

        assert_eq!(unloaded, far - 49);
        assert_eq!(loaded, 81);
    }

    #[test]
    fn test_reap_drops_removed() {
        let tracked = TrackedEntities::new();
        let a = mob(1, 0);
        let b = mob(2, 100);
        tracked.insert(a.clone());
        tracked.insert(b);

        a.check_despawn();

        assert_eq!(reap(&tracked), 1);
        assert_eq!(tracked.len(), 1);
    }

    #[test]
    fn test_demo_ticks_every_chunk_once() {
        let ticker = RegionTicker::start(RegionTickingConfig {
            executor_thread_count: 2,
            ..Default::default()
        })
        .unwrap();

        let mut world = DemoWorld::new(6, 400.0, 42);
        world.refresh_loaded(3);

        let tracked = TrackedEntities::new();
        let next_id = AtomicU32::new(0);
        let centers = world.spawn_centers();
        let mut rng = StdRng::seed_from_u64(1);
        let spawned = spawn_batch(&tracked, &next_id, &mut rng, &centers, 50);
        assert!(spawned >= 50);

        let summary = ticker.tick(
            &world,
            &world.agents(),
            &tracked,
            &world.loaded(),
            TickSettings::new(3, 3),
            (),
        );

        let stats = world.stats();
        assert_eq!(stats.chunk_ticks, stats.loaded_chunks as u64);
        assert_eq!(stats.random_ticks, 3 * stats.loaded_chunks as u64);
        assert_eq!(
            summary.region_chunks + summary.fallback_chunks,
            stats.loaded_chunks
        );
        // Riders are carried by their vehicle, never ticked on their own
        assert_eq!(stats.entity_ticks + stats.passenger_ticks, spawned as u64);

        ticker.shutdown().unwrap();
    }
}
