//! Regionized tick runner
//!
//! This binary:
//! 1. Loads the region ticking config (JSON file named by `RCT_CONFIG`)
//! 2. Builds a synthetic world with wandering players and mobs
//! 3. Drives it with the tick coordinator at `TARGET_TPS` for `TICKS` ticks
//! 4. Shuts the worker pool down
//!
//! Other knobs: `PLAYERS`, `ENTITIES`, `VIEW_DISTANCE`, `SEED`.

mod demo;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use rct_tick::{RegionTicker, RegionTickingConfig, TickSettings, TrackedEntities};
use tracing::{debug, info, warn};

use crate::demo::{DemoWorld, Spawner, reap, spawn_batch};

/// Mobs spawned in the background during every tick.
const SPAWNS_PER_TICK: usize = 4;
/// Players are placed within this many blocks of the origin.
const PLAYER_SPREAD: f64 = 2_000.0;
const RANDOM_TICK_SPEED: u32 = 3;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rct_runner=info".parse()?)
                .add_directive("rct_tick=info".parse()?),
        )
        .init();

    let config = match std::env::var("RCT_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => RegionTickingConfig::default(),
    };

    let ticks: u64 = env_or("TICKS", 200);
    let target_tps: f32 = env_or("TARGET_TPS", 20.0);
    let players: usize = env_or("PLAYERS", 16);
    let entities: usize = env_or("ENTITIES", 2_000);
    let view_distance: u32 = env_or("VIEW_DISTANCE", 8);
    let seed: u64 = env_or("SEED", 0x5eed);

    info!(
        ?config,
        ticks,
        target_tps,
        players,
        entities,
        view_distance,
        "Starting region tick runner"
    );

    let ticker = RegionTicker::start(config)?;
    let settings = TickSettings::new(view_distance, RANDOM_TICK_SPEED);

    let mut world = DemoWorld::new(players, PLAYER_SPREAD, seed);
    world.refresh_loaded(view_distance);

    let tracked = Arc::new(TrackedEntities::new());
    let next_id = Arc::new(AtomicU32::new(0));
    let centers = world.spawn_centers();
    let spawned = spawn_batch(&tracked, &next_id, world.rng(), &centers, entities);
    info!(spawned, loaded = world.stats().loaded_chunks, "World populated");

    let spawner = Spawner::new(Arc::clone(&tracked), Arc::clone(&next_id), seed);

    // Non-positive rates run unthrottled
    let target_delta = Duration::try_from_secs_f32(1.0 / target_tps).unwrap_or(Duration::ZERO);
    let run_start = Instant::now();

    for tick in 0..ticks {
        let start = Instant::now();

        world.move_players();
        let (loaded, unloaded) = world.refresh_loaded(view_distance);
        let agents = world.agents();
        let chunks = world.loaded();

        let spawns = spawner.spawn(world.spawn_centers(), SPAWNS_PER_TICK, tick);
        let summary = ticker.tick(&world, &agents, &*tracked, &chunks, settings, spawns);
        let reaped = reap(&tracked);

        if summary.failed_regions > 0 {
            warn!(
                tick,
                failed = summary.failed_regions,
                skipped = summary.skipped_entities,
                "Regions failed this tick"
            );
        }

        let elapsed = start.elapsed();
        if tick.is_multiple_of(20) {
            info!(
                tick,
                regions = summary.regions,
                region_chunks = summary.region_chunks,
                fallback_chunks = summary.fallback_chunks,
                region_entities = summary.region_entities,
                unassigned_entities = summary.unassigned_entities,
                tracked = tracked.len(),
                ?elapsed,
                "Tick"
            );
        } else {
            debug!(tick, ?summary, loaded, unloaded, reaped, ?elapsed, "Tick");
        }

        if elapsed < target_delta {
            std::thread::sleep(target_delta - elapsed);
        }
    }

    let stats = world.stats();
    info!(
        ticks,
        elapsed = ?run_start.elapsed(),
        loaded_chunks = stats.loaded_chunks,
        chunk_ticks = stats.chunk_ticks,
        random_ticks = stats.random_ticks,
        entity_ticks = stats.entity_ticks,
        passenger_ticks = stats.passenger_ticks,
        "Run complete"
    );

    ticker.shutdown()?;
    Ok(())
}

fn load_config(path: &Path) -> eyre::Result<RegionTickingConfig> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .wrap_err_with(|| format!("parsing config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parse an environment variable, falling back to `default` when unset or
/// malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back() {
        assert_eq!(env_or("RCT_RUNNER_TEST_UNSET_VARIABLE", 7_u32), 7);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/rct.json")).unwrap_err();
        assert!(format!("{err:#}").contains("reading config"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("rct-runner-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "enable": false, "executor-thread-count": 2 }"#).unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(!config.enable);
        assert_eq!(config.executor_thread_count, 2);
        assert_eq!(config.shutdown_timeout_secs, 10);
    }

    #[test]
    fn test_seeded_worlds_match() {
        let a = DemoWorld::new(4, 100.0, 9).agents();
        let b = DemoWorld::new(4, 100.0, 9).agents();
        assert_eq!(a, b);
    }
}
