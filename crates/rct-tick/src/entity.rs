//! Per-entity tick contract.

use crate::world::{TickEntity, TickWorld};

/// What happened when an entity came up for its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTick {
    /// Already removed from the world.
    Removed,
    /// Frozen by the tick-rate manager.
    Frozen,
    /// Riding a live vehicle that still carries it; the vehicle ticks it.
    Passenger,
    /// Ticked standalone, after being dismounted if its vehicle was gone.
    Ticked { dismounted: bool },
}

/// Tick one entity, skipping it where another tick already covers it.
///
/// Removed and frozen entities are skipped. A passenger whose vehicle is
/// alive and still lists it is left to the vehicle; any other rider is
/// dismounted first so it is never ticked twice.
pub fn tick_entity<W>(world: &W, entity: &W::Entity) -> EntityTick
where
    W: TickWorld + ?Sized,
{
    if entity.is_removed() {
        return EntityTick::Removed;
    }
    if world.is_entity_frozen(entity) {
        return EntityTick::Frozen;
    }

    entity.check_despawn();

    let mut dismounted = false;
    if let Some(vehicle) = entity.vehicle() {
        if !vehicle.is_removed() && vehicle.has_passenger(entity) {
            return EntityTick::Passenger;
        }

        entity.stop_riding();
        dismounted = true;
    }

    world.tick_entity(entity);
    EntityTick::Ticked { dismounted }
}
