//! Procedural placement of candles and pickups ahead of the camera
//!
//! The spawner walks a cursor of candidate slots along world x. Each slot
//! may hold one candle (red hazard or green momentum) and one pickup. All
//! placed entities are kept strictly left-to-right, so a candle always has
//! `min_gap` of clear space before it and a pickup never sits over a candle.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::entity::{Entity, EntityArena, Obstacle, Pickup, PickupKind};
use super::terrain::Terrain;
use crate::tuning::SpawnTable;

/// Upper bound on slots evaluated by one `fill`
const MAX_SLOTS_PER_FILL: u32 = 64;
/// Clear space between a pickup and whatever precedes it
const PICKUP_CLEARANCE: f32 = 4.0;

/// Difficulty in [0, 1] for the distance travelled so far
pub fn difficulty(table: &SpawnTable, distance: f32) -> f32 {
    let d = distance / table.difficulty_distance;
    if d.is_finite() { d.clamp(0.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    /// World x of the next candidate slot
    next_slot_x: f32,
    /// Right edge of the last placed entity
    last_right: f32,
    kinds: Vec<PickupKind>,
    /// None when every weight is zero
    weights: Option<WeightedIndex<f32>>,
}

impl Spawner {
    pub fn new(table: &SpawnTable, camera_x: f32) -> Self {
        let kinds = table.pickup_weights.iter().map(|w| w.kind).collect();
        let weights = match WeightedIndex::new(table.pickup_weights.iter().map(|w| w.weight)) {
            Ok(weights) => Some(weights),
            Err(err) => {
                log::warn!("Pickup table unusable, no pickups will spawn: {}", err);
                None
            }
        };

        Self {
            next_slot_x: camera_x + table.first_slot_offset,
            last_right: f32::NEG_INFINITY,
            kinds,
            weights,
        }
    }

    pub fn next_slot_x(&self) -> f32 {
        self.next_slot_x
    }

    /// Populate the opening stretch of a run
    pub fn seed_initial<R: Rng + ?Sized>(
        &mut self,
        table: &SpawnTable,
        camera_x: f32,
        distance: f32,
        terrain: &Terrain,
        entities: &mut EntityArena,
        rng: &mut R,
    ) {
        self.next_slot_x = camera_x + table.first_slot_offset;
        for _ in 0..table.initial_slots {
            self.spawn_slot(table, distance, terrain, entities, rng);
        }
        log::debug!("Seeded {} entities", entities.len());
    }

    /// Evaluate every slot up to `horizon_x`. Returns the number of slots used.
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        table: &SpawnTable,
        horizon_x: f32,
        distance: f32,
        terrain: &Terrain,
        entities: &mut EntityArena,
        rng: &mut R,
    ) -> u32 {
        let mut slots = 0;
        while self.next_slot_x <= horizon_x && slots < MAX_SLOTS_PER_FILL {
            self.spawn_slot(table, distance, terrain, entities, rng);
            slots += 1;
        }
        slots
    }

    fn spawn_slot<R: Rng + ?Sized>(
        &mut self,
        table: &SpawnTable,
        distance: f32,
        terrain: &Terrain,
        entities: &mut EntityArena,
        rng: &mut R,
    ) {
        let d = difficulty(table, distance);
        let slot_x = self.next_slot_x;
        self.next_slot_x += table.slot_spacing;

        let candidate = slot_x + table.slot_jitter.sample(rng);

        if rng.random::<f32>() < table.hazard.at(d) {
            let height = if rng.random::<f32>() < table.tall_hazard.at(d) {
                table.tall_hazard_height.sample(rng)
            } else {
                table.short_hazard_height.sample(rng)
            };
            self.place_candle(candidate, table.hazard_width, height, true, table, terrain, entities);
        } else if rng.random::<f32>() < table.momentum_chance {
            let height = table.momentum_height.sample(rng);
            self.place_candle(candidate, table.momentum_width, height, false, table, terrain, entities);
        }

        if rng.random::<f32>() < table.pickup.at(d) {
            if let Some(kind) = self.draw_kind(rng) {
                let offset = table.pickup_offset.sample(rng);
                let lift = if rng.random::<f32>() < table.air_lane_chance {
                    table.air_height.sample(rng)
                } else {
                    table.floor_height
                };
                let r = table.pickup_radius;
                let x = (candidate + offset).max(self.last_right + r + PICKUP_CLEARANCE);
                let y = terrain.ground_height(x) - lift;

                entities.insert(Entity::Pickup(Pickup {
                    pos: Vec2::new(x, y),
                    radius: r,
                    kind,
                    consumed: false,
                }));
                self.last_right = x + r;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_candle(
        &mut self,
        candidate: f32,
        width: f32,
        height: f32,
        hazardous: bool,
        table: &SpawnTable,
        terrain: &Terrain,
        entities: &mut EntityArena,
    ) {
        let x = candidate.max(self.last_right + table.min_gap);
        let ground = terrain.ground_height(x + width * 0.5);
        entities.insert(Entity::Obstacle(Obstacle {
            pos: Vec2::new(x, ground - height),
            size: Vec2::new(width, height),
            hazardous,
            consumed: false,
        }));
        self.last_right = x + width;
    }

    fn draw_kind<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PickupKind> {
        let weights = self.weights.as_ref()?;
        self.kinds.get(weights.sample(rng)).copied()
    }
}
