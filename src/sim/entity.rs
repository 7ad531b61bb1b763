//! Obstacles, pickups and the slot arena that owns them
//!
//! Entities are addressed by generational [`EntityId`]s. Removing an entity
//! frees its slot for reuse without shifting any other entity, so ids stay
//! valid while the collision pass walks the arena.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;

/// Stable handle to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

/// Collectible kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Flat score reward scaled by the multiplier
    Coin,
    /// Timed scroll speed window
    SpeedBoost,
    /// One shield charge
    Shield,
    /// Speed window and shield charge together
    ComboPower,
    /// One extra life
    Heart,
}

/// A candle standing on the ground line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Top-left corner in world coordinates
    pub pos: Vec2,
    pub size: Vec2,
    /// Red candles hurt, green (momentum) candles reward
    pub hazardous: bool,
    /// Momentum candles pay out once
    pub consumed: bool,
}

impl Obstacle {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// A floating collectible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Center in world coordinates
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PickupKind,
    pub consumed: bool,
}

/// Anything the player can touch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Obstacle(Obstacle),
    Pickup(Pickup),
}

impl Entity {
    /// Left edge in world x
    pub fn left(&self) -> f32 {
        match self {
            Entity::Obstacle(o) => o.pos.x,
            Entity::Pickup(p) => p.pos.x - p.radius,
        }
    }

    /// Right edge in world x
    pub fn right(&self) -> f32 {
        match self {
            Entity::Obstacle(o) => o.pos.x + o.size.x,
            Entity::Pickup(p) => p.pos.x + p.radius,
        }
    }

    pub fn is_consumed(&self) -> bool {
        match self {
            Entity::Obstacle(o) => o.consumed,
            Entity::Pickup(p) => p.consumed,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Slot arena with O(1) insert/remove and a free list
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    /// Indices of empty slots, reused before the arena grows
    free: Vec<u32>,
    live: usize,
    next_generation: u32,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocated slots, live or free
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        // Generations are never reused, even after compaction drops a slot
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = generation;
            slot.entity = Some(entity);
            EntityId { index, generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation,
                entity: Some(entity),
            });
            EntityId { index, generation }
        }
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slot(id).and_then(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    /// Remove an entity, returning it if the id was still live
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entity = slot.entity.take()?;
        self.free.push(id.index);
        self.live -= 1;
        Some(entity)
    }

    /// Live entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entity.as_ref().map(|e| {
                (
                    EntityId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    e,
                )
            })
        })
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.iter().filter_map(|(_, e)| match e {
            Entity::Obstacle(o) => Some(o),
            Entity::Pickup(_) => None,
        })
    }

    pub fn pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.iter().filter_map(|(_, e)| match e {
            Entity::Pickup(p) => Some(p),
            Entity::Obstacle(_) => None,
        })
    }

    /// Remove every entity for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&Entity) -> bool) -> usize {
        let mut removed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.as_ref().is_some_and(|e| !keep(e)) {
                slot.entity = None;
                self.free.push(i as u32);
                removed += 1;
            }
        }
        self.live -= removed;
        removed
    }

    /// Drop trailing empty slots once more than half the arena is free
    pub fn compact(&mut self) {
        if self.free.len() * 2 <= self.slots.len() {
            return;
        }
        while self.slots.last().is_some_and(|slot| slot.entity.is_none()) {
            self.slots.pop();
        }
        let len = self.slots.len() as u32;
        self.free.retain(|&i| i < len);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}
