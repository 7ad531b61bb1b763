//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by arena slot)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod entity;
pub mod physics;
pub mod spawn;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{Aabb, Contact, HitOutcome};
pub use entity::{Entity, EntityArena, EntityId, Obstacle, Pickup, PickupKind};
pub use physics::{Player, StepReport};
pub use spawn::{Spawner, difficulty};
pub use state::{
    CharacterBonus, GameEvent, HudSnapshot, RunModifiers, RunState, RunStatus, ShopModifiers,
    Simulation, World, multiplier_for_combo,
};
pub use terrain::{Terrain, TerrainPoint};
pub use tick::tick;
