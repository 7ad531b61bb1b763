//! Run state and the `Simulation` that owns it
//!
//! All mutable game state lives in one [`Simulation`]. The outside world can
//! only start a run, abort it, request a jump, and advance time; everything
//! else is read-only.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityArena, PickupKind};
use super::physics::Player;
use super::spawn::Spawner;
use super::terrain::Terrain;
use super::tick;
use crate::tuning::{RunTuning, Tuning};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Menu; the world is built but does not advance
    Idle,
    /// Active gameplay
    Running,
    /// Lives exhausted; needs `start_run` or `reset_run`
    GameOver,
}

/// Camera and scroll state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub elapsed: f32,
    /// Difficulty ramp before character and boost multipliers.
    /// Never decreases during a run.
    pub base_speed: f32,
    /// Effective scroll speed this tick
    pub scroll_speed: f32,
    /// World x of the left edge of the frame
    pub camera_x: f32,
    /// Baseline floor height
    pub ground_y: f32,
}

impl World {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            elapsed: 0.0,
            base_speed: tuning.world.base_speed.min(tuning.world.max_speed),
            scroll_speed: 0.0,
            camera_x: 0.0,
            ground_y: tuning.terrain.baseline_y,
        }
    }
}

/// Score economy for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub lives: u8,
    pub max_lives: u8,
    pub multiplier: f32,
    /// No-hit time accumulated toward the next combo step
    pub combo_timer: f32,
    pub combo_count: u32,
    pub distance: f32,
    pub score: f64,
    pub speed_boost_timer: f32,
    pub status: RunStatus,
}

impl RunState {
    pub fn new(tuning: &RunTuning) -> Self {
        Self {
            lives: tuning.starting_lives,
            max_lives: tuning.max_lives,
            multiplier: 1.0,
            combo_timer: 0.0,
            combo_count: 0,
            distance: 0.0,
            score: 0.0,
            speed_boost_timer: 0.0,
            status: RunStatus::Idle,
        }
    }

    pub fn speed_boost_active(&self) -> bool {
        self.speed_boost_timer > 0.0
    }

    /// Add a non-negative amount to the score
    pub fn add_score(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.score += amount;
        }
    }
}

/// Per-character modifiers, read-only during a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterBonus {
    pub score_multiplier: f32,
    pub speed_multiplier: f32,
    /// Scales power-up durations
    pub cooldown_multiplier: f32,
}

impl Default for CharacterBonus {
    fn default() -> Self {
        Self {
            score_multiplier: 1.0,
            speed_multiplier: 1.0,
            cooldown_multiplier: 1.0,
        }
    }
}

impl CharacterBonus {
    /// Replace non-finite or non-positive factors with neutral ones
    pub fn sanitized(self) -> Self {
        let fix = |v: f32| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        Self {
            score_multiplier: fix(self.score_multiplier),
            speed_multiplier: fix(self.speed_multiplier),
            cooldown_multiplier: fix(self.cooldown_multiplier),
        }
    }
}

/// Purchased run-start modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShopModifiers {
    pub extra_starting_lives: u8,
    pub starts_with_shield: bool,
    pub starting_multiplier: f32,
}

impl Default for ShopModifiers {
    fn default() -> Self {
        Self {
            extra_starting_lives: 0,
            starts_with_shield: false,
            starting_multiplier: 1.0,
        }
    }
}

/// Everything applied once when a run starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    pub character: CharacterBonus,
    pub shop: ShopModifiers,
}

/// Notable things that happened during the last tick, for toasts and haptics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    Jumped { index: u8 },
    Landed,
    ShieldAbsorbed,
    Hit { lives_left: u8 },
    CoinCollected { reward: f64 },
    MomentumCollected { reward: f64 },
    PowerUp { kind: PickupKind },
    Healed { lives: u8 },
    /// Heart collected with lives already full
    LivesFull,
    ComboMilestone { combo: u32, multiplier: f32 },
    GameOver { score: f64 },
}

/// Read-only view for the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: f64,
    pub multiplier: f32,
    pub lives: u8,
    pub max_lives: u8,
    pub status: RunStatus,
    pub combo: u32,
    pub shield_charges: u8,
    pub speed_boost_active: bool,
}

/// Multiplier earned by `combo` uninterrupted combo steps
pub fn multiplier_for_combo(combo: u32, tuning: &RunTuning, bonus: &CharacterBonus) -> f32 {
    let base = 1.0 + combo as f32 * tuning.combo_step;
    (base * bonus.score_multiplier).min(tuning.max_multiplier)
}

/// The whole game world
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) seed: u64,
    pub(crate) tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub(crate) world: World,
    pub(crate) player: Player,
    pub(crate) terrain: Terrain,
    pub(crate) spawner: Spawner,
    pub(crate) entities: EntityArena,
    pub(crate) run: RunState,
    pub(crate) bonus: CharacterBonus,
    pub(crate) events: Vec<GameEvent>,
}

/// Fresh per-run state, built off to the side and swapped in at once
struct RunParts {
    world: World,
    player: Player,
    terrain: Terrain,
    spawner: Spawner,
    entities: EntityArena,
    run: RunState,
}

impl RunParts {
    fn build(tuning: &Tuning, rng: &mut Pcg32) -> Self {
        let world = World::new(tuning);
        let mut terrain = Terrain::new(&tuning.terrain, rng);
        terrain.advance(world.camera_x, tuning.world.view_width + tuning.spawn.lookahead);

        let player_x = world.camera_x + tuning.player.screen_x;
        let ground = terrain.ground_height(player_x + tuning.player.width * 0.5);
        let player = Player::new(&tuning.player, player_x, ground);

        Self {
            spawner: Spawner::new(&tuning.spawn, world.camera_x),
            world,
            player,
            terrain,
            entities: EntityArena::new(),
            run: RunState::new(&tuning.run),
        }
    }
}

impl Simulation {
    /// Simulation with the shipped balance
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Simulation with custom balance; bad values are repaired first
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let parts = RunParts::build(&tuning, &mut rng);
        Self {
            seed,
            spawner: parts.spawner,
            world: parts.world,
            player: parts.player,
            terrain: parts.terrain,
            entities: parts.entities,
            run: parts.run,
            tuning,
            rng,
            bonus: CharacterBonus::default(),
            events: Vec::new(),
        }
    }

    fn install(&mut self, parts: RunParts) {
        self.world = parts.world;
        self.player = parts.player;
        self.terrain = parts.terrain;
        self.spawner = parts.spawner;
        self.entities = parts.entities;
        self.run = parts.run;
        self.events.clear();
    }

    /// Start a fresh run, discarding any run in progress
    pub fn start_run(&mut self, modifiers: RunModifiers) {
        let parts = RunParts::build(&self.tuning, &mut self.rng);
        self.install(parts);
        self.bonus = modifiers.character.sanitized();

        let shop = modifiers.shop;
        let rt = &self.tuning.run;
        self.run.lives = rt
            .starting_lives
            .saturating_add(shop.extra_starting_lives)
            .min(rt.max_lives);
        let start_mult = if shop.starting_multiplier.is_finite() {
            shop.starting_multiplier.clamp(1.0, rt.max_multiplier)
        } else {
            1.0
        };
        self.run.multiplier = start_mult;
        if shop.starts_with_shield {
            self.player.shield_charges = rt.max_shield_charges.min(1);
        }

        self.spawner.seed_initial(
            &self.tuning.spawn,
            self.world.camera_x,
            self.run.distance,
            &self.terrain,
            &mut self.entities,
            &mut self.rng,
        );

        self.run.status = RunStatus::Running;
        self.events.push(GameEvent::RunStarted);
        log::info!(
            "Run started: lives {}, multiplier x{:.2}, shield {}",
            self.run.lives,
            self.run.multiplier,
            self.player.shield_charges
        );
    }

    /// Abort to the menu. All run state is replaced in one step.
    pub fn reset_run(&mut self) {
        let parts = RunParts::build(&self.tuning, &mut self.rng);
        self.install(parts);
        self.bonus = CharacterBonus::default();
        log::info!("Run reset");
    }

    /// Buffer a jump; consumed by the next `update`
    pub fn request_jump(&mut self) {
        if self.run.status == RunStatus::Running {
            self.player.request_jump(self.tuning.player.jump_buffer);
        }
    }

    /// Advance by `dt` seconds of wall-clock time
    pub fn update(&mut self, dt: f32) {
        tick::tick(self, dt);
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.run.score,
            multiplier: self.run.multiplier,
            lives: self.run.lives,
            max_lives: self.run.max_lives,
            status: self.run.status,
            combo: self.run.combo_count,
            shield_charges: self.player.shield_charges,
            speed_boost_active: self.run.speed_boost_active(),
        }
    }

    /// Take the events raised by the last tick
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn bonus(&self) -> &CharacterBonus {
        &self.bonus
    }

    /// Live entities, for drawing
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().map(|(_, e)| e)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
