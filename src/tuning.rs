//! Data-driven game balance
//!
//! Every number the simulation uses lives here. Defaults reproduce the
//! shipped balance; a JSON document can override any subset of fields.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::PickupKind;

/// Errors raised while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning field `{field}` is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Inclusive range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform sample; collapses to `min` for empty or inverted spans
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min && (self.max - self.min).is_finite() {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    /// Finite and ordered, with a width that does not overflow
    fn is_valid(&self) -> bool {
        self.min <= self.max && (self.max - self.min).is_finite()
    }
}

/// Probability that ramps linearly with difficulty and saturates at `cap`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityCurve {
    pub base: f32,
    pub slope: f32,
    pub cap: f32,
}

impl ProbabilityCurve {
    pub const fn new(base: f32, slope: f32, cap: f32) -> Self {
        Self { base, slope, cap }
    }

    /// A curve that never fires
    pub const fn never() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Probability at difficulty `d` (0 = start of run, 1 = fully ramped)
    pub fn at(&self, difficulty: f32) -> f32 {
        let d = difficulty.clamp(0.0, 1.0);
        let p = (self.base + self.slope * d).min(self.cap);
        if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// One row of the pickup kind table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupWeight {
    pub kind: PickupKind,
    pub weight: f32,
}

/// World scrolling and gravity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Visible frame width in world pixels
    pub view_width: f32,
    /// Visible frame height in world pixels
    pub view_height: f32,
    /// Scroll speed at distance 0 (px/s)
    pub base_speed: f32,
    /// Ramp ceiling before character and boost multipliers (px/s)
    pub max_speed: f32,
    /// Distance travelled per extra px/s of ramp
    pub speed_ramp_divisor: f32,
    /// Scroll speed factor while a speed boost is active
    pub boost_speed_factor: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Largest step a single frame may integrate (seconds)
    pub max_dt: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            view_width: 420.0,
            view_height: 740.0,
            base_speed: 340.0,
            max_speed: 720.0,
            speed_ramp_divisor: 26.0,
            boost_speed_factor: 1.25,
            gravity: 2600.0,
            max_dt: 1.0 / 30.0,
        }
    }
}

/// Ground line shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Baseline floor height (screen y, grows downward)
    pub baseline_y: f32,
    /// Horizontal distance between cached samples
    pub step: f32,
    /// Peak noise displacement around the baseline
    pub amplitude: f32,
    /// Extra depth of a crash dip
    pub crash_depth: f32,
    /// Additional crash depth scaled by local volatility
    pub crash_volatility: f32,
    /// Crash dips occur where the crash wave falls below this value
    pub crash_threshold: f32,
    /// Highest allowed ground (smallest y)
    pub min_y: f32,
    /// Lowest allowed ground (largest y)
    pub max_y: f32,
    /// Samples kept behind the camera
    pub trail: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            baseline_y: 585.0,
            step: 14.0,
            amplitude: 18.0,
            crash_depth: 28.0,
            crash_volatility: 12.0,
            crash_threshold: -0.985,
            min_y: 540.0,
            max_y: 640.0,
            trail: 40.0,
        }
    }
}

/// Player body and jump controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Fixed screen x of the player's left edge
    pub screen_x: f32,
    pub width: f32,
    pub height: f32,
    /// Consecutive jumps allowed before landing
    pub max_jumps: u8,
    /// Upward impulse per jump in a sequence (first, second, third...)
    pub jump_impulses: Vec<f32>,
    /// Fractional impulse bonus while a speed boost is active
    pub boost_jump_bonus: f32,
    /// Grace window after leaving the ground (seconds)
    pub coyote_time: f32,
    /// Lifetime of a buffered jump request (seconds)
    pub jump_buffer: f32,
    /// Distance the feet may hover above a falling slope and stay grounded
    pub ground_snap: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            screen_x: 120.0,
            width: 34.0,
            height: 42.0,
            max_jumps: 3,
            jump_impulses: vec![860.0, 820.0, 780.0],
            boost_jump_bonus: 0.04,
            coyote_time: 0.10,
            jump_buffer: 0.12,
            ground_snap: 6.0,
        }
    }
}

/// Lives, multiplier and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTuning {
    pub starting_lives: u8,
    pub max_lives: u8,
    pub max_shield_charges: u8,
    /// Invulnerability after an unabsorbed hit
    pub hit_invulnerability: f32,
    /// Invulnerability after a shield absorbs a hit
    pub shield_invulnerability: f32,
    /// No-hit time per combo step
    pub combo_interval: f32,
    /// Multiplier growth per combo step
    pub combo_step: f32,
    pub max_multiplier: f32,
    /// Combo counts that raise a milestone event
    pub combo_milestone: u32,
    /// Passive score per pixel scrolled, before the multiplier
    pub passive_score_rate: f32,
    pub coin_reward: f32,
    pub momentum_reward: f32,
    /// Speed boost length before the character cooldown multiplier
    pub speed_boost_duration: f32,
}

impl Default for RunTuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            max_lives: 5,
            max_shield_charges: 1,
            hit_invulnerability: 0.9,
            shield_invulnerability: 0.7,
            combo_interval: 1.2,
            combo_step: 0.04,
            max_multiplier: 4.0,
            combo_milestone: 4,
            passive_score_rate: 0.18,
            coin_reward: 120.0,
            momentum_reward: 250.0,
            speed_boost_duration: 4.0,
        }
    }
}

/// Procedural placement table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTable {
    /// Distance at which difficulty saturates
    pub difficulty_distance: f32,
    /// Distance between candidate slots
    pub slot_spacing: f32,
    /// Random forward offset applied inside a slot
    pub slot_jitter: Span,
    /// First slot distance ahead of the camera at run start
    pub first_slot_offset: f32,
    /// Slots seeded at run start
    pub initial_slots: u32,
    /// Spawn horizon beyond the right edge of the frame
    pub lookahead: f32,
    /// Entities whose left edge falls this far behind the camera are evicted
    pub eviction_threshold: f32,
    /// Minimum clear space between consecutive entities
    pub min_gap: f32,

    pub hazard: ProbabilityCurve,
    pub tall_hazard: ProbabilityCurve,
    pub hazard_width: f32,
    pub tall_hazard_height: Span,
    pub short_hazard_height: Span,

    /// Chance of a momentum candle in a slot without a hazard
    pub momentum_chance: f32,
    pub momentum_width: f32,
    pub momentum_height: Span,

    pub pickup: ProbabilityCurve,
    pub pickup_radius: f32,
    pub pickup_offset: Span,
    pub air_lane_chance: f32,
    /// Height of an air-lane pickup above the ground
    pub air_height: Span,
    /// Height of a floor-lane pickup above the ground
    pub floor_height: f32,
    pub pickup_weights: Vec<PickupWeight>,
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self {
            difficulty_distance: 22_000.0,
            slot_spacing: 240.0,
            slot_jitter: Span::new(0.0, 120.0),
            first_slot_offset: 500.0,
            initial_slots: 6,
            lookahead: 600.0,
            eviction_threshold: -220.0,
            min_gap: 90.0,

            hazard: ProbabilityCurve::new(0.35, 0.35, 0.70),
            tall_hazard: ProbabilityCurve::new(0.25, 0.20, 0.45),
            hazard_width: 26.0,
            tall_hazard_height: Span::new(90.0, 140.0),
            short_hazard_height: Span::new(55.0, 95.0),

            momentum_chance: 0.25,
            momentum_width: 22.0,
            momentum_height: Span::new(45.0, 110.0),

            pickup: ProbabilityCurve::new(0.22, 0.10, 0.32),
            pickup_radius: 14.0,
            pickup_offset: Span::new(40.0, 120.0),
            air_lane_chance: 0.5,
            air_height: Span::new(120.0, 220.0),
            floor_height: 40.0,
            pickup_weights: vec![
                PickupWeight { kind: PickupKind::Coin, weight: 60.0 },
                PickupWeight { kind: PickupKind::SpeedBoost, weight: 14.0 },
                PickupWeight { kind: PickupKind::Shield, weight: 12.0 },
                PickupWeight { kind: PickupKind::ComboPower, weight: 10.0 },
                PickupWeight { kind: PickupKind::Heart, weight: 4.0 },
            ],
        }
    }
}

impl SpawnTable {
    fn spans(&self) -> [(&'static str, Span); 6] {
        [
            ("spawn.slot_jitter", self.slot_jitter),
            ("spawn.tall_hazard_height", self.tall_hazard_height),
            ("spawn.short_hazard_height", self.short_hazard_height),
            ("spawn.momentum_height", self.momentum_height),
            ("spawn.pickup_offset", self.pickup_offset),
            ("spawn.air_height", self.air_height),
        ]
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub terrain: TerrainTuning,
    pub player: PlayerTuning,
    pub run: RunTuning,
    pub spawn: SpawnTable,
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn non_negative_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 { value } else { fallback }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 { value } else { fallback }
}

fn probability(value: f32) -> f32 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

fn span_or(span: Span, fallback: Span) -> Span {
    if span.is_valid() { span } else { fallback }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a document, falling back to the shipped balance on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Ignoring tuning override: {}", err);
                Self::default()
            }
        }
    }

    /// Report the first field that would make the simulation misbehave
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |field, reason| Err(TuningError::Invalid { field, reason });

        if !(self.world.max_dt.is_finite() && self.world.max_dt > 0.0) {
            return invalid("world.max_dt", "must be positive");
        }
        if !(self.world.speed_ramp_divisor.is_finite() && self.world.speed_ramp_divisor > 0.0) {
            return invalid("world.speed_ramp_divisor", "must be positive");
        }
        if !(self.world.max_speed.is_finite() && self.world.max_speed >= 0.0) {
            return invalid("world.max_speed", "must be non-negative");
        }
        if !(self.terrain.step.is_finite() && self.terrain.step > 0.0) {
            return invalid("terrain.step", "must be positive");
        }
        if self.terrain.min_y > self.terrain.max_y {
            return invalid("terrain.min_y", "must not exceed terrain.max_y");
        }
        if self.player.max_jumps == 0 {
            return invalid("player.max_jumps", "must allow at least one jump");
        }
        if self.player.jump_impulses.is_empty() {
            return invalid("player.jump_impulses", "must list at least one impulse");
        }
        if self.run.max_lives == 0 || self.run.starting_lives > self.run.max_lives {
            return invalid("run.starting_lives", "must be within 1..=run.max_lives");
        }
        if !(self.run.combo_interval.is_finite() && self.run.combo_interval > 0.0) {
            return invalid("run.combo_interval", "must be positive");
        }
        if self.run.max_multiplier < 1.0 {
            return invalid("run.max_multiplier", "must be at least 1.0");
        }
        if !(self.spawn.slot_spacing.is_finite() && self.spawn.slot_spacing > 0.0) {
            return invalid("spawn.slot_spacing", "must be positive");
        }
        for (field, span) in self.spawn.spans() {
            if !span.is_valid() {
                return invalid(field, "must be a finite, ordered range");
            }
        }
        if self.spawn.pickup_weights.iter().any(|w| !(w.weight.is_finite() && w.weight >= 0.0)) {
            return invalid("spawn.pickup_weights", "weights must be non-negative");
        }
        Ok(())
    }

    /// Repair out-of-range values so a tick can never panic or stall.
    ///
    /// Unlike [`Tuning::validate`] this never fails: each bad field is
    /// replaced by its shipped default or clamped into range.
    pub fn sanitized(mut self) -> Self {
        let d = Tuning::default();

        let w = &mut self.world;
        w.view_width = positive_or(w.view_width, d.world.view_width);
        w.view_height = positive_or(w.view_height, d.world.view_height);
        w.base_speed = non_negative_or(w.base_speed, d.world.base_speed);
        w.max_speed = non_negative_or(w.max_speed, d.world.max_speed);
        w.speed_ramp_divisor = positive_or(w.speed_ramp_divisor, d.world.speed_ramp_divisor);
        w.boost_speed_factor = non_negative_or(w.boost_speed_factor, d.world.boost_speed_factor);
        w.gravity = finite_or(w.gravity, d.world.gravity);
        w.max_dt = positive_or(w.max_dt, d.world.max_dt).min(0.1);

        let t = &mut self.terrain;
        t.baseline_y = finite_or(t.baseline_y, d.terrain.baseline_y);
        t.step = positive_or(t.step, d.terrain.step).max(1.0);
        t.amplitude = non_negative_or(t.amplitude, d.terrain.amplitude);
        t.crash_depth = non_negative_or(t.crash_depth, d.terrain.crash_depth);
        t.crash_volatility = non_negative_or(t.crash_volatility, d.terrain.crash_volatility);
        t.crash_threshold = finite_or(t.crash_threshold, d.terrain.crash_threshold);
        t.min_y = finite_or(t.min_y, d.terrain.min_y);
        t.max_y = finite_or(t.max_y, d.terrain.max_y).max(t.min_y);
        t.trail = non_negative_or(t.trail, d.terrain.trail);

        let p = &mut self.player;
        p.screen_x = finite_or(p.screen_x, d.player.screen_x);
        p.width = positive_or(p.width, d.player.width);
        p.height = positive_or(p.height, d.player.height);
        p.max_jumps = p.max_jumps.max(1);
        p.jump_impulses.retain(|i| i.is_finite());
        if p.jump_impulses.is_empty() {
            p.jump_impulses = d.player.jump_impulses.clone();
        }
        p.boost_jump_bonus = non_negative_or(p.boost_jump_bonus, d.player.boost_jump_bonus);
        p.coyote_time = non_negative_or(p.coyote_time, d.player.coyote_time);
        p.jump_buffer = non_negative_or(p.jump_buffer, d.player.jump_buffer);
        p.ground_snap = non_negative_or(p.ground_snap, d.player.ground_snap);

        let r = &mut self.run;
        r.max_lives = r.max_lives.max(1);
        r.starting_lives = r.starting_lives.clamp(1, r.max_lives);
        r.hit_invulnerability = non_negative_or(r.hit_invulnerability, d.run.hit_invulnerability);
        r.shield_invulnerability =
            non_negative_or(r.shield_invulnerability, d.run.shield_invulnerability);
        r.combo_interval = positive_or(r.combo_interval, d.run.combo_interval).max(0.05);
        r.combo_step = non_negative_or(r.combo_step, d.run.combo_step);
        r.max_multiplier = finite_or(r.max_multiplier, d.run.max_multiplier).max(1.0);
        r.combo_milestone = r.combo_milestone.max(1);
        r.passive_score_rate = non_negative_or(r.passive_score_rate, d.run.passive_score_rate);
        r.coin_reward = non_negative_or(r.coin_reward, d.run.coin_reward);
        r.momentum_reward = non_negative_or(r.momentum_reward, d.run.momentum_reward);
        r.speed_boost_duration = non_negative_or(r.speed_boost_duration, d.run.speed_boost_duration);

        let s = &mut self.spawn;
        s.difficulty_distance = positive_or(s.difficulty_distance, d.spawn.difficulty_distance);
        s.slot_spacing = positive_or(s.slot_spacing, d.spawn.slot_spacing).max(1.0);
        s.slot_jitter = span_or(s.slot_jitter, d.spawn.slot_jitter);
        s.first_slot_offset = finite_or(s.first_slot_offset, d.spawn.first_slot_offset);
        s.lookahead = non_negative_or(s.lookahead, d.spawn.lookahead);
        s.eviction_threshold = finite_or(s.eviction_threshold, d.spawn.eviction_threshold);
        s.min_gap = non_negative_or(s.min_gap, d.spawn.min_gap);
        s.hazard_width = positive_or(s.hazard_width, d.spawn.hazard_width);
        s.tall_hazard_height = span_or(s.tall_hazard_height, d.spawn.tall_hazard_height);
        s.short_hazard_height = span_or(s.short_hazard_height, d.spawn.short_hazard_height);
        s.momentum_chance = probability(s.momentum_chance);
        s.momentum_width = positive_or(s.momentum_width, d.spawn.momentum_width);
        s.momentum_height = span_or(s.momentum_height, d.spawn.momentum_height);
        s.pickup_radius = positive_or(s.pickup_radius, d.spawn.pickup_radius);
        s.pickup_offset = span_or(s.pickup_offset, d.spawn.pickup_offset);
        s.air_lane_chance = probability(s.air_lane_chance);
        s.air_height = span_or(s.air_height, d.spawn.air_height);
        s.floor_height = finite_or(s.floor_height, d.spawn.floor_height);
        s.pickup_weights.retain(|w| w.weight.is_finite() && w.weight >= 0.0);

        self
    }
}
