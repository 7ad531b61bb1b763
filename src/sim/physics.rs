//! Player body, jump controller and gravity integration
//!
//! The player is either grounded or airborne. Jumps come from a fixed
//! budget refilled only on landing; a request is buffered briefly so a tap
//! just before touchdown still fires, and a coyote window keeps a jump
//! available for a moment after running off a ledge.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::terrain::Terrain;
use crate::tuning::{PlayerTuning, Tuning};

/// The runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner in world coordinates (y grows downward)
    pub pos: Vec2,
    pub size: Vec2,
    /// Positive is downward
    pub vel_y: f32,
    pub grounded: bool,
    pub jumps_remaining: u8,
    pub coyote_timer: f32,
    pub jump_buffer_timer: f32,
    pub invulnerability_timer: f32,
    pub shield_charges: u8,
}

/// What happened to the player during one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Airborne → grounded this step
    pub landed: bool,
    /// Grounded → airborne without a jump (ground fell away)
    pub left_ground: bool,
    /// Index in the jump sequence of a jump executed this step
    pub jumped: Option<u8>,
}

impl Player {
    /// A player standing on the ground at world x `x`
    pub fn new(tuning: &PlayerTuning, x: f32, ground_y: f32) -> Self {
        Self {
            pos: Vec2::new(x, ground_y - tuning.height),
            size: Vec2::new(tuning.width, tuning.height),
            vel_y: 0.0,
            grounded: true,
            jumps_remaining: tuning.max_jumps,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            invulnerability_timer: 0.0,
            shield_charges: 0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Screen y of the feet
    pub fn feet(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability_timer > 0.0
    }

    /// Record a jump request; repeated requests only refresh the window
    pub fn request_jump(&mut self, buffer: f32) {
        self.jump_buffer_timer = buffer;
    }

    /// Execute a jump if budget remains.
    ///
    /// Returns false and leaves the player untouched at zero budget.
    pub fn do_jump(&mut self, tuning: &PlayerTuning, boosted: bool) -> bool {
        if self.jumps_remaining == 0 {
            return false;
        }
        let index = tuning.max_jumps.saturating_sub(self.jumps_remaining) as usize;
        let impulse = tuning
            .jump_impulses
            .get(index)
            .or(tuning.jump_impulses.last())
            .copied()
            .unwrap_or(0.0);
        let scale = if boosted {
            1.0 + tuning.boost_jump_bonus
        } else {
            1.0
        };

        self.vel_y = -impulse * scale;
        self.grounded = false;
        self.jumps_remaining -= 1;
        self.coyote_timer = 0.0;
        self.jump_buffer_timer = 0.0;
        true
    }

    /// Count down the coyote, buffer and invulnerability windows
    pub fn tick_timers(&mut self, dt: f32) {
        if !self.grounded {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }
        self.jump_buffer_timer = (self.jump_buffer_timer - dt).max(0.0);
        self.invulnerability_timer = (self.invulnerability_timer - dt).max(0.0);
    }

    /// True when a buffered request may fire this step
    fn can_consume_buffer(&self) -> bool {
        self.jump_buffer_timer > 0.0
            && (self.grounded || self.coyote_timer > 0.0 || self.jumps_remaining > 0)
    }
}

/// Advance the player by one step: timers, gravity, ground contact, then
/// any buffered jump.
pub fn step(player: &mut Player, tuning: &Tuning, terrain: &Terrain, dt: f32, boosted: bool) -> StepReport {
    let pt = &tuning.player;
    let mut report = StepReport::default();

    player.tick_timers(dt);

    // Explicit Euler
    player.vel_y += tuning.world.gravity * dt;
    player.pos.y += player.vel_y * dt;

    let ground = terrain.ground_height(player.center().x);
    // Stick to downhill slopes instead of hopping off every sample
    let snap = if player.grounded && player.vel_y >= 0.0 {
        pt.ground_snap
    } else {
        0.0
    };

    if player.feet() + snap >= ground {
        player.pos.y = ground - player.size.y;
        player.vel_y = 0.0;
        if !player.grounded {
            player.grounded = true;
            player.jumps_remaining = pt.max_jumps;
            report.landed = true;
        }
        player.coyote_timer = pt.coyote_time;
    } else if player.grounded {
        player.grounded = false;
        player.coyote_timer = pt.coyote_time;
        report.left_ground = true;
    }

    if player.can_consume_buffer() {
        let index = pt.max_jumps.saturating_sub(player.jumps_remaining);
        if player.do_jump(pt, boosted) {
            report.jumped = Some(index);
        }
    }

    report
}
