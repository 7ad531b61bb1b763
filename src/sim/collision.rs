//! Contact detection and the effects it triggers
//!
//! Detection is read-only: [`find_contacts`] walks the arena and reports
//! what the player touches. Resolution then applies the effects in slot
//! order, so a fatal hit stops everything behind it.

use glam::Vec2;

use super::entity::{Entity, EntityArena, EntityId, PickupKind};
use super::physics::Player;
use super::state::{CharacterBonus, GameEvent, RunState, RunStatus};
use crate::tuning::RunTuning;

/// Axis-aligned box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Circle overlap via the closest point on the box
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        center.distance_squared(closest) < radius * radius
    }
}

/// Something the player is touching this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Hazard(EntityId),
    Momentum(EntityId),
    Pickup(EntityId, PickupKind),
}

/// Every unconsumed entity overlapping `player`, in slot order
pub fn find_contacts(player: &Aabb, entities: &EntityArena) -> Vec<Contact> {
    entities
        .iter()
        .filter(|(_, entity)| !entity.is_consumed())
        .filter_map(|(id, entity)| match entity {
            Entity::Obstacle(o) if player.overlaps(&o.aabb()) => Some(if o.hazardous {
                Contact::Hazard(id)
            } else {
                Contact::Momentum(id)
            }),
            Entity::Pickup(p) if player.overlaps_circle(p.pos, p.radius) => {
                Some(Contact::Pickup(id, p.kind))
            }
            _ => None,
        })
        .collect()
}

/// How a hazard contact played out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Player was invulnerable
    Ignored,
    /// A shield charge took the hit
    Absorbed,
    /// One life lost
    Damaged,
    /// Last life lost
    Fatal,
}

/// Mutable view over everything a contact can change
pub struct Effects<'a> {
    pub player: &'a mut Player,
    pub run: &'a mut RunState,
    pub tuning: &'a RunTuning,
    pub bonus: &'a CharacterBonus,
    pub events: &'a mut Vec<GameEvent>,
}

impl Effects<'_> {
    pub fn take_hit(&mut self) -> HitOutcome {
        if self.player.is_invulnerable() {
            return HitOutcome::Ignored;
        }

        if self.player.shield_charges > 0 {
            self.player.shield_charges -= 1;
            self.player.invulnerability_timer = self.tuning.shield_invulnerability;
            self.events.push(GameEvent::ShieldAbsorbed);
            return HitOutcome::Absorbed;
        }

        self.run.lives = self.run.lives.saturating_sub(1);
        self.run.multiplier = 1.0;
        self.run.combo_count = 0;
        self.run.combo_timer = 0.0;
        self.player.invulnerability_timer = self.tuning.hit_invulnerability;
        self.events.push(GameEvent::Hit {
            lives_left: self.run.lives,
        });

        if self.run.lives == 0 {
            self.run.status = RunStatus::GameOver;
            HitOutcome::Fatal
        } else {
            HitOutcome::Damaged
        }
    }

    fn grant_speed_boost(&mut self) {
        self.run.speed_boost_timer = self.tuning.speed_boost_duration * self.bonus.cooldown_multiplier;
    }

    fn grant_shield(&mut self) {
        self.player.shield_charges = self
            .player
            .shield_charges
            .saturating_add(1)
            .min(self.tuning.max_shield_charges);
    }

    pub fn apply_pickup(&mut self, kind: PickupKind) {
        match kind {
            PickupKind::Coin => {
                let reward = f64::from(self.tuning.coin_reward * self.run.multiplier);
                self.run.add_score(reward);
                self.events.push(GameEvent::CoinCollected { reward });
            }
            PickupKind::SpeedBoost => {
                self.grant_speed_boost();
                self.events.push(GameEvent::PowerUp { kind });
            }
            PickupKind::Shield => {
                self.grant_shield();
                self.events.push(GameEvent::PowerUp { kind });
            }
            PickupKind::ComboPower => {
                self.grant_speed_boost();
                self.grant_shield();
                self.events.push(GameEvent::PowerUp { kind });
            }
            PickupKind::Heart => {
                if self.run.lives < self.run.max_lives {
                    self.run.lives += 1;
                    self.events.push(GameEvent::Healed {
                        lives: self.run.lives,
                    });
                } else {
                    self.events.push(GameEvent::LivesFull);
                }
            }
        }
    }

    pub fn collect_momentum(&mut self) {
        let reward = f64::from(self.tuning.momentum_reward * self.run.multiplier);
        self.run.add_score(reward);
        self.events.push(GameEvent::MomentumCollected { reward });
    }
}

/// Apply every contact in order. Stops as soon as the run ends.
pub fn resolve(contacts: &[Contact], entities: &mut EntityArena, fx: &mut Effects<'_>) {
    for contact in contacts {
        if fx.run.status != RunStatus::Running {
            break;
        }
        match *contact {
            Contact::Hazard(id) => {
                if fx.take_hit() == HitOutcome::Absorbed {
                    entities.remove(id);
                }
            }
            Contact::Momentum(id) => {
                if let Some(Entity::Obstacle(o)) = entities.get_mut(id) {
                    o.consumed = true;
                    fx.collect_momentum();
                }
            }
            Contact::Pickup(id, kind) => {
                if entities.remove(id).is_some() {
                    fx.apply_pickup(kind);
                }
            }
        }
    }
}
