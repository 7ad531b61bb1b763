//! Frame-driven simulation tick
//!
//! Advances a running simulation by one variable timestep. The order is
//! fixed: scroll, terrain, spawns, player physics, contacts, combo, passive
//! score, eviction.

use super::collision::{self, Effects};
use super::physics;
use super::state::{GameEvent, RunStatus, Simulation, multiplier_for_combo};

/// Events kept when the UI stops draining them
const MAX_PENDING_EVENTS: usize = 256;

fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 }
}

/// Advance the simulation by `dt` seconds. No-op unless a run is active.
pub fn tick(sim: &mut Simulation, dt: f32) {
    if sim.run.status != RunStatus::Running {
        return;
    }

    let Simulation {
        tuning,
        rng,
        world,
        player,
        terrain,
        spawner,
        entities,
        run,
        bonus,
        events,
        ..
    } = sim;

    let dt = clamp_dt(dt, tuning.world.max_dt);
    let wt = &tuning.world;
    world.elapsed += dt;

    // Scroll: the ramp only ever speeds up
    let ramp = (wt.base_speed + run.distance / wt.speed_ramp_divisor).min(wt.max_speed);
    world.base_speed = world.base_speed.max(ramp);
    let boosted = run.speed_boost_active();
    let boost = if boosted { wt.boost_speed_factor } else { 1.0 };
    world.scroll_speed = world.base_speed * bonus.speed_multiplier * boost;

    let travelled = world.scroll_speed * dt;
    run.distance += travelled;
    world.camera_x += travelled;
    player.pos.x = world.camera_x + tuning.player.screen_x;
    run.speed_boost_timer = (run.speed_boost_timer - dt).max(0.0);

    let horizon = wt.view_width + tuning.spawn.lookahead;
    terrain.advance(world.camera_x, horizon);
    spawner.fill(
        &tuning.spawn,
        world.camera_x + horizon,
        run.distance,
        terrain,
        entities,
        rng,
    );

    let report = physics::step(player, tuning, terrain, dt, boosted);
    if report.landed {
        events.push(GameEvent::Landed);
    }
    if let Some(index) = report.jumped {
        events.push(GameEvent::Jumped { index });
    }

    let contacts = collision::find_contacts(&player.aabb(), entities);
    let rt = &tuning.run;
    {
        let mut fx = Effects {
            player: &mut *player,
            run: &mut *run,
            tuning: rt,
            bonus: &*bonus,
            events: &mut *events,
        };
        collision::resolve(&contacts, entities, &mut fx);
    }

    if run.status == RunStatus::GameOver {
        log::info!(
            "Run over: score {:.0}, distance {:.0}, combo {}",
            run.score,
            run.distance,
            run.combo_count
        );
        events.push(GameEvent::GameOver { score: run.score });
        return;
    }

    // Combo: remainder carries into the next step
    run.combo_timer += dt;
    while run.combo_timer >= rt.combo_interval {
        run.combo_timer -= rt.combo_interval;
        run.combo_count += 1;
        run.multiplier = multiplier_for_combo(run.combo_count, rt, bonus);
        if run.combo_count % rt.combo_milestone == 0 {
            events.push(GameEvent::ComboMilestone {
                combo: run.combo_count,
                multiplier: run.multiplier,
            });
        }
    }

    let passive = world.scroll_speed * dt * rt.passive_score_rate * run.multiplier;
    run.add_score(f64::from(passive));

    let cutoff = world.camera_x + tuning.spawn.eviction_threshold;
    let evicted = entities.retain(|e| e.left() >= cutoff);
    if evicted > 0 {
        entities.compact();
    }

    if events.len() > MAX_PENDING_EVENTS {
        let excess = events.len() - MAX_PENDING_EVENTS;
        events.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Entity, Obstacle, Pickup, PickupKind};
    use crate::sim::state::{RunModifiers, ShopModifiers};
    use crate::tuning::{ProbabilityCurve, Tuning};
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    /// Flat ground, no spawns, no scrolling
    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.world.base_speed = 0.0;
        tuning.world.max_speed = 0.0;
        tuning.terrain.amplitude = 0.0;
        tuning.terrain.crash_depth = 0.0;
        tuning.terrain.crash_volatility = 0.0;
        tuning.spawn.hazard = ProbabilityCurve::never();
        tuning.spawn.pickup = ProbabilityCurve::never();
        tuning.spawn.momentum_chance = 0.0;
        tuning
    }

    fn quiet_sim(modifiers: RunModifiers) -> Simulation {
        let mut sim = Simulation::with_tuning(7, quiet_tuning());
        sim.start_run(modifiers);
        sim.drain_events();
        sim
    }

    fn pickup_at_player(sim: &Simulation, kind: PickupKind) -> Entity {
        Entity::Pickup(Pickup {
            pos: sim.player.center(),
            radius: 14.0,
            kind,
            consumed: false,
        })
    }

    fn hazard_at_player(sim: &Simulation, height: f32) -> Entity {
        let ground = sim.terrain.baseline();
        Entity::Obstacle(Obstacle {
            pos: Vec2::new(sim.player.pos.x + 5.0, ground - height),
            size: Vec2::new(26.0, height),
            hazardous: true,
            consumed: false,
        })
    }

    fn count_hits(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| matches!(e, GameEvent::Hit { .. })).count()
    }

    #[test]
    fn test_idle_simulation_does_not_advance() {
        let mut sim = Simulation::new(1);
        sim.update(DT);
        assert_eq!(sim.world.camera_x, 0.0);
        assert_eq!(sim.world.elapsed, 0.0);
    }

    #[test]
    fn test_scroll_and_passive_score() {
        let mut sim = Simulation::new(1);
        sim.start_run(RunModifiers::default());
        sim.update(DT);
        assert!((sim.world.scroll_speed - 340.0).abs() < 1e-3);
        assert!((sim.world.camera_x - 340.0 * DT).abs() < 1e-3);
        let expected = 340.0 * DT * 0.18;
        assert!((sim.run.score - f64::from(expected)).abs() < 1e-3);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut sim = Simulation::new(1);
        sim.start_run(RunModifiers::default());
        sim.update(5.0);
        assert!((sim.world.elapsed - 1.0 / 30.0).abs() < 1e-6);
        sim.update(f32::NAN);
        sim.update(-1.0);
        assert!((sim.world.elapsed - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_base_speed_ramps_and_caps() {
        let mut sim = Simulation::new(1);
        sim.start_run(RunModifiers::default());
        sim.run.distance = 26.0 * 100.0;
        sim.update(0.0);
        assert!((sim.world.base_speed - 440.0).abs() < 1e-3);
        sim.run.distance = 1e7;
        sim.update(0.0);
        assert_eq!(sim.world.base_speed, 720.0);
        // Never decreases, even if distance were reset
        sim.run.distance = 0.0;
        sim.update(0.0);
        assert_eq!(sim.world.base_speed, 720.0);
    }

    #[test]
    fn test_speed_boost_scales_scroll() {
        let mut sim = Simulation::new(1);
        sim.start_run(RunModifiers::default());
        sim.run.speed_boost_timer = 1.0;
        sim.update(DT);
        assert!((sim.world.scroll_speed - 340.0 * 1.25).abs() < 1e-3);
        assert!(sim.hud().speed_boost_active);
    }

    #[test]
    fn test_five_coins_at_zero_speed() {
        let mut sim = quiet_sim(RunModifiers::default());
        for _ in 0..5 {
            let coin = pickup_at_player(&sim, PickupKind::Coin);
            sim.entities.insert(coin);
        }
        sim.update(DT);
        assert_eq!(sim.run.score, 5.0 * 120.0);
        assert_eq!(sim.entity_count(), 0);
    }

    #[test]
    fn test_combo_after_three_intervals() {
        let mut sim = quiet_sim(RunModifiers::default());
        let dt = 1.0 / 32.0;
        // 116 ticks = 3.625 s, just past 3 × 1.2 s
        for _ in 0..116 {
            sim.update(dt);
        }
        assert_eq!(sim.run.combo_count, 3);
        assert!((sim.run.multiplier - 1.12).abs() < 1e-5);
    }

    #[test]
    fn test_combo_milestone_event() {
        let mut sim = quiet_sim(RunModifiers::default());
        for _ in 0..(5.0 / DT) as usize {
            sim.update(DT);
        }
        let milestones: Vec<_> = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ComboMilestone { combo: 4, .. }))
            .collect();
        assert_eq!(milestones.len(), 1);
    }

    #[test]
    fn test_combo_step_recomputes_starting_multiplier() {
        let mut sim = quiet_sim(RunModifiers {
            shop: ShopModifiers {
                starting_multiplier: 1.5,
                ..Default::default()
            },
            ..Default::default()
        });
        let dt = 1.0 / 32.0;
        // Holds until the first step
        for _ in 0..32 {
            sim.update(dt);
        }
        assert_eq!(sim.run.combo_count, 0);
        assert_eq!(sim.run.multiplier, 1.5);

        for _ in 32..116 {
            sim.update(dt);
        }
        assert_eq!(sim.run.combo_count, 3);
        let expected = multiplier_for_combo(3, &sim.tuning.run, &sim.bonus);
        assert!((sim.run.multiplier - expected).abs() < 1e-6);
        assert!((sim.run.multiplier - 1.12).abs() < 1e-5);
    }

    #[test]
    fn test_hazard_under_landing_costs_one_life() {
        let mut sim = quiet_sim(RunModifiers {
            shop: ShopModifiers {
                starting_multiplier: 1.5,
                ..Default::default()
            },
            ..Default::default()
        });
        sim.player.pos.y = 300.0;
        sim.player.grounded = false;
        sim.player.jumps_remaining = 2;
        let hazard = hazard_at_player(&sim, 60.0);
        sim.entities.insert(hazard);

        // Falls onto the candle and stands in it, well inside the
        // invulnerability window
        for _ in 0..40 {
            sim.update(DT);
        }
        let events = sim.drain_events();
        assert_eq!(count_hits(&events), 1);
        assert_eq!(sim.run.lives, 2);
        assert_eq!(sim.run.multiplier, 1.0);
        assert!(sim.player.grounded);
        assert_eq!(sim.entity_count(), 1);
    }

    #[test]
    fn test_shield_absorbs_and_removes_hazard() {
        let mut sim = quiet_sim(RunModifiers {
            shop: ShopModifiers {
                starts_with_shield: true,
                starting_multiplier: 2.0,
                ..Default::default()
            },
            ..Default::default()
        });
        let hazard = hazard_at_player(&sim, 80.0);
        sim.entities.insert(hazard);
        sim.update(DT);

        assert_eq!(sim.run.lives, 3);
        assert_eq!(sim.player.shield_charges, 0);
        assert_eq!(sim.run.multiplier, 2.0);
        assert_eq!(sim.entity_count(), 0);
        assert!(sim.drain_events().contains(&GameEvent::ShieldAbsorbed));
    }

    #[test]
    fn test_heart_at_cap() {
        let mut sim = quiet_sim(RunModifiers {
            shop: ShopModifiers {
                extra_starting_lives: 2,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(sim.run.lives, 5);
        let heart = pickup_at_player(&sim, PickupKind::Heart);
        sim.entities.insert(heart);
        sim.update(DT);
        assert_eq!(sim.run.lives, 5);
        assert!(sim.drain_events().contains(&GameEvent::LivesFull));
    }

    #[test]
    fn test_coyote_jump_matches_grounded_jump() {
        let mut grounded = quiet_sim(RunModifiers::default());
        grounded.request_jump();
        grounded.update(DT);

        let mut coyote = quiet_sim(RunModifiers::default());
        coyote.player.grounded = false;
        coyote.player.pos.y -= 30.0;
        coyote.player.coyote_timer = 0.08;
        coyote.request_jump();
        coyote.update(DT);

        assert_eq!(grounded.player.vel_y, -860.0);
        assert_eq!(coyote.player.vel_y, grounded.player.vel_y);
        assert_eq!(coyote.player.jumps_remaining, grounded.player.jumps_remaining);
    }

    #[test]
    fn test_zero_budget_jump_waits_for_landing() {
        let mut sim = quiet_sim(RunModifiers::default());
        sim.player.pos.y = 300.0;
        sim.player.grounded = false;
        sim.player.jumps_remaining = 0;
        sim.request_jump();

        let mut landed_at = None;
        for i in 0..60 {
            sim.update(DT);
            let events = sim.drain_events();
            assert!(!events.iter().any(|e| matches!(e, GameEvent::Jumped { .. })));
            if events.contains(&GameEvent::Landed) {
                landed_at = Some(i);
                break;
            }
            assert_eq!(sim.player.jumps_remaining, 0);
        }
        // The request expired mid-air, so landing does not trigger it
        assert!(landed_at.is_some());
        assert_eq!(sim.player.jumps_remaining, 3);

        sim.request_jump();
        sim.update(DT);
        assert!(sim.drain_events().contains(&GameEvent::Jumped { index: 0 }));
    }

    #[test]
    fn test_buffered_jump_fires_on_landing_tick() {
        let mut sim = quiet_sim(RunModifiers::default());
        let ground = sim.terrain.baseline();
        // Just above the floor and falling, out of jumps
        sim.player.pos.y = ground - sim.player.size.y - 10.0;
        sim.player.vel_y = 200.0;
        sim.player.grounded = false;
        sim.player.coyote_timer = 0.0;
        sim.player.jumps_remaining = 0;
        sim.request_jump();

        let mut landing_events = None;
        for _ in 0..6 {
            sim.update(DT);
            let events = sim.drain_events();
            if events.contains(&GameEvent::Landed) {
                landing_events = Some(events);
                break;
            }
            assert!(!events.iter().any(|e| matches!(e, GameEvent::Jumped { .. })));
            assert!(sim.player.jump_buffer_timer > 0.0);
        }

        let events = landing_events.expect("landed within the buffer window");
        assert!(events.contains(&GameEvent::Jumped { index: 0 }));
        assert!(!sim.player.grounded);
        assert!(sim.player.vel_y < 0.0);
        assert_eq!(sim.player.jumps_remaining, 2);
        assert_eq!(sim.player.jump_buffer_timer, 0.0);
    }

    #[test]
    fn test_game_over_freezes_run() {
        let mut sim = quiet_sim(RunModifiers::default());
        sim.run.lives = 1;
        let hazard = hazard_at_player(&sim, 80.0);
        sim.entities.insert(hazard);
        sim.update(DT);

        assert_eq!(sim.status(), RunStatus::GameOver);
        let events = sim.drain_events();
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));

        let elapsed = sim.world.elapsed;
        sim.request_jump();
        sim.update(DT);
        assert_eq!(sim.world.elapsed, elapsed);
        assert_eq!(sim.player.jump_buffer_timer, 0.0);
    }

    #[test]
    fn test_entities_behind_camera_are_evicted() {
        let mut sim = Simulation::new(3);
        sim.start_run(RunModifiers::default());
        sim.entities.insert(Entity::Pickup(Pickup {
            pos: Vec2::new(-400.0, 100.0),
            radius: 14.0,
            kind: PickupKind::Coin,
            consumed: false,
        }));
        let before = sim.entity_count();
        sim.update(DT);
        let cutoff = sim.world.camera_x - 220.0;
        assert_eq!(sim.entity_count(), before - 1);
        assert!(sim.entities().all(|e| e.left() >= cutoff));
    }

    #[test]
    fn test_determinism() {
        let mut a = Simulation::new(2024);
        let mut b = Simulation::new(2024);
        a.start_run(RunModifiers::default());
        b.start_run(RunModifiers::default());
        for i in 0..600 {
            if i % 37 == 0 {
                a.request_jump();
                b.request_jump();
            }
            a.update(DT);
            b.update(DT);
        }
        assert_eq!(a.hud(), b.hud());
        assert_eq!(a.world.camera_x, b.world.camera_x);
        assert_eq!(a.player, b.player);
    }

    #[test]
    fn test_pending_events_are_bounded() {
        let mut sim = quiet_sim(RunModifiers::default());
        for _ in 0..2000 {
            sim.request_jump();
            sim.update(DT);
        }
        assert!(sim.events().len() <= MAX_PENDING_EVENTS);
    }
}
