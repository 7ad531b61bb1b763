//! End-to-end flows through the public API

use chrono::NaiveDate;
use rekt_runner::consts::FRAME_DT;
use rekt_runner::leaderboard::{Leaderboard, LeaderboardView};
use rekt_runner::profile::{CharacterId, SaveRecord, ShopItem, week_key, whole_score};
use rekt_runner::sim::{GameEvent, RunModifiers, RunStatus, Simulation, autopilot};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn idle_simulation_waits_for_start() {
    let mut sim = Simulation::new(11);
    assert_eq!(sim.status(), RunStatus::Idle);

    sim.request_jump();
    for _ in 0..30 {
        sim.update(FRAME_DT);
    }
    assert_eq!(sim.run().distance, 0.0);
    assert_eq!(sim.run().score, 0.0);
    assert!(sim.events().is_empty());

    sim.start_run(RunModifiers::default());
    assert_eq!(sim.status(), RunStatus::Running);
    assert_eq!(sim.drain_events(), vec![GameEvent::RunStarted]);

    for _ in 0..30 {
        sim.update(FRAME_DT);
    }
    assert!(sim.run().distance > 0.0);

    sim.reset_run();
    assert_eq!(sim.status(), RunStatus::Idle);
    assert_eq!(sim.run().distance, 0.0);
    assert_eq!(sim.hud().lives, sim.tuning().run.starting_lives);
}

#[test]
fn restarting_gives_a_fresh_run() {
    let mut sim = Simulation::new(5);
    sim.start_run(RunModifiers::default());
    for _ in 0..120 {
        sim.update(FRAME_DT);
    }
    let first_distance = sim.run().distance;
    assert!(first_distance > 0.0);

    sim.start_run(RunModifiers::default());
    assert_eq!(sim.run().distance, 0.0);
    assert_eq!(sim.run().score, 0.0);
    assert_eq!(sim.world().camera_x, 0.0);
}

#[test]
fn autopilot_plays_a_run() {
    let mut jumps = 0;
    for seed in 1..=4 {
        let mut sim = Simulation::new(seed);
        sim.start_run(RunModifiers::default());

        let mut ticks = 0;
        while sim.status() == RunStatus::Running && ticks < 30 * 60 {
            autopilot::step(&mut sim, FRAME_DT);
            jumps += sim
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Jumped { .. }))
                .count();
            ticks += 1;
        }

        assert!(sim.run().distance > 0.0);
        assert!(sim.run().score > 0.0);
        assert!(sim.run().lives <= sim.tuning().run.max_lives);
    }
    assert!(jumps > 0, "autopilot never jumped over a red candle");
}

#[test]
fn character_speed_bonus_scales_scroll() {
    let mut plain = Simulation::new(2);
    let mut mega = Simulation::new(2);
    plain.start_run(RunModifiers::default());
    mega.start_run(RunModifiers {
        character: CharacterId::Mega.def().bonus,
        ..RunModifiers::default()
    });

    plain.update(FRAME_DT);
    mega.update(FRAME_DT);

    let ratio = mega.world().scroll_speed / plain.world().scroll_speed;
    assert!((ratio - 1.05).abs() < 1e-4, "ratio {}", ratio);
}

#[test]
fn profile_to_leaderboard_flow() {
    let monday = day(2026, 3, 2);
    let mut profile = SaveRecord::default();

    // First day pays the welcome bonus, the next day grows the streak
    let bonus = profile.claim_daily(monday).expect("first claim");
    assert_eq!(bonus.credits, 150);
    assert!(profile.claim_daily(monday).is_none());
    let bonus = profile.claim_daily(day(2026, 3, 3)).expect("second day");
    assert_eq!(bonus.streak, 2);
    assert_eq!(profile.credits, 150 + 160);

    // Only the extra life is affordable
    let (modifiers, receipt) =
        profile.prepare_run(&[ShopItem::ExtraLife, ShopItem::StartMultiplier]);
    assert_eq!(receipt.bought, vec![ShopItem::ExtraLife]);
    assert_eq!(receipt.skipped, vec![ShopItem::StartMultiplier]);
    assert_eq!(profile.credits, 10);

    let mut sim = Simulation::new(9);
    sim.start_run(modifiers);
    assert_eq!(sim.run().lives, 4);
    for _ in 0..600 {
        sim.update(FRAME_DT);
    }
    let score = sim.run().score;
    assert!(score > 0.0);

    let settlement = profile.settle_run(score, day(2026, 3, 3));
    assert!(settlement.new_best_all_time);
    assert_eq!(profile.best_all_time, whole_score(score));

    let week = week_key(day(2026, 3, 3));
    let mut board = Leaderboard::new();
    board.submit("old run", 10, "2025-W01", 0.0);
    let rank = board.submit("  degen  ", whole_score(score).max(11), &week, 1.0);
    assert_eq!(rank, Some(1));

    let weekly = board.view(LeaderboardView::Weekly, &week);
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].name, "degen");
    assert_eq!(board.view(LeaderboardView::AllTime, &week).len(), 2);
}

#[test]
fn saved_profile_survives_a_round_trip() {
    let mut profile = SaveRecord {
        credits: 3000,
        ..SaveRecord::default()
    };
    profile.select_character(CharacterId::Mega).expect("affordable");

    let json = serde_json::to_string(&profile).expect("serialize");
    let restored = SaveRecord::from_json(&json).expect("parse");
    assert_eq!(restored.selected_character(), CharacterId::Mega);
    assert_eq!(restored.credits, 500);

    // Older saves missing fields still load
    let partial = SaveRecord::from_json(r#"{"credits": 42}"#).expect("partial");
    assert_eq!(partial.credits, 42);
    assert_eq!(partial.selected_character(), CharacterId::Bull);
}
