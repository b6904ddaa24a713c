use std::time::Duration;

use lane_defence_core::{Event, Phase, TileCoord, TowerKind, UpgradeTrack};
use lane_defence_runtime::{AudioCue, Session, SessionConfig};
use lane_defence_system_difficulty::wave_plan;
use lane_defence_world::{query, WorldConfig};

const TICK: Duration = Duration::from_micros(16_667);

fn session_with(seed: u64, world: WorldConfig) -> Session {
    Session::new(SessionConfig {
        rng_seed: seed,
        world,
    })
}

/// Runs ticks until the predicate holds, panicking past the cap.
fn run_until(session: &mut Session, cap: usize, mut done: impl FnMut(&Session) -> bool) {
    for _ in 0..cap {
        let _ = session.tick(TICK);
        if done(session) {
            return;
        }
    }
    panic!("condition not reached within {cap} ticks");
}

#[test]
fn money_is_conserved_across_a_full_wave() {
    let mut session = Session::new(SessionConfig {
        rng_seed: 42,
        world: WorldConfig::default(),
    });

    let tile = TileCoord::new(2, 2);
    assert!(session.place_tower_at(tile));
    let after_purchase = query::money(session.world());
    assert_eq!(after_purchase, 50);

    // Play wave one to completion, summing every paid reward.
    let mut rewards = 0u32;
    let mut wave_seen = false;
    for _ in 0..60_000 {
        let events: Vec<Event> = session.tick(TICK).to_vec();
        for event in &events {
            match event {
                Event::WaveStarted { .. } => wave_seen = true,
                Event::EnemyKilled { reward, .. } => rewards += reward,
                _ => {}
            }
        }
        if wave_seen && query::phase(session.world()) == Phase::Planning {
            break;
        }
    }
    assert!(wave_seen, "wave one never started");
    assert_eq!(
        query::phase(session.world()),
        Phase::Planning,
        "wave one never resolved"
    );
    assert_eq!(
        query::money(session.world()),
        after_purchase + rewards,
        "every credit must come from a paid kill reward"
    );
    assert_eq!(query::live_enemy_count(session.world()), 0);
}

#[test]
fn a_leak_charges_a_life_and_pays_nothing() {
    let mut session = session_with(7, WorldConfig::default());

    let mut leaked = false;
    for _ in 0..60_000 {
        let events: Vec<Event> = session.tick(TICK).to_vec();
        if let Some(Event::EnemyLeaked {
            lives_remaining, ..
        }) = events
            .iter()
            .find(|event| matches!(event, Event::EnemyLeaked { .. }))
        {
            assert_eq!(*lives_remaining, 19);
            leaked = true;
            break;
        }
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::EnemyKilled { .. })),
            "no towers were placed, so nothing can die"
        );
    }
    assert!(leaked, "an undefended enemy must eventually leak");
    assert_eq!(query::lives(session.world()), 19);
    assert_eq!(query::money(session.world()), 100, "leaks pay no reward");
}

#[test]
fn losing_the_last_life_freezes_the_session() {
    let mut session = session_with(
        11,
        WorldConfig {
            starting_money: 100,
            starting_lives: 1,
        },
    );

    run_until(&mut session, 120_000, |session| {
        query::game_over(session.world())
    });
    assert!(session
        .take_audio_cues()
        .contains(&AudioCue::GameOver));

    let money = query::money(session.world());
    let wave = query::wave(session.world());
    let events: Vec<Event> = session.tick(TICK).to_vec();
    assert!(events.is_empty(), "terminal ticks emit nothing");
    assert_eq!(query::money(session.world()), money);
    assert_eq!(query::wave(session.world()), wave);

    assert!(
        !session.place_tower_at(TileCoord::new(2, 2)),
        "input after the end of the run is ignored"
    );
}

#[test]
fn sell_mode_routes_clicks_and_refunds() {
    let mut session = session_with(0, WorldConfig::default());
    let tile = TileCoord::new(2, 2);
    assert!(session.handle_tile_click(tile), "default mode places");
    assert_eq!(query::money(session.world()), 50);

    assert!(session.toggle_sell_mode());
    assert!(session.handle_tile_click(tile), "sell mode sells");
    assert_eq!(query::money(session.world()), 87);
    assert!(query::tower_at(session.world(), tile).is_none());
    assert!(session.sell_mode(), "mode persists until toggled off");

    assert!(!session.handle_tile_click(tile), "empty tile declines");
}

#[test]
fn upgrade_mode_selects_then_applies() {
    let mut session = session_with(
        0,
        WorldConfig {
            starting_money: 10_000,
            starting_lives: 20,
        },
    );
    let tile = TileCoord::new(2, 2);
    assert!(session.place_tower_at(tile));

    assert!(session.toggle_upgrade_mode());
    assert!(!session.handle_tile_click(TileCoord::new(5, 5)), "no tower there");
    assert_eq!(session.upgrade_target(), None);

    assert!(session.handle_tile_click(tile));
    assert_eq!(session.upgrade_target(), Some(tile));

    assert!(session.apply_upgrade(UpgradeTrack::FireRate));
    let snapshot = query::tower_view(session.world())
        .into_vec()
        .pop()
        .expect("one tower placed");
    assert_eq!(snapshot.fire_rate_level, 1);
}

#[test]
fn selling_the_upgrade_target_clears_the_selection() {
    let mut session = session_with(0, WorldConfig::default());
    let tile = TileCoord::new(2, 2);
    assert!(session.place_tower_at(tile));
    assert!(session.toggle_upgrade_mode());
    assert!(session.handle_tile_click(tile));

    assert!(session.sell_tower_at(tile));
    assert_eq!(session.upgrade_target(), None);
    assert!(!session.apply_upgrade(UpgradeTrack::Damage));
}

#[test]
fn interaction_modes_are_mutually_exclusive() {
    let mut session = session_with(0, WorldConfig::default());

    assert!(session.toggle_upgrade_mode());
    assert!(session.toggle_sell_mode());
    assert!(!session.upgrade_mode(), "entering sell leaves upgrade");

    assert!(session.toggle_upgrade_mode());
    assert!(!session.sell_mode(), "entering upgrade leaves sell");

    session.select_tower_kind(TowerKind::Rapid);
    assert!(!session.sell_mode());
    assert!(!session.upgrade_mode());
    assert_eq!(session.selected_tower(), TowerKind::Rapid);
}

#[test]
fn mute_suppresses_audio_cues() {
    let mut session = session_with(0, WorldConfig::default());

    assert!(session.place_tower_at(TileCoord::new(2, 2)));
    assert_eq!(session.take_audio_cues(), vec![AudioCue::TowerPlaced]);

    assert!(session.toggle_mute());
    assert!(session.place_tower_at(TileCoord::new(3, 3)));
    assert!(session.take_audio_cues().is_empty());

    assert!(!session.toggle_mute());
}

#[test]
fn rejected_placement_emits_no_cue_and_charges_nothing() {
    let mut session = session_with(0, WorldConfig::default());
    session.select_tower_kind(TowerKind::Heavy);

    assert!(!session.place_tower_at(TileCoord::new(2, 2)), "120 exceeds 100");
    assert_eq!(query::money(session.world()), 100);
    assert!(session.take_audio_cues().is_empty());
}

#[test]
fn waves_escalate_with_the_difficulty_curve() {
    // Session-level sanity on the curve wiring: wave two schedules more
    // spawns than wave one says it should only if the plan says so.
    let plan_one = wave_plan(1);
    let plan_two = wave_plan(2);
    assert!(plan_two.count >= plan_one.count);

    let mut session = session_with(3, WorldConfig::default());
    run_until(&mut session, 60_000, |session| {
        query::wave(session.world()) == 1 && query::is_spawning(session.world())
    });
    let first_total = query::remaining_spawns(session.world())
        + query::live_enemy_count(session.world());
    assert_eq!(
        first_total,
        (plan_one.count + plan_one.burst_bonus) as usize
    );
}
