//! End-to-end engine tests — turn pipeline, command failure taxonomy,
//! docking, kill bookkeeping, and the three end conditions.

use stargrid_core::{
    engine::{MissionOutcome, TurnEngine},
    ship::ShipSystem,
    types::{ObjectKind, SectorPos, QUADRANT_SIZE},
    SimConfig,
};

/// Test config with random events switched off so resource numbers are
/// exactly predictable.
fn quiet_cfg() -> SimConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cfg = SimConfig::default_test();
    cfg.events.base_event_chance = 0.0;
    cfg
}

fn p(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn free_sector(engine: &TurnEngine) -> SectorPos {
    let quadrant = engine.ship().quadrant;
    let objects = engine.galaxy().objects(quadrant);
    for x in 1..=QUADRANT_SIZE {
        for y in 1..=QUADRANT_SIZE {
            let pos = SectorPos::new(x, y);
            if pos != engine.ship().position && !objects.contains_key(&pos) {
                return pos;
            }
        }
    }
    panic!("no free sector around the ship");
}

#[test]
fn empty_galaxy_is_immediate_victory() {
    let mut cfg = quiet_cfg();
    cfg.galaxy.total_hostiles = 0;
    let mut engine = TurnEngine::new(cfg);

    let report = engine.process_turn("srs", &[]);
    assert!(report.success, "{}", report.message);
    assert_eq!(report.outcome, MissionOutcome::Victory);
    assert!(engine.is_over());
}

#[test]
fn firing_with_no_targets_fails_without_spending() {
    let mut cfg = quiet_cfg();
    cfg.galaxy.total_hostiles = 0;
    let mut engine = TurnEngine::new(cfg);
    engine.ship_mut().energy = 1;

    let report = engine.process_turn("pha", &p(&["1"]));
    assert!(!report.success);
    assert!(report.message.contains("No targets"), "got: {}", report.message);
    assert_eq!(engine.ship().energy, 1, "a failed command must not spend energy");
    assert_eq!(report.outcome, MissionOutcome::InProgress);
}

#[test]
fn invalid_navigation_is_rejected_in_place() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let before = engine.ship().quadrant;

    let report = engine.process_turn("nav", &p(&["9,9"]));
    assert!(!report.success);
    assert!(
        report.message.contains("Invalid quadrant"),
        "got: {}",
        report.message
    );
    assert_eq!(engine.ship().quadrant, before);
}

#[test]
fn deadline_expiry_is_a_defeat() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let deadline = engine.state().mission_deadline;
    engine.state_mut().stardate = deadline - 0.05;

    let report = engine.process_turn("srs", &[]);
    assert!(report.success, "{}", report.message);
    assert_eq!(report.outcome, MissionOutcome::TimeExpired);
    assert!(engine.is_over());
}

#[test]
fn unknown_commands_fail_but_count_as_an_attempt() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let report = engine.process_turn("xyz", &[]);

    assert!(!report.success);
    assert!(report.message.contains("Unknown command"), "got: {}", report.message);
    assert_eq!(engine.state().turn_count, 1);
    assert_eq!(report.outcome, MissionOutcome::InProgress);
}

#[test]
fn malformed_parameters_fail_but_count_as_an_attempt() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let before = engine.ship().quadrant;

    let report = engine.process_turn("nav", &p(&["abc"]));
    assert!(!report.success);
    assert_eq!(engine.ship().quadrant, before);
    assert_eq!(engine.state().turn_count, 1);

    let report = engine.process_turn("tor", &p(&["400", "3"]));
    assert!(!report.success, "course 400 is out of range");
    assert_eq!(engine.state().turn_count, 2);
}

#[test]
fn terminal_state_is_sticky() {
    let mut cfg = quiet_cfg();
    cfg.galaxy.total_hostiles = 0;
    let mut engine = TurnEngine::new(cfg);
    engine.process_turn("srs", &[]);
    assert!(engine.is_over());

    let turns = engine.state().turn_count;
    let report = engine.process_turn("srs", &[]);
    assert!(!report.success);
    assert!(report.message.contains("over"), "got: {}", report.message);
    assert_eq!(engine.state().turn_count, turns, "rejected turns do not count");
}

#[test]
fn paused_engine_rejects_commands_without_counting() {
    let mut engine = TurnEngine::new(quiet_cfg());
    engine.pause();

    let report = engine.process_turn("srs", &[]);
    assert!(!report.success);
    assert!(report.message.contains("paused"), "got: {}", report.message);
    assert_eq!(engine.state().turn_count, 0);

    engine.resume();
    assert!(engine.process_turn("srs", &[]).success);
}

#[test]
fn shield_requests_clamp_and_charge_the_applied_delta() {
    let mut engine = TurnEngine::new(quiet_cfg());

    // Lowering shields is free.
    let report = engine.process_turn("shi", &p(&["500"]));
    assert!(report.success, "{}", report.message);
    assert_eq!(engine.ship().shields, 500);
    assert_eq!(engine.ship().energy, 3000);

    // A request above the maximum clamps to it and charges for the delta.
    let report = engine.process_turn("shi", &p(&["2000"]));
    assert!(report.success, "{}", report.message);
    assert_eq!(engine.ship().shields, 1500);
    assert_eq!(engine.ship().energy, 2000);
}

#[test]
fn navigation_charges_distance_times_rate() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let from = engine.ship().quadrant;
    let target = if from.x <= 4 {
        format!("{},{}", from.x + 2, from.y)
    } else {
        format!("{},{}", from.x - 2, from.y)
    };

    let report = engine.process_turn("nav", &p(&[&target]));
    assert!(report.success, "{}", report.message);
    // Two quadrants at 8 energy per unit distance.
    assert_eq!(engine.ship().energy, 3000 - 16);
    assert_eq!(engine.state().total_energy_used, 16);
    assert_ne!(engine.ship().quadrant, from);
    assert!(engine.ship().visited.contains(&engine.ship().quadrant));
}

#[test]
fn docking_needs_a_station_alongside() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let quadrant = engine.ship().quadrant;

    // No station in the quadrant at all.
    for station in engine.galaxy().station_positions(quadrant) {
        engine.galaxy_mut().remove_object(quadrant, station);
    }
    let report = engine.process_turn("dock", &[]);
    assert!(!report.success);
    assert!(report.message.contains("No station"), "got: {}", report.message);

    // A station in the quadrant but out of reach.
    let ship_pos = engine.ship().position;
    let far = [SectorPos::new(1, 1), SectorPos::new(8, 8)]
        .into_iter()
        .find(|corner| ship_pos.manhattan_to(*corner) > 1)
        .unwrap();
    engine.galaxy_mut().add_object(quadrant, far, ObjectKind::Station);
    let report = engine.process_turn("dock", &[]);
    assert!(!report.success);
    assert!(report.message.contains("adjacent"), "got: {}", report.message);

    // Alongside: docking restores everything. The berth must be a cardinal
    // neighbour; a diagonal cell is out of reach.
    let berth = ship_pos
        .neighbours()
        .into_iter()
        .find(|cell| ship_pos.manhattan_to(*cell) == 1)
        .unwrap();
    engine.galaxy_mut().add_object(quadrant, berth, ObjectKind::Station);
    engine.ship_mut().energy = 500;
    engine.ship_mut().shields = 100;
    engine.ship_mut().torpedoes = 2;
    engine.ship_mut().damage.add(ShipSystem::WarpDrive, 0.5);

    let report = engine.process_turn("dock", &[]);
    assert!(report.success, "{}", report.message);
    assert_eq!(engine.ship().energy, engine.ship().max_energy);
    assert_eq!(engine.ship().shields, engine.ship().max_shields);
    assert_eq!(engine.ship().torpedoes, engine.ship().max_torpedoes);
    assert!(!engine.ship().has_damage());
}

#[test]
fn killing_a_hostile_updates_every_ledger() {
    let mut engine = TurnEngine::new(quiet_cfg());
    let quadrant = engine.ship().quadrant;

    // Plant one hostile in the (hostile-free) starting quadrant and a berth
    // so the ship can rearm between volleys, then resync the counters.
    let victim = free_sector(&engine);
    engine.galaxy_mut().add_object(quadrant, victim, ObjectKind::Hostile);
    let ship_pos = engine.ship().position;
    let berth = ship_pos
        .neighbours()
        .into_iter()
        .find(|cell| ship_pos.manhattan_to(*cell) == 1 && *cell != victim)
        .unwrap();
    engine.galaxy_mut().add_object(quadrant, berth, ObjectKind::Station);
    let total = engine.galaxy().hostile_count();
    engine.state_mut().hostiles_remaining = total;
    engine.state_mut().initial_hostiles = total;

    for _ in 0..80 {
        if engine.state().hostiles_remaining < total {
            break;
        }
        let report = engine.process_turn("pha", &p(&["700"]));
        assert!(report.success, "{}", report.message);
        let report = engine.process_turn("dock", &[]);
        assert!(report.success, "{}", report.message);
    }

    assert_eq!(
        engine.state().hostiles_remaining,
        total - 1,
        "the volley loop never finished the hostile off"
    );
    assert_eq!(
        engine.state().hostiles_remaining,
        engine.galaxy().hostile_count(),
        "the remaining-hostile counter must mirror the galaxy"
    );
    assert_eq!(engine.state().score, 100);
}

#[test]
fn counters_mirror_the_galaxy_over_a_long_run() {
    let mut engine = TurnEngine::new(SimConfig::default_test());
    let script = [
        ("srs", vec![]),
        ("nav", vec!["4,4".to_string()]),
        ("pha", vec!["400".to_string()]),
        ("nav", vec!["6,2".to_string()]),
        ("tor", vec!["90".to_string(), "3".to_string()]),
        ("shi", vec!["1000".to_string()]),
        ("nav", vec!["2,7".to_string()]),
        ("pha", vec!["400".to_string()]),
    ];
    for (name, params) in script {
        let _ = engine.process_turn(name, &params);
        if engine.is_over() {
            break;
        }
        assert_eq!(
            engine.state().hostiles_remaining,
            engine.galaxy().hostile_count(),
            "counter drifted from the galaxy after '{name}'"
        );
        assert!(engine.ship().energy >= 0);
        assert!(engine.ship().shields >= 0);
        let destroyed =
            engine.state().initial_hostiles - engine.state().hostiles_remaining;
        assert_eq!(engine.state().score, 100 * destroyed as i64);
    }
}
