//! Event injector tests — cooldown gating, hazard lifecycles, ship-facing
//! effects, and the contextual warnings.

use stargrid_core::{
    config::SimConfig,
    events::{EventContext, EventInjector, EventKind},
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    ship::ShipModel,
    types::QuadrantCoord,
};

fn rng(seed: u64) -> SubsystemRng {
    RngBank::new(seed).stream(SubsystemSlot::Events)
}

fn ship() -> ShipModel {
    ShipModel::new(&SimConfig::default_test().ship)
}

fn ctx() -> EventContext {
    EventContext {
        hostiles_remaining: 6,
        time_remaining: 30.0,
        ship_quadrant: QuadrantCoord::new(4, 4),
        local_stations: 0,
    }
}

fn injector(chance: f64, cooldown: u32) -> EventInjector {
    let mut cfg = SimConfig::default_test().events;
    cfg.base_event_chance = chance;
    cfg.min_cooldown = cooldown;
    EventInjector::new(cfg)
}

#[test]
fn cooldown_gates_new_events() {
    let mut injector = injector(1.0, 3);
    let mut ship = ship();
    let mut rng = rng(0xE7E7);

    // A healthy ship and a quiet context produce no messages while the
    // cooldown is still running, even at a guaranteed trigger chance.
    for turn in 1..=2 {
        let log = injector.run_turn(&ctx(), &mut ship, &mut rng);
        assert!(log.is_empty(), "turn {turn} produced: {log:?}");
    }

    let log = injector.run_turn(&ctx(), &mut ship, &mut rng);
    assert!(!log.is_empty(), "the cooldown expired and the roll is certain");
}

#[test]
fn nothing_happens_at_zero_chance() {
    let mut injector = injector(0.0, 1);
    let mut ship = ship();
    let mut rng = rng(0xBEEF);

    for _ in 0..20 {
        let log = injector.run_turn(&ctx(), &mut ship, &mut rng);
        assert!(log.is_empty(), "unexpected events: {log:?}");
    }
    assert!(injector.active_events().is_empty());
    assert_eq!(ship.energy, ship.max_energy);
}

#[test]
fn ion_storm_drains_now_and_every_turn_until_it_expires() {
    let mut injector = injector(0.0, 5);
    let mut ship = ship();
    let mut rng = rng(0x5707);

    let log = injector.trigger(EventKind::IonStorm, &ctx(), &mut ship, &mut rng);
    assert!(log.iter().any(|l| l.contains("Ion storm")), "got: {log:?}");
    assert_eq!(ship.energy, ship.max_energy - 200);
    assert_eq!(injector.active_events().len(), 1);

    let mut turns = 0;
    while !injector.active_events().is_empty() {
        let log = injector.run_turn(&ctx(), &mut ship, &mut rng);
        assert!(log.iter().any(|l| l.contains("Ion storm")), "got: {log:?}");
        turns += 1;
        assert!(turns <= 5, "storm outlived its maximum duration");
    }
    // 2 to 5 turns of follow-up drain at a quarter of the initial hit.
    let drained = (ship.max_energy - 200) - ship.energy;
    assert_eq!(drained, 50 * turns);
    assert!((2..=5).contains(&turns));
}

#[test]
fn malfunction_damages_one_system() {
    let mut injector = injector(0.0, 5);
    let mut ship = ship();
    let mut rng = rng(0xFA17);

    assert!(!ship.has_damage());
    let log = injector.trigger(EventKind::EquipmentMalfunction, &ctx(), &mut ship, &mut rng);
    assert!(ship.has_damage(), "malfunction must damage a system");
    assert!(
        log.iter().any(|l| l.contains("malfunction")),
        "got: {log:?}"
    );
}

#[test]
fn discovery_windfalls_respect_the_maxima() {
    let mut injector = injector(0.0, 5);
    let mut rng = rng(0xD15C);

    for _ in 0..20 {
        let mut ship = ship();
        injector.trigger(EventKind::Discovery, &ctx(), &mut ship, &mut rng);
        assert!(ship.energy <= ship.max_energy);
        assert!(ship.shields <= ship.max_shields);
        assert!(ship.torpedoes <= ship.max_torpedoes);
    }
}

#[test]
fn distress_calls_name_a_quadrant_next_door() {
    let mut injector = injector(0.0, 5);
    let mut ship = ship();
    let mut rng = rng(0xD157);

    let mut ctx = ctx();
    ctx.ship_quadrant = QuadrantCoord::new(1, 1);
    let log = injector.trigger(EventKind::DistressCall, &ctx, &mut ship, &mut rng);

    let detail = &log[1];
    let neighbours = ["quadrant 1,2", "quadrant 2,1", "quadrant 2,2"];
    assert!(
        neighbours.iter().any(|n| detail.contains(n)),
        "distress call should name a neighbouring quadrant: {detail}"
    );
}

#[test]
fn reinforcement_reports_do_not_touch_the_ship() {
    let mut injector = injector(0.0, 5);
    let mut ship = ship();
    let mut rng = rng(0x4E14);

    let log = injector.trigger(EventKind::HostileReinforcements, &ctx(), &mut ship, &mut rng);
    assert!(!log.is_empty());
    assert_eq!(ship.energy, ship.max_energy);
    assert_eq!(ship.shields, ship.max_shields);
    assert!(!ship.has_damage());
}

#[test]
fn low_energy_warning_fires_eventually() {
    let mut injector = injector(0.0, 5);
    let mut ship = ship();
    ship.energy = 400;
    let mut rng = rng(0x10E0);

    let mut seen = false;
    for _ in 0..200 {
        let log = injector.run_turn(&ctx(), &mut ship, &mut rng);
        if log.iter().any(|l| l.contains("Energy reserves running low")) {
            seen = true;
            break;
        }
    }
    assert!(seen, "a 10% warning never fired across 200 turns");
}
