//! Strategic advisor tests — threat weighting, status grades, warnings,
//! recommendations, and the route planner.

use stargrid_core::{
    advisor::{ConditionGrade, MissionPace, ResourceGrade, StrategicAdvisor, TimeGrade},
    config::SimConfig,
    engine::{GameState, MissionOutcome},
    galaxy::GalaxyModel,
    rng::{RngBank, SubsystemSlot},
    ship::{ShipModel, ShipSystem},
    types::{ObjectKind, QuadrantCoord, SectorPos},
};

fn galaxy(seed: u64) -> GalaxyModel {
    let cfg = SimConfig::default_test();
    let mut rng = RngBank::new(seed).stream(SubsystemSlot::Galaxy);
    let mut galaxy = GalaxyModel::new(&cfg.galaxy);
    galaxy.generate(&mut rng);
    galaxy
}

fn ship() -> ShipModel {
    ShipModel::new(&SimConfig::default_test().ship)
}

fn state() -> GameState {
    GameState {
        stardate: 2267.0,
        mission_start: 2267.0,
        mission_deadline: 2297.0,
        score: 0,
        initial_hostiles: 15,
        hostiles_remaining: 15,
        stations_remaining: 4,
        turn_count: 0,
        quadrants_visited: 1,
        combat_encounters: 0,
        total_energy_used: 0,
        total_torpedoes_fired: 0,
        outcome: MissionOutcome::InProgress,
    }
}

#[test]
fn fresh_mission_reads_healthy() {
    let assessment = StrategicAdvisor::analyze(&state(), &ship(), &galaxy(3));

    assert!((0.0..=1.0).contains(&assessment.threat_level));
    assert_eq!(assessment.resources.energy_status, ResourceGrade::Excellent);
    assert_eq!(assessment.resources.overall_status, ConditionGrade::Excellent);
    assert_eq!(assessment.progress.time_status, TimeGrade::Ample);
    assert_eq!(assessment.progress.pace, MissionPace::OnSchedule);
    assert!(assessment.urgent_warning.is_none());
}

#[test]
fn energy_warning_outranks_every_other_warning() {
    let mut state = state();
    state.stardate = state.mission_deadline - 1.0;
    let mut ship = ship();
    ship.energy = 100;

    let assessment = StrategicAdvisor::analyze(&state, &ship, &galaxy(5));
    assert_eq!(
        assessment.urgent_warning.as_deref(),
        Some("CRITICAL: Energy reserves dangerously low!")
    );
}

#[test]
fn deadline_warning_when_time_runs_short() {
    let mut state = state();
    state.stardate = state.mission_deadline - 2.0;

    let assessment = StrategicAdvisor::analyze(&state, &ship(), &galaxy(5));
    let warning = assessment.urgent_warning.expect("warning fires");
    assert!(warning.contains("Mission time expires"), "got: {warning}");
}

#[test]
fn extreme_threat_raises_the_last_resort_warning() {
    // Battered ship, full enemy strength, late mission, crowded quadrant.
    let mut state = state();
    state.stardate = state.mission_deadline - 3.0;

    let mut ship = ship();
    ship.energy = 250;
    ship.shields = 0;
    for system in ShipSystem::ALL {
        ship.damage.add(system, 1.0);
    }

    let mut galaxy = galaxy(7);
    let mut placed = 0;
    'outer: for x in 1..=8 {
        for y in 1..=8 {
            let pos = SectorPos::new(x, y);
            if !galaxy.objects(ship.quadrant).contains_key(&pos) {
                galaxy.add_object(ship.quadrant, pos, ObjectKind::Hostile);
                placed += 1;
                if placed == 3 {
                    break 'outer;
                }
            }
        }
    }

    let assessment = StrategicAdvisor::analyze(&state, &ship, &galaxy);
    assert!(assessment.threat_level > 0.8, "threat {}", assessment.threat_level);
    assert_eq!(
        assessment.urgent_warning.as_deref(),
        Some("WARNING: Extreme danger detected!")
    );
}

#[test]
fn resource_grades_follow_the_percentage_thresholds() {
    let mut ship = ship();

    ship.energy = 1800; // 60%
    let a = StrategicAdvisor::analyze(&state(), &ship, &galaxy(9));
    assert_eq!(a.resources.energy_status, ResourceGrade::Good);

    ship.energy = 1200; // 40%
    let a = StrategicAdvisor::analyze(&state(), &ship, &galaxy(9));
    assert_eq!(a.resources.energy_status, ResourceGrade::Low);

    ship.energy = 600; // 20%
    let a = StrategicAdvisor::analyze(&state(), &ship, &galaxy(9));
    assert_eq!(a.resources.energy_status, ResourceGrade::Critical);
}

#[test]
fn pace_compares_kills_against_the_clock() {
    let mut state = state();
    state.hostiles_remaining = 5; // two thirds destroyed
    state.stardate = state.mission_start + 3.0; // 10% of the clock
    let a = StrategicAdvisor::analyze(&state, &ship(), &galaxy(11));
    assert_eq!(a.progress.pace, MissionPace::AheadOfSchedule);

    let mut state = self::state();
    state.hostiles_remaining = 15; // nothing destroyed
    state.stardate = state.mission_start + 15.0; // half the clock gone
    let a = StrategicAdvisor::analyze(&state, &ship(), &galaxy(11));
    assert_eq!(a.progress.pace, MissionPace::BehindSchedule);
}

#[test]
fn recommendations_cover_resupply_and_retreat() {
    let mut ship = ship();
    ship.energy = 300; // critical
    ship.torpedoes = 1;

    let a = StrategicAdvisor::analyze(&state(), &ship, &galaxy(13));
    assert!(
        a.recommendations.iter().any(|r| r.contains("energy replenishment")),
        "missing the resupply note: {:?}",
        a.recommendations
    );
    assert!(
        a.recommendations.iter().any(|r| r.contains("Torpedo stores low")),
        "missing the torpedo note: {:?}",
        a.recommendations
    );
}

#[test]
fn combat_readiness_degrades_with_the_ship() {
    let fresh = StrategicAdvisor::combat_readiness(&ship());
    assert!(fresh > 0.8, "fresh ship should be ready: {fresh}");

    let mut wreck = ship();
    wreck.energy = 100;
    wreck.shields = 0;
    wreck.torpedoes = 0;
    wreck.damage.add(ShipSystem::BeamArray, 0.95);
    let battered = StrategicAdvisor::combat_readiness(&wreck);
    assert!(battered < 0.2, "wreck should not be ready: {battered}");
}

#[test]
fn route_planner_visits_nearest_first() {
    let galaxy = galaxy(17);
    let targets = [
        QuadrantCoord::new(5, 5),
        QuadrantCoord::new(1, 2),
        QuadrantCoord::new(8, 8),
    ];
    let plan = StrategicAdvisor::plan_route(QuadrantCoord::new(1, 1), &targets, &galaxy);

    assert_eq!(
        plan.legs,
        vec![
            QuadrantCoord::new(1, 2),
            QuadrantCoord::new(5, 5),
            QuadrantCoord::new(8, 8),
        ]
    );
    // Legs of 1, 5 and sqrt(18) quadrants at 8 energy per unit distance.
    assert_eq!(plan.energy_estimate, 8 + 40 + 33);
    assert!((plan.total_distance - (6.0 + 18.0f64.sqrt())).abs() < 1e-9);
}

#[test]
fn route_planner_handles_no_targets() {
    let plan = StrategicAdvisor::plan_route(QuadrantCoord::new(4, 4), &[], &galaxy(19));
    assert!(plan.legs.is_empty());
    assert_eq!(plan.energy_estimate, 0);
    assert_eq!(plan.total_distance, 0.0);
}

#[test]
fn efficiency_rating_starts_at_the_neutral_baseline() {
    // Fresh mission: full time and resource efficiency, neutral combat.
    let rating = StrategicAdvisor::efficiency_rating(&state());
    assert!((rating - 0.8).abs() < 1e-9, "rating {rating}");
}
