//! Galaxy tests — generation totals, count/mapping consistency, spatial
//! queries, and the snapshot contract.

use stargrid_core::{
    config::SimConfig,
    galaxy::GalaxyModel,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    types::{ObjectKind, QuadrantCoord, SectorPos, GALAXY_SIZE, QUADRANT_SIZE},
};

fn build(seed: u64) -> (GalaxyModel, SubsystemRng) {
    let cfg = SimConfig::default_test();
    let mut rng = RngBank::new(seed).stream(SubsystemSlot::Galaxy);
    let mut galaxy = GalaxyModel::new(&cfg.galaxy);
    galaxy.generate(&mut rng);
    (galaxy, rng)
}

fn all_coords() -> Vec<QuadrantCoord> {
    let mut coords = Vec::new();
    for x in 1..=GALAXY_SIZE {
        for y in 1..=GALAXY_SIZE {
            coords.push(QuadrantCoord::new(x, y));
        }
    }
    coords
}

fn free_sector(galaxy: &GalaxyModel, coord: QuadrantCoord) -> SectorPos {
    let objects = galaxy.objects(coord);
    for x in 1..=QUADRANT_SIZE {
        for y in 1..=QUADRANT_SIZE {
            let pos = SectorPos::new(x, y);
            if !objects.contains_key(&pos) {
                return pos;
            }
        }
    }
    panic!("no free sector in quadrant {coord}");
}

#[test]
fn generation_places_configured_totals() {
    let cfg = SimConfig::default_test();
    let (galaxy, _) = build(7);

    assert_eq!(galaxy.hostile_count(), cfg.galaxy.total_hostiles);
    assert_eq!(galaxy.station_count(), cfg.galaxy.total_stations);

    for coord in all_coords() {
        let (hostiles, stations, obstacles) = galaxy.summary(coord);
        assert!(
            hostiles <= cfg.galaxy.max_hostiles_per_quadrant,
            "quadrant {coord} exceeds the hostile cap: {hostiles}"
        );
        assert!(stations <= 1, "quadrant {coord} has {stations} stations");
        assert!(obstacles >= 1, "quadrant {coord} has no obstacles");
    }
}

#[test]
fn counts_match_layout_after_generation() {
    let (galaxy, _) = build(11);
    for coord in all_coords() {
        let quadrant = galaxy.quadrant(coord).expect("quadrant exists");
        assert!(
            quadrant.counts_consistent(),
            "counts disagree with layout in quadrant {coord}"
        );
    }
}

#[test]
fn mutators_keep_counts_consistent() {
    let (mut galaxy, _) = build(13);
    let coord = QuadrantCoord::new(3, 3);
    let before = galaxy.summary(coord).0;

    let pos = free_sector(&galaxy, coord);
    galaxy.add_object(coord, pos, ObjectKind::Hostile);
    assert_eq!(galaxy.summary(coord).0, before + 1);
    assert!(galaxy.quadrant(coord).unwrap().counts_consistent());

    let target = free_sector(&galaxy, coord);
    assert!(galaxy.move_object(coord, pos, target), "move to a free cell");
    assert_eq!(galaxy.summary(coord).0, before + 1);
    assert!(galaxy.quadrant(coord).unwrap().counts_consistent());

    assert_eq!(galaxy.remove_object(coord, target), Some(ObjectKind::Hostile));
    assert_eq!(galaxy.summary(coord).0, before);
    assert!(galaxy.quadrant(coord).unwrap().counts_consistent());
}

#[test]
fn move_rejects_occupied_and_out_of_range_destinations() {
    let (mut galaxy, _) = build(17);
    let coord = QuadrantCoord::new(1, 1);
    let a = free_sector(&galaxy, coord);
    galaxy.add_object(coord, a, ObjectKind::Hostile);
    let b = free_sector(&galaxy, coord);
    galaxy.add_object(coord, b, ObjectKind::Obstacle);

    assert!(!galaxy.move_object(coord, a, b), "destination is occupied");
    assert!(
        !galaxy.move_object(coord, a, SectorPos::new(0, 5)),
        "destination is out of range"
    );
    assert!(galaxy.quadrant(coord).unwrap().counts_consistent());
}

#[test]
fn distance_is_symmetric_and_zero_on_self() {
    let (galaxy, _) = build(19);
    let pairs = [
        (QuadrantCoord::new(1, 1), QuadrantCoord::new(8, 8)),
        (QuadrantCoord::new(2, 7), QuadrantCoord::new(5, 3)),
        (QuadrantCoord::new(4, 4), QuadrantCoord::new(4, 5)),
    ];
    for (a, b) in pairs {
        assert_eq!(galaxy.distance(a, b), galaxy.distance(b, a));
    }
    let a = QuadrantCoord::new(6, 2);
    assert_eq!(galaxy.distance(a, a), 0.0);
}

#[test]
fn course_is_normalized_into_degrees() {
    let (galaxy, _) = build(23);
    for (a, b) in [
        (QuadrantCoord::new(1, 1), QuadrantCoord::new(8, 1)),
        (QuadrantCoord::new(8, 8), QuadrantCoord::new(1, 1)),
        (QuadrantCoord::new(4, 4), QuadrantCoord::new(4, 1)),
    ] {
        let course = galaxy.course(a, b);
        assert!((0.0..360.0).contains(&course), "course {course} out of range");
    }
    // Due east is zero degrees.
    assert_eq!(
        galaxy.course(QuadrantCoord::new(1, 4), QuadrantCoord::new(7, 4)),
        0.0
    );
}

#[test]
fn adjacent_summaries_clip_at_the_galaxy_edge() {
    let (galaxy, _) = build(29);
    assert_eq!(galaxy.adjacent_summaries(QuadrantCoord::new(1, 1)).len(), 4);
    assert_eq!(galaxy.adjacent_summaries(QuadrantCoord::new(8, 4)).len(), 6);
    assert_eq!(galaxy.adjacent_summaries(QuadrantCoord::new(4, 4)).len(), 9);
}

#[test]
fn nearest_station_points_at_a_station() {
    let (galaxy, _) = build(31);
    let nearest = galaxy
        .nearest_station(QuadrantCoord::new(4, 4))
        .expect("galaxy has stations");
    assert!(galaxy.summary(nearest).1 > 0, "no station at {nearest}");
}

#[test]
fn safe_start_avoids_hostiles() {
    let (galaxy, mut rng) = build(37);
    for _ in 0..10 {
        let start = galaxy.safe_starting_quadrant(&mut rng);
        assert!(start.is_valid());
        assert_eq!(
            galaxy.summary(start).0,
            0,
            "safe start {start} contains hostiles"
        );
    }
}

#[test]
fn scan_grid_marks_the_player_exactly_once() {
    let (galaxy, mut rng) = build(41);
    let coord = QuadrantCoord::new(2, 5);
    let player = galaxy.safe_position_in(coord, &mut rng);
    let grid = galaxy.scan_grid(coord, player);

    assert_eq!(grid.len(), QUADRANT_SIZE as usize);
    for row in &grid {
        assert_eq!(row.chars().count(), QUADRANT_SIZE as usize);
    }
    let players: usize = grid
        .iter()
        .map(|row| row.chars().filter(|c| *c == 'P').count())
        .sum();
    assert_eq!(players, 1);
}

#[test]
fn snapshot_roundtrips_through_restore() {
    let cfg = SimConfig::default_test();
    let (galaxy, _) = build(43);
    let snap = galaxy.snapshot();
    let restored = GalaxyModel::restore(&cfg.galaxy, &snap).expect("restore succeeds");
    let json_a = serde_json::to_string(&snap).unwrap();
    let json_b = serde_json::to_string(&restored.snapshot()).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn restore_rejects_tampered_counts() {
    let cfg = SimConfig::default_test();
    let (galaxy, _) = build(47);
    let mut snap = galaxy.snapshot();
    snap.quadrants[0].hostiles += 1;
    assert!(GalaxyModel::restore(&cfg.galaxy, &snap).is_err());
}

#[test]
fn restore_rejects_out_of_range_coordinates() {
    let cfg = SimConfig::default_test();
    let (galaxy, _) = build(53);
    let mut snap = galaxy.snapshot();
    snap.quadrants[0].coord = QuadrantCoord::new(9, 1);
    assert!(GalaxyModel::restore(&cfg.galaxy, &snap).is_err());
}
