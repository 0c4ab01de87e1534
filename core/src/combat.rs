//! Combat resolution — beam fire, torpedo fire, trajectory geometry.
//!
//! Stateless: every function is a pure mapping from (inputs, rng draws) to an
//! outcome record. The caller owns all mutation of galaxy and ship state and
//! is responsible for verifying targets exist before any resource is spent.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    rng::SubsystemRng,
    types::{ObjectKind, SectorPos},
};

pub const BEAM_MAX_RANGE: f64 = 8.0;
pub const TORPEDO_MAX_RANGE: f64 = 10.0;
/// A single hit at or above these damage values destroys the target outright.
pub const BEAM_KILL_THRESHOLD: i64 = 50;
pub const TORPEDO_KILL_THRESHOLD: i64 = 75;

const BEAM_BASE_ACCURACY: f64 = 0.8;
const TORPEDO_BASE_ACCURACY: f64 = 0.6;
const DAMAGE_VARIANCE: f64 = 0.2;
const CRITICAL_HIT_CHANCE: f64 = 0.1;
const CRITICAL_HIT_MULTIPLIER: f64 = 2.0;

/// Structured result of one weapon discharge.
#[derive(Debug, Clone, Serialize)]
pub struct AttackOutcome {
    pub success: bool,
    pub message: String,
    /// Per-target narration, in resolution order.
    pub events: Vec<String>,
    /// Every target a hit was rolled against, misses included. The caller
    /// feeds these through the adaptive combat model.
    pub engaged: Vec<SectorPos>,
    /// Every landed hit with its damage, destroying hits included.
    pub hits: Vec<(SectorPos, i64)>,
    pub destroyed: Vec<SectorPos>,
    pub total_damage: i64,
}

impl AttackOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            events: Vec::new(),
            engaged: Vec::new(),
            hits: Vec::new(),
            destroyed: Vec::new(),
            total_damage: 0,
        }
    }

    fn fired() -> Self {
        Self {
            success: true,
            message: String::new(),
            events: Vec::new(),
            engaged: Vec::new(),
            hits: Vec::new(),
            destroyed: Vec::new(),
            total_damage: 0,
        }
    }
}

/// Directed-energy fire: the allocation is split evenly across all targets,
/// remainder to the first, and each target is resolved independently.
pub fn fire_beams(
    origin: SectorPos,
    efficiency: f64,
    targets: &[SectorPos],
    energy: i64,
    rng: &mut SubsystemRng,
) -> AttackOutcome {
    if efficiency <= 0.1 {
        return AttackOutcome::failed("Beam array is too damaged to fire");
    }
    if targets.is_empty() {
        return AttackOutcome::failed("No targets in range");
    }

    let mut out = AttackOutcome::fired();
    let share = energy / targets.len() as i64;
    let remainder = energy % targets.len() as i64;
    let mut hit_count = 0usize;
    let mut miss_count = 0usize;

    for (i, &target) in targets.iter().enumerate() {
        let target_energy = share + if i == 0 { remainder } else { 0 };
        if target_energy <= 0 {
            continue;
        }
        out.engaged.push(target);
        let distance = origin.distance_to(target);
        let p = beam_hit_probability(distance, target_energy, efficiency);
        if rng.chance(p) {
            let mut damage = beam_damage(target_energy, distance, efficiency, rng);
            if rng.chance(CRITICAL_HIT_CHANCE) {
                damage = (damage as f64 * CRITICAL_HIT_MULTIPLIER) as i64;
                out.events.push(format!("Critical hit on hostile at {target}!"));
            }
            out.total_damage += damage;
            out.hits.push((target, damage));
            hit_count += 1;
            out.events
                .push(format!("Beam hit hostile at {target} for {damage} damage"));
            if damage >= BEAM_KILL_THRESHOLD {
                out.destroyed.push(target);
                out.events.push(format!("Hostile at {target} destroyed!"));
            }
        } else {
            miss_count += 1;
            out.events.push(format!("Beam fire missed hostile at {target}"));
        }
    }

    out.message = format!(
        "Beams fired: {hit_count} hits, {miss_count} misses, {} destroyed",
        out.destroyed.len()
    );
    log::info!(
        "beam attack: {energy} energy, {hit_count} hits, {} destroyed",
        out.destroyed.len()
    );
    out
}

/// Ballistic fire along a course with an angular spread. Any hostile on the
/// trajectory is a candidate hit, resolved independently, once per cell.
pub fn fire_torpedo(
    origin: SectorPos,
    efficiency: f64,
    course: f64,
    spread: i32,
    objects: &BTreeMap<SectorPos, ObjectKind>,
    rng: &mut SubsystemRng,
) -> AttackOutcome {
    if efficiency <= 0.1 {
        return AttackOutcome::failed("Launcher tubes are too damaged to fire");
    }

    let trajectory = torpedo_trajectory(origin, course, spread);
    let candidates: Vec<SectorPos> = trajectory
        .into_iter()
        .filter(|pos| objects.get(pos) == Some(&ObjectKind::Hostile))
        .collect();

    let mut out = AttackOutcome::fired();
    if candidates.is_empty() {
        out.message = "Torpedo missed".into();
        out.events.push("Torpedo ran clear of all targets".into());
        return out;
    }

    let mut hit_count = 0usize;
    for target in candidates {
        out.engaged.push(target);
        let distance = origin.distance_to(target);
        let p = torpedo_hit_probability(distance, spread, efficiency);
        if rng.chance(p) {
            let mut damage = torpedo_damage(distance, efficiency, rng);
            if rng.chance(CRITICAL_HIT_CHANCE) {
                damage = (damage as f64 * CRITICAL_HIT_MULTIPLIER) as i64;
                out.events
                    .push(format!("Critical torpedo hit on hostile at {target}!"));
            }
            out.total_damage += damage;
            out.hits.push((target, damage));
            hit_count += 1;
            out.events
                .push(format!("Torpedo hit hostile at {target} for {damage} damage"));
            if damage >= TORPEDO_KILL_THRESHOLD {
                out.destroyed.push(target);
                out.events
                    .push(format!("Hostile at {target} destroyed by torpedo!"));
            }
        } else {
            out.events.push(format!("Torpedo grazed hostile at {target}"));
        }
    }

    out.message = format!(
        "Torpedo fired: {hit_count} hits, {} destroyed",
        out.destroyed.len()
    );
    log::info!(
        "torpedo attack: course {course:.1}, {hit_count} hits, {} destroyed",
        out.destroyed.len()
    );
    out
}

// ── Probability and damage formulas ──────────────────────────────────────

pub fn beam_hit_probability(distance: f64, energy: i64, efficiency: f64) -> f64 {
    let distance_mod = (1.0 - (distance / BEAM_MAX_RANGE) * 0.5).max(0.1);
    // More energy per target sharpens the firing solution, up to +20%.
    let energy_mod = (1.0 + (energy as f64 / 1000.0) * 0.2).min(1.2);
    (BEAM_BASE_ACCURACY * distance_mod * energy_mod * efficiency).clamp(0.05, 0.95)
}

pub fn torpedo_hit_probability(distance: f64, spread: i32, efficiency: f64) -> f64 {
    let distance_mod = (1.0 - (distance / TORPEDO_MAX_RANGE) * 0.3).max(0.2);
    // A wider spread covers more sky, up to +30%.
    let spread_mod = (1.0 + (spread as f64 / 10.0) * 0.3).min(1.3);
    (TORPEDO_BASE_ACCURACY * distance_mod * spread_mod * efficiency).clamp(0.1, 0.9)
}

pub fn beam_damage(
    energy: i64,
    distance: f64,
    efficiency: f64,
    rng: &mut SubsystemRng,
) -> i64 {
    let base = energy / 20;
    let distance_mod = (1.0 - (distance / BEAM_MAX_RANGE) * 0.4).max(0.3);
    let variance = rng.uniform(1.0 - DAMAGE_VARIANCE, 1.0 + DAMAGE_VARIANCE);
    ((base as f64 * distance_mod * efficiency * variance) as i64).max(1)
}

pub fn torpedo_damage(distance: f64, efficiency: f64, rng: &mut SubsystemRng) -> i64 {
    let base = 100.0;
    let distance_mod = (1.0 - (distance / TORPEDO_MAX_RANGE) * 0.2).max(0.5);
    let variance = rng.uniform(1.0 - DAMAGE_VARIANCE, 1.0 + DAMAGE_VARIANCE);
    ((base * distance_mod * efficiency * variance) as i64).max(10)
}

// ── Trajectory geometry ──────────────────────────────────────────────────

/// Sample the torpedo's path: one point per integer range step along the
/// course, fanned across the spread's angular offsets with a radius that
/// grows with distance. In-bounds cells only; each cell appears at most once
/// so a short-range shot cannot resolve the same target twice.
pub fn torpedo_trajectory(origin: SectorPos, course: f64, spread: i32) -> Vec<SectorPos> {
    let course_rad = course.to_radians();
    let mut trajectory: Vec<SectorPos> = Vec::new();
    let max_steps = TORPEDO_MAX_RANGE as i32;
    let half = spread / 2;

    for step in 1..=max_steps {
        let base_x = origin.x as f64 + step as f64 * course_rad.cos();
        let base_y = origin.y as f64 + step as f64 * course_rad.sin();
        let radius = spread as f64 * 0.1 * step as f64;

        for offset in -half..=half {
            let angle = course_rad + offset as f64 * 0.1;
            let pos = SectorPos::new(
                (base_x + radius * angle.cos()) as i32,
                (base_y + radius * angle.sin()) as i32,
            );
            if pos.is_valid() && !trajectory.contains(&pos) {
                trajectory.push(pos);
            }
        }
    }
    trajectory
}

// ── Firing-solution helpers ──────────────────────────────────────────────

/// The course that runs straight through a target.
pub fn optimal_torpedo_course(from: SectorPos, to: SectorPos) -> f64 {
    from.bearing_to(to)
}

/// Energy worth allocating against a target at the given distance, bounded
/// by what is available but never below the minimum effective charge.
pub fn optimal_beam_energy(distance: f64, available: i64) -> i64 {
    let base = (200.0 * (1.0 + distance / 4.0)) as i64;
    base.min(available).max(100)
}
