//! Galaxy grid — quadrant layout, object placement, spatial queries.
//!
//! RULES:
//!   - This module is the sole source of truth for what occupies which
//!     sector. Tactical bookkeeping mirrors it, never the other way round.
//!   - Count fields and the object mapping change together, always.
//!   - Iteration over quadrants and objects is BTreeMap order (x, then y);
//!     downstream AI logic relies on that order being turn-stable.
//!   - Queries are pure; side effects are confined to the mutators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::GalaxyConfig,
    error::{SimError, SimResult},
    rng::SubsystemRng,
    types::{ObjectKind, QuadrantCoord, SectorPos, GALAXY_SIZE, QUADRANT_SIZE},
};

/// Contents of a single quadrant.
///
/// Invariant: each count equals the number of mapping entries of that kind.
#[derive(Debug, Clone, Default)]
pub struct QuadrantState {
    pub hostiles: u32,
    pub stations: u32,
    pub obstacles: u32,
    pub objects: BTreeMap<SectorPos, ObjectKind>,
}

impl QuadrantState {
    pub fn counts(&self) -> (u32, u32, u32) {
        (self.hostiles, self.stations, self.obstacles)
    }

    /// True when the count fields agree with the mapping. Checked by tests
    /// after every mutation path.
    pub fn counts_consistent(&self) -> bool {
        let tally = |kind: ObjectKind| {
            self.objects.values().filter(|k| **k == kind).count() as u32
        };
        self.hostiles == tally(ObjectKind::Hostile)
            && self.stations == tally(ObjectKind::Station)
            && self.obstacles == tally(ObjectKind::Obstacle)
    }

    fn bump(&mut self, kind: ObjectKind, delta: i64) {
        let slot = match kind {
            ObjectKind::Hostile => &mut self.hostiles,
            ObjectKind::Station => &mut self.stations,
            ObjectKind::Obstacle => &mut self.obstacles,
        };
        *slot = (*slot as i64 + delta).max(0) as u32;
    }
}

/// Serialized form of one quadrant; coordinates round-trip as structured
/// records, never as delimited strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrantRecord {
    pub coord: QuadrantCoord,
    pub hostiles: u32,
    pub stations: u32,
    pub obstacles: u32,
    pub objects: Vec<(SectorPos, ObjectKind)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxySnapshot {
    pub quadrants: Vec<QuadrantRecord>,
}

pub struct GalaxyModel {
    quadrants: BTreeMap<QuadrantCoord, QuadrantState>,
    cfg: GalaxyConfig,
}

impl GalaxyModel {
    pub fn new(cfg: &GalaxyConfig) -> Self {
        Self {
            quadrants: BTreeMap::new(),
            cfg: cfg.clone(),
        }
    }

    /// Generate a fresh galaxy: scatter hostiles (capped per quadrant),
    /// stations (max one per quadrant) and obstacles, then assign every
    /// quadrant's objects to distinct random interior sectors.
    pub fn generate(&mut self, rng: &mut SubsystemRng) {
        self.quadrants.clear();
        for x in 1..=GALAXY_SIZE {
            for y in 1..=GALAXY_SIZE {
                self.quadrants
                    .insert(QuadrantCoord::new(x, y), QuadrantState::default());
            }
        }

        self.scatter_hostiles(rng);
        self.scatter_stations(rng);
        self.scatter_obstacles(rng);

        let coords: Vec<QuadrantCoord> = self.quadrants.keys().copied().collect();
        for coord in coords {
            self.place_quadrant_objects(coord, rng);
        }

        log::info!(
            "galaxy generated: {} hostiles, {} stations",
            self.hostile_count(),
            self.station_count()
        );
    }

    fn random_coord(rng: &mut SubsystemRng) -> QuadrantCoord {
        QuadrantCoord::new(
            1 + rng.next_u64_below(GALAXY_SIZE as u64) as i32,
            1 + rng.next_u64_below(GALAXY_SIZE as u64) as i32,
        )
    }

    fn scatter_hostiles(&mut self, rng: &mut SubsystemRng) {
        let cap = self.cfg.max_hostiles_per_quadrant.max(1);
        // Clamp so a misconfigured total cannot loop forever.
        let target = self
            .cfg
            .total_hostiles
            .min(cap * (GALAXY_SIZE * GALAXY_SIZE) as u32);
        let mut placed = 0;
        while placed < target {
            let coord = Self::random_coord(rng);
            if let Some(q) = self.quadrants.get_mut(&coord) {
                if q.hostiles < cap {
                    q.hostiles += 1;
                    placed += 1;
                }
            }
        }
    }

    fn scatter_stations(&mut self, rng: &mut SubsystemRng) {
        let target = self
            .cfg
            .total_stations
            .min((GALAXY_SIZE * GALAXY_SIZE) as u32);
        let mut placed = 0;
        while placed < target {
            let coord = Self::random_coord(rng);
            if let Some(q) = self.quadrants.get_mut(&coord) {
                if q.stations == 0 {
                    q.stations = 1;
                    placed += 1;
                }
            }
        }
    }

    fn scatter_obstacles(&mut self, rng: &mut SubsystemRng) {
        let max_obstacles =
            ((QUADRANT_SIZE as f64 * self.cfg.obstacle_density) as u32).max(1);
        for q in self.quadrants.values_mut() {
            q.obstacles = 1 + rng.next_u64_below(max_obstacles as u64) as u32;
        }
    }

    fn place_quadrant_objects(&mut self, coord: QuadrantCoord, rng: &mut SubsystemRng) {
        let Some(counts) = self.quadrants.get(&coord).map(QuadrantState::counts) else {
            return;
        };
        let mut available: Vec<SectorPos> = Vec::with_capacity(64);
        for x in 1..=QUADRANT_SIZE {
            for y in 1..=QUADRANT_SIZE {
                available.push(SectorPos::new(x, y));
            }
        }
        let Some(q) = self.quadrants.get_mut(&coord) else {
            return;
        };
        let (hostiles, stations, obstacles) = counts;
        let plan = [
            (ObjectKind::Hostile, hostiles),
            (ObjectKind::Station, stations),
            (ObjectKind::Obstacle, obstacles),
        ];
        for (kind, count) in plan {
            for _ in 0..count {
                if available.is_empty() {
                    break;
                }
                let idx = rng.next_u64_below(available.len() as u64) as usize;
                let pos = available.swap_remove(idx);
                q.objects.insert(pos, kind);
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn quadrant(&self, coord: QuadrantCoord) -> Option<&QuadrantState> {
        self.quadrants.get(&coord)
    }

    /// (hostiles, stations, obstacles) for a quadrant; zeros when invalid.
    pub fn summary(&self, coord: QuadrantCoord) -> (u32, u32, u32) {
        self.quadrants
            .get(&coord)
            .map_or((0, 0, 0), QuadrantState::counts)
    }

    /// A copy of a quadrant's object layout.
    pub fn objects(&self, coord: QuadrantCoord) -> BTreeMap<SectorPos, ObjectKind> {
        self.quadrants
            .get(&coord)
            .map(|q| q.objects.clone())
            .unwrap_or_default()
    }

    /// Summaries for the 3x3 block of valid quadrants centred on `center`.
    pub fn adjacent_summaries(
        &self,
        center: QuadrantCoord,
    ) -> BTreeMap<QuadrantCoord, (u32, u32, u32)> {
        let mut out = BTreeMap::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let coord = QuadrantCoord::new(center.x + dx, center.y + dy);
                if coord.is_valid() {
                    out.insert(coord, self.summary(coord));
                }
            }
        }
        out
    }

    fn positions_of(&self, coord: QuadrantCoord, kind: ObjectKind) -> Vec<SectorPos> {
        self.quadrants
            .get(&coord)
            .map(|q| {
                q.objects
                    .iter()
                    .filter(|(_, k)| **k == kind)
                    .map(|(p, _)| *p)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn hostile_positions(&self, coord: QuadrantCoord) -> Vec<SectorPos> {
        self.positions_of(coord, ObjectKind::Hostile)
    }

    pub fn station_positions(&self, coord: QuadrantCoord) -> Vec<SectorPos> {
        self.positions_of(coord, ObjectKind::Station)
    }

    pub fn hostile_count(&self) -> u32 {
        self.quadrants.values().map(|q| q.hostiles).sum()
    }

    pub fn station_count(&self) -> u32 {
        self.quadrants.values().map(|q| q.stations).sum()
    }

    pub fn distance(&self, a: QuadrantCoord, b: QuadrantCoord) -> f64 {
        a.distance_to(b)
    }

    /// Course from a to b in degrees, normalized into [0,360).
    pub fn course(&self, a: QuadrantCoord, b: QuadrantCoord) -> f64 {
        a.bearing_to(b)
    }

    pub fn nearest_station(&self, from: QuadrantCoord) -> Option<QuadrantCoord> {
        let mut nearest: Option<(QuadrantCoord, f64)> = None;
        for (coord, q) in &self.quadrants {
            if q.stations == 0 {
                continue;
            }
            let d = from.distance_to(*coord);
            match nearest {
                Some((_, best)) if d >= best => {}
                _ => nearest = Some((*coord, d)),
            }
        }
        nearest.map(|(coord, _)| coord)
    }

    /// A hostile-free quadrant with a station in it or in an adjacent
    /// quadrant; failing that any hostile-free quadrant; failing that a
    /// uniformly random quadrant.
    pub fn safe_starting_quadrant(&self, rng: &mut SubsystemRng) -> QuadrantCoord {
        let mut sheltered = Vec::new();
        let mut hostile_free = Vec::new();
        for (coord, q) in &self.quadrants {
            if q.hostiles > 0 {
                continue;
            }
            hostile_free.push(*coord);
            let near_station = q.stations > 0
                || self
                    .adjacent_summaries(*coord)
                    .values()
                    .any(|(_, stations, _)| *stations > 0);
            if near_station {
                sheltered.push(*coord);
            }
        }
        if !sheltered.is_empty() {
            return *rng.pick(&sheltered);
        }
        if !hostile_free.is_empty() {
            return *rng.pick(&hostile_free);
        }
        Self::random_coord(rng)
    }

    /// An unoccupied sector inside `coord`, probing at random; falls back to
    /// the centre after 20 attempts.
    pub fn safe_position_in(
        &self,
        coord: QuadrantCoord,
        rng: &mut SubsystemRng,
    ) -> SectorPos {
        let Some(q) = self.quadrants.get(&coord) else {
            return SectorPos::new(4, 4);
        };
        for _ in 0..20 {
            let pos = SectorPos::new(
                1 + rng.next_u64_below(QUADRANT_SIZE as u64) as i32,
                1 + rng.next_u64_below(QUADRANT_SIZE as u64) as i32,
            );
            if !q.objects.contains_key(&pos) {
                return pos;
            }
        }
        SectorPos::new(4, 4)
    }

    /// Renderable short-range scan grid: one string per row, one glyph per
    /// sector, with the player marked 'P'.
    pub fn scan_grid(&self, coord: QuadrantCoord, player: SectorPos) -> Vec<String> {
        let objects = self.objects(coord);
        let mut rows = Vec::with_capacity(QUADRANT_SIZE as usize);
        for y in 1..=QUADRANT_SIZE {
            let mut row = String::with_capacity(QUADRANT_SIZE as usize);
            for x in 1..=QUADRANT_SIZE {
                let pos = SectorPos::new(x, y);
                let glyph = if pos == player {
                    'P'
                } else {
                    objects.get(&pos).map_or('.', |kind| kind.glyph())
                };
                row.push(glyph);
            }
            rows.push(row);
        }
        rows
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    /// Place an object, replacing whatever occupied the sector.
    pub fn add_object(&mut self, coord: QuadrantCoord, pos: SectorPos, kind: ObjectKind) {
        if !pos.is_valid() {
            return;
        }
        if self
            .quadrants
            .get(&coord)
            .is_some_and(|q| q.objects.contains_key(&pos))
        {
            self.remove_object(coord, pos);
        }
        if let Some(q) = self.quadrants.get_mut(&coord) {
            q.objects.insert(pos, kind);
            q.bump(kind, 1);
        }
    }

    pub fn remove_object(
        &mut self,
        coord: QuadrantCoord,
        pos: SectorPos,
    ) -> Option<ObjectKind> {
        let q = self.quadrants.get_mut(&coord)?;
        let kind = q.objects.remove(&pos)?;
        q.bump(kind, -1);
        Some(kind)
    }

    /// Relocate an object inside a quadrant. Fails (returns false) when the
    /// source is empty, the destination is occupied or out of bounds.
    pub fn move_object(
        &mut self,
        coord: QuadrantCoord,
        from: SectorPos,
        to: SectorPos,
    ) -> bool {
        if !to.is_valid() {
            return false;
        }
        let Some(q) = self.quadrants.get_mut(&coord) else {
            return false;
        };
        if !q.objects.contains_key(&from) || q.objects.contains_key(&to) {
            return false;
        }
        if let Some(kind) = q.objects.remove(&from) {
            q.objects.insert(to, kind);
            return true;
        }
        false
    }

    // ── Snapshot ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> GalaxySnapshot {
        GalaxySnapshot {
            quadrants: self
                .quadrants
                .iter()
                .map(|(coord, q)| QuadrantRecord {
                    coord: *coord,
                    hostiles: q.hostiles,
                    stations: q.stations,
                    obstacles: q.obstacles,
                    objects: q.objects.iter().map(|(p, k)| (*p, *k)).collect(),
                })
                .collect(),
        }
    }

    pub fn restore(cfg: &GalaxyConfig, snap: &GalaxySnapshot) -> SimResult<Self> {
        let mut model = Self::new(cfg);
        for record in &snap.quadrants {
            if !record.coord.is_valid() {
                return Err(SimError::SnapshotInvalid(format!(
                    "quadrant {} out of range",
                    record.coord
                )));
            }
            let mut q = QuadrantState {
                hostiles: record.hostiles,
                stations: record.stations,
                obstacles: record.obstacles,
                objects: BTreeMap::new(),
            };
            for (pos, kind) in &record.objects {
                if !pos.is_valid() {
                    return Err(SimError::SnapshotInvalid(format!(
                        "sector {pos} out of range in quadrant {}",
                        record.coord
                    )));
                }
                q.objects.insert(*pos, *kind);
            }
            if !q.counts_consistent() {
                return Err(SimError::SnapshotInvalid(format!(
                    "counts disagree with layout in quadrant {}",
                    record.coord
                )));
            }
            model.quadrants.insert(record.coord, q);
        }
        Ok(model)
    }
}
