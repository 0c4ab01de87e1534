//! Hostile-unit tactical AI — per-unit emotional state, five personality
//! strategies behind one trait, and a small adaptive model of the player.
//!
//! RULES:
//!   - GalaxyModel owns positions. The unit map here is bookkeeping keyed by
//!     the same sectors; TurnEngine mirrors every move and kill into it.
//!   - Candidate orders come from sorted cell lists, so decisions are
//!     turn-stable for a given seed.
//!   - The adaptive player model is plain exponential moving averages, reset
//!     with the rest of the AI at new-game start.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::AiConfig,
    rng::SubsystemRng,
    ship::ShipModel,
    types::{ObjectKind, SectorPos, QUADRANT_SIZE},
};

// ── Personalities ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Aggressive,
    Defensive,
    Tactical,
    Berserker,
    Commander,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Tactical,
        Personality::Berserker,
        Personality::Commander,
    ];

    fn health_modifier(self) -> f64 {
        match self {
            Self::Berserker => 0.8,
            Self::Defensive => 1.2,
            Self::Commander => 1.1,
            Self::Tactical | Self::Aggressive => 1.0,
        }
    }

    fn starting_aggression(self, base: f64) -> f64 {
        match self {
            Self::Berserker => 0.9,
            Self::Defensive => 0.4,
            Self::Commander => 0.6,
            Self::Tactical => 0.7,
            Self::Aggressive => base,
        }
    }

    pub fn strategy(self) -> &'static dyn Strategy {
        match self {
            Self::Aggressive => &AggressiveStrategy,
            Self::Defensive => &DefensiveStrategy,
            Self::Tactical => &TacticalStrategy,
            Self::Berserker => &BerserkerStrategy,
            Self::Commander => &CommanderStrategy,
        }
    }
}

// ── Unit state ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Spawn,
    Attack,
    Move,
    Retreat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitState {
    pub position: SectorPos,
    pub health: i64,
    pub max_health: i64,
    pub energy: i64,
    pub personality: Personality,
    /// In [0,1]; feeds attack power and closes distance.
    pub aggression: f64,
    /// In [0,1]; suppresses aggression and drives retreats.
    pub fear: f64,
    pub last_action: ActionKind,
    pub turns_since_damage: u32,
}

impl UnitState {
    pub fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }

    pub fn damage_fraction(&self) -> f64 {
        if self.max_health <= 0 {
            return 1.0;
        }
        1.0 - self.health as f64 / self.max_health as f64
    }
}

// ── Decisions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitWeapon {
    Disruptor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UnitAction {
    Attack {
        weapon: UnitWeapon,
        power: i64,
        damage: i64,
        flanking: bool,
        coordinated: bool,
    },
    Move {
        to: SectorPos,
    },
    Retreat {
        to: SectorPos,
    },
}

impl UnitAction {
    fn kind(&self) -> ActionKind {
        match self {
            Self::Attack { .. } => ActionKind::Attack,
            Self::Move { .. } => ActionKind::Move,
            Self::Retreat { .. } => ActionKind::Retreat,
        }
    }
}

/// One turn's view of the battlefield from a single unit's perspective.
#[derive(Debug, Clone)]
pub struct TacticalSituation {
    pub player_pos: SectorPos,
    pub distance_to_player: f64,
    /// Hostiles in the quadrant excluding this unit.
    pub allied_units: u32,
    pub stations_present: u32,
    pub player_threat: f64,
    pub has_cover: bool,
    pub flanking_opportunity: bool,
    /// Valid unoccupied neighbouring cells, in cell order.
    pub free_adjacent: Vec<SectorPos>,
    /// Subset of free_adjacent that increases distance to the player.
    pub escape_cells: Vec<SectorPos>,
    pub optimal_range: f64,
    pub player_shield_ratio: f64,
}

// ── Strategies ───────────────────────────────────────────────────────────

/// One implementation per personality; chooses this turn's action.
pub trait Strategy: Sync {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction;
}

pub struct AggressiveStrategy;
pub struct DefensiveStrategy;
pub struct TacticalStrategy;
pub struct BerserkerStrategy;
pub struct CommanderStrategy;

impl Strategy for DefensiveStrategy {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        if unit.damage_fraction() > 0.6 {
            return retreat_action(unit.position, sit, rng);
        }
        // Hold the 3..5 band and fire conservatively from inside it.
        if sit.distance_to_player < 3.0 {
            step_away(unit.position, sit)
        } else if sit.distance_to_player > 5.0 {
            step_toward(unit.position, sit)
        } else {
            attack_action(unit, sit, 0.3, false, false, rng)
        }
    }
}

impl Strategy for BerserkerStrategy {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        if sit.distance_to_player > 2.0 {
            return step_toward(unit.position, sit);
        }
        attack_action(unit, sit, 0.8, false, false, rng)
    }
}

impl Strategy for CommanderStrategy {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        if sit.flanking_opportunity {
            return attack_action(unit, sit, 0.6, true, false, rng);
        }
        if sit.allied_units > 0 {
            return attack_action(unit, sit, 0.6, false, true, rng);
        }
        TacticalStrategy.decide(unit, sit, rng)
    }
}

impl Strategy for TacticalStrategy {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        let d = sit.distance_to_player;
        if (d - sit.optimal_range).abs() > 1.0 {
            return if d < sit.optimal_range {
                step_away(unit.position, sit)
            } else {
                step_toward(unit.position, sit)
            };
        }
        let fraction = 0.5 * (1.0 + sit.player_threat * 0.5);
        attack_action(unit, sit, fraction, false, false, rng)
    }
}

impl Strategy for AggressiveStrategy {
    fn decide(
        &self,
        unit: &UnitState,
        sit: &TacticalSituation,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        if sit.distance_to_player > 3.0 {
            return step_toward(unit.position, sit);
        }
        attack_action(unit, sit, 0.7, false, false, rng)
    }
}

fn attack_action(
    unit: &UnitState,
    sit: &TacticalSituation,
    energy_fraction: f64,
    flanking: bool,
    coordinated: bool,
    rng: &mut SubsystemRng,
) -> UnitAction {
    let power = (unit.energy as f64 * energy_fraction) as i64;
    let mut damage = attack_damage(power, sit.distance_to_player, rng);
    if flanking {
        damage += (damage as f64 * 0.25) as i64;
    }
    UnitAction::Attack {
        weapon: UnitWeapon::Disruptor,
        power,
        damage,
        flanking,
        coordinated,
    }
}

/// Unit weapon damage from allocated power and range.
pub fn attack_damage(power: i64, distance: f64, rng: &mut SubsystemRng) -> i64 {
    let base = power / 10;
    let distance_mod = (1.0 - (distance - 1.0) * 0.1).max(0.5);
    let variance = rng.uniform(0.8, 1.2);
    ((base as f64 * distance_mod * variance) as i64).max(1)
}

fn step_toward(position: SectorPos, sit: &TacticalSituation) -> UnitAction {
    let to = sit
        .free_adjacent
        .iter()
        .copied()
        .min_by(|a, b| {
            a.distance_to(sit.player_pos)
                .total_cmp(&b.distance_to(sit.player_pos))
        })
        .unwrap_or(position);
    UnitAction::Move { to }
}

fn step_away(position: SectorPos, sit: &TacticalSituation) -> UnitAction {
    let to = sit
        .free_adjacent
        .iter()
        .copied()
        .max_by(|a, b| {
            a.distance_to(sit.player_pos)
                .total_cmp(&b.distance_to(sit.player_pos))
        })
        .unwrap_or(position);
    UnitAction::Move { to }
}

fn retreat_action(
    position: SectorPos,
    sit: &TacticalSituation,
    rng: &mut SubsystemRng,
) -> UnitAction {
    let to = if sit.escape_cells.is_empty() {
        // Nowhere better to go: bolt to a random adjacent cell, clamped to
        // the grid. The engine drops the move if the cell is occupied.
        let dx = *rng.pick(&[-1i32, 0, 1]);
        let dy = *rng.pick(&[-1i32, 0, 1]);
        SectorPos::new(
            (position.x + dx).clamp(1, QUADRANT_SIZE),
            (position.y + dy).clamp(1, QUADRANT_SIZE),
        )
    } else {
        *rng.pick(&sit.escape_cells)
    };
    UnitAction::Retreat { to }
}

// ── Adaptive model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PlayerModel {
    /// EMA of the player's shield ratio, nudged each observed turn.
    pub shield_usage: f64,
    /// EMA of how often the player's commands are attacks.
    pub aggression_estimate: f64,
    pub encounters: u32,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            shield_usage: 0.5,
            aggression_estimate: 0.5,
            encounters: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CombatStats {
    pub shots_fired: u64,
    pub hits: u64,
    pub damage_dealt: i64,
    pub damage_received: i64,
    pub units_destroyed: u32,
}

impl CombatStats {
    pub fn accuracy(&self) -> f64 {
        self.hits as f64 / self.shots_fired.max(1) as f64
    }
}

// ── The AI itself ────────────────────────────────────────────────────────

pub struct TacticalAi {
    cfg: AiConfig,
    pub units: BTreeMap<SectorPos, UnitState>,
    pub player_model: PlayerModel,
    pub stats: CombatStats,
}

impl TacticalAi {
    pub fn new(cfg: AiConfig) -> Self {
        Self {
            cfg,
            units: BTreeMap::new(),
            player_model: PlayerModel::default(),
            stats: CombatStats::default(),
        }
    }

    /// New-game semantics: forget every unit and everything learned.
    pub fn reset(&mut self) {
        self.units.clear();
        self.player_model = PlayerModel::default();
        self.stats = CombatStats::default();
    }

    pub fn unit(&self, pos: SectorPos) -> Option<&UnitState> {
        self.units.get(&pos)
    }

    /// Decide this unit's action for the turn. Units are initialized lazily
    /// on their first evaluation.
    pub fn decide(
        &mut self,
        unit_pos: SectorPos,
        player_pos: SectorPos,
        ship: &ShipModel,
        objects: &BTreeMap<SectorPos, ObjectKind>,
        rng: &mut SubsystemRng,
    ) -> UnitAction {
        self.ensure_unit(unit_pos, rng);
        let sit = self.analyze(unit_pos, player_pos, ship, objects, rng);

        let action = {
            let Some(unit) = self.units.get_mut(&unit_pos) else {
                return UnitAction::Move { to: unit_pos };
            };
            update_emotional_state(unit, &sit);
            let action = unit.personality.strategy().decide(unit, &sit, rng);
            unit.last_action = action.kind();
            unit.turns_since_damage = unit.turns_since_damage.saturating_add(1);
            action
        };

        if self.cfg.adaptation_enabled {
            self.observe_shield_ratio(ship);
            self.player_model.encounters += 1;
        }

        log::debug!("unit at {unit_pos} decided: {:?}", action.kind());
        action
    }

    fn ensure_unit(&mut self, pos: SectorPos, rng: &mut SubsystemRng) {
        if self.units.contains_key(&pos) {
            return;
        }
        let personality = *rng.pick(&Personality::ALL);
        let health = (self.cfg.base_health as f64 * personality.health_modifier()) as i64;
        self.units.insert(
            pos,
            UnitState {
                position: pos,
                health,
                max_health: health,
                energy: self.cfg.base_energy,
                personality,
                aggression: personality.starting_aggression(self.cfg.base_aggression),
                fear: 0.0,
                last_action: ActionKind::Spawn,
                turns_since_damage: 0,
            },
        );
        log::debug!("initialized {personality:?} unit at {pos}");
    }

    fn analyze(
        &self,
        unit_pos: SectorPos,
        player_pos: SectorPos,
        ship: &ShipModel,
        objects: &BTreeMap<SectorPos, ObjectKind>,
        rng: &mut SubsystemRng,
    ) -> TacticalSituation {
        let distance = unit_pos.distance_to(player_pos);
        let hostiles = objects
            .values()
            .filter(|k| **k == ObjectKind::Hostile)
            .count() as u32;
        let stations = objects
            .values()
            .filter(|k| **k == ObjectKind::Station)
            .count() as u32;

        // Situational awareness is imperfect: a unit that fails the roll
        // fights without cover/flanking information this turn.
        let aware = rng.chance(self.cfg.tactical_awareness);
        let has_cover = aware && cover_between(unit_pos, player_pos, objects);
        let flanking_opportunity =
            aware && flanking_available(unit_pos, player_pos, objects);

        let free_adjacent: Vec<SectorPos> = unit_pos
            .neighbours()
            .into_iter()
            .filter(|cell| !objects.contains_key(cell))
            .collect();
        let escape_cells: Vec<SectorPos> = free_adjacent
            .iter()
            .copied()
            .filter(|cell| cell.distance_to(player_pos) > distance)
            .collect();

        let player_shield_ratio = if ship.max_shields > 0 {
            ship.shields as f64 / ship.max_shields as f64
        } else {
            0.0
        };
        let personality = self.units.get(&unit_pos).map(|unit| unit.personality);

        TacticalSituation {
            player_pos,
            distance_to_player: distance,
            allied_units: hostiles.saturating_sub(1),
            stations_present: stations,
            player_threat: self.assess_player_threat(ship),
            has_cover,
            flanking_opportunity,
            free_adjacent,
            escape_cells,
            optimal_range: optimal_combat_range(personality, player_shield_ratio),
            player_shield_ratio,
        }
    }

    /// Blend of the player's resource ratios, scaled by the learned
    /// aggression estimate once enough encounters have been observed.
    pub fn assess_player_threat(&self, ship: &ShipModel) -> f64 {
        let energy = (ship.energy as f64 / ship.max_energy.max(1) as f64).min(1.0);
        let shields = (ship.shields as f64 / ship.max_shields.max(1) as f64).min(1.0);
        let torpedoes =
            (ship.torpedoes as f64 / ship.max_torpedoes.max(1) as f64).min(1.0);
        let mut threat = energy * 0.4 + shields * 0.3 + torpedoes * 0.3;
        if self.player_model.encounters > 5 {
            threat *= 0.5 + self.player_model.aggression_estimate * 0.5;
        }
        threat.min(1.0)
    }

    fn observe_shield_ratio(&mut self, ship: &ShipModel) {
        let ratio = if ship.max_shields > 0 {
            ship.shields as f64 / ship.max_shields as f64
        } else {
            0.0
        };
        let rate = self.cfg.learning_rate;
        self.player_model.shield_usage =
            self.player_model.shield_usage * (1.0 - rate) + ratio * rate;
    }

    /// Observation of one player command: was it an attack?
    pub fn observe_player_action(&mut self, attacked: bool) {
        if !self.cfg.adaptation_enabled {
            return;
        }
        let rate = self.cfg.learning_rate;
        let observed = if attacked { 1.0 } else { 0.0 };
        self.player_model.aggression_estimate =
            self.player_model.aggression_estimate * (1.0 - rate) + observed * rate;
    }

    /// Mirror a galaxy-side move into the unit map.
    pub fn relocate_unit(&mut self, from: SectorPos, to: SectorPos) {
        if let Some(mut unit) = self.units.remove(&from) {
            unit.position = to;
            self.units.insert(to, unit);
        }
    }

    /// Remove a unit killed outright (threshold kill). Counts toward losses
    /// only when the unit had state.
    pub fn remove_unit(&mut self, pos: SectorPos) {
        if self.units.remove(&pos).is_some() {
            self.stats.units_destroyed += 1;
        }
    }

    /// Record one player shot against the unit at `pos`. Applies received
    /// damage to its health pool; returns true when that kills it (the unit
    /// is removed here, the caller mirrors the galaxy side).
    pub fn report_combat_result(&mut self, pos: SectorPos, damage_received: i64) -> bool {
        self.stats.shots_fired += 1;
        if damage_received > 0 {
            self.stats.hits += 1;
            self.stats.damage_received += damage_received;
        }
        if let Some(unit) = self.units.get_mut(&pos) {
            if damage_received > 0 {
                unit.health = (unit.health - damage_received).max(0);
                unit.turns_since_damage = 0;
            }
            if unit.health <= 0 {
                self.units.remove(&pos);
                self.stats.units_destroyed += 1;
                return true;
            }
        }
        false
    }
}

// ── Situation helpers ────────────────────────────────────────────────────

fn update_emotional_state(unit: &mut UnitState, sit: &TacticalSituation) {
    let damage_fear = unit.damage_fraction() * 0.5;
    let threat_fear = sit.player_threat * 0.3;
    let outnumbered_fear = if sit.allied_units == 0 { 0.2 } else { 0.0 };
    unit.fear = (damage_fear + threat_fear + outnumbered_fear).min(1.0);

    let mut aggression = unit.aggression;
    if unit.personality == Personality::Berserker && unit.is_damaged() {
        aggression += 0.2;
    }
    if unit.personality == Personality::Commander {
        if sit.allied_units > 0 {
            aggression += 0.1;
        }
        if sit.flanking_opportunity {
            aggression += 0.15;
        }
    }
    unit.aggression = (aggression - unit.fear * 0.3).clamp(0.1, 1.0);
}

/// Line-of-sight check: an obstacle on the sampled line between the two
/// positions counts as cover.
fn cover_between(
    from: SectorPos,
    to: SectorPos,
    objects: &BTreeMap<SectorPos, ObjectKind>,
) -> bool {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = dx.abs().max(dy.abs());
    if steps <= 1 {
        return false;
    }
    for i in 1..steps {
        let check = SectorPos::new(
            from.x + (dx as f64 * i as f64 / steps as f64) as i32,
            from.y + (dy as f64 * i as f64 / steps as f64) as i32,
        );
        if objects.get(&check) == Some(&ObjectKind::Obstacle) {
            return true;
        }
    }
    false
}

/// True when some ally sits on roughly the opposite side of the player:
/// vectors from the player to each unit point in opposing directions.
fn flanking_available(
    unit_pos: SectorPos,
    player_pos: SectorPos,
    objects: &BTreeMap<SectorPos, ObjectKind>,
) -> bool {
    objects
        .iter()
        .filter(|(pos, kind)| **kind == ObjectKind::Hostile && **pos != unit_pos)
        .any(|(ally, _)| {
            let v1x = unit_pos.x - player_pos.x;
            let v1y = unit_pos.y - player_pos.y;
            let v2x = ally.x - player_pos.x;
            let v2y = ally.y - player_pos.y;
            v1x * v2x + v1y * v2y < 0
        })
}

/// Preferred engagement range: the personality sets the baseline posture,
/// strong player shields push it out, weak ones pull it in.
fn optimal_combat_range(personality: Option<Personality>, player_shield_ratio: f64) -> f64 {
    let mut range = match personality {
        Some(Personality::Berserker) => 1.5,
        Some(Personality::Aggressive) => 2.0,
        Some(Personality::Defensive) => 4.0,
        _ => 3.0,
    };
    if player_shield_ratio > 0.7 {
        range += 1.0;
    } else if player_shield_ratio < 0.3 {
        range -= 1.0;
    }
    range.clamp(1.0, 6.0)
}
