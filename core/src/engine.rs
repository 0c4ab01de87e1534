//! Turn orchestration — command dispatch, AI pass, events, end conditions.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Command resolution
//!   2. Tactical AI pass over every hostile in the player's quadrant
//!   3. Event injection
//!   4. Stardate advance (+0.1)
//!   5. End-condition check (victory, ship destroyed, deadline)
//!
//! RULES:
//!   - A turn either fails locally (no tick runs) or commits the whole
//!     pipeline. Failed commands still count as an attempted turn.
//!   - GalaxyModel owns positions. Every unit move or kill is mirrored into
//!     TacticalAi's bookkeeping here and nowhere else.
//!   - Terminal outcomes are sticky: once the mission is over, every further
//!     command is rejected without touching any counter.
//!   - All randomness flows through the per-subsystem RNG streams created
//!     from the configured seed at construction.

use serde::{Deserialize, Serialize};

use crate::{
    advisor::{StrategicAdvisor, StrategicAssessment},
    combat::{self, AttackOutcome},
    command::GameCommand,
    config::SimConfig,
    error::{SimError, SimResult},
    events::{EventContext, EventInjector},
    galaxy::GalaxyModel,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    ship::{DamageReport, ShipModel, ShipSystem},
    snapshot::GameSnapshot,
    tactical::{TacticalAi, UnitAction},
    types::{ObjectKind, QuadrantCoord, SectorPos},
};

/// Stardate advance per successful turn.
pub const STARDATE_INCREMENT: f64 = 0.1;
/// Mission clock origin.
pub const MISSION_START: f64 = 2267.0;
/// Energy cost per unit of warp distance.
pub const WARP_ENERGY_RATE: f64 = 8.0;
/// Score awarded per destroyed hostile.
pub const KILL_SCORE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    InProgress,
    Victory,
    ShipDestroyed,
    TimeExpired,
}

impl MissionOutcome {
    pub fn is_over(self) -> bool {
        self != Self::InProgress
    }
}

/// Process-wide mission counters, mutated once per accepted turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub stardate: f64,
    pub mission_start: f64,
    pub mission_deadline: f64,
    pub score: i64,
    pub initial_hostiles: u32,
    pub hostiles_remaining: u32,
    pub stations_remaining: u32,
    pub turn_count: u64,
    pub quadrants_visited: u32,
    pub combat_encounters: u32,
    pub total_energy_used: i64,
    pub total_torpedoes_fired: u32,
    pub outcome: MissionOutcome,
}

impl GameState {
    pub fn time_remaining(&self) -> f64 {
        (self.mission_deadline - self.stardate).max(0.0)
    }
}

// ── Turn report payloads ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub quadrant: QuadrantCoord,
    pub hostiles: u32,
    pub stations: u32,
    pub obstacles: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceReading {
    pub target: QuadrantCoord,
    pub distance: f64,
    pub course: f64,
    pub energy_cost: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub stardate: f64,
    pub time_remaining: f64,
    pub condition: &'static str,
    pub quadrant: QuadrantCoord,
    pub position: SectorPos,
    pub energy: i64,
    pub shields: i64,
    pub torpedoes: u32,
    pub hostiles_remaining: u32,
    pub stations_remaining: u32,
    pub score: i64,
    pub quadrants_visited: u32,
    pub combat_encounters: u32,
}

/// Structured result of one processed turn, rendered by front ends.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub success: bool,
    pub message: String,
    pub events: Vec<String>,
    pub turn: u64,
    pub stardate: f64,
    pub outcome: MissionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<StrategicAssessment>,
}

impl TurnReport {
    fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            events: Vec::new(),
            turn: 0,
            stardate: 0.0,
            outcome: MissionOutcome::InProgress,
            scan: None,
            regions: None,
            status: None,
            damage: None,
            distance: None,
            advisory: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        let mut report = Self::succeeded(message);
        report.success = false;
        report
    }
}

// ── The engine ───────────────────────────────────────────────────────────

pub struct TurnEngine {
    cfg: SimConfig,
    galaxy: GalaxyModel,
    ship: ShipModel,
    tactical: TacticalAi,
    events: EventInjector,
    state: GameState,
    paused: bool,
    rng_galaxy: SubsystemRng,
    rng_ship: SubsystemRng,
    rng_combat: SubsystemRng,
    rng_tactical: SubsystemRng,
    rng_events: SubsystemRng,
}

impl TurnEngine {
    /// Build a fresh mission: generate the galaxy, place the ship in a safe
    /// starting quadrant, zero the counters.
    pub fn new(cfg: SimConfig) -> Self {
        let bank = RngBank::new(cfg.seed);
        let mut rng_galaxy = bank.stream(SubsystemSlot::Galaxy);

        let mut galaxy = GalaxyModel::new(&cfg.galaxy);
        galaxy.generate(&mut rng_galaxy);

        let mut ship = ShipModel::new(&cfg.ship);
        let start = galaxy.safe_starting_quadrant(&mut rng_galaxy);
        ship.quadrant = start;
        ship.position = galaxy.safe_position_in(start, &mut rng_galaxy);
        ship.visited.insert(start);

        let hostiles = galaxy.hostile_count();
        let stations = galaxy.station_count();
        let state = GameState {
            stardate: MISSION_START,
            mission_start: MISSION_START,
            mission_deadline: MISSION_START + cfg.mission_duration,
            score: 0,
            initial_hostiles: hostiles,
            hostiles_remaining: hostiles,
            stations_remaining: stations,
            turn_count: 0,
            quadrants_visited: 1,
            combat_encounters: 0,
            total_energy_used: 0,
            total_torpedoes_fired: 0,
            outcome: MissionOutcome::InProgress,
        };

        log::info!(
            "new mission: {hostiles} hostiles, {stations} stations, starting at {start}, \
             deadline {:.1}",
            state.mission_deadline
        );

        Self {
            galaxy,
            ship,
            tactical: TacticalAi::new(cfg.ai.clone()),
            events: EventInjector::new(cfg.events.clone()),
            state,
            paused: false,
            rng_galaxy,
            rng_ship: bank.stream(SubsystemSlot::Ship),
            rng_combat: bank.stream(SubsystemSlot::Combat),
            rng_tactical: bank.stream(SubsystemSlot::Tactical),
            rng_events: bank.stream(SubsystemSlot::Events),
            cfg,
        }
    }

    /// Rebuild a playable engine from a saved snapshot. Unit emotional state
    /// and active events are transient and start fresh.
    pub fn restore(cfg: SimConfig, snapshot: &GameSnapshot) -> SimResult<Self> {
        if !snapshot.ship.quadrant.is_valid() || !snapshot.ship.position.is_valid() {
            return Err(SimError::SnapshotInvalid(
                "ship location out of range".to_string(),
            ));
        }
        let galaxy = GalaxyModel::restore(&cfg.galaxy, &snapshot.galaxy)?;
        let bank = RngBank::new(cfg.seed);
        Ok(Self {
            galaxy,
            ship: snapshot.ship.clone(),
            tactical: TacticalAi::new(cfg.ai.clone()),
            events: EventInjector::new(cfg.events.clone()),
            state: snapshot.state.clone(),
            paused: false,
            rng_galaxy: bank.stream(SubsystemSlot::Galaxy),
            rng_ship: bank.stream(SubsystemSlot::Ship),
            rng_combat: bank.stream(SubsystemSlot::Combat),
            rng_tactical: bank.stream(SubsystemSlot::Tactical),
            rng_events: bank.stream(SubsystemSlot::Events),
            cfg,
        })
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state.clone(),
            ship: self.ship.clone(),
            galaxy: self.galaxy.snapshot(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn ship(&self) -> &ShipModel {
        &self.ship
    }

    pub fn galaxy(&self) -> &GalaxyModel {
        &self.galaxy
    }

    pub fn tactical(&self) -> &TacticalAi {
        &self.tactical
    }

    pub fn is_over(&self) -> bool {
        self.state.outcome.is_over()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Direct mutable access for scenario tooling and tests. Front ends
    /// drive the simulation through `process_turn` only.
    pub fn ship_mut(&mut self) -> &mut ShipModel {
        &mut self.ship
    }

    /// See [`Self::ship_mut`].
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// See [`Self::ship_mut`].
    pub fn galaxy_mut(&mut self) -> &mut GalaxyModel {
        &mut self.galaxy
    }

    // ── Turn pipeline ────────────────────────────────────────────────────

    /// Process one command and, on success, drive the full simulation tick.
    pub fn process_turn(&mut self, name: &str, params: &[String]) -> TurnReport {
        if self.state.outcome.is_over() {
            return self.rejected("The mission is over. No further commands are accepted.");
        }
        if self.paused {
            return self.rejected("Simulation is paused");
        }

        self.state.turn_count += 1;

        let command = match GameCommand::parse(name, params) {
            Ok(command) => command,
            Err(message) => return self.finish(TurnReport::failed(message)),
        };
        let attacked = matches!(
            command,
            GameCommand::FireBeams { .. } | GameCommand::FireTorpedo { .. }
        );

        let mut report = match self.dispatch(command) {
            Ok(report) => report,
            Err(err) => {
                log::error!("turn {} faulted: {err}", self.state.turn_count);
                return self.finish(TurnReport::failed(format!(
                    "Error processing command: {err}"
                )));
            }
        };
        if !report.success {
            return self.finish(report);
        }

        self.tactical.observe_player_action(attacked);
        self.run_ai_pass(&mut report.events);
        self.inject_events(&mut report.events);
        self.state.stardate += STARDATE_INCREMENT;
        self.check_end_conditions(&mut report.events);

        let assessment = StrategicAdvisor::analyze(&self.state, &self.ship, &self.galaxy);
        if let Some(warning) = &assessment.urgent_warning {
            report.events.push(format!("Strategic analysis: {warning}"));
        }
        report.advisory = Some(assessment);

        self.finish(report)
    }

    fn rejected(&self, message: &str) -> TurnReport {
        let mut report = TurnReport::failed(message);
        report.turn = self.state.turn_count;
        report.stardate = self.state.stardate;
        report.outcome = self.state.outcome;
        report
    }

    fn finish(&self, mut report: TurnReport) -> TurnReport {
        report.turn = self.state.turn_count;
        report.stardate = self.state.stardate;
        report.outcome = self.state.outcome;
        report
    }

    fn dispatch(&mut self, command: GameCommand) -> SimResult<TurnReport> {
        match command {
            GameCommand::Navigate { target } => self.handle_navigate(target),
            GameCommand::ShortRangeScan => self.handle_short_scan(),
            GameCommand::LongRangeScan => self.handle_long_scan(),
            GameCommand::FireBeams { energy } => self.handle_beams(energy),
            GameCommand::FireTorpedo { course, spread } => self.handle_torpedo(course, spread),
            GameCommand::SetShields { level } => self.handle_set_shields(level),
            GameCommand::ShieldStatus => Ok(TurnReport::succeeded(format!(
                "Shield status: {}/{}",
                self.ship.shields, self.ship.max_shields
            ))),
            GameCommand::Dock => self.handle_dock(),
            GameCommand::ComputerFunctions => Ok(TurnReport::succeeded(
                "Computer functions: distance, status",
            )),
            GameCommand::ComputerDistance { target } => self.handle_distance(target),
            GameCommand::ComputerStatus => self.handle_status(),
            GameCommand::DamageReport => {
                let mut report = TurnReport::succeeded("Damage report generated");
                report.damage = Some(self.ship.damage_report());
                Ok(report)
            }
        }
    }

    // ── Command handlers ─────────────────────────────────────────────────

    fn handle_navigate(&mut self, target: QuadrantCoord) -> SimResult<TurnReport> {
        if target == self.ship.quadrant {
            return Ok(TurnReport::failed("Already in that quadrant"));
        }
        if self.ship.efficiency(ShipSystem::WarpDrive) <= 0.1 {
            return Ok(TurnReport::failed("Warp drive is too damaged to navigate"));
        }

        let distance = self.galaxy.distance(self.ship.quadrant, target);
        let cost = (distance * WARP_ENERGY_RATE) as i64;
        if !self.ship.try_spend_energy(cost) {
            return Ok(TurnReport::failed(format!(
                "Insufficient energy. Need {cost}, have {}",
                self.ship.energy
            )));
        }
        self.state.total_energy_used += cost;

        self.ship.quadrant = target;
        self.ship.position = self.galaxy.safe_position_in(target, &mut self.rng_galaxy);
        self.ship.undock();
        if self.ship.visited.insert(target) {
            self.state.quadrants_visited += 1;
        }

        let mut report = TurnReport::succeeded(format!(
            "Warped to quadrant {target}. Energy used: {cost}"
        ));
        report.events.push(format!("Entered quadrant {target}"));
        if self.galaxy.summary(target).0 > 0 {
            report.events.push("Hostiles detected in this quadrant!".to_string());
        }
        Ok(report)
    }

    fn handle_short_scan(&mut self) -> SimResult<TurnReport> {
        if !self.ship.can_scan() {
            return Ok(TurnReport::failed("Sensors are too damaged to scan"));
        }
        let mut report = TurnReport::succeeded("Short range sensors activated");
        report.scan = Some(self.galaxy.scan_grid(self.ship.quadrant, self.ship.position));
        Ok(report)
    }

    fn handle_long_scan(&mut self) -> SimResult<TurnReport> {
        if !self.ship.can_scan() {
            return Ok(TurnReport::failed("Sensors are too damaged to scan"));
        }
        let regions = self
            .galaxy
            .adjacent_summaries(self.ship.quadrant)
            .into_iter()
            .map(|(quadrant, (hostiles, stations, obstacles))| RegionSummary {
                quadrant,
                hostiles,
                stations,
                obstacles,
            })
            .collect();
        let mut report = TurnReport::succeeded("Long range sensors activated");
        report.regions = Some(regions);
        Ok(report)
    }

    fn handle_beams(&mut self, energy: i64) -> SimResult<TurnReport> {
        if self.ship.efficiency(ShipSystem::BeamArray) <= 0.1 {
            return Ok(TurnReport::failed("Beam array is too damaged to fire"));
        }
        let targets = self.galaxy.hostile_positions(self.ship.quadrant);
        if targets.is_empty() {
            return Ok(TurnReport::failed("No targets in range"));
        }
        if !self.ship.try_spend_energy(energy) {
            return Ok(TurnReport::failed(format!(
                "Insufficient energy. Have {}",
                self.ship.energy
            )));
        }
        self.state.total_energy_used += energy;

        let outcome = combat::fire_beams(
            self.ship.position,
            self.ship.efficiency(ShipSystem::BeamArray),
            &targets,
            energy,
            &mut self.rng_combat,
        );

        let mut report = TurnReport::succeeded(outcome.message.clone());
        self.apply_attack(&outcome, &mut report.events);
        Ok(report)
    }

    fn handle_torpedo(&mut self, course: f64, spread: i32) -> SimResult<TurnReport> {
        if self.ship.efficiency(ShipSystem::LauncherTubes) <= 0.1 {
            return Ok(TurnReport::failed("Launcher tubes are too damaged to fire"));
        }
        if self.ship.torpedoes == 0 {
            return Ok(TurnReport::failed("No torpedoes remaining"));
        }
        let objects = self.galaxy.objects(self.ship.quadrant);
        if !objects.values().any(|kind| *kind == ObjectKind::Hostile) {
            return Ok(TurnReport::failed("No targets in range"));
        }

        self.ship.torpedoes -= 1;
        self.state.total_torpedoes_fired += 1;

        let outcome = combat::fire_torpedo(
            self.ship.position,
            self.ship.efficiency(ShipSystem::LauncherTubes),
            course,
            spread,
            &objects,
            &mut self.rng_combat,
        );

        let mut report = TurnReport::succeeded(outcome.message.clone());
        self.apply_attack(&outcome, &mut report.events);
        Ok(report)
    }

    /// Commit a weapon discharge: narrate it, feed every engaged target
    /// through the adaptive combat model, and mirror kills into the galaxy.
    fn apply_attack(&mut self, outcome: &AttackOutcome, events: &mut Vec<String>) {
        events.extend(outcome.events.iter().cloned());
        let quadrant = self.ship.quadrant;

        for &target in &outcome.engaged {
            let damage = outcome
                .hits
                .iter()
                .find(|(pos, _)| *pos == target)
                .map_or(0, |(_, damage)| *damage);
            let pool_kill = self.tactical.report_combat_result(target, damage);
            let threshold_kill = outcome.destroyed.contains(&target);
            if !pool_kill && !threshold_kill {
                continue;
            }
            if threshold_kill {
                // Removed outright; the unit may never have had AI state.
                self.tactical.remove_unit(target);
            } else {
                events.push(format!("Hostile at {target} destroyed!"));
            }
            self.register_kill(quadrant, target);
        }
    }

    fn register_kill(&mut self, quadrant: QuadrantCoord, pos: SectorPos) {
        if self.galaxy.remove_object(quadrant, pos).is_some() {
            self.state.hostiles_remaining = self.state.hostiles_remaining.saturating_sub(1);
            self.state.score += KILL_SCORE;
            log::info!(
                "hostile destroyed at {pos}, {} remaining",
                self.state.hostiles_remaining
            );
        }
    }

    fn handle_set_shields(&mut self, level: i64) -> SimResult<TurnReport> {
        match self.ship.set_shields(level) {
            Ok(spent) => {
                self.state.total_energy_used += spent;
                Ok(TurnReport::succeeded(format!(
                    "Shields set to {}",
                    self.ship.shields
                )))
            }
            Err(message) => Ok(TurnReport::failed(message)),
        }
    }

    fn handle_dock(&mut self) -> SimResult<TurnReport> {
        let stations = self.galaxy.station_positions(self.ship.quadrant);
        if stations.is_empty() {
            return Ok(TurnReport::failed("No station in this quadrant"));
        }
        let adjacent = stations
            .iter()
            .any(|station| self.ship.position.manhattan_to(*station) <= 1);
        if !adjacent {
            return Ok(TurnReport::failed("Must be adjacent to a station to dock"));
        }

        self.ship.dock();
        let mut report = TurnReport::succeeded(
            "Docked with station. All systems restored to full capacity.",
        );
        report.events.push("Docked with station".to_string());
        report
            .events
            .push("Ship fully repaired and resupplied".to_string());
        Ok(report)
    }

    fn handle_distance(&mut self, target: QuadrantCoord) -> SimResult<TurnReport> {
        let distance = self.galaxy.distance(self.ship.quadrant, target);
        let course = self.galaxy.course(self.ship.quadrant, target);
        let energy_cost = (distance * WARP_ENERGY_RATE) as i64;
        let mut report = TurnReport::succeeded(format!(
            "Distance to {target}: {distance:.2} quadrants, energy cost: {energy_cost}"
        ));
        report.distance = Some(DistanceReading {
            target,
            distance,
            course,
            energy_cost,
        });
        Ok(report)
    }

    fn handle_status(&mut self) -> SimResult<TurnReport> {
        let mut report = TurnReport::succeeded("Status report generated");
        report.status = Some(StatusReport {
            stardate: self.state.stardate,
            time_remaining: self.state.time_remaining(),
            condition: self.ship.alert_condition(),
            quadrant: self.ship.quadrant,
            position: self.ship.position,
            energy: self.ship.energy,
            shields: self.ship.shields,
            torpedoes: self.ship.torpedoes,
            hostiles_remaining: self.state.hostiles_remaining,
            stations_remaining: self.state.stations_remaining,
            score: self.state.score,
            quadrants_visited: self.state.quadrants_visited,
            combat_encounters: self.state.combat_encounters,
        });
        Ok(report)
    }

    // ── Simulation tick ──────────────────────────────────────────────────

    /// One decision per hostile sharing the player's quadrant, in the
    /// quadrant mapping's iteration order.
    fn run_ai_pass(&mut self, events: &mut Vec<String>) {
        let quadrant = self.ship.quadrant;
        let hostiles = self.galaxy.hostile_positions(quadrant);
        if hostiles.is_empty() {
            return;
        }
        self.state.combat_encounters += 1;

        for pos in hostiles {
            if self.ship.is_destroyed() {
                break;
            }
            // Re-read the layout: an earlier unit may have taken this cell.
            let objects = self.galaxy.objects(quadrant);
            if objects.get(&pos) != Some(&ObjectKind::Hostile) {
                continue;
            }
            let action = self.tactical.decide(
                pos,
                self.ship.position,
                &self.ship,
                &objects,
                &mut self.rng_tactical,
            );
            match action {
                UnitAction::Attack {
                    damage,
                    flanking,
                    coordinated,
                    ..
                } => {
                    let hull = self.ship.take_damage(damage, &mut self.rng_ship);
                    let mut line = format!("Hostile at {pos} attacks for {damage} damage");
                    if flanking {
                        line.push_str(" (flanking)");
                    } else if coordinated {
                        line.push_str(" (coordinated)");
                    }
                    if hull == 0 {
                        line.push_str("; shields held");
                    }
                    events.push(line);
                }
                UnitAction::Move { to } | UnitAction::Retreat { to } => {
                    if to != pos && self.galaxy.move_object(quadrant, pos, to) {
                        self.tactical.relocate_unit(pos, to);
                        events.push(format!("Hostile moves from {pos} to {to}"));
                    }
                }
            }
        }
    }

    fn inject_events(&mut self, events: &mut Vec<String>) {
        let ctx = EventContext {
            hostiles_remaining: self.state.hostiles_remaining,
            time_remaining: self.state.time_remaining(),
            ship_quadrant: self.ship.quadrant,
            local_stations: self.galaxy.summary(self.ship.quadrant).1,
        };
        events.extend(self.events.run_turn(&ctx, &mut self.ship, &mut self.rng_events));
    }

    /// Fixed priority: victory, then ship destroyed, then deadline.
    fn check_end_conditions(&mut self, events: &mut Vec<String>) {
        if self.state.outcome.is_over() {
            return;
        }
        if self.state.hostiles_remaining == 0 {
            self.state.outcome = MissionOutcome::Victory;
            events.push("All hostiles destroyed. Mission accomplished!".to_string());
            log::info!("victory at stardate {:.1}", self.state.stardate);
        } else if self.ship.is_destroyed() {
            self.state.outcome = MissionOutcome::ShipDestroyed;
            events.push("The ship has been destroyed.".to_string());
            log::info!("defeat: ship destroyed");
        } else if self.state.stardate >= self.state.mission_deadline {
            self.state.outcome = MissionOutcome::TimeExpired;
            events.push("Mission deadline passed. Command recalls the ship.".to_string());
            log::info!("defeat: deadline passed");
        }
    }
}
