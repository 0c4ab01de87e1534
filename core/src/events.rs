//! Random and contextual events — hazards, windfalls, malfunctions.
//!
//! Each injection pass first services every active event (hazards drain
//! energy per tick until their duration runs out; anomalies are one-shot
//! and retire on creation), then, once off cooldown, rolls for a new event
//! chosen by weighted selection over a fixed catalogue with context-adjusted
//! weights, and finally evaluates the independent contextual warnings.
//!
//! RULES:
//!   - Event effects mutate the ship directly; nothing here touches the
//!     galaxy or the AI.
//!   - The catalogue is an ordered list, not a map: the walk order of the
//!     weighted choice is part of the deterministic contract.

use crate::{
    config::EventConfig,
    rng::SubsystemRng,
    ship::{ShipModel, ShipSystem},
    types::QuadrantCoord,
};

const LOW_ENERGY_WARNING_CHANCE: f64 = 0.1;
const TIME_CRITICAL_WARNING_CHANCE: f64 = 0.2;
const NEAR_VICTORY_WARNING_CHANCE: f64 = 0.15;

/// The fixed event catalogue, in selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    IonStorm,
    SubspaceAnomaly,
    DistressCall,
    HostileReinforcements,
    StationEmergency,
    EquipmentMalfunction,
    Discovery,
    DiplomaticContact,
}

const BASE_WEIGHTS: [(EventKind, f64); 8] = [
    (EventKind::IonStorm, 0.2),
    (EventKind::SubspaceAnomaly, 0.15),
    (EventKind::DistressCall, 0.1),
    (EventKind::HostileReinforcements, 0.1),
    (EventKind::StationEmergency, 0.05),
    (EventKind::EquipmentMalfunction, 0.15),
    (EventKind::Discovery, 0.1),
    (EventKind::DiplomaticContact, 0.05),
];

/// Systems a malfunction can hit: the exposed, field-repairable ones.
const MALFUNCTION_SYSTEMS: [ShipSystem; 5] = [
    ShipSystem::WarpDrive,
    ShipSystem::ImpulseDrive,
    ShipSystem::BeamArray,
    ShipSystem::LauncherTubes,
    ShipSystem::Sensors,
];

/// A persistent hazard with remaining lifetime.
#[derive(Debug, Clone)]
pub struct ActiveEvent {
    pub kind: EventKind,
    pub remaining_turns: u32,
    pub drain_per_turn: i64,
}

/// What the injector is allowed to see of the rest of the simulation.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub hostiles_remaining: u32,
    pub time_remaining: f64,
    pub ship_quadrant: QuadrantCoord,
    pub local_stations: u32,
}

pub struct EventInjector {
    cfg: EventConfig,
    turns_since_event: u32,
    active: Vec<ActiveEvent>,
}

impl EventInjector {
    pub fn new(cfg: EventConfig) -> Self {
        Self {
            cfg,
            turns_since_event: 0,
            active: Vec::new(),
        }
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.active
    }

    /// One injection pass, run after the AI phase of every successful turn.
    /// Returns the human-readable event log for the turn.
    pub fn run_turn(
        &mut self,
        ctx: &EventContext,
        ship: &mut ShipModel,
        rng: &mut SubsystemRng,
    ) -> Vec<String> {
        let mut log = Vec::new();
        self.turns_since_event += 1;

        self.process_active(ship, &mut log);

        if self.turns_since_event >= self.cfg.min_cooldown
            && rng.chance(self.cfg.base_event_chance)
        {
            let kind = self.pick_event(ctx, ship, rng);
            log.extend(self.trigger(kind, ctx, ship, rng));
            self.turns_since_event = 0;
        }

        self.contextual_warnings(ctx, ship, rng, &mut log);
        log
    }

    fn process_active(&mut self, ship: &mut ShipModel, log: &mut Vec<String>) {
        for event in &mut self.active {
            let drained = ship.drain_energy(event.drain_per_turn);
            if ship.energy == 0 {
                log.push(format!("Ion storm drains the last {drained} energy - CRITICAL!"));
            } else {
                log.push(format!("Ion storm continues - {drained} energy lost"));
            }
            event.remaining_turns = event.remaining_turns.saturating_sub(1);
            if event.remaining_turns == 0 {
                log.push("Ion storm subsiding".to_string());
            }
        }
        self.active.retain(|event| event.remaining_turns > 0);
    }

    /// Context-adjusted weighted choice over the catalogue.
    fn pick_event(
        &self,
        ctx: &EventContext,
        ship: &ShipModel,
        rng: &mut SubsystemRng,
    ) -> EventKind {
        let mut weights: Vec<(EventKind, f64)> = BASE_WEIGHTS.to_vec();
        for (kind, weight) in weights.iter_mut() {
            match *kind {
                EventKind::HostileReinforcements => {
                    if ctx.hostiles_remaining > 10 {
                        *weight *= 1.5;
                    } else if ctx.hostiles_remaining < 5 {
                        *weight *= 0.5;
                    }
                }
                EventKind::EquipmentMalfunction if ship.has_damage() => *weight *= 2.0,
                EventKind::StationEmergency if ctx.local_stations > 0 => *weight *= 3.0,
                EventKind::Discovery if ctx.time_remaining < 10.0 => *weight *= 0.3,
                _ => {}
            }
        }

        let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
        let mut roll = rng.uniform(0.0, total);
        for (kind, weight) in &weights {
            if roll < *weight {
                return *kind;
            }
            roll -= weight;
        }
        // Floating-point tail: the walk can fall just past the last bucket.
        weights[weights.len() - 1].0
    }

    /// Fire a specific event kind. Public so front ends and tests can force
    /// a particular event.
    pub fn trigger(
        &mut self,
        kind: EventKind,
        ctx: &EventContext,
        ship: &mut ShipModel,
        rng: &mut SubsystemRng,
    ) -> Vec<String> {
        match kind {
            EventKind::IonStorm => self.trigger_ion_storm(ship, rng),
            EventKind::SubspaceAnomaly => trigger_anomaly(rng),
            EventKind::DistressCall => trigger_distress_call(ctx, rng),
            EventKind::HostileReinforcements => vec![
                "INTELLIGENCE: Hostile reinforcements reported entering the sector".to_string(),
                "Long-range plots show additional contacts".to_string(),
            ],
            EventKind::StationEmergency => trigger_station_emergency(rng),
            EventKind::EquipmentMalfunction => trigger_malfunction(ship, rng),
            EventKind::Discovery => trigger_discovery(ship, rng),
            EventKind::DiplomaticContact => trigger_diplomatic(rng),
        }
    }

    fn trigger_ion_storm(&mut self, ship: &mut ShipModel, rng: &mut SubsystemRng) -> Vec<String> {
        let duration = 2 + rng.next_u64_below(4) as u32;
        let drain = self.cfg.storm_energy_drain;
        ship.drain_energy(drain);
        self.active.push(ActiveEvent {
            kind: EventKind::IonStorm,
            remaining_turns: duration,
            drain_per_turn: drain / 4,
        });
        log::info!("ion storm: {duration} turns, {drain} initial drain");
        vec![
            "ALERT: Ion storm detected!".to_string(),
            format!("Energy systems disrupted - {drain} energy lost"),
            format!("Storm expected to last {duration} turns"),
        ]
    }

    /// Independent low-probability warnings tied to hard game conditions.
    fn contextual_warnings(
        &self,
        ctx: &EventContext,
        ship: &ShipModel,
        rng: &mut SubsystemRng,
        log: &mut Vec<String>,
    ) {
        if ship.energy > 0 && ship.energy < 500 && rng.chance(LOW_ENERGY_WARNING_CHANCE) {
            log.push("ENGINEERING: Energy reserves running low!".to_string());
        }
        if ctx.time_remaining > 0.0
            && ctx.time_remaining < 5.0
            && rng.chance(TIME_CRITICAL_WARNING_CHANCE)
        {
            log.push(format!(
                "COMMAND: Mission time critical - {:.1} stardates remaining!",
                ctx.time_remaining
            ));
        }
        if ctx.hostiles_remaining > 0
            && ctx.hostiles_remaining <= 3
            && rng.chance(NEAR_VICTORY_WARNING_CHANCE)
        {
            log.push(format!(
                "TACTICAL: Only {} hostile ships remain!",
                ctx.hostiles_remaining
            ));
        }
    }
}

fn trigger_anomaly(rng: &mut SubsystemRng) -> Vec<String> {
    let phenomena = [
        ("Temporal distortion", "Time flow altered - mission clock unreliable"),
        ("Gravitational anomaly", "Navigation solutions disrupted"),
        ("Subspace interference", "Communications and sensors impaired"),
        ("Quantum fluctuation", "Weapon systems reporting power fluctuations"),
    ];
    let (name, effect) = *rng.pick(&phenomena);
    vec![format!("SCIENCE: {name} detected!"), effect.to_string()]
}

fn trigger_distress_call(ctx: &EventContext, rng: &mut SubsystemRng) -> Vec<String> {
    let vessels = ["merchant vessel", "survey ship", "colony transport", "patrol craft"];
    let vessel = *rng.pick(&vessels);

    // Pick a quadrant adjacent to the ship; every quadrant has at least
    // three valid neighbours, so the list is never empty.
    let mut nearby = Vec::with_capacity(8);
    for dx in -1..=1 {
        for dy in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let coord = QuadrantCoord::new(ctx.ship_quadrant.x + dx, ctx.ship_quadrant.y + dy);
            if coord.is_valid() {
                nearby.push(coord);
            }
        }
    }
    let quadrant = *rng.pick(&nearby);

    vec![
        "COMMUNICATIONS: Distress call received!".to_string(),
        format!("A {vessel} is requesting assistance in quadrant {quadrant}"),
    ]
}

fn trigger_station_emergency(rng: &mut SubsystemRng) -> Vec<String> {
    let emergencies = [
        "a medical emergency",
        "a technical malfunction",
        "a supply shortage",
        "defensive systems offline",
    ];
    let emergency = *rng.pick(&emergencies);
    vec![
        "COMMAND: Station emergency reported!".to_string(),
        format!("Station experiencing {emergency}"),
    ]
}

fn trigger_malfunction(ship: &mut ShipModel, rng: &mut SubsystemRng) -> Vec<String> {
    let system = *rng.pick(&MALFUNCTION_SYSTEMS);
    let severity = rng.uniform(0.1, 0.3);
    let level = ship.damage.add(system, severity);
    log::info!("malfunction: {} now {level:.2} damaged", system.label());
    vec![
        "ENGINEERING: Equipment malfunction detected!".to_string(),
        format!("{} experiencing problems", system.label()),
        "Repair recommended - dock with a station".to_string(),
    ]
}

fn trigger_discovery(ship: &mut ShipModel, rng: &mut SubsystemRng) -> Vec<String> {
    let finds = [
        "Ancient artifact",
        "Abandoned supply cache",
        "Derelict ship",
        "Rare mineral deposit",
    ];
    let idx = rng.next_u64_below(finds.len() as u64) as usize;
    let mut log = vec![format!("SCIENCE: {} discovered!", finds[idx])];
    match idx {
        0 => {
            ship.replenish_energy(300);
            log.push("Energy reserves boosted by 300".to_string());
        }
        1 => {
            ship.add_torpedoes(2);
            log.push("Torpedo stores replenished".to_string());
        }
        2 => log.push("Nothing salvageable aboard".to_string()),
        _ => {
            ship.add_shields(200);
            log.push("Shield capacitors charged by 200".to_string());
        }
    }
    log
}

fn trigger_diplomatic(rng: &mut SubsystemRng) -> Vec<String> {
    let parties = [
        "trade delegation",
        "neutral envoy",
        "science exchange",
        "border patrol",
    ];
    let party = *rng.pick(&parties);
    vec![
        format!("DIPLOMATIC: {party} vessel encountered"),
        "Peaceful contact established".to_string(),
    ]
}
