//! Simulation configuration.
//!
//! Plain typed values consumed by the engine. Loading these from files is a
//! front-end concern; the core only defines the shape and the defaults.
//! In tests, use `SimConfig::default_test()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxyConfig {
    /// Total hostile units scattered across the galaxy.
    pub total_hostiles: u32,
    /// Total support stations (at most one per quadrant).
    pub total_stations: u32,
    /// Per-quadrant obstacle count is uniform in 1..=max(1, 8 * density).
    pub obstacle_density: f64,
    /// Placement cap for hostiles in a single quadrant.
    pub max_hostiles_per_quadrant: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
    pub max_energy: i64,
    pub max_shields: i64,
    pub max_torpedoes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Starting aggression for units without a personality override.
    pub base_aggression: f64,
    /// EMA rate for the adaptive player model.
    pub learning_rate: f64,
    /// Per-turn probability that a unit works out cover/flanking information.
    pub tactical_awareness: f64,
    /// Master switch for the adaptive player model.
    pub adaptation_enabled: bool,
    pub base_health: i64,
    pub base_energy: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Base per-turn probability of a new random event once off cooldown.
    pub base_event_chance: f64,
    /// Minimum turns between random events.
    pub min_cooldown: u32,
    /// Immediate energy loss when an ion storm hits.
    pub storm_energy_drain: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    /// Mission length in stardates.
    pub mission_duration: f64,
    pub galaxy: GalaxyConfig,
    pub ship: ShipConfig,
    pub ai: AiConfig,
    pub events: EventConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            mission_duration: 30.0,
            galaxy: GalaxyConfig {
                total_hostiles: 15,
                total_stations: 4,
                obstacle_density: 0.3,
                max_hostiles_per_quadrant: 3,
            },
            ship: ShipConfig {
                max_energy: 3000,
                max_shields: 1500,
                max_torpedoes: 10,
            },
            ai: AiConfig {
                base_aggression: 0.7,
                learning_rate: 0.1,
                tactical_awareness: 0.8,
                adaptation_enabled: true,
                base_health: 100,
                base_energy: 200,
            },
            events: EventConfig {
                base_event_chance: 0.05,
                min_cooldown: 5,
                storm_energy_drain: 200,
            },
        }
    }
}

impl SimConfig {
    /// Config with a small galaxy for fast, inspectable unit tests.
    pub fn default_test() -> Self {
        let mut cfg = Self::default();
        cfg.galaxy.total_hostiles = 6;
        cfg.galaxy.total_stations = 2;
        cfg
    }
}
