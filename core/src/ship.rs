//! Player vessel — resources, per-subsystem damage, capability queries.
//!
//! RULES:
//!   - Energy, shields and torpedoes never go negative.
//!   - `destroyed` is flagged the instant energy reaches zero, by whichever
//!     mutator got it there.
//!   - Damage lands on shields first; only the remainder touches energy and
//!     may harm a subsystem.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    config::ShipConfig,
    rng::SubsystemRng,
    types::{QuadrantCoord, SectorPos},
};

/// The eight damageable subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipSystem {
    WarpDrive,
    ImpulseDrive,
    BeamArray,
    LauncherTubes,
    ShieldGrid,
    Sensors,
    Computer,
    LifeSupport,
}

impl ShipSystem {
    pub const ALL: [ShipSystem; 8] = [
        ShipSystem::WarpDrive,
        ShipSystem::ImpulseDrive,
        ShipSystem::BeamArray,
        ShipSystem::LauncherTubes,
        ShipSystem::ShieldGrid,
        ShipSystem::Sensors,
        ShipSystem::Computer,
        ShipSystem::LifeSupport,
    ];

    /// Repair crews work through systems in this order.
    pub const REPAIR_PRIORITY: [ShipSystem; 8] = [
        ShipSystem::LifeSupport,
        ShipSystem::WarpDrive,
        ShipSystem::ShieldGrid,
        ShipSystem::BeamArray,
        ShipSystem::LauncherTubes,
        ShipSystem::Sensors,
        ShipSystem::ImpulseDrive,
        ShipSystem::Computer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::WarpDrive => "warp drive",
            Self::ImpulseDrive => "impulse drive",
            Self::BeamArray => "beam array",
            Self::LauncherTubes => "launcher tubes",
            Self::ShieldGrid => "shield grid",
            Self::Sensors => "sensors",
            Self::Computer => "computer",
            Self::LifeSupport => "life support",
        }
    }
}

/// Per-subsystem damage, 0.0 = fully functional, 1.0 = destroyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemDamage {
    pub warp_drive: f64,
    pub impulse_drive: f64,
    pub beam_array: f64,
    pub launcher_tubes: f64,
    pub shield_grid: f64,
    pub sensors: f64,
    pub computer: f64,
    pub life_support: f64,
}

impl SystemDamage {
    pub fn get(&self, system: ShipSystem) -> f64 {
        match system {
            ShipSystem::WarpDrive => self.warp_drive,
            ShipSystem::ImpulseDrive => self.impulse_drive,
            ShipSystem::BeamArray => self.beam_array,
            ShipSystem::LauncherTubes => self.launcher_tubes,
            ShipSystem::ShieldGrid => self.shield_grid,
            ShipSystem::Sensors => self.sensors,
            ShipSystem::Computer => self.computer,
            ShipSystem::LifeSupport => self.life_support,
        }
    }

    fn slot(&mut self, system: ShipSystem) -> &mut f64 {
        match system {
            ShipSystem::WarpDrive => &mut self.warp_drive,
            ShipSystem::ImpulseDrive => &mut self.impulse_drive,
            ShipSystem::BeamArray => &mut self.beam_array,
            ShipSystem::LauncherTubes => &mut self.launcher_tubes,
            ShipSystem::ShieldGrid => &mut self.shield_grid,
            ShipSystem::Sensors => &mut self.sensors,
            ShipSystem::Computer => &mut self.computer,
            ShipSystem::LifeSupport => &mut self.life_support,
        }
    }

    /// Add damage to one system, clamped so it never exceeds 1.0.
    pub fn add(&mut self, system: ShipSystem, amount: f64) -> f64 {
        let slot = self.slot(system);
        *slot = (*slot + amount).min(1.0);
        *slot
    }

    pub fn mean(&self) -> f64 {
        ShipSystem::ALL
            .iter()
            .map(|s| self.get(*s))
            .sum::<f64>()
            / ShipSystem::ALL.len() as f64
    }

    pub fn any(&self) -> bool {
        ShipSystem::ALL.iter().any(|s| self.get(*s) > 0.0)
    }
}

// ── Damage report payload ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub system: &'static str,
    pub damage: f64,
    pub efficiency: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairItem {
    pub system: &'static str,
    pub damage: f64,
    pub priority: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DamageReport {
    pub systems: Vec<SystemStatus>,
    pub overall_condition: &'static str,
    pub repair_priority: Vec<RepairItem>,
}

// ── Ship ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipModel {
    pub max_energy: i64,
    pub max_shields: i64,
    pub max_torpedoes: u32,
    pub energy: i64,
    pub shields: i64,
    pub torpedoes: u32,
    pub quadrant: QuadrantCoord,
    pub position: SectorPos,
    pub visited: BTreeSet<QuadrantCoord>,
    pub damage: SystemDamage,
    pub docked: bool,
    pub destroyed: bool,
}

impl ShipModel {
    pub fn new(cfg: &ShipConfig) -> Self {
        Self {
            max_energy: cfg.max_energy,
            max_shields: cfg.max_shields,
            max_torpedoes: cfg.max_torpedoes,
            energy: cfg.max_energy,
            shields: cfg.max_shields,
            torpedoes: cfg.max_torpedoes,
            quadrant: QuadrantCoord::new(1, 1),
            position: SectorPos::new(4, 4),
            visited: BTreeSet::new(),
            damage: SystemDamage::default(),
            docked: false,
            destroyed: false,
        }
    }

    pub fn reset_to_full_strength(&mut self) {
        self.energy = self.max_energy;
        self.shields = self.max_shields;
        self.torpedoes = self.max_torpedoes;
        self.damage = SystemDamage::default();
        self.docked = false;
        self.destroyed = false;
        log::info!("ship reset to full strength");
    }

    /// Apply incoming damage: shields absorb first, the remainder drains
    /// energy and may harm one random subsystem. Returns the post-shield
    /// damage amount for reporting.
    pub fn take_damage(&mut self, amount: i64, rng: &mut SubsystemRng) -> i64 {
        if amount <= 0 {
            return 0;
        }
        let mut remaining = amount;
        if self.shields > 0 {
            let absorbed = self.shields.min(remaining);
            self.shields -= absorbed;
            remaining -= absorbed;
            log::debug!("shields absorbed {absorbed}, {} remaining", self.shields);
        }
        if remaining > 0 {
            self.energy -= self.energy.min(remaining);
            self.roll_system_damage(remaining, rng);
            log::info!("ship took {remaining} damage, energy now {}", self.energy);
        }
        self.note_energy_state();
        remaining
    }

    fn roll_system_damage(&mut self, remaining: i64, rng: &mut SubsystemRng) {
        // Chance of a subsystem hit scales with the damage that got through.
        let chance = (remaining as f64 / 100.0).min(0.8);
        if rng.chance(chance) {
            let system = *rng.pick(&ShipSystem::ALL);
            let severity = rng.uniform(0.1, 0.5);
            let level = self.damage.add(system, severity);
            log::info!("{} damaged: {level:.2}", system.label());
        }
    }

    fn note_energy_state(&mut self) {
        if self.energy <= 0 {
            self.energy = 0;
            if !self.destroyed {
                self.destroyed = true;
                log::warn!("ship destroyed");
            }
        }
    }

    /// Spend energy after verifying it is available.
    pub fn try_spend_energy(&mut self, cost: i64) -> bool {
        if cost < 0 || self.energy < cost {
            return false;
        }
        self.energy -= cost;
        self.note_energy_state();
        true
    }

    /// Unchecked drain used by hazards; clamps at zero. Returns the amount
    /// actually drained.
    pub fn drain_energy(&mut self, amount: i64) -> i64 {
        let drained = self.energy.min(amount.max(0));
        self.energy -= drained;
        self.note_energy_state();
        drained
    }

    pub fn replenish_energy(&mut self, amount: i64) {
        self.energy = (self.energy + amount.max(0)).min(self.max_energy);
    }

    pub fn add_shields(&mut self, amount: i64) {
        self.shields = (self.shields + amount.max(0)).min(self.max_shields);
    }

    pub fn add_torpedoes(&mut self, count: u32) {
        self.torpedoes = (self.torpedoes + count).min(self.max_torpedoes);
    }

    /// Set the shield level. Requests above the maximum clamp to it; raising
    /// costs energy for the applied delta only, lowering is free. Returns the
    /// energy spent, or an error message when the delta is unaffordable.
    pub fn set_shields(&mut self, level: i64) -> Result<i64, String> {
        let level = level.min(self.max_shields).max(0);
        let delta = level - self.shields;
        if delta > self.energy {
            return Err(format!(
                "Insufficient energy. Need {delta}, have {}",
                self.energy
            ));
        }
        if delta > 0 {
            self.energy -= delta;
        }
        self.shields = level;
        self.note_energy_state();
        Ok(delta.max(0))
    }

    pub fn dock(&mut self) {
        self.docked = true;
        self.energy = self.max_energy;
        self.shields = self.max_shields;
        self.torpedoes = self.max_torpedoes;
        self.damage = SystemDamage::default();
        self.destroyed = false;
        log::info!("docked with station, ship fully restored");
    }

    pub fn undock(&mut self) {
        self.docked = false;
    }

    // ── Capability queries ───────────────────────────────────────────────

    pub fn efficiency(&self, system: ShipSystem) -> f64 {
        (1.0 - self.damage.get(system)).max(0.0)
    }

    pub fn can_warp(&self) -> bool {
        self.efficiency(ShipSystem::WarpDrive) > 0.1 && self.energy > 100
    }

    pub fn can_fire_beams(&self) -> bool {
        self.efficiency(ShipSystem::BeamArray) > 0.1 && self.energy > 50
    }

    pub fn can_fire_torpedoes(&self) -> bool {
        self.efficiency(ShipSystem::LauncherTubes) > 0.1 && self.torpedoes > 0
    }

    pub fn can_scan(&self) -> bool {
        self.efficiency(ShipSystem::Sensors) > 0.1
    }

    pub fn has_damage(&self) -> bool {
        self.damage.any()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed || self.energy <= 0
    }

    /// Alert condition shown on the status report.
    pub fn alert_condition(&self) -> &'static str {
        if self.shields <= 0 && self.energy < 1000 {
            "RED"
        } else if self.energy < 2000 || self.has_damage() {
            "YELLOW"
        } else {
            "GREEN"
        }
    }

    pub fn overall_condition(&self) -> &'static str {
        if self.is_destroyed() {
            return "DESTROYED";
        }
        let avg = self.damage.mean();
        if avg < 0.1 {
            "EXCELLENT"
        } else if avg < 0.3 {
            "GOOD"
        } else if avg < 0.6 {
            "FAIR"
        } else if avg < 0.8 {
            "POOR"
        } else {
            "CRITICAL"
        }
    }

    pub fn damage_report(&self) -> DamageReport {
        let systems = ShipSystem::ALL
            .iter()
            .map(|&system| {
                let damage = self.damage.get(system);
                let status = if damage <= 0.0 {
                    "operational"
                } else if damage < 0.2 {
                    "minor damage"
                } else if damage < 0.5 {
                    "moderate damage"
                } else if damage < 0.8 {
                    "major damage"
                } else {
                    "critical damage"
                };
                SystemStatus {
                    system: system.label(),
                    damage,
                    efficiency: self.efficiency(system),
                    status,
                }
            })
            .collect();

        let repair_priority = ShipSystem::REPAIR_PRIORITY
            .iter()
            .filter(|&&system| self.damage.get(system) > 0.0)
            .map(|&system| {
                let damage = self.damage.get(system);
                let priority = if damage > 0.8 {
                    "CRITICAL"
                } else if damage > 0.5 {
                    "HIGH"
                } else if damage > 0.2 {
                    "MEDIUM"
                } else {
                    "LOW"
                };
                RepairItem {
                    system: system.label(),
                    damage,
                    priority,
                }
            })
            .collect();

        DamageReport {
            systems,
            overall_condition: self.overall_condition(),
            repair_priority,
        }
    }
}
