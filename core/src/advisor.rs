//! Strategic advisor — read-only situational analysis and recommendations.
//!
//! RULES:
//!   - Nothing here mutates simulation state; the engine calls `analyze`
//!     once per turn purely to annotate the turn report.
//!   - Ratios are computed against the configured maxima and the recorded
//!     initial counts, never against hard-coded totals.

use serde::Serialize;

use crate::{
    engine::GameState,
    galaxy::GalaxyModel,
    ship::{ShipModel, ShipSystem},
    types::QuadrantCoord,
};

/// Energy cost per unit of travel distance, used by the route planner.
const ROUTE_ENERGY_RATE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGrade {
    Excellent,
    Good,
    Low,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrade {
    Ample,
    Adequate,
    Limited,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPace {
    AheadOfSchedule,
    OnSchedule,
    BehindSchedule,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceAnalysis {
    pub energy_status: ResourceGrade,
    pub energy_percent: f64,
    pub shield_status: ResourceGrade,
    pub shield_percent: f64,
    pub torpedo_status: ResourceGrade,
    pub torpedo_count: u32,
    pub overall_status: ConditionGrade,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionProgress {
    pub time_remaining: f64,
    pub time_percent: f64,
    pub time_status: TimeGrade,
    pub hostiles_destroyed: u32,
    pub hostiles_remaining: u32,
    pub progress_percent: f64,
    pub progress_status: ConditionGrade,
    pub pace: MissionPace,
}

#[derive(Debug, Clone, Serialize)]
pub struct TacticalReadout {
    pub immediate_threats: u32,
    pub local_support: u32,
    pub nearest_station_distance: Option<f64>,
    pub combat_readiness: f64,
    /// In [-1, 1]; negative means the current quadrant favours the enemy.
    pub tactical_advantage: f64,
}

/// One turn's full strategic picture.
#[derive(Debug, Clone, Serialize)]
pub struct StrategicAssessment {
    pub stardate: f64,
    /// 0.0 = safe, 1.0 = extreme danger.
    pub threat_level: f64,
    pub resources: ResourceAnalysis,
    pub progress: MissionProgress,
    pub tactical: TacticalReadout,
    pub recommendations: Vec<String>,
    pub urgent_warning: Option<String>,
    pub efficiency_rating: f64,
}

/// A greedy nearest-neighbour patrol route with its energy estimate.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub legs: Vec<QuadrantCoord>,
    pub total_distance: f64,
    pub energy_estimate: i64,
}

pub struct StrategicAdvisor;

impl StrategicAdvisor {
    pub fn analyze(
        state: &GameState,
        ship: &ShipModel,
        galaxy: &GalaxyModel,
    ) -> StrategicAssessment {
        let threat_level = Self::threat_level(state, ship, galaxy);
        let resources = Self::analyze_resources(ship);
        let progress = Self::analyze_progress(state);
        let tactical = Self::analyze_tactical(ship, galaxy);
        let recommendations =
            Self::recommendations(&resources, &progress, &tactical, ship, threat_level);
        let urgent_warning = Self::urgent_warning(state, ship, threat_level);
        let efficiency_rating = Self::efficiency_rating(state);

        log::debug!(
            "strategic analysis: threat {threat_level:.2}, efficiency {efficiency_rating:.2}"
        );

        StrategicAssessment {
            stardate: state.stardate,
            threat_level,
            resources,
            progress,
            tactical,
            recommendations,
            urgent_warning,
            efficiency_rating,
        }
    }

    /// Weighted blend: remaining hostiles 0.4, time pressure 0.3, inverse
    /// ship condition 0.2, local hostile density 0.1.
    pub fn threat_level(state: &GameState, ship: &ShipModel, galaxy: &GalaxyModel) -> f64 {
        let initial = state.initial_hostiles.max(1) as f64;
        let hostile_threat = (state.hostiles_remaining as f64 / initial).min(1.0);

        let duration = (state.mission_deadline - state.mission_start).max(f64::MIN_POSITIVE);
        let time_threat = (1.0 - state.time_remaining() / duration).max(0.0);

        let condition_threat = 1.0 - Self::ship_condition(ship);

        let (local_hostiles, _, _) = galaxy.summary(ship.quadrant);
        let local_threat = (local_hostiles as f64 / 3.0).min(1.0);

        (hostile_threat * 0.4 + time_threat * 0.3 + condition_threat * 0.2 + local_threat * 0.1)
            .clamp(0.0, 1.0)
    }

    /// Overall hull state in [0, 1]: energy 0.4, shields 0.3, systems 0.3.
    pub fn ship_condition(ship: &ShipModel) -> f64 {
        if ship.is_destroyed() {
            return 0.0;
        }
        let energy = ship.energy as f64 / ship.max_energy.max(1) as f64;
        let shields = ship.shields as f64 / ship.max_shields.max(1) as f64;
        let systems = 1.0 - ship.damage.mean();
        (energy * 0.4 + shields * 0.3 + systems * 0.3).clamp(0.0, 1.0)
    }

    fn analyze_resources(ship: &ShipModel) -> ResourceAnalysis {
        let energy_percent = percent(ship.energy, ship.max_energy);
        let shield_percent = percent(ship.shields, ship.max_shields);
        let torpedo_percent = percent(ship.torpedoes as i64, ship.max_torpedoes as i64);

        let avg = (energy_percent + shield_percent + torpedo_percent) / 300.0;
        let overall_status = if avg >= 0.75 {
            ConditionGrade::Excellent
        } else if avg >= 0.5 {
            ConditionGrade::Good
        } else if avg >= 0.25 {
            ConditionGrade::Fair
        } else {
            ConditionGrade::Poor
        };

        ResourceAnalysis {
            energy_status: resource_grade(energy_percent),
            energy_percent,
            shield_status: resource_grade(shield_percent),
            shield_percent,
            torpedo_status: resource_grade(torpedo_percent),
            torpedo_count: ship.torpedoes,
            overall_status,
        }
    }

    fn analyze_progress(state: &GameState) -> MissionProgress {
        let duration = (state.mission_deadline - state.mission_start).max(f64::MIN_POSITIVE);
        let time_remaining = state.time_remaining();
        let time_percent = (time_remaining / duration) * 100.0;

        let initial = state.initial_hostiles.max(1) as f64;
        let destroyed = state.initial_hostiles.saturating_sub(state.hostiles_remaining);
        let kill_progress = destroyed as f64 / initial;

        let progress_status = if kill_progress >= 0.8 {
            ConditionGrade::Excellent
        } else if kill_progress >= 0.6 {
            ConditionGrade::Good
        } else if kill_progress >= 0.4 {
            ConditionGrade::Fair
        } else {
            ConditionGrade::Poor
        };

        let time_status = if time_percent >= 75.0 {
            TimeGrade::Ample
        } else if time_percent >= 50.0 {
            TimeGrade::Adequate
        } else if time_percent >= 25.0 {
            TimeGrade::Limited
        } else {
            TimeGrade::Critical
        };

        // Pace compares kill progress with time progress, with a 0.2 band.
        let time_progress = (state.stardate - state.mission_start) / duration;
        let pace = if kill_progress > time_progress + 0.2 {
            MissionPace::AheadOfSchedule
        } else if kill_progress < time_progress - 0.2 {
            MissionPace::BehindSchedule
        } else {
            MissionPace::OnSchedule
        };

        MissionProgress {
            time_remaining,
            time_percent,
            time_status,
            hostiles_destroyed: destroyed,
            hostiles_remaining: state.hostiles_remaining,
            progress_percent: kill_progress * 100.0,
            progress_status,
            pace,
        }
    }

    fn analyze_tactical(ship: &ShipModel, galaxy: &GalaxyModel) -> TacticalReadout {
        let (local_hostiles, local_stations, _) = galaxy.summary(ship.quadrant);
        let nearest_station_distance = galaxy
            .nearest_station(ship.quadrant)
            .map(|coord| ship.quadrant.distance_to(coord));

        TacticalReadout {
            immediate_threats: local_hostiles,
            local_support: local_stations,
            nearest_station_distance,
            combat_readiness: Self::combat_readiness(ship),
            tactical_advantage: Self::tactical_advantage(ship, local_hostiles, local_stations),
        }
    }

    /// Weapons 0.4, energy 0.4, shields 0.2.
    pub fn combat_readiness(ship: &ShipModel) -> f64 {
        if ship.is_destroyed() {
            return 0.0;
        }
        let beams = if ship.can_fire_beams() {
            ship.efficiency(ShipSystem::BeamArray)
        } else {
            0.0
        };
        let torpedoes = if ship.can_fire_torpedoes() {
            ship.efficiency(ShipSystem::LauncherTubes)
        } else {
            0.0
        };
        let weapons = beams.max(torpedoes);
        // 1000 energy is enough for a sustained engagement.
        let energy = (ship.energy as f64 / 1000.0).min(1.0);
        let shields = ship.shields as f64 / ship.max_shields.max(1) as f64;
        (weapons * 0.4 + energy * 0.4 + shields * 0.2).clamp(0.0, 1.0)
    }

    /// Station +0.3, each extra local hostile -0.2, condition swings ±0.4.
    pub fn tactical_advantage(ship: &ShipModel, local_hostiles: u32, local_stations: u32) -> f64 {
        let mut advantage = 0.0;
        if local_stations > 0 {
            advantage += 0.3;
        }
        if local_hostiles > 1 {
            advantage -= 0.2 * (local_hostiles - 1) as f64;
        }
        advantage += (Self::ship_condition(ship) - 0.5) * 0.4;
        advantage.clamp(-1.0, 1.0)
    }

    fn recommendations(
        resources: &ResourceAnalysis,
        progress: &MissionProgress,
        tactical: &TacticalReadout,
        ship: &ShipModel,
        _threat_level: f64,
    ) -> Vec<String> {
        let mut out = Vec::new();

        match resources.energy_status {
            ResourceGrade::Critical => {
                out.push("PRIORITY: Seek a station for energy replenishment".to_string());
            }
            ResourceGrade::Low => {
                out.push("Consider energy conservation measures".to_string());
            }
            _ => {}
        }
        if resources.torpedo_count <= 2 {
            out.push("Torpedo stores low - prioritize station resupply".to_string());
        }

        if tactical.immediate_threats > 0 {
            if tactical.combat_readiness < 0.5 {
                out.push("CAUTION: Combat situation unfavourable - consider retreat".to_string());
            } else {
                out.push("Engage hostiles with optimal weapon selection".to_string());
            }
        }

        match progress.pace {
            MissionPace::BehindSchedule => {
                out.push("Mission pace slow - increase aggressive tactics".to_string());
            }
            MissionPace::AheadOfSchedule => {
                out.push("Good progress - maintain current strategy".to_string());
            }
            MissionPace::OnSchedule => {}
        }
        if progress.time_percent < 25.0 {
            out.push("URGENT: Time critical - focus on primary objectives".to_string());
        }

        if let Some(distance) = tactical.nearest_station_distance {
            let worth_docking =
                ship.has_damage() || resources.overall_status == ConditionGrade::Poor;
            if distance <= 2.0 && worth_docking {
                out.push("Consider docking at the nearby station".to_string());
            }
        }

        out
    }

    /// Hard-threshold warnings, checked in priority order. At most one fires.
    pub fn urgent_warning(state: &GameState, ship: &ShipModel, threat_level: f64) -> Option<String> {
        if ship.energy < 200 {
            return Some("CRITICAL: Energy reserves dangerously low!".to_string());
        }
        if ship.is_destroyed() {
            return Some("CRITICAL: Ship systems failing!".to_string());
        }
        let time_remaining = state.time_remaining();
        if time_remaining < 3.0 {
            return Some(format!(
                "CRITICAL: Mission time expires in {time_remaining:.1} stardates!"
            ));
        }
        if threat_level > 0.8 {
            return Some("WARNING: Extreme danger detected!".to_string());
        }
        None
    }

    /// Time 0.3, resource usage 0.3, combat effectiveness 0.4.
    pub fn efficiency_rating(state: &GameState) -> f64 {
        let duration = (state.mission_deadline - state.mission_start).max(f64::MIN_POSITIVE);
        let elapsed = state.stardate - state.mission_start;
        let time_efficiency = (1.0 - elapsed / duration).max(0.0);

        let per_quadrant =
            state.total_energy_used as f64 / state.quadrants_visited.max(1) as f64;
        let resource_efficiency = (1.0 - per_quadrant / 1000.0).max(0.0);

        let destroyed = state.initial_hostiles.saturating_sub(state.hostiles_remaining);
        let combat_efficiency = if state.combat_encounters > 0 {
            (destroyed as f64 / state.combat_encounters as f64).min(1.0)
        } else {
            0.5
        };

        (time_efficiency * 0.3 + resource_efficiency * 0.3 + combat_efficiency * 0.4)
            .clamp(0.0, 1.0)
    }

    /// Nearest-neighbour tour over the targets. Not optimal, just cheap and
    /// good enough for patrol planning.
    pub fn plan_route(
        from: QuadrantCoord,
        targets: &[QuadrantCoord],
        galaxy: &GalaxyModel,
    ) -> RoutePlan {
        let mut legs = Vec::with_capacity(targets.len());
        let mut remaining: Vec<QuadrantCoord> = targets.to_vec();
        let mut current = from;
        let mut total_distance = 0.0;
        let mut energy_estimate = 0i64;

        while !remaining.is_empty() {
            let (idx, distance) = remaining
                .iter()
                .enumerate()
                .map(|(i, target)| (i, galaxy.distance(current, *target)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            let next = remaining.remove(idx);
            total_distance += distance;
            energy_estimate += (distance * ROUTE_ENERGY_RATE) as i64;
            legs.push(next);
            current = next;
        }

        RoutePlan {
            legs,
            total_distance,
            energy_estimate,
        }
    }
}

fn percent(current: i64, maximum: i64) -> f64 {
    if maximum <= 0 {
        return 0.0;
    }
    (current as f64 / maximum as f64) * 100.0
}

fn resource_grade(percent: f64) -> ResourceGrade {
    if percent >= 75.0 {
        ResourceGrade::Excellent
    } else if percent >= 50.0 {
        ResourceGrade::Good
    } else if percent >= 25.0 {
        ResourceGrade::Low
    } else {
        ResourceGrade::Critical
    }
}
