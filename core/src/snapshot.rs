//! Save-game contract — the single serialized snapshot.
//!
//! A snapshot carries GameState, the full ship (damage vector and visited
//! set included) and the complete galaxy layout: enough to resume a session
//! exactly. Unit emotional state and active events are transient and start
//! fresh on restore. Coordinates round-trip as structured records, never as
//! delimited strings.

use serde::{Deserialize, Serialize};

use crate::{engine::GameState, error::SimResult, galaxy::GalaxySnapshot, ship::ShipModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub ship: ShipModel,
    pub galaxy: GalaxySnapshot,
}

impl GameSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
