//! stargrid-core — a turn-based space-combat simulation engine.
//!
//! A player vessel explores an 8x8 grid of quadrants, each with its own 8x8
//! interior, and must destroy every hostile unit before the mission deadline
//! while managing energy, shields and torpedoes. The engine is fully
//! deterministic for a given seed: all randomness flows through
//! per-subsystem PCG streams and nothing else may influence outcomes.
//!
//! Front ends drive the simulation through [`engine::TurnEngine::process_turn`]
//! and render the returned [`engine::TurnReport`]; no simulation logic lives
//! outside this crate.

pub mod advisor;
pub mod combat;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod galaxy;
pub mod rng;
pub mod ship;
pub mod snapshot;
pub mod tactical;
pub mod types;

pub use config::SimConfig;
pub use engine::{MissionOutcome, TurnEngine, TurnReport};
pub use error::{SimError, SimResult};
pub use snapshot::GameSnapshot;
