//! Shared primitive types used across the entire simulation.
//!
//! Two coordinate spaces exist and are never mixed: `QuadrantCoord` addresses
//! one cell of the 8x8 galaxy grid, `SectorPos` one cell of a quadrant's
//! local 8x8 interior. Both are `Ord` so that every map keyed by them is a
//! `BTreeMap` with a documented, turn-stable iteration order (x, then y).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quadrants per galaxy axis.
pub const GALAXY_SIZE: i32 = 8;
/// Sectors per quadrant axis.
pub const QUADRANT_SIZE: i32 = 8;

/// Address of one quadrant in the galaxy grid. Valid range [1,8] per axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct QuadrantCoord {
    pub x: i32,
    pub y: i32,
}

impl QuadrantCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(self) -> bool {
        (1..=GALAXY_SIZE).contains(&self.x) && (1..=GALAXY_SIZE).contains(&self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        euclid(other.x - self.x, other.y - self.y)
    }

    /// Bearing from self to other in degrees, normalized into [0,360).
    pub fn bearing_to(self, other: Self) -> f64 {
        bearing(other.x - self.x, other.y - self.y)
    }
}

impl fmt::Display for QuadrantCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Address of one sector inside a quadrant. Valid range [1,8] per axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SectorPos {
    pub x: i32,
    pub y: i32,
}

impl SectorPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(self) -> bool {
        (1..=QUADRANT_SIZE).contains(&self.x) && (1..=QUADRANT_SIZE).contains(&self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        euclid(other.x - self.x, other.y - self.y)
    }

    pub fn bearing_to(self, other: Self) -> f64 {
        bearing(other.x - self.x, other.y - self.y)
    }

    pub fn manhattan_to(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The up-to-eight valid neighbouring sectors, in (x, y) order.
    pub fn neighbours(self) -> Vec<SectorPos> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let cell = SectorPos::new(self.x + dx, self.y + dy);
                if cell.is_valid() {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

impl fmt::Display for SectorPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// What occupies a sector. Empty sectors are absent from the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Hostile,
    Station,
    Obstacle,
}

impl ObjectKind {
    /// Single-character glyph used by the short-range scan grid.
    pub fn glyph(self) -> char {
        match self {
            Self::Hostile => 'H',
            Self::Station => 'S',
            Self::Obstacle => '*',
        }
    }
}

fn euclid(dx: i32, dy: i32) -> f64 {
    ((dx * dx + dy * dy) as f64).sqrt()
}

fn bearing(dx: i32, dy: i32) -> f64 {
    if dx == 0 && dy == 0 {
        return 0.0;
    }
    let deg = (dy as f64).atan2(dx as f64).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}
