//! Player command surface — parsing and range validation.
//!
//! Every front end feeds the engine a command name plus string parameters;
//! parsing rejects malformed or out-of-range input here, before any
//! simulation state is touched.

use crate::types::QuadrantCoord;

/// All recognized player commands.
#[derive(Debug, Clone, PartialEq)]
pub enum GameCommand {
    Navigate { target: QuadrantCoord },
    ShortRangeScan,
    LongRangeScan,
    FireBeams { energy: i64 },
    FireTorpedo { course: f64, spread: i32 },
    SetShields { level: i64 },
    ShieldStatus,
    Dock,
    ComputerFunctions,
    ComputerDistance { target: QuadrantCoord },
    ComputerStatus,
    DamageReport,
}

impl GameCommand {
    /// Parse a command name and its parameters. Command names are
    /// case-insensitive; parameters are validated against their ranges.
    pub fn parse(name: &str, params: &[String]) -> Result<Self, String> {
        match name.to_ascii_lowercase().as_str() {
            "nav" => {
                let Some(dest) = params.first() else {
                    return Err(
                        "Navigation requires a destination quadrant (e.g. 'nav 3,4')".to_string()
                    );
                };
                Ok(Self::Navigate {
                    target: parse_coord(dest)?,
                })
            }
            "srs" => Ok(Self::ShortRangeScan),
            "lrs" => Ok(Self::LongRangeScan),
            "pha" => {
                let Some(raw) = params.first() else {
                    return Err("Beam fire requires an energy amount".to_string());
                };
                let energy: i64 = raw
                    .parse()
                    .map_err(|_| "Invalid energy amount".to_string())?;
                if energy <= 0 {
                    return Err("Invalid energy amount".to_string());
                }
                Ok(Self::FireBeams { energy })
            }
            "tor" => {
                if params.len() < 2 {
                    return Err(
                        "Torpedo fire requires course and spread (e.g. 'tor 45 3')".to_string()
                    );
                }
                let course: f64 = params[0]
                    .parse()
                    .map_err(|_| "Course must be between 0 and 360 degrees".to_string())?;
                if !(0.0..=360.0).contains(&course) {
                    return Err("Course must be between 0 and 360 degrees".to_string());
                }
                let spread: i32 = params[1]
                    .parse()
                    .map_err(|_| "Spread must be between 1 and 10".to_string())?;
                if !(1..=10).contains(&spread) {
                    return Err("Spread must be between 1 and 10".to_string());
                }
                Ok(Self::FireTorpedo { course, spread })
            }
            "shi" => {
                let Some(raw) = params.first() else {
                    return Ok(Self::ShieldStatus);
                };
                let level: i64 = raw
                    .parse()
                    .map_err(|_| "Invalid shield level".to_string())?;
                if level < 0 {
                    return Err("Shield level cannot be negative".to_string());
                }
                Ok(Self::SetShields { level })
            }
            "dock" => Ok(Self::Dock),
            "com" => {
                let Some(function) = params.first() else {
                    return Ok(Self::ComputerFunctions);
                };
                match function.to_ascii_lowercase().as_str() {
                    "distance" => {
                        let Some(dest) = params.get(1) else {
                            return Err("Distance calculation requires a destination".to_string());
                        };
                        Ok(Self::ComputerDistance {
                            target: parse_coord(dest)?,
                        })
                    }
                    "status" => Ok(Self::ComputerStatus),
                    other => Err(format!("Unknown computer function: {other}")),
                }
            }
            "dam" => Ok(Self::DamageReport),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

/// Parse "x,y" into a quadrant coordinate, rejecting out-of-range values.
fn parse_coord(raw: &str) -> Result<QuadrantCoord, String> {
    const INVALID: &str = "Invalid quadrant coordinates";
    let mut parts = raw.split(',');
    let x: i32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| INVALID.to_string())?;
    let y: i32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| INVALID.to_string())?;
    if parts.next().is_some() {
        return Err(INVALID.to_string());
    }
    let coord = QuadrantCoord::new(x, y);
    if !coord.is_valid() {
        return Err(INVALID.to_string());
    }
    Ok(coord)
}
