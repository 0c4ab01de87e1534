//! grid-runner: headless driver for the stargrid simulation.
//!
//! Usage:
//!   grid-runner --seed 42 --duration 30
//!   echo -e "srs\nnav 3,4\npha 500" | grid-runner --seed 42 --quiet
//!
//! Reads one command per line from stdin ("nav 3,4", "pha 500", ...), feeds
//! it to the engine and prints one JSON turn report per line, then an
//! end-of-run summary. "pause", "resume" and "quit" are runner controls,
//! not simulation commands.

use std::env;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use stargrid_core::{engine::TurnEngine, SimConfig};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut cfg = SimConfig::default();
    cfg.seed = parse_arg(&args, "--seed", cfg.seed);
    cfg.mission_duration = parse_arg(&args, "--duration", cfg.mission_duration);
    cfg.galaxy.total_hostiles = parse_arg(&args, "--hostiles", cfg.galaxy.total_hostiles);
    cfg.galaxy.total_stations = parse_arg(&args, "--stations", cfg.galaxy.total_stations);
    let quiet = args.iter().any(|a| a == "--quiet");

    if !quiet {
        println!("stargrid — grid-runner");
        println!("  seed:     {}", cfg.seed);
        println!("  hostiles: {}", cfg.galaxy.total_hostiles);
        println!("  stations: {}", cfg.galaxy.total_stations);
        println!("  duration: {} stardates", cfg.mission_duration);
        println!();
    }

    let mut engine = TurnEngine::new(cfg);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        match name {
            "quit" | "exit" => break,
            "pause" => {
                engine.pause();
                continue;
            }
            "resume" => {
                engine.resume();
                continue;
            }
            _ => {}
        }

        let params: Vec<String> = parts.map(str::to_string).collect();
        let report = engine.process_turn(name, &params);
        log::debug!(
            "turn {}: '{name}' -> success={}",
            report.turn,
            report.success
        );
        let game_over = report.outcome.is_over();
        writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
        stdout.flush()?;
        if game_over {
            break;
        }
    }

    if !quiet {
        print_summary(&engine);
    }
    Ok(())
}

fn print_summary(engine: &TurnEngine) {
    let state = engine.state();
    println!();
    println!("=== MISSION SUMMARY ===");
    println!("  outcome:        {:?}", state.outcome);
    println!("  stardate:       {:.1}", state.stardate);
    println!("  turns:          {}", state.turn_count);
    println!("  score:          {}", state.score);
    println!("  hostiles left:  {}", state.hostiles_remaining);
    println!("  energy used:    {}", state.total_energy_used);
    println!("  torpedoes used: {}", state.total_torpedoes_fired);
    println!("  quadrants seen: {}", state.quadrants_visited);
    println!("  ship condition: {}", engine.ship().overall_condition());
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
