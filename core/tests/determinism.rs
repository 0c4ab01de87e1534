//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same command script. They must end in
//! byte-identical snapshots. Any divergence is a blocker — do not merge
//! until fixed.

use stargrid_core::{engine::TurnEngine, SimConfig};

fn script() -> Vec<(&'static str, Vec<String>)> {
    let p = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    vec![
        ("srs", p(&[])),
        ("lrs", p(&[])),
        ("shi", p(&["800"])),
        ("com", p(&["status"])),
        ("nav", p(&["5,5"])),
        ("srs", p(&[])),
        ("pha", p(&["300"])),
        ("nav", p(&["2,6"])),
        ("tor", p(&["45", "3"])),
        ("dam", p(&[])),
        ("com", p(&["distance", "8,8"])),
        ("nav", p(&["7,3"])),
        ("pha", p(&["500"])),
    ]
}

fn run_script(seed: u64) -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cfg = SimConfig::default_test();
    cfg.seed = seed;
    let mut engine = TurnEngine::new(cfg);
    for (name, params) in script() {
        let _ = engine.process_turn(name, &params);
        if engine.is_over() {
            break;
        }
    }
    engine.snapshot().to_json().expect("snapshot serializes")
}

#[test]
fn same_seed_same_commands_identical_final_state() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let a = run_script(SEED);
    let b = run_script(SEED);

    assert_eq!(a, b, "snapshots diverged for identical seed and script");
}

#[test]
fn different_seeds_produce_different_galaxies() {
    let a = run_script(42);
    let b = run_script(99);

    assert_ne!(
        a, b,
        "different seeds produced identical snapshots — the seed is not being used"
    );
}

#[test]
fn fresh_engines_with_same_seed_agree_before_any_turn() {
    let cfg = SimConfig::default_test();
    let a = TurnEngine::new(cfg.clone()).snapshot().to_json().unwrap();
    let b = TurnEngine::new(cfg).snapshot().to_json().unwrap();
    assert_eq!(a, b, "generation diverged before the first turn");
}
