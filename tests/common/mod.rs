#![allow(dead_code)]

use nexus_lineup::config::EngineConfig;
use nexus_lineup::model::{PlayerRecord, Position, TeamStack};
use std::sync::Once;

static INIT: Once = Once::new();

/// Routes `tracing` output through the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const TEAMS: [&str; 4] = ["HLE", "DK", "KT", "NS"];
pub const POSITIONS: [&str; 5] = ["TOP", "JNG", "MID", "ADC", "SUP"];

pub fn record(id: &str, team: &str, position: &str, salary: f64, points: f64, ownership: f64) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        name: format!("Player {id}"),
        team: team.to_string(),
        position: position.to_string(),
        salary,
        projected_points: points,
        ownership,
    }
}

/// Four teams, one player per position plus a TEAM entry each.
pub fn slate() -> Vec<PlayerRecord> {
    let mut records = Vec::new();
    for (t, team) in TEAMS.iter().enumerate() {
        for (p, pos) in POSITIONS.iter().enumerate() {
            let salary = 3_800.0 + ((t * 3 + p * 5) % 8) as f64 * 700.0;
            let points = salary / 1000.0 * (2.4 + ((t + p) % 5) as f64 * 0.25);
            let ownership = 5.0 + ((t * 13 + p * 7) % 31) as f64;
            records.push(record(&format!("{team}-{pos}"), team, pos, salary, points, ownership));
        }
        records.push(record(
            &format!("{team}-TEAM"),
            team,
            "TEAM",
            3_000.0 + t as f64 * 350.0,
            6.5 + t as f64,
            10.0 + t as f64 * 2.0,
        ));
    }
    records
}

pub fn stacks() -> Vec<TeamStack> {
    vec![TeamStack {
        team: "HLE".into(),
        positions: vec![Position::Jng, Position::Mid, Position::Adc],
        stack_plus: 1.3,
    }]
}

/// Small search budgets so full runs finish quickly.
pub fn fast_engine(seed: u64) -> EngineConfig {
    let mut engine = EngineConfig::default().with_seed(seed);
    engine.sampler = engine.sampler.with_min_trials(300);
    engine.evolution = engine
        .evolution
        .with_population_size(30)
        .with_generations(10)
        .with_parallel(false);
    engine.annealing = engine
        .annealing
        .with_max_iterations(200)
        .with_runs(2)
        .with_parallel(false);
    engine.hybrid = engine.hybrid.with_parallel(false);
    engine.portfolio = engine.portfolio.with_candidate_multiplier(4);
    engine
}
