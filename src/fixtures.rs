//! Shared test fixtures: a four-team slate and a recording progress sink.

use crate::generator::{GeneratorInput, LineupContext, ProgressSink};
use crate::model::{Player, PlayerRecord, Position, TeamStack};
use std::sync::{Arc, Mutex};

pub(crate) const TEAMS: [&str; 4] = ["T1", "GEN", "BLG", "JDG"];

/// 4 teams x (TOP, JNG, MID, ADC, SUP, TEAM) = 24 players.
///
/// Flex salaries spread over 4,000–8,800; the cheapest lineup costs well
/// under the cap and the most expensive one well over it.
pub(crate) fn sample_records() -> Vec<PlayerRecord> {
    let mut records = Vec::new();
    for (t, team) in TEAMS.iter().enumerate() {
        for (p, pos) in Position::REQUIRED.iter().enumerate() {
            let salary = 4000 + ((t * 5 + p * 3) % 7) as u32 * 800;
            let rate = 2.6 + ((t + 2 * p) % 4) as f64 * 0.3;
            records.push(PlayerRecord {
                id: format!("{team}-{pos}"),
                name: format!("{team} {pos}"),
                team: team.to_string(),
                position: pos.to_string(),
                salary: salary as f64,
                projected_points: salary as f64 / 1000.0 * rate,
                ownership: 4.0 + ((t * 7 + p * 11) % 29) as f64,
            });
        }
        records.push(PlayerRecord {
            id: format!("{team}-TEAM"),
            name: format!("{team} Team"),
            team: team.to_string(),
            position: "TEAM".into(),
            salary: (3200 + t * 400) as f64,
            projected_points: 7.0 + t as f64 * 1.5,
            ownership: 8.0 + t as f64 * 3.0,
        });
    }
    records
}

pub(crate) fn sample_players() -> Vec<Player> {
    sample_records()
        .iter()
        .filter_map(PlayerRecord::to_player)
        .collect()
}

pub(crate) fn sample_stacks() -> Vec<TeamStack> {
    vec![
        TeamStack {
            team: "T1".into(),
            positions: vec![Position::Mid, Position::Adc, Position::Sup],
            stack_plus: 1.4,
        },
        TeamStack {
            team: "GEN".into(),
            positions: vec![Position::Top, Position::Jng, Position::Mid],
            stack_plus: 1.1,
        },
    ]
}

pub(crate) fn sample_input() -> GeneratorInput {
    GeneratorInput::new(sample_players()).with_team_stacks(sample_stacks())
}

pub(crate) fn sample_context() -> Arc<LineupContext> {
    LineupContext::prepare(sample_input()).expect("sample pool is valid")
}

/// Captures every progress and status event.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub progress: Mutex<Vec<(f64, String)>>,
    pub status: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, percent: f64, stage: &str) {
        self.progress.lock().unwrap().push((percent, stage.to_string()));
    }

    fn on_status(&self, message: &str) {
        self.status.lock().unwrap().push(message.to_string());
    }
}
