//! Validation checks, run in order.

use super::report::{PoolStats, ValidationReport};
use crate::model::{Player, PlayerRecord, Position, RosterRules};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Projections this many times the median are flagged.
const PROJECTION_OUTLIER_RATIO: f64 = 3.0;
/// Points per $1,000 above this are implausible.
const MAX_PLAUSIBLE_VALUE: f64 = 10.0;
/// Salary at which a zero projection is suspicious.
const EXPENSIVE_SALARY: u32 = 9_000;
/// Share of zero-projection players that triggers a warning.
const ZERO_PROJECTION_SHARE: f64 = 0.25;

/// Validates raw player records against roster rules.
pub fn validate(records: &[PlayerRecord], rules: &RosterRules) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.stats.salary_cap = rules.salary_cap;

    // (a) structural
    if records.is_empty() {
        report.error("player pool must be non-empty");
        return report.finish();
    }
    if let Err(e) = rules.validate() {
        report.error(format!("invalid roster rules: {e}"));
    }
    let players = check_structure(records, &mut report);
    if players.is_empty() {
        report.error("no player record could be parsed");
        return report.finish();
    }

    // (b) positional coverage
    let position_counts = check_positions(&players, &mut report);

    // (c) team balance
    check_teams(&players, rules, &mut report);

    // (d) salary feasibility
    let team_slot = rules.team_slot && position_counts.get(&Position::Team).copied().unwrap_or(0) > 0;
    if rules.team_slot && !team_slot {
        report.warn("no TEAM players in pool; lineups will be built without a TEAM slot");
    }
    let min_lineup_salary = minimum_lineup_salary(&players, rules, team_slot);
    match min_lineup_salary {
        Some(min) if min > u64::from(rules.salary_cap) => report.error(format!(
            "minimum possible lineup salary {} exceeds salary cap {}",
            format_salary(min),
            format_salary(u64::from(rules.salary_cap))
        )),
        Some(_) => {}
        None => report.error("cannot build any lineup: required positions are missing"),
    }

    // (e) statistical sanity
    check_statistics(records, &players, &mut report);

    report.stats = pool_stats(&players, position_counts, min_lineup_salary, rules, team_slot);
    report.finish()
}

/// Validates already typed players (e.g. a pool loaded from storage).
pub fn validate_players(players: &[Player], rules: &RosterRules) -> ValidationReport {
    let records: Vec<PlayerRecord> = players
        .iter()
        .map(|p| PlayerRecord {
            id: p.id.clone(),
            name: p.name.clone(),
            team: p.team.clone(),
            position: p.position.to_string(),
            salary: p.salary as f64,
            projected_points: p.projected_points,
            ownership: p.ownership,
        })
        .collect();
    validate(&records, rules)
}

/// Cheapest player per required position, plus the cheapest captain at
/// the captain multiplier, plus the cheapest TEAM player when the slot
/// exists. `None` if a required position (or the TEAM slot) has no player.
///
/// Summed in `u64`: individual salaries may be anywhere in `u32`.
pub fn minimum_lineup_salary(players: &[Player], rules: &RosterRules, team_slot: bool) -> Option<u64> {
    let cheapest = |pos: Position| {
        players
            .iter()
            .filter(|p| p.position == pos)
            .map(|p| u64::from(p.salary))
            .min()
    };

    let mut total = 0u64;
    for pos in Position::REQUIRED {
        total += cheapest(pos)?;
    }
    let captain = players
        .iter()
        .filter(|p| p.position.is_required())
        .map(|p| (p.salary as f64 * rules.captain_multiplier).round() as u64)
        .min()?;
    total += captain;
    if team_slot {
        total += cheapest(Position::Team)?;
    }
    Some(total)
}

fn check_structure(records: &[PlayerRecord], report: &mut ValidationReport) -> Vec<Player> {
    let mut players = Vec::with_capacity(records.len());
    let mut seen_ids = HashSet::new();

    for (i, r) in records.iter().enumerate() {
        let label = if r.id.trim().is_empty() {
            format!("record {i}")
        } else {
            format!("record {i} ({})", r.id)
        };
        let mut ok = true;

        if r.id.trim().is_empty() {
            report.error(format!("{label}: missing id"));
            ok = false;
        } else if !seen_ids.insert(r.id.clone()) {
            report.error(format!("{label}: duplicate player id"));
            ok = false;
        }
        if r.name.trim().is_empty() {
            report.error(format!("{label}: missing name"));
            ok = false;
        }
        if r.team.trim().is_empty() {
            report.error(format!("{label}: missing team"));
            ok = false;
        }
        if let Err(e) = r.position.parse::<Position>() {
            report.error(format!("{label}: {e}"));
            ok = false;
        }
        if !r.salary.is_finite() || r.salary < 0.0 {
            report.error(format!("{label}: salary must be a non-negative number, got {}", r.salary));
            ok = false;
        } else if r.salary > u32::MAX as f64 {
            report.error(format!(
                "{label}: salary {} is out of range (max {})",
                r.salary,
                u32::MAX
            ));
            ok = false;
        }
        if !r.projected_points.is_finite() || r.projected_points < 0.0 {
            report.error(format!(
                "{label}: projection must be a non-negative number, got {}",
                r.projected_points
            ));
            ok = false;
        }

        if ok {
            if let Some(player) = r.to_player() {
                players.push(player);
            }
        }
    }
    players
}

fn check_positions(players: &[Player], report: &mut ValidationReport) -> BTreeMap<Position, usize> {
    let mut counts: BTreeMap<Position, usize> = BTreeMap::new();
    for p in players {
        *counts.entry(p.position).or_insert(0) += 1;
    }
    for pos in Position::REQUIRED {
        match counts.get(&pos).copied().unwrap_or(0) {
            0 => report.error(format!("no players available for position {pos}")),
            1 => report.warn(format!(
                "only one {pos} player available; every lineup will use the same one"
            )),
            _ => {}
        }
    }
    counts
}

fn check_teams(players: &[Player], rules: &RosterRules, report: &mut ValidationReport) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for p in players {
        *counts.entry(p.team.as_str()).or_insert(0) += 1;
    }
    if counts.len() < 2 {
        report.error(format!(
            "at least two distinct teams are required, found {}",
            counts.len()
        ));
    }
    for (team, &n) in &counts {
        if n > rules.max_players_per_team + 1 {
            report.warn(format!(
                "team {team} has {n} players, more than the expected {}",
                rules.max_players_per_team + 1
            ));
        } else if n == 1 {
            report.warn(format!("team {team} has only one player"));
        }
    }
}

fn check_statistics(records: &[PlayerRecord], players: &[Player], report: &mut ValidationReport) {
    let out_of_range = records
        .iter()
        .filter(|r| !r.ownership.is_finite() || r.ownership < 0.0 || r.ownership > 100.0)
        .count();
    if out_of_range > 0 {
        report.warn(format!(
            "{out_of_range} player(s) have ownership outside 0-100%; values were clamped"
        ));
    }
    if players.iter().all(|p| p.ownership == 0.0) {
        report.warn("all ownership projections are zero; leverage scoring will be flat");
    }

    let mut projections: Vec<f64> = players
        .iter()
        .filter(|p| p.position.is_required() && p.projected_points > 0.0)
        .map(|p| p.projected_points)
        .collect();
    projections.sort_by(|a, b| a.total_cmp(b));
    if let Some(&median) = projections.get(projections.len() / 2) {
        let outliers = players
            .iter()
            .filter(|p| p.projected_points > median * PROJECTION_OUTLIER_RATIO)
            .count();
        if outliers > 0 {
            report.warn(format!(
                "{outliers} player(s) project above {PROJECTION_OUTLIER_RATIO}x the median of {median:.1} points"
            ));
        }
    }

    let mut names: HashMap<String, usize> = HashMap::new();
    for p in players {
        *names.entry(p.name.to_lowercase()).or_insert(0) += 1;
    }
    let mut duplicates: Vec<&String> = names.iter().filter(|(_, &n)| n > 1).map(|(k, _)| k).collect();
    duplicates.sort();
    for name in duplicates {
        report.warn(format!("duplicate player name '{name}'"));
    }

    for p in players {
        if p.salary > 0 && p.value() > MAX_PLAUSIBLE_VALUE {
            report.warn(format!(
                "{} ({}) projects {:.1} points per $1k, check projection or salary",
                p.name,
                p.id,
                p.value()
            ));
        }
        if p.salary >= EXPENSIVE_SALARY && p.projected_points == 0.0 {
            report.warn(format!(
                "{} ({}) costs {} but projects zero points",
                p.name,
                p.id,
                format_salary(u64::from(p.salary))
            ));
        }
    }

    let zero = players.iter().filter(|p| p.projected_points == 0.0).count();
    if zero as f64 / players.len() as f64 > ZERO_PROJECTION_SHARE {
        report.warn(format!(
            "{zero} of {} players have a zero projection",
            players.len()
        ));
    }
}

fn pool_stats(
    players: &[Player],
    position_counts: BTreeMap<Position, usize>,
    min_lineup_salary: Option<u64>,
    rules: &RosterRules,
    team_slot: bool,
) -> PoolStats {
    let n = players.len().max(1) as f64;
    let teams: HashSet<&str> = players.iter().map(|p| p.team.as_str()).collect();
    PoolStats {
        player_count: players.len(),
        team_count: teams.len(),
        position_counts,
        min_salary: players.iter().map(|p| p.salary).min().unwrap_or(0),
        max_salary: players.iter().map(|p| p.salary).max().unwrap_or(0),
        avg_salary: players.iter().map(|p| p.salary as f64).sum::<f64>() / n,
        avg_projection: players.iter().map(|p| p.projected_points).sum::<f64>() / n,
        avg_ownership: players.iter().map(|p| p.ownership).sum::<f64>() / n,
        min_lineup_salary,
        salary_cap: rules.salary_cap,
        team_slot,
    }
}

/// `52000` → `"52,000"`.
pub(crate) fn format_salary(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
