//! Prepared, immutable view of a player pool shared by all generators.

use crate::error::Result;
use crate::model::{
    Algorithm, ExposureSettings, ExposureTracker, Lineup, Player, Position, Roster, RosterRules,
    ScoreCard, Slot, TeamStack, FLEX_SLOTS,
};
use crate::scoring::{nexus_score, NexusScore};
use crate::validation::{PlayerPool, ValidationReport};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a generator needs before it can run.
#[derive(Debug, Clone, Default)]
pub struct GeneratorInput {
    pub players: Vec<Player>,
    pub rules: RosterRules,
    pub exposure: ExposureSettings,
    /// Lineups already produced for this slate; seeds exposure counts.
    pub existing_lineups: Vec<Lineup>,
    pub team_stacks: Vec<TeamStack>,
}

impl GeneratorInput {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            players,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: RosterRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_exposure(mut self, exposure: ExposureSettings) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_existing_lineups(mut self, lineups: Vec<Lineup>) -> Self {
        self.existing_lineups = lineups;
        self
    }

    pub fn with_team_stacks(mut self, stacks: Vec<TeamStack>) -> Self {
        self.team_stacks = stacks;
        self
    }
}

/// A roster under construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialRoster {
    pub captain: Option<usize>,
    pub flex: [Option<usize>; FLEX_SLOTS],
    pub team: Option<usize>,
}

impl PartialRoster {
    pub fn get(&self, slot: Slot) -> Option<usize> {
        match slot {
            Slot::Captain => self.captain,
            Slot::Flex(i) => self.flex[i],
            Slot::Team => self.team,
        }
    }

    pub fn set(&mut self, slot: Slot, idx: usize) {
        match slot {
            Slot::Captain => self.captain = Some(idx),
            Slot::Flex(i) => self.flex[i] = Some(idx),
            Slot::Team => self.team = Some(idx),
        }
    }

    pub fn used(&self) -> Vec<usize> {
        self.captain
            .into_iter()
            .chain(self.flex.iter().flatten().copied())
            .chain(self.team)
            .collect()
    }

    fn complete(self, team_slot: bool) -> Option<Roster> {
        let mut flex = [0usize; FLEX_SLOTS];
        for (dst, src) in flex.iter_mut().zip(self.flex) {
            *dst = src?;
        }
        let team = if team_slot { Some(self.team?) } else { None };
        Some(Roster {
            captain: self.captain?,
            flex,
            team,
        })
    }
}

/// Validated, indexed player pool plus the run's exposure state.
///
/// Built once per run and shared read-only (behind `Arc`) by every
/// generator and every parallel unit of work.
#[derive(Debug)]
pub struct LineupContext {
    players: Vec<Player>,
    rules: RosterRules,
    team_slot: bool,
    /// Per flex slot, sorted by salary ascending.
    by_position: [Vec<usize>; FLEX_SLOTS],
    /// Captain-eligible players, sorted by salary ascending.
    captains: Vec<usize>,
    /// TEAM players, sorted by salary ascending.
    teams: Vec<usize>,
    id_index: HashMap<String, usize>,
    exposure: ExposureSettings,
    tracker: ExposureTracker,
    team_stacks: Vec<TeamStack>,
    report: ValidationReport,
}

impl LineupContext {
    /// Validates the players and builds the indexes.
    pub fn prepare(input: GeneratorInput) -> Result<Arc<Self>> {
        let pool = PlayerPool::from_players(input.players, input.rules)?;
        Ok(Arc::new(Self::from_pool(
            pool,
            input.exposure,
            &input.existing_lineups,
            input.team_stacks,
        )))
    }

    pub fn from_pool(
        pool: PlayerPool,
        exposure: ExposureSettings,
        existing_lineups: &[Lineup],
        team_stacks: Vec<TeamStack>,
    ) -> Self {
        let team_slot = pool.team_slot();
        let (players, rules, report) = pool.into_parts();

        let mut by_position: [Vec<usize>; FLEX_SLOTS] = Default::default();
        let mut captains = Vec::new();
        let mut teams = Vec::new();
        for (i, p) in players.iter().enumerate() {
            match p.position.slot_index() {
                Some(s) => {
                    by_position[s].push(i);
                    captains.push(i);
                }
                None => teams.push(i),
            }
        }
        let by_salary = |a: &usize, b: &usize| {
            players[*a]
                .salary
                .cmp(&players[*b].salary)
                .then_with(|| players[*a].id.cmp(&players[*b].id))
        };
        for list in by_position.iter_mut() {
            list.sort_by(by_salary);
        }
        captains.sort_by(by_salary);
        teams.sort_by(by_salary);

        let id_index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        Self {
            players,
            rules,
            team_slot,
            by_position,
            captains,
            teams,
            id_index,
            exposure,
            tracker: ExposureTracker::from_lineups(existing_lineups),
            team_stacks,
            report,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, idx: usize) -> &Player {
        &self.players[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    pub fn team_slot(&self) -> bool {
        self.team_slot
    }

    pub fn exposure(&self) -> &ExposureSettings {
        &self.exposure
    }

    /// Exposure counts seeded from previously generated lineups.
    pub fn tracker(&self) -> &ExposureTracker {
        &self.tracker
    }

    pub fn team_stacks(&self) -> &[TeamStack] {
        &self.team_stacks
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Captain, flex slots in position order, then TEAM when present.
    pub fn slot_order(&self) -> Vec<Slot> {
        let mut order = Vec::with_capacity(FLEX_SLOTS + 2);
        order.push(Slot::Captain);
        order.extend((0..FLEX_SLOTS).map(Slot::Flex));
        if self.team_slot {
            order.push(Slot::Team);
        }
        order
    }

    /// Eligible players for a slot, cheapest first.
    pub fn candidates(&self, slot: Slot) -> &[usize] {
        match slot {
            Slot::Captain => &self.captains,
            Slot::Flex(i) => &self.by_position[i],
            Slot::Team => &self.teams,
        }
    }

    /// Salary a player costs in a given slot.
    pub fn slot_salary(&self, slot: Slot, idx: usize) -> u32 {
        let salary = self.players[idx].salary;
        match slot {
            Slot::Captain => self.rules.captain_salary(salary),
            _ => salary,
        }
    }

    /// Projection a player contributes in a given slot.
    pub fn slot_projection(&self, slot: Slot, idx: usize) -> f64 {
        let points = self.players[idx].projected_points;
        match slot {
            Slot::Captain => points * self.rules.captain_multiplier,
            _ => points,
        }
    }

    pub fn salary(&self, roster: &Roster) -> u32 {
        roster
            .slots()
            .into_iter()
            .filter_map(|slot| roster.get(slot).map(|idx| self.slot_salary(slot, idx)))
            .fold(0u32, u32::saturating_add)
    }

    /// Unspent salary, zero when over the cap.
    pub fn headroom(&self, roster: &Roster) -> u32 {
        self.rules.salary_cap.saturating_sub(self.salary(roster))
    }

    /// Cheapest eligible player for `slot` not in `used`.
    pub fn cheapest_unused(&self, slot: Slot, used: &[usize]) -> Option<usize> {
        self.candidates(slot)
            .iter()
            .copied()
            .find(|c| !used.contains(c))
    }

    /// Describes the first violated roster invariant.
    pub fn check(&self, roster: &Roster) -> std::result::Result<(), String> {
        let n = self.players.len();
        if roster.players().any(|idx| idx >= n) {
            return Err("player index out of range".into());
        }
        let captain = &self.players[roster.captain];
        if !captain.position.is_required() {
            return Err(format!("captain {} is not captain-eligible", captain.id));
        }
        for (i, &idx) in roster.flex.iter().enumerate() {
            let expected = Position::REQUIRED[i];
            if self.players[idx].position != expected {
                return Err(format!(
                    "flex slot {expected} holds {} ({})",
                    self.players[idx].id, self.players[idx].position
                ));
            }
        }
        match (self.team_slot, roster.team) {
            (true, None) => return Err("TEAM slot is empty".into()),
            (false, Some(_)) => return Err("roster has a TEAM player but no TEAM slot".into()),
            (true, Some(idx)) if self.players[idx].position != Position::Team => {
                return Err(format!("TEAM slot holds {}", self.players[idx].id));
            }
            _ => {}
        }
        let mut ids: Vec<usize> = roster.players().collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err("player used in more than one slot".into());
        }
        let salary = self.salary(roster);
        if salary > self.rules.salary_cap {
            return Err(format!(
                "salary {salary} exceeds cap {}",
                self.rules.salary_cap
            ));
        }
        Ok(())
    }

    pub fn is_valid(&self, roster: &Roster) -> bool {
        self.check(roster).is_ok()
    }

    /// Every rostered player except the captain.
    pub fn others(&self, roster: &Roster) -> Vec<&Player> {
        roster
            .flex
            .iter()
            .chain(roster.team.iter())
            .map(|&idx| &self.players[idx])
            .collect()
    }

    pub fn score(&self, roster: &Roster) -> NexusScore {
        nexus_score(&self.players[roster.captain], &self.others(roster), &self.rules)
    }

    /// Exposure penalty for adding `roster` to the batch tracked by `tracker`.
    pub fn exposure_penalty(&self, roster: &Roster, tracker: &ExposureTracker) -> f64 {
        tracker.penalty(
            &self.exposure,
            &self.players[roster.captain],
            &self.others(roster),
        )
    }

    /// Freezes a roster into a lineup. `scores.nexus` is always filled.
    pub fn to_lineup(&self, roster: &Roster, source: Algorithm, scores: ScoreCard) -> Lineup {
        let score = self.score(roster);
        Lineup {
            captain: self.players[roster.captain].clone(),
            flex: roster.flex.iter().map(|&i| self.players[i].clone()).collect(),
            team: roster.team.map(|i| self.players[i].clone()),
            total_salary: score.total_salary,
            score,
            scores: ScoreCard {
                nexus: score.total,
                ..scores
            },
            source: Some(source),
        }
    }

    /// Maps a lineup back onto this pool, if all its players are present.
    pub fn roster_of(&self, lineup: &Lineup) -> Option<Roster> {
        let mut flex = [0usize; FLEX_SLOTS];
        for (dst, p) in flex.iter_mut().zip(lineup.flex.iter()) {
            *dst = self.index_of(&p.id)?;
        }
        let team = match (&lineup.team, self.team_slot) {
            (Some(p), true) => Some(self.index_of(&p.id)?),
            (None, false) => None,
            _ => return None,
        };
        let roster = Roster {
            captain: self.index_of(&lineup.captain.id)?,
            flex,
            team,
        };
        self.is_valid(&roster).then_some(roster)
    }

    /// Cheapest way to fill `slots`, avoiding `used`.
    fn completion_cost(&self, slots: &[Slot], used: &[usize]) -> Option<u32> {
        let mut used = used.to_vec();
        let mut total = 0u32;
        for &slot in slots {
            let idx = self.cheapest_unused(slot, &used)?;
            total += self.slot_salary(slot, idx);
            used.push(idx);
        }
        Some(total)
    }

    /// Fills the open slots of `partial`, in `order`, within the cap.
    ///
    /// For each slot, `pick` chooses among candidates that still leave
    /// enough budget to complete the remaining slots at their cheapest.
    /// Returns `None` when a slot has no such candidate or `pick` declines.
    pub fn construct<F>(&self, mut partial: PartialRoster, order: &[Slot], mut pick: F) -> Option<Roster>
    where
        F: FnMut(Slot, &[usize]) -> Option<usize>,
    {
        let cap = self.rules.salary_cap;
        let open: Vec<Slot> = order
            .iter()
            .copied()
            .filter(|s| partial.get(*s).is_none())
            .collect();

        for (k, &slot) in open.iter().enumerate() {
            let used = partial.used();
            let spent: u32 = self
                .slot_order()
                .into_iter()
                .filter_map(|s| partial.get(s).map(|idx| self.slot_salary(s, idx)))
                .sum();
            let rest = &open[k + 1..];

            let mut feasible = Vec::new();
            for &c in self.candidates(slot) {
                if used.contains(&c) {
                    continue;
                }
                let cost = spent + self.slot_salary(slot, c);
                if cost > cap {
                    // sorted by salary: nothing further fits
                    break;
                }
                let mut with_candidate = used.clone();
                with_candidate.push(c);
                if let Some(rem) = self.completion_cost(rest, &with_candidate) {
                    if cost + rem <= cap {
                        feasible.push(c);
                    }
                }
            }
            if feasible.is_empty() {
                return None;
            }
            let choice = pick(slot, &feasible)?;
            partial.set(slot, choice);
        }

        partial
            .complete(self.team_slot)
            .filter(|r| self.is_valid(r))
    }

    /// Value-greedy feasible roster, then upgraded slot by slot while
    /// salary allows.
    pub fn greedy_roster(&self) -> Option<Roster> {
        let order = self.slot_order();
        let mut roster = self.construct(PartialRoster::default(), &order, |slot, feasible| {
            feasible.iter().copied().fold(None, |best: Option<usize>, c| {
                let key = |i: usize| match slot {
                    Slot::Captain | Slot::Team => self.slot_projection(slot, i),
                    Slot::Flex(_) => self.players[i].value(),
                };
                match best {
                    Some(b) if key(b) >= key(c) => Some(b),
                    _ => Some(c),
                }
            })
        })?;

        for _ in 0..3 {
            let mut improved = false;
            for slot in roster.slots() {
                let Some(current) = roster.get(slot) else {
                    continue;
                };
                let current_points = self.slot_projection(slot, current);
                let mut best: Option<(usize, f64)> = None;
                for &c in self.candidates(slot) {
                    if roster.contains(c) {
                        continue;
                    }
                    let points = self.slot_projection(slot, c);
                    if points <= current_points || best.is_some_and(|(_, b)| b >= points) {
                        continue;
                    }
                    let mut trial = roster;
                    trial.set(slot, c);
                    if self.salary(&trial) <= self.rules.salary_cap {
                        best = Some((c, points));
                    }
                }
                if let Some((c, _)) = best {
                    roster.set(slot, c);
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        Some(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::random::create_rng;
    use rand::Rng;

    #[test]
    fn test_indexes() {
        let ctx = fixtures::sample_context();
        assert_eq!(ctx.players().len(), 24);
        assert!(ctx.team_slot());
        for i in 0..FLEX_SLOTS {
            let list = ctx.candidates(Slot::Flex(i));
            assert_eq!(list.len(), 4);
            for w in list.windows(2) {
                assert!(ctx.player(w[0]).salary <= ctx.player(w[1]).salary);
            }
        }
        assert_eq!(ctx.candidates(Slot::Captain).len(), 20);
        assert_eq!(ctx.candidates(Slot::Team).len(), 4);
        assert_eq!(ctx.slot_order().len(), 7);
    }

    #[test]
    fn test_greedy_roster_valid() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().expect("feasible");
        assert!(ctx.is_valid(&roster), "{:?}", ctx.check(&roster));
    }

    #[test]
    fn test_construct_random_always_valid() {
        let ctx = fixtures::sample_context();
        let mut rng = create_rng(9);
        let order = ctx.slot_order();
        for _ in 0..200 {
            let roster = ctx
                .construct(PartialRoster::default(), &order, |_, feasible| {
                    Some(feasible[rng.random_range(0..feasible.len())])
                })
                .expect("sample pool always completes");
            assert!(ctx.is_valid(&roster));
        }
    }

    #[test]
    fn test_construct_respects_prefill() {
        let ctx = fixtures::sample_context();
        let mid = ctx.index_of("T1-MID").unwrap();
        let mut partial = PartialRoster::default();
        partial.set(Slot::Flex(2), mid);
        let roster = ctx
            .construct(partial, &ctx.slot_order(), |_, f| f.first().copied())
            .unwrap();
        assert_eq!(roster.flex[2], mid);
    }

    #[test]
    fn test_check_detects_violations() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();

        let mut dup = roster;
        dup.captain = roster.flex[0];
        assert!(ctx.check(&dup).unwrap_err().contains("more than one slot"));

        let mut wrong = roster;
        wrong.flex[0] = roster.flex[1];
        assert!(ctx.check(&wrong).is_err());

        let mut no_team = roster;
        no_team.team = None;
        assert!(ctx.check(&no_team).unwrap_err().contains("TEAM"));
    }

    #[test]
    fn test_salary_cap_violation() {
        let ctx = fixtures::sample_context();
        // Most expensive player per slot blows through the cap.
        let most_expensive = |slot: Slot| *ctx.candidates(slot).last().unwrap();
        let mut flex = [0; FLEX_SLOTS];
        for (i, f) in flex.iter_mut().enumerate() {
            *f = most_expensive(Slot::Flex(i));
        }
        let captain = ctx
            .candidates(Slot::Captain)
            .iter()
            .rev()
            .copied()
            .find(|c| !flex.contains(c))
            .unwrap();
        let roster = Roster {
            captain,
            flex,
            team: Some(most_expensive(Slot::Team)),
        };
        assert!(ctx.check(&roster).unwrap_err().contains("exceeds cap"));
    }

    #[test]
    fn test_lineup_roundtrip_through_ids() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let lineup = ctx.to_lineup(&roster, Algorithm::Annealing, ScoreCard::default());
        assert_eq!(lineup.source, Some(Algorithm::Annealing));
        assert_eq!(lineup.total_salary, ctx.salary(&roster));
        assert!((lineup.scores.nexus - lineup.score.total).abs() < 1e-12);
        assert_eq!(ctx.roster_of(&lineup), Some(roster));
    }
}
