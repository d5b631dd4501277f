//! Neighborhood moves.

use crate::error::{OptimizerError, Result};
use crate::generator::LineupContext;
use crate::model::{ExposureTracker, Roster, Slot, FLEX_SLOTS};
use crate::random::{shuffle, weighted_index};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum share of the outgoing player's projection a position swap keeps.
const SWAP_PROJECTION_FLOOR: f64 = 0.8;

/// The five annealing neighborhood moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Swap a flex player for a same-position player with at least 80% of
    /// their projection.
    PositionSwap,
    /// Make the highest-projected flex player captain.
    CaptainPromotion,
    /// Replace an unstacked player with a teammate of a 2–4 player stack.
    StackBuild,
    /// Spend unused salary on the best points-per-dollar upgrade.
    SalaryUpgrade,
    /// Replace a player outside their exposure band.
    ExposureFix,
}

impl MoveKind {
    pub const ALL: [MoveKind; 5] = [
        MoveKind::PositionSwap,
        MoveKind::CaptainPromotion,
        MoveKind::StackBuild,
        MoveKind::SalaryUpgrade,
        MoveKind::ExposureFix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MoveKind::PositionSwap => "position_swap",
            MoveKind::CaptainPromotion => "captain_promotion",
            MoveKind::StackBuild => "stack_build",
            MoveKind::SalaryUpgrade => "salary_upgrade",
            MoveKind::ExposureFix => "exposure_fix",
        }
    }

    /// Moves that can apply given the run's exposure settings.
    pub fn available(ctx: &LineupContext) -> Vec<MoveKind> {
        Self::ALL
            .into_iter()
            .filter(|k| *k != MoveKind::ExposureFix || !ctx.exposure().is_empty())
            .collect()
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fail(kind: MoveKind, reason: impl Into<String>) -> OptimizerError {
    OptimizerError::NeighborGeneration {
        move_kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn fits(ctx: &LineupContext, roster: &Roster) -> bool {
    ctx.salary(roster) <= ctx.rules().salary_cap
}

fn with_slot(roster: &Roster, slot: Slot, idx: usize) -> Roster {
    let mut next = *roster;
    next.set(slot, idx);
    next
}

/// Builds one neighbor of `roster`.
///
/// Fails with [`OptimizerError::NeighborGeneration`] when the move has no
/// applicable option from this roster.
pub fn propose<R: Rng>(
    kind: MoveKind,
    ctx: &LineupContext,
    roster: &Roster,
    tracker: &ExposureTracker,
    rng: &mut R,
) -> Result<Roster> {
    let neighbor = match kind {
        MoveKind::PositionSwap => position_swap(ctx, roster, rng),
        MoveKind::CaptainPromotion => captain_promotion(ctx, roster),
        MoveKind::StackBuild => stack_build(ctx, roster, rng),
        MoveKind::SalaryUpgrade => salary_upgrade(ctx, roster, rng),
        MoveKind::ExposureFix => exposure_fix(ctx, roster, tracker, rng),
    }?;
    ctx.check(&neighbor).map_err(|reason| fail(kind, reason))?;
    Ok(neighbor)
}

fn position_swap<R: Rng>(ctx: &LineupContext, roster: &Roster, rng: &mut R) -> Result<Roster> {
    let i = rng.random_range(0..FLEX_SLOTS);
    let slot = Slot::Flex(i);
    let floor = SWAP_PROJECTION_FLOOR * ctx.player(roster.flex[i]).projected_points;

    let options: Vec<Roster> = ctx
        .candidates(slot)
        .iter()
        .copied()
        .filter(|&c| !roster.contains(c) && ctx.player(c).projected_points >= floor)
        .map(|c| with_slot(roster, slot, c))
        .filter(|next| fits(ctx, next))
        .collect();
    if options.is_empty() {
        return Err(fail(
            MoveKind::PositionSwap,
            format!("no affordable {} within 80% projection", ctx.player(roster.flex[i]).position),
        ));
    }
    Ok(options[rng.random_range(0..options.len())])
}

fn captain_promotion(ctx: &LineupContext, roster: &Roster) -> Result<Roster> {
    let mut order: Vec<usize> = (0..FLEX_SLOTS).collect();
    order.sort_by(|&a, &b| {
        ctx.slot_projection(Slot::Captain, roster.flex[b])
            .total_cmp(&ctx.slot_projection(Slot::Captain, roster.flex[a]))
    });

    let old_captain = roster.captain;
    for i in order {
        let mut next = *roster;
        next.captain = roster.flex[i];
        if ctx.player(old_captain).position.slot_index() == Some(i) {
            next.flex[i] = old_captain;
        } else {
            // best affordable replacement for the vacated slot
            let slot = Slot::Flex(i);
            let replacement = ctx
                .candidates(slot)
                .iter()
                .copied()
                .filter(|&c| c != next.captain && !next.flex.contains(&c) && next.team != Some(c))
                .map(|c| with_slot(&next, slot, c))
                .filter(|candidate| fits(ctx, candidate))
                .max_by(|a, b| {
                    ctx.player(a.flex[i])
                        .projected_points
                        .total_cmp(&ctx.player(b.flex[i]).projected_points)
                });
            match replacement {
                Some(r) => next = r,
                None => continue,
            }
        }
        if fits(ctx, &next) {
            return Ok(next);
        }
    }
    Err(fail(MoveKind::CaptainPromotion, "no affordable promotion"))
}

fn stack_build<R: Rng>(ctx: &LineupContext, roster: &Roster, rng: &mut R) -> Result<Roster> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for idx in roster.players() {
        *counts.entry(ctx.player(idx).team.as_str()).or_insert(0) += 1;
    }
    let stacks: Vec<&str> = counts
        .iter()
        .filter(|(_, &n)| (2..=4).contains(&n))
        .map(|(&team, _)| team)
        .collect();
    if stacks.is_empty() {
        return Err(fail(MoveKind::StackBuild, "no 2-4 player stack on roster"));
    }

    let weights: Vec<f64> = stacks
        .iter()
        .map(|team| {
            1.0 + ctx
                .team_stacks()
                .iter()
                .filter(|s| s.team == *team)
                .map(|s| s.stack_plus.max(0.0))
                .fold(0.0, f64::max)
        })
        .collect();
    let team = stacks[weighted_index(&weights, rng).unwrap_or(0)];

    let non_captain: Vec<Slot> = roster.slots().into_iter().filter(|s| *s != Slot::Captain).collect();
    let outsiders: Vec<Slot> = non_captain
        .iter()
        .copied()
        .filter(|&s| roster.get(s).is_some_and(|idx| ctx.player(idx).team != team))
        .collect();
    let unstacked: Vec<Slot> = outsiders
        .iter()
        .copied()
        .filter(|&s| roster.get(s).is_some_and(|idx| counts[ctx.player(idx).team.as_str()] == 1))
        .collect();

    for slots in [&unstacked, &outsiders] {
        let options: Vec<Roster> = slots
            .iter()
            .flat_map(|&slot| {
                ctx.candidates(slot)
                    .iter()
                    .copied()
                    .filter(|&c| ctx.player(c).team == team && !roster.contains(c))
                    .map(move |c| with_slot(roster, slot, c))
            })
            .filter(|next| fits(ctx, next))
            .collect();
        if !options.is_empty() {
            return Ok(options[rng.random_range(0..options.len())]);
        }
    }
    Err(fail(MoveKind::StackBuild, format!("no affordable {team} teammate")))
}

fn salary_upgrade<R: Rng>(ctx: &LineupContext, roster: &Roster, rng: &mut R) -> Result<Roster> {
    let headroom = ctx.headroom(roster);
    if headroom == 0 {
        return Err(fail(MoveKind::SalaryUpgrade, "no salary headroom"));
    }

    let mut slots = roster.slots();
    shuffle(&mut slots, rng);
    for slot in slots {
        let Some(current) = roster.get(slot) else {
            continue;
        };
        let budget = ctx.slot_salary(slot, current) + headroom;
        let current_points = ctx.slot_projection(slot, current);
        let best = ctx
            .candidates(slot)
            .iter()
            .copied()
            .filter(|&c| {
                !roster.contains(c)
                    && ctx.slot_salary(slot, c) <= budget
                    && ctx.slot_projection(slot, c) > current_points
            })
            .max_by(|&a, &b| {
                let value = |i: usize| ctx.slot_projection(slot, i) / ctx.slot_salary(slot, i).max(1) as f64;
                value(a).total_cmp(&value(b))
            });
        if let Some(c) = best {
            return Ok(with_slot(roster, slot, c));
        }
    }
    Err(fail(MoveKind::SalaryUpgrade, "no upgrade fits the remaining salary"))
}

fn exposure_fix<R: Rng>(
    ctx: &LineupContext,
    roster: &Roster,
    tracker: &ExposureTracker,
    rng: &mut R,
) -> Result<Roster> {
    let settings = ctx.exposure();
    let offending: Vec<Slot> = roster
        .slots()
        .into_iter()
        .filter(|&s| {
            roster
                .get(s)
                .is_some_and(|idx| tracker.is_outside_band(settings, &ctx.player(idx).id))
        })
        .collect();
    if offending.is_empty() {
        return Err(fail(MoveKind::ExposureFix, "all players within exposure bands"));
    }

    let slot = offending[rng.random_range(0..offending.len())];
    ctx.candidates(slot)
        .iter()
        .copied()
        .filter(|&c| !roster.contains(c) && !tracker.is_outside_band(settings, &ctx.player(c).id))
        .map(|c| with_slot(roster, slot, c))
        .filter(|next| fits(ctx, next))
        .max_by(|a, b| {
            let points = |r: &Roster| r.get(slot).map_or(0.0, |i| ctx.slot_projection(slot, i));
            points(a).total_cmp(&points(b))
        })
        .ok_or_else(|| fail(MoveKind::ExposureFix, "no in-band alternative fits the cap"))
}

/// Replaces one random slot with a random affordable alternative.
pub fn random_replacement<R: Rng>(ctx: &LineupContext, roster: &Roster, rng: &mut R) -> Option<Roster> {
    let slots = roster.slots();
    let slot = slots[rng.random_range(0..slots.len())];
    let options: Vec<Roster> = ctx
        .candidates(slot)
        .iter()
        .copied()
        .filter(|&c| !roster.contains(c))
        .map(|c| with_slot(roster, slot, c))
        .filter(|next| fits(ctx, next))
        .collect();
    if options.is_empty() {
        None
    } else {
        Some(options[rng.random_range(0..options.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::generator::GeneratorInput;
    use crate::model::{ExposureBand, ExposureSettings};
    use crate::random::create_rng;

    #[test]
    fn test_every_move_yields_valid_or_error() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let mut rng = create_rng(1);
        for kind in MoveKind::ALL {
            for _ in 0..20 {
                match propose(kind, &ctx, &roster, ctx.tracker(), &mut rng) {
                    Ok(next) => {
                        assert!(ctx.is_valid(&next), "{kind}: {:?}", ctx.check(&next));
                        assert_ne!(next, roster, "{kind} returned the same roster");
                    }
                    Err(err) => assert!(matches!(err, OptimizerError::NeighborGeneration { .. })),
                }
            }
        }
    }

    #[test]
    fn test_position_swap_keeps_projection_floor() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let mut rng = create_rng(2);
        for _ in 0..30 {
            if let Ok(next) = propose(MoveKind::PositionSwap, &ctx, &roster, ctx.tracker(), &mut rng) {
                let i = (0..FLEX_SLOTS).find(|&i| next.flex[i] != roster.flex[i]).unwrap();
                let before = ctx.player(roster.flex[i]).projected_points;
                assert!(ctx.player(next.flex[i]).projected_points >= 0.8 * before);
                assert_eq!(next.captain, roster.captain);
            }
        }
    }

    #[test]
    fn test_captain_promotion_picks_a_flex_player() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let mut rng = create_rng(3);
        if let Ok(next) = propose(MoveKind::CaptainPromotion, &ctx, &roster, ctx.tracker(), &mut rng) {
            assert!(roster.flex.contains(&next.captain));
            assert_ne!(next.captain, roster.captain);
        }
    }

    #[test]
    fn test_stack_build_grows_a_stack() {
        let ctx = fixtures::sample_context();
        let mut rng = create_rng(4);
        let roster = ctx.greedy_roster().unwrap();
        let max_stack = |r: &Roster| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for idx in r.players() {
                *counts.entry(ctx.player(idx).team.clone()).or_insert(0) += 1;
            }
            counts
        };
        if let Ok(next) = propose(MoveKind::StackBuild, &ctx, &roster, ctx.tracker(), &mut rng) {
            let before = max_stack(&roster);
            let after = max_stack(&next);
            assert!(after.iter().any(|(team, n)| *n > before.get(team).copied().unwrap_or(0)));
        }
    }

    #[test]
    fn test_salary_upgrade_spends_headroom() {
        let ctx = fixtures::sample_context();
        let mut rng = create_rng(5);
        // cheapest possible roster leaves plenty of headroom
        let roster = ctx
            .construct(Default::default(), &ctx.slot_order(), |_, f| f.first().copied())
            .unwrap();
        let next = propose(MoveKind::SalaryUpgrade, &ctx, &roster, ctx.tracker(), &mut rng).unwrap();
        assert!(ctx.salary(&next) > ctx.salary(&roster));
        assert!(ctx.salary(&next) <= 50_000);
    }

    #[test]
    fn test_exposure_fix_removes_excluded_player() {
        let base = fixtures::sample_context();
        let roster = base.greedy_roster().unwrap();
        let excluded = base.player(roster.flex[0]).id.clone();
        let settings = ExposureSettings::default().with_player(excluded.clone(), ExposureBand::new(0.0, 0.0));
        let ctx = LineupContext::prepare(
            GeneratorInput::new(fixtures::sample_players())
                .with_team_stacks(fixtures::sample_stacks())
                .with_exposure(settings),
        )
        .unwrap();
        assert!(MoveKind::available(&ctx).contains(&MoveKind::ExposureFix));

        let mut rng = create_rng(6);
        let next = propose(MoveKind::ExposureFix, &ctx, &roster, ctx.tracker(), &mut rng).unwrap();
        assert!(next.players().all(|idx| ctx.player(idx).id != excluded));
    }

    #[test]
    fn test_exposure_fix_unavailable_without_settings() {
        let ctx = fixtures::sample_context();
        assert_eq!(MoveKind::available(&ctx).len(), 4);
        let roster = ctx.greedy_roster().unwrap();
        let err = propose(MoveKind::ExposureFix, &ctx, &roster, ctx.tracker(), &mut create_rng(7)).unwrap_err();
        assert!(err.to_string().contains("exposure_fix"));
    }

    #[test]
    fn test_random_replacement_changes_one_slot() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let mut rng = create_rng(8);
        for _ in 0..20 {
            if let Some(next) = random_replacement(&ctx, &roster, &mut rng) {
                assert!(ctx.is_valid(&next));
                let changed = roster.slots().into_iter().filter(|&s| next.get(s) != roster.get(s)).count();
                assert_eq!(changed, 1);
            }
        }
    }
}
