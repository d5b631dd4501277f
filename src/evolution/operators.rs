//! Roster crossover, mutation and repair.

use crate::generator::LineupContext;
use crate::model::{Roster, Slot};
use rand::Rng;

/// Position-wise uniform crossover: each slot comes from either parent
/// with equal probability.
///
/// The child may hold duplicates or exceed the cap; run [`repair`] on it.
pub fn crossover<R: Rng>(ctx: &LineupContext, a: &Roster, b: &Roster, rng: &mut R) -> Roster {
    let mut child = *a;
    for slot in ctx.slot_order() {
        if rng.random_bool(0.5) {
            if let Some(idx) = b.get(slot) {
                child.set(slot, idx);
            }
        }
    }
    child
}

/// Replaces one random slot with a random eligible player not on the roster.
///
/// Returns `false` when the chosen slot has no alternative.
pub fn mutate<R: Rng>(ctx: &LineupContext, roster: &mut Roster, rng: &mut R) -> bool {
    let order = ctx.slot_order();
    let slot = order[rng.random_range(0..order.len())];
    let alternatives: Vec<usize> = ctx
        .candidates(slot)
        .iter()
        .copied()
        .filter(|&c| !roster.contains(c))
        .collect();
    if alternatives.is_empty() {
        return false;
    }
    roster.set(slot, alternatives[rng.random_range(0..alternatives.len())]);
    true
}

/// Cheapest player for `slot` not already on the roster.
fn cheapest_alternative(ctx: &LineupContext, roster: &Roster, slot: Slot) -> Option<usize> {
    ctx.candidates(slot).iter().copied().find(|&c| !roster.contains(c))
}

/// Restores roster validity in place.
///
/// 1. A player repeated across slots is replaced, in the later slot, by
///    the cheapest eligible alternative.
/// 2. While over the cap, the most expensive non-captain slot that can be
///    made cheaper is downgraded to its cheapest alternative; the captain
///    is downgraded only when no other slot can be.
///
/// Returns whether the roster ended valid.
pub fn repair(ctx: &LineupContext, roster: &mut Roster) -> bool {
    let slots = roster.slots();

    let mut seen = Vec::with_capacity(slots.len());
    for &slot in &slots {
        let Some(idx) = roster.get(slot) else {
            continue;
        };
        if seen.contains(&idx) {
            match cheapest_alternative(ctx, roster, slot) {
                Some(alt) => roster.set(slot, alt),
                None => return false,
            }
        }
        if let Some(idx) = roster.get(slot) {
            seen.push(idx);
        }
    }

    let cap = ctx.rules().salary_cap;
    for _ in 0..=slots.len() {
        if ctx.salary(roster) <= cap {
            break;
        }

        let mut downgrades: Vec<(Slot, u32, usize)> = slots
            .iter()
            .filter(|s| **s != Slot::Captain)
            .filter_map(|&slot| {
                let current = roster.get(slot)?;
                let alt = cheapest_alternative(ctx, roster, slot)?;
                (ctx.slot_salary(slot, alt) < ctx.slot_salary(slot, current))
                    .then(|| (slot, ctx.slot_salary(slot, current), alt))
            })
            .collect();
        downgrades.sort_by(|a, b| b.1.cmp(&a.1));

        let step = downgrades.first().map(|&(slot, _, alt)| (slot, alt)).or_else(|| {
            let alt = cheapest_alternative(ctx, roster, Slot::Captain)?;
            (ctx.slot_salary(Slot::Captain, alt) < ctx.slot_salary(Slot::Captain, roster.captain))
                .then_some((Slot::Captain, alt))
        });
        match step {
            Some((slot, alt)) => roster.set(slot, alt),
            None => return false,
        }
    }

    ctx.is_valid(roster)
}
