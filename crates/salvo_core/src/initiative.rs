//! Initiative and turn order.
//!
//! Each round every player with a live unit rolls 2d6. Tied players re-roll
//! among themselves until the tie is broken. The lowest total acts first in
//! every phase of the round; turns then alternate one unit at a time.

use std::collections::BTreeMap;

use crate::dice::DiceRoller;
use crate::player::PlayerId;

/// Outcome of an initiative roll-off.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Initiative {
    /// Players from lowest to highest initiative.
    pub order: Vec<PlayerId>,
    /// Every roll each player made, tie-breakers included.
    pub rolls: BTreeMap<PlayerId, Vec<u8>>,
}

/// Roll initiative for `players`.
///
/// Players roll in the order given; callers pass them sorted by id so the
/// sequence of dice is reproducible.
pub fn roll<D: DiceRoller + ?Sized>(players: &[PlayerId], dice: &mut D) -> Initiative {
    let mut rolls = BTreeMap::new();
    let order = rank(players.to_vec(), dice, &mut rolls);
    Initiative { order, rolls }
}

fn rank<D: DiceRoller + ?Sized>(
    players: Vec<PlayerId>,
    dice: &mut D,
    rolls: &mut BTreeMap<PlayerId, Vec<u8>>,
) -> Vec<PlayerId> {
    let mut by_total: BTreeMap<u8, Vec<PlayerId>> = BTreeMap::new();
    for player in players {
        let total = dice.roll_2d6();
        rolls.entry(player).or_default().push(total);
        by_total.entry(total).or_default().push(player);
    }
    let mut order = Vec::new();
    for group in by_total.into_values() {
        if group.len() > 1 {
            order.extend(rank(group, dice, rolls));
        } else {
            order.extend(group);
        }
    }
    order
}

/// Interleave turns: cycle through `order`, one turn per remaining eligible
/// unit, skipping players who have run out.
#[must_use]
pub fn interleave(order: &[PlayerId], eligible: &BTreeMap<PlayerId, usize>) -> Vec<PlayerId> {
    let mut remaining: Vec<(PlayerId, usize)> = order
        .iter()
        .map(|p| (*p, eligible.get(p).copied().unwrap_or(0)))
        .collect();
    let mut turns = Vec::new();
    while remaining.iter().any(|(_, n)| *n > 0) {
        for (player, left) in &mut remaining {
            if *left > 0 {
                turns.push(*player);
                *left -= 1;
            }
        }
    }
    turns
}
