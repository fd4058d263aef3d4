//! Randomness source.
//!
//! Every die roll the rules make goes through a [`DiceRoller`]. A game owns
//! exactly one roller, so the sequence of rolls (and therefore every outcome)
//! is a pure function of the seed and the order of declarations.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of uniform six-sided die rolls.
pub trait DiceRoller {
    /// Roll one six-sided die, `1..=6`.
    fn d6(&mut self) -> u8;

    /// Roll two six-sided dice and sum them, `2..=12`.
    fn roll_2d6(&mut self) -> u8 {
        let first = self.d6();
        first + self.d6()
    }

    /// Number of single dice rolled so far.
    fn rolls_made(&self) -> u64;
}

/// Production die source: a seeded ChaCha8 stream.
///
/// The generator state is serializable so snapshots resume the exact
/// sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeededDice {
    seed: u64,
    rng: ChaCha8Rng,
    rolls: u64,
}

impl SeededDice {
    /// Create a die source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            rolls: 0,
        }
    }

    /// The seed this source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl DiceRoller for SeededDice {
    fn d6(&mut self) -> u8 {
        self.rolls += 1;
        self.rng.gen_range(1..=6)
    }

    fn rolls_made(&self) -> u64 {
        self.rolls
    }
}

/// Test die source replaying a fixed script of d6 results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDice {
    script: VecDeque<u8>,
    rolls: u64,
}

impl ScriptedDice {
    /// Script of individual d6 results.
    ///
    /// # Panics
    ///
    /// Panics if any value is outside `1..=6`.
    #[must_use]
    pub fn new(d6s: impl IntoIterator<Item = u8>) -> Self {
        let script: VecDeque<u8> = d6s.into_iter().collect();
        assert!(
            script.iter().all(|d| (1..=6).contains(d)),
            "scripted d6 out of range: {script:?}"
        );
        Self { script, rolls: 0 }
    }

    /// Script of 2d6 totals, each split into two dice.
    ///
    /// # Panics
    ///
    /// Panics if any total is outside `2..=12`.
    #[must_use]
    pub fn from_2d6_totals(totals: impl IntoIterator<Item = u8>) -> Self {
        let mut dice = Self::default();
        for total in totals {
            dice.push_2d6(total);
        }
        dice
    }

    /// Append a single d6 result.
    pub fn push_d6(&mut self, value: u8) {
        assert!((1..=6).contains(&value), "scripted d6 out of range: {value}");
        self.script.push_back(value);
    }

    /// Append a 2d6 total.
    pub fn push_2d6(&mut self, total: u8) {
        assert!((2..=12).contains(&total), "scripted 2d6 out of range: {total}");
        let first = if total > 6 { total - 6 } else { 1 };
        self.script.push_back(first);
        self.script.push_back(total - first);
    }

    /// Dice not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DiceRoller for ScriptedDice {
    /// # Panics
    ///
    /// Panics when the script runs out: the test declared fewer rolls than
    /// the rules consumed.
    fn d6(&mut self) -> u8 {
        self.rolls += 1;
        match self.script.pop_front() {
            Some(value) => value,
            None => panic!("scripted dice exhausted after {} rolls", self.rolls - 1),
        }
    }

    fn rolls_made(&self) -> u64 {
        self.rolls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_in_range() {
        let mut dice = SeededDice::new(42);
        for _ in 0..1_000 {
            let d = dice.d6();
            assert!((1..=6).contains(&d));
            let total = dice.roll_2d6();
            assert!((2..=12).contains(&total));
        }
        assert_eq!(dice.rolls_made(), 3_000);
    }

    #[test]
    fn test_seeded_dice_determinism() {
        let mut a = SeededDice::new(7);
        let mut b = SeededDice::new(7);
        let seq_a: Vec<u8> = (0..64).map(|_| a.d6()).collect();
        let seq_b: Vec<u8> = (0..64).map(|_| b.d6()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_seeded_dice_state_survives_serialization() {
        let mut dice = SeededDice::new(99);
        for _ in 0..10 {
            dice.d6();
        }
        let bytes = bincode::serialize(&dice).expect("serialize");
        let mut restored: SeededDice = bincode::deserialize(&bytes).expect("deserialize");
        let next_original: Vec<u8> = (0..20).map(|_| dice.d6()).collect();
        let next_restored: Vec<u8> = (0..20).map(|_| restored.d6()).collect();
        assert_eq!(next_original, next_restored);
        assert_eq!(restored.rolls_made(), 30);
    }

    #[test]
    fn test_scripted_totals_split() {
        let mut dice = ScriptedDice::from_2d6_totals([2, 7, 12]);
        assert_eq!(dice.roll_2d6(), 2);
        assert_eq!(dice.roll_2d6(), 7);
        assert_eq!(dice.roll_2d6(), 12);
        assert_eq!(dice.remaining(), 0);
        assert_eq!(dice.rolls_made(), 6);
    }

    #[test]
    #[should_panic(expected = "scripted dice exhausted")]
    fn test_scripted_dice_exhaustion_panics() {
        let mut dice = ScriptedDice::new([3]);
        dice.d6();
        dice.d6();
    }
}
