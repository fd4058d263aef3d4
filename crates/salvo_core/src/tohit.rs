//! To-hit values.
//!
//! A [`ToHit`] is the pure result of evaluating an attack: impossible,
//! automatic, or a base value plus an itemized list of modifiers. The target
//! number is `base + Σ modifiers`; a 2d6 roll at or above it hits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::Side;

/// Lowest target number that still needs a roll.
pub const MIN_ROLLED: i32 = 3;

/// Highest target number a 2d6 roll can reach.
pub const MAX_ROLLED: i32 = 12;

/// One named to-hit modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    /// Signed adjustment.
    pub value: i32,
    /// What it is for.
    pub description: String,
}

/// A rolled to-hit value: base plus ordered modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToHitSpec {
    /// Base value (gunnery or piloting based).
    pub base: i32,
    /// What the base is.
    pub base_description: String,
    /// Modifiers in the order they were applied.
    pub modifiers: Vec<Modifier>,
    /// Side of the target the attack strikes.
    pub side: Side,
}

impl ToHitSpec {
    /// Start from a base value.
    #[must_use]
    pub fn new(base: i32, description: impl Into<String>, side: Side) -> Self {
        Self {
            base,
            base_description: description.into(),
            modifiers: Vec::new(),
            side,
        }
    }

    /// Append a modifier. Zero-valued modifiers are dropped.
    pub fn add(&mut self, value: i32, description: impl Into<String>) {
        if value != 0 {
            self.modifiers.push(Modifier {
                value,
                description: description.into(),
            });
        }
    }

    /// Target number.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.base + self.modifiers.iter().map(|m| m.value).sum::<i32>()
    }

    /// Whether `roll` meets the target number.
    #[must_use]
    pub fn is_hit(&self, roll: u8) -> bool {
        i32::from(roll) >= self.value()
    }
}

impl fmt::Display for ToHitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.value(), self.base_description, self.base)?;
        for m in &self.modifiers {
            write!(f, ", {} {:+}", m.description, m.value)?;
        }
        Ok(())
    }
}

/// Evaluated chance of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToHit {
    /// Cannot be attempted; never rolls.
    Impossible(String),
    /// Hits without a roll.
    Automatic(String),
    /// Needs a 2d6 roll.
    Roll(ToHitSpec),
}

impl ToHit {
    /// Shorthand for an impossible result.
    pub fn impossible(reason: impl Into<String>) -> Self {
        Self::Impossible(reason.into())
    }

    /// Collapse a spec whose value is out of dice range.
    #[must_use]
    pub fn from_spec(spec: ToHitSpec) -> Self {
        let value = spec.value();
        if value > MAX_ROLLED {
            Self::Impossible(format!("target number {value} exceeds 12"))
        } else if value < MIN_ROLLED {
            Self::Automatic(format!("target number {value} always succeeds"))
        } else {
            Self::Roll(spec)
        }
    }

    /// Whether the attack cannot be made.
    #[must_use]
    pub const fn is_impossible(&self) -> bool {
        matches!(self, Self::Impossible(_))
    }

    /// Target number, `None` unless a roll is needed.
    #[must_use]
    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Roll(spec) => Some(spec.value()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_sums_modifiers() {
        let mut spec = ToHitSpec::new(4, "gunnery skill", Side::Front);
        spec.add(2, "medium range");
        spec.add(0, "stationary");
        assert_eq!(spec.value(), 6);
        assert_eq!(spec.modifiers.len(), 1);
    }

    #[test]
    fn test_roll_boundary() {
        let mut spec = ToHitSpec::new(4, "gunnery skill", Side::Front);
        spec.add(2, "medium range");
        assert!(spec.is_hit(6));
        assert!(!spec.is_hit(5));
    }

    #[test]
    fn test_out_of_range_values_collapse() {
        let mut spec = ToHitSpec::new(4, "gunnery skill", Side::Front);
        spec.add(9, "everything");
        assert!(ToHit::from_spec(spec).is_impossible());

        let mut easy = ToHitSpec::new(4, "gunnery skill", Side::Front);
        easy.add(-4, "immobile target");
        assert!(matches!(ToHit::from_spec(easy), ToHit::Automatic(_)));
    }

    #[test]
    fn test_display_lists_modifiers() {
        let mut spec = ToHitSpec::new(4, "gunnery skill", Side::Front);
        spec.add(2, "medium range");
        assert_eq!(spec.to_string(), "6 (gunnery skill 4), medium range +2");
    }
}
