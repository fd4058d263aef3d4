//! Hex grid geometry.
//!
//! Axial coordinates (q, r) on a flat-top grid. Facing `North` points to
//! decreasing `r`, and the six facings proceed clockwise from there.

use serde::{Deserialize, Serialize};

use crate::math::{lerp, Fixed, EPSILON};

/// Axial hex coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Hex {
    /// Column.
    pub q: i32,
    /// Row (skewed).
    pub r: i32,
}

/// One of the six directions a unit can face, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facing {
    /// Up.
    North,
    /// Up and right.
    NorthEast,
    /// Down and right.
    SouthEast,
    /// Down.
    South,
    /// Down and left.
    SouthWest,
    /// Up and left.
    NorthWest,
}

impl Facing {
    /// All facings, clockwise from north.
    pub const ALL: [Facing; 6] = [
        Facing::North,
        Facing::NorthEast,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::NorthWest,
    ];

    /// Clockwise index, 0 for north.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Facing::North => 0,
            Facing::NorthEast => 1,
            Facing::SouthEast => 2,
            Facing::South => 3,
            Facing::SouthWest => 4,
            Facing::NorthWest => 5,
        }
    }

    /// Facing for a clockwise index; wraps modulo six.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index % 6) as usize]
    }

    /// Rotate one hexside clockwise.
    #[must_use]
    pub const fn turn_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate one hexside counter-clockwise.
    #[must_use]
    pub const fn turn_left(self) -> Self {
        Self::from_index(self.index() + 5)
    }

    /// The facing pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Axial offset of one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::NorthEast => (1, -1),
            Facing::SouthEast => (1, 0),
            Facing::South => (0, 1),
            Facing::SouthWest => (-1, 1),
            Facing::NorthWest => (-1, 0),
        }
    }

    /// Clockwise hexsides from `self` to `other`, in `0..6`.
    #[must_use]
    pub const fn relative(self, other: Facing) -> u8 {
        (other.index() + 6 - self.index()) % 6
    }
}

impl Hex {
    /// Create a hex from axial coordinates.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Neighbor one step in `facing`.
    #[must_use]
    pub const fn neighbor(self, facing: Facing) -> Self {
        let (dq, dr) = facing.offset();
        Self::new(self.q + dq, self.r + dr)
    }

    /// All six neighbors, clockwise from north.
    #[must_use]
    pub fn neighbors(self) -> [Hex; 6] {
        Facing::ALL.map(|f| self.neighbor(f))
    }

    /// Distance in hex steps.
    #[must_use]
    pub const fn distance(self, other: Hex) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        (dq + dr + ds) / 2
    }

    /// Whether `other` shares a hexside with `self`.
    #[must_use]
    pub const fn is_adjacent(self, other: Hex) -> bool {
        self.distance(other) == 1
    }

    /// The facing that best points from `self` toward `other`.
    ///
    /// Returns `None` when both hexes are the same. Lines running exactly
    /// along a hexside split resolve to the lower clockwise index.
    #[must_use]
    pub fn direction_to(self, other: Hex) -> Option<Facing> {
        if self == other {
            return None;
        }
        let (dq, dr, ds) = (other.q - self.q, other.r - self.r, other.s() - self.s());
        let mut best = Facing::North;
        let mut best_dot = i32::MIN;
        for facing in Facing::ALL {
            let (fq, fr) = facing.offset();
            let fs = -fq - fr;
            let dot = dq * fq + dr * fr + ds * fs;
            if dot > best_dot {
                best = facing;
                best_dot = dot;
            }
        }
        Some(best)
    }

    /// Every hex on the straight line from `self` to `other`, endpoints
    /// included, in order.
    ///
    /// Uses fixed-point cube interpolation with a small nudge so that the
    /// result is identical on every platform.
    #[must_use]
    pub fn line_to(self, other: Hex) -> Vec<Hex> {
        let n = self.distance(other);
        if n == 0 {
            return vec![self];
        }

        let nudge_q = EPSILON;
        let nudge_r = EPSILON + EPSILON;
        let aq = Fixed::from_num(self.q) + nudge_q;
        let ar = Fixed::from_num(self.r) + nudge_r;
        let bq = Fixed::from_num(other.q) + nudge_q;
        let br = Fixed::from_num(other.r) + nudge_r;

        let steps = Fixed::from_num(n);
        (0..=n)
            .map(|i| {
                let t = Fixed::from_num(i) / steps;
                cube_round(lerp(aq, bq, t), lerp(ar, br, t))
            })
            .collect()
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Round fractional axial coordinates to the containing hex.
fn cube_round(q: Fixed, r: Fixed) -> Hex {
    let s = -q - r;

    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    Hex::new(rq.to_num::<i32>(), rr.to_num::<i32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_distance() {
        let a = Hex::new(0, 0);
        assert_eq!(a.distance(Hex::new(2, -1)), 2);
        assert_eq!(a.distance(Hex::new(3, 0)), 3);
        assert_eq!(a.distance(Hex::new(-2, -2)), 4);
        assert_eq!(a.distance(a), 0);
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        let center = Hex::new(4, 7);
        for neighbor in center.neighbors() {
            assert!(center.is_adjacent(neighbor));
        }
    }

    #[test]
    fn test_facing_rotation() {
        assert_eq!(Facing::North.turn_left(), Facing::NorthWest);
        assert_eq!(Facing::NorthWest.turn_right(), Facing::North);
        assert_eq!(Facing::SouthEast.opposite(), Facing::NorthWest);
        assert_eq!(Facing::North.relative(Facing::South), 3);
        assert_eq!(Facing::SouthWest.relative(Facing::North), 2);
    }

    #[test]
    fn test_direction_to_neighbors() {
        let center = Hex::new(2, 2);
        for facing in Facing::ALL {
            assert_eq!(center.direction_to(center.neighbor(facing)), Some(facing));
        }
        assert_eq!(center.direction_to(center), None);
    }

    #[test]
    fn test_line_to_straight() {
        let line = Hex::new(0, 0).line_to(Hex::new(0, 3));
        assert_eq!(
            line,
            vec![Hex::new(0, 0), Hex::new(0, 1), Hex::new(0, 2), Hex::new(0, 3)]
        );
    }

    #[test]
    fn test_line_to_is_contiguous_and_symmetric_in_length() {
        let a = Hex::new(1, 1);
        let b = Hex::new(6, -2);
        let line = a.line_to(b);
        assert_eq!(line.len() as u32, a.distance(b) + 1);
        assert_eq!(line.first(), Some(&a));
        assert_eq!(line.last(), Some(&b));
        for pair in line.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "gap in {line:?}");
        }
        assert_eq!(b.line_to(a).len(), line.len());
    }

    #[test]
    fn test_line_to_is_deterministic() {
        let a = Hex::new(-3, 5);
        let b = Hex::new(4, -1);
        assert_eq!(a.line_to(b), a.line_to(b));
    }
}
