//! Attack geometry: which side is struck and what lies between attacker
//! and target.

use crate::entity::Entity;
use crate::hex::{Facing, Hex};
use crate::location::Side;
use crate::state::GameState;
use crate::unit_kind::UnitKind;

/// Side of `target` struck by an attack coming from `from`.
///
/// The two front hexsides either side of the facing count as front; the
/// remaining arcs are right, rear and left going clockwise. An attack from
/// the target's own hex strikes the front.
#[must_use]
pub fn hit_side(from: Hex, target: &Entity) -> Side {
    let Some(direction) = target.position().direction_to(from) else {
        return Side::Front;
    };
    side_from_relative(target.facing().relative(direction))
}

/// Map clockwise hexsides from the target's facing to a side.
#[must_use]
pub const fn side_from_relative(relative: u8) -> Side {
    match relative {
        2 => Side::Right,
        3 => Side::Rear,
        4 => Side::Left,
        _ => Side::Front,
    }
}

/// Hex an attacker strikes from: its position, or the hex it entered the
/// target's hex from when the two share a hex.
#[must_use]
pub fn attack_origin(attacker: &Entity, target: &Entity) -> Hex {
    if attacker.position() == target.position() {
        attacker.movement().prior
    } else {
        attacker.position()
    }
}

/// What lies on the line between two units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOfSight {
    /// Why the line is blocked, if it is.
    pub blocked: Option<String>,
    /// Accumulated penalty from intervening woods.
    pub woods: i32,
    /// Target benefits from partial cover.
    pub partial_cover: bool,
}

/// Trace line of sight from `attacker` to `target`.
///
/// Aerospace units are above the terrain and always see and are seen.
#[must_use]
pub fn line_of_sight(attacker: &Entity, target: &Entity, state: &GameState) -> LineOfSight {
    let mut los = LineOfSight::default();
    if attacker.kind().is_aerospace() || target.kind().is_aerospace() {
        return los;
    }

    let board = state.board();
    let threshold = state.config().woods_blocking_threshold;
    let attacker_level = board.elevation(attacker.position()) + attacker.height();
    let target_floor = board.elevation(target.position());
    let target_level = target_floor + target.height();

    let line = attacker.position().line_to(target.position());
    let intervening = line.get(1..line.len().saturating_sub(1)).unwrap_or(&[]);
    for hex in intervening {
        let level = board.elevation(*hex);
        if level > attacker_level && level > target_level {
            los.blocked = Some(format!("terrain at {hex} blocks line of sight"));
            return los;
        }
        los.woods += board.terrain(*hex).woods_modifier();
        if los.woods >= threshold {
            los.blocked = Some("intervening woods block line of sight".into());
            return los;
        }
    }

    if target.kind() == UnitKind::Mech && !target.is_prone() {
        let behind_rise = intervening
            .last()
            .is_some_and(|hex| board.elevation(*hex) == target_floor + 1);
        let in_shallow_water = board.terrain(target.position()).water_depth() == 1;
        los.partial_cover = behind_rise || in_shallow_water;
    }
    los
}

/// Facing from `from` toward `to`, north when they coincide.
#[must_use]
pub fn facing_toward(from: Hex, to: Hex) -> Facing {
    from.direction_to(to).unwrap_or(Facing::North)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, HexTile, Terrain};
    use crate::config::GameConfig;
    use crate::testing;

    fn state(board: Board) -> GameState {
        GameState::new(GameConfig::default(), board)
    }

    #[test]
    fn test_hit_side_arcs() {
        let target = testing::entity(testing::HUNCHBACK, 2, Hex::new(5, 5));
        assert_eq!(hit_side(Hex::new(5, 3), &target), Side::Front);
        assert_eq!(hit_side(Hex::new(5, 8), &target), Side::Rear);
        assert_eq!(hit_side(Hex::new(6, 5), &target), Side::Right);
        assert_eq!(hit_side(Hex::new(4, 6), &target), Side::Left);
        assert_eq!(hit_side(Hex::new(5, 5), &target), Side::Front);
    }

    #[test]
    fn test_relative_table() {
        let sides: Vec<Side> = (0..6).map(side_from_relative).collect();
        assert_eq!(
            sides,
            vec![
                Side::Front,
                Side::Front,
                Side::Right,
                Side::Rear,
                Side::Left,
                Side::Front
            ]
        );
    }

    #[test]
    fn test_clear_line() {
        let a = testing::entity_with_id(testing::HUNCHBACK, 1, 1, Hex::new(2, 2));
        let b = testing::entity_with_id(testing::HUNCHBACK, 2, 2, Hex::new(2, 7));
        let los = line_of_sight(&a, &b, &state(Board::new(10, 10)));
        assert_eq!(los, LineOfSight::default());
    }

    #[test]
    fn test_woods_accumulate_and_block() {
        let a = testing::entity_with_id(testing::HUNCHBACK, 1, 1, Hex::new(2, 2));
        let b = testing::entity_with_id(testing::HUNCHBACK, 2, 2, Hex::new(2, 7));
        let light = HexTile::new(0, Terrain::LightWoods);
        let board = Board::new(10, 10).with_tile(Hex::new(2, 4), light).unwrap();
        assert_eq!(line_of_sight(&a, &b, &state(board.clone())).woods, 1);

        let heavy = HexTile::new(0, Terrain::HeavyWoods);
        let board = board.with_tile(Hex::new(2, 5), heavy).unwrap();
        assert!(line_of_sight(&a, &b, &state(board)).blocked.is_some());
    }

    #[test]
    fn test_high_ground_blocks() {
        let a = testing::entity_with_id(testing::HUNCHBACK, 1, 1, Hex::new(2, 2));
        let b = testing::entity_with_id(testing::HUNCHBACK, 2, 2, Hex::new(2, 6));
        let board = Board::new(10, 10)
            .with_tile(Hex::new(2, 4), HexTile::new(3, Terrain::Clear))
            .unwrap();
        assert!(line_of_sight(&a, &b, &state(board)).blocked.is_some());
    }

    #[test]
    fn test_partial_cover_behind_rise() {
        let a = testing::entity_with_id(testing::HUNCHBACK, 1, 1, Hex::new(2, 2));
        let b = testing::entity_with_id(testing::HUNCHBACK, 2, 2, Hex::new(2, 6));
        let board = Board::new(10, 10)
            .with_tile(Hex::new(2, 5), HexTile::new(1, Terrain::Clear))
            .unwrap();
        let los = line_of_sight(&a, &b, &state(board));
        assert!(los.blocked.is_none());
        assert!(los.partial_cover);
    }
}
