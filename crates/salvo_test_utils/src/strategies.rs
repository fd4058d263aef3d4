//! Proptest strategies for game inputs.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the rules and the phase machine.

use proptest::prelude::*;
use salvo_core::hex::{Facing, Hex};
use salvo_core::movement::{MoveMode, MovePath, MoveStep};

/// Any hex on a `width` x `height` board.
pub fn arb_hex(width: u32, height: u32) -> impl Strategy<Value = Hex> {
    let bound = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
    (0..bound(width), 0..bound(height)).prop_map(|(q, r)| Hex::new(q, r))
}

/// Any facing.
pub fn arb_facing() -> impl Strategy<Value = Facing> {
    (0u8..6).prop_map(Facing::from_index)
}

/// A die seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// A single d6.
pub fn arb_d6() -> impl Strategy<Value = u8> {
    1u8..=6
}

/// A 2d6 total.
pub fn arb_2d6() -> impl Strategy<Value = u8> {
    (arb_d6(), arb_d6()).prop_map(|(a, b)| a + b)
}

/// A list of d6 results, enough to script a few rolls.
pub fn arb_dice(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(arb_d6(), 1..=max_len)
}

/// A movement mode.
pub fn arb_move_mode() -> impl Strategy<Value = MoveMode> {
    prop_oneof![
        Just(MoveMode::Walk),
        Just(MoveMode::Run),
        Just(MoveMode::Jump),
    ]
}

/// A single step, weighted towards moving.
pub fn arb_move_step() -> impl Strategy<Value = MoveStep> {
    prop_oneof![
        4 => Just(MoveStep::Forward),
        1 => Just(MoveStep::Backward),
        2 => Just(MoveStep::TurnLeft),
        2 => Just(MoveStep::TurnRight),
        1 => Just(MoveStep::GoProne),
        1 => Just(MoveStep::GetUp),
    ]
}

/// A declared path of up to `max_steps` steps. Most are illegal for some
/// unit or other, which is the point.
pub fn arb_move_path(max_steps: usize) -> impl Strategy<Value = MovePath> {
    (
        arb_move_mode(),
        prop::collection::vec(arb_move_step(), 0..=max_steps),
    )
        .prop_map(|(mode, steps)| MovePath::new(mode, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_hexes_stay_on_board(hex in arb_hex(7, 5)) {
            prop_assert!(hex.q >= 0 && hex.q < 7);
            prop_assert!(hex.r >= 0 && hex.r < 5);
        }

        #[test]
        fn prop_2d6_in_range(total in arb_2d6()) {
            prop_assert!((2..=12).contains(&total));
        }

        #[test]
        fn prop_paths_respect_length(path in arb_move_path(6)) {
            prop_assert!(path.steps.len() <= 6);
        }
    }
}
