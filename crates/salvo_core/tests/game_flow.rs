//! Whole-game behavior through the public API.

use salvo_core::prelude::*;
use salvo_core::replay::ReplayInput;
use salvo_test_utils::fixtures::{self, autopilot, hex, GameBuilder, HUNCHBACK, LOCUST};
use proptest::prelude::*;
use salvo_test_utils::strategies::{arb_move_path, arb_seed};

fn phase_changes(events: &[GameEvent]) -> Vec<(u32, Phase)> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::PhaseChanged { round, phase } => Some((*round, *phase)),
            _ => None,
        })
        .collect()
}

fn skirmish(seed: u64) -> Game {
    GameBuilder::new(10, 10)
        .player("alice", 1)
        .player("bob", 2)
        .unit("alice", HUNCHBACK, hex(4, 7), Facing::North)
        .unit("alice", LOCUST, hex(6, 7), Facing::North)
        .unit("bob", HUNCHBACK, hex(4, 2), Facing::South)
        .build_seeded(seed)
}

#[test]
fn test_first_round_visits_every_phase_in_order() {
    let mut game = skirmish(11);
    let mut events = game.start().unwrap();
    while game.state().round() < 2 && !game.is_over() {
        let input = autopilot(&game).unwrap();
        let mut produced = input.apply(&mut game);
        if produced.is_empty() {
            produced = game.force_pass().unwrap();
        }
        events.extend(produced);
    }

    let round_one: Vec<Phase> = phase_changes(&events)
        .into_iter()
        .filter(|(round, _)| *round == 1)
        .map(|(_, phase)| phase)
        .collect();
    assert_eq!(
        round_one,
        vec![
            Phase::Initiative,
            Phase::Movement,
            Phase::WeaponAttack,
            Phase::PhysicalAttack,
            Phase::End,
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::InitiativeRolled { .. })));
}

#[test]
fn test_actions_outside_their_phase_are_rejected() {
    let mut game = skirmish(5);
    game.start().unwrap();
    assert_eq!(game.state().phase(), Phase::Movement);

    let player = game.current_turn().unwrap();
    let actor = game.state().entities_of(player).next().unwrap().id();
    let enemy = game
        .state()
        .entities()
        .values()
        .find(|e| e.owner() != player)
        .unwrap()
        .id();
    let rejection = game
        .submit(player, ActionRequest::weapon(actor, 0, enemy))
        .unwrap_err();
    assert!(matches!(rejection, Rejection::WrongPhase { .. }));
    assert_eq!(game.state().pending().len(), 0);
}

#[test]
fn test_force_pass_advances_a_stalled_phase() {
    let mut game = skirmish(8);
    game.start().unwrap();
    let alice = game.state().player_by_name("alice").unwrap().id;
    let bob = game.state().player_by_name("bob").unwrap().id;
    game.player_disconnected(alice).unwrap();
    game.player_disconnected(bob).unwrap();

    let mut passes = 0;
    while game.state().phase() == Phase::Movement {
        let events = game.force_pass().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TurnPassed { .. })));
        passes += 1;
        assert!(passes <= 3, "one pass per movement turn");
    }
    assert_eq!(passes, 3);
    assert_eq!(game.state().phase(), Phase::WeaponAttack);
    assert!(game
        .state()
        .entities()
        .values()
        .all(|e| e.movement().mode.is_none()));
}

#[test]
fn test_disconnect_drops_declared_attack() {
    let mut game = fixtures::duel();
    game.start().unwrap();
    while game.state().phase() == Phase::Movement {
        game.force_pass().unwrap();
    }

    let player = game.current_turn().unwrap();
    let actor = game.state().entities_of(player).next().unwrap().id();
    let target = game
        .state()
        .entities()
        .values()
        .find(|e| e.owner() != player)
        .unwrap()
        .id();
    // Both duel mechs carry a medium laser; six hexes is medium range.
    let weapon = game
        .state()
        .entity(actor)
        .unwrap()
        .mounts()
        .iter()
        .position(|m| m.equipment() == "ISMediumLaser")
        .unwrap();
    game.submit(player, ActionRequest::weapon(actor, weapon, target))
        .unwrap();
    assert_eq!(game.state().pending().len(), 1);

    let events = game.player_disconnected(player).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::ActionCancelled { .. })));
    assert!(game.state().pending().is_empty());
    assert!(!game.state().entity(actor).unwrap().mounts()[weapon].fired_this_round());

    let events = game.player_reconnected(player).unwrap();
    assert_eq!(events.len(), 1);
    assert!(game.player_reconnected(player).unwrap().is_empty());
}

#[test]
fn test_round_limit_ends_in_draw() {
    let mut game = GameBuilder::new(20, 20)
        .config(GameConfig::default().with_max_rounds(2))
        .player("alice", 1)
        .player("bob", 2)
        .unit("alice", LOCUST, hex(1, 18), Facing::North)
        .unit("bob", LOCUST, hex(18, 1), Facing::South)
        .build_seeded(4);
    game.start().unwrap();
    let mut guard = 0;
    while !game.is_over() {
        game.force_pass().unwrap();
        guard += 1;
        assert!(guard < 50);
    }
    let result = game.state().result().unwrap();
    assert_eq!(result.winner, None);
    assert_eq!(result.round, 2);
    assert_eq!(game.force_pass(), Err(Rejection::GameOver));
}

#[test]
fn test_view_tracks_turns() {
    let mut game = skirmish(2);
    game.start().unwrap();
    let view = game.view();
    assert_eq!(view.phase, Phase::Movement);
    assert_eq!(view.turn_order.len(), 3);
    assert_eq!(view.current_player(), game.current_turn());
    assert_eq!(view.entities.len(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_phases_never_skip_and_rounds_never_regress(
        seed in arb_seed(),
        paths in prop::collection::vec(arb_move_path(5), 1..12),
    ) {
        let mut game = skirmish(seed);
        let mut events = game.start().unwrap();
        let mut paths = paths.into_iter();
        let mut last_round = game.state().round();

        for _ in 0..80 {
            if game.is_over() {
                break;
            }
            let input = match (game.state().phase(), game.current_turn()) {
                (Phase::Movement, Some(player)) => {
                    let actor = game
                        .state()
                        .entities_of(player)
                        .find(|e| !e.is_done() && e.can_act())
                        .map(Entity::id);
                    match (actor, paths.next()) {
                        (Some(actor), Some(path)) => ReplayInput::Submit {
                            player,
                            request: ActionRequest::movement(actor, path),
                        },
                        _ => autopilot(&game).unwrap(),
                    }
                }
                _ => autopilot(&game).unwrap(),
            };
            let mut produced = input.apply(&mut game);
            if produced.is_empty() {
                produced = game.force_pass().unwrap();
            }
            events.extend(produced);

            prop_assert!(!game.is_halted(), "halted: {:?}", game.halt_reason());
            prop_assert!(game.state().round() >= last_round);
            last_round = game.state().round();
            prop_assert!(game.state().validate().is_ok());
        }

        let mut previous = Phase::Lobby;
        for (_, phase) in phase_changes(&events) {
            prop_assert_eq!(phase, previous.next());
            previous = phase;
        }

        for entity in game.state().entities().values() {
            for location in entity.locations() {
                prop_assert!(location.armor() <= location.original_armor());
                prop_assert!(location.internal() <= location.original_internal());
            }
            prop_assert!(game.state().board().contains(entity.position()));
        }
    }
}
