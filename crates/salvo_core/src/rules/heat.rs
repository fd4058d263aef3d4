//! Heat bookkeeping for the End phase.

use crate::entity::Entity;
use crate::events::GameEvent;
use crate::movement::{MoveMode, MovementRecord};
use crate::unit_kind::Capabilities;

/// Heat generated by this round's movement.
#[must_use]
pub fn movement_heat(record: &MovementRecord) -> u32 {
    match record.mode {
        Some(MoveMode::Walk) => 1,
        Some(MoveMode::Run) => 2,
        Some(MoveMode::Jump) => record.hexes.max(3),
        None => 0,
    }
}

/// Add movement and weapon heat, dissipate through working heat sinks and
/// update shutdown. Units that do not track heat are left alone.
pub(crate) fn end_of_round(entity: &mut Entity, shutdown_heat: u32, events: &mut Vec<GameEvent>) {
    if !entity.capabilities().contains(Capabilities::TRACKS_HEAT) || entity.is_destroyed() {
        entity.heat_buildup = 0;
        return;
    }
    let before = (entity.heat, entity.shutdown);
    let gained = entity.heat_buildup + movement_heat(&entity.movement);
    entity.heat = (entity.heat + gained).saturating_sub(entity.working_heat_sinks());
    entity.heat_buildup = 0;
    entity.shutdown = entity.heat >= shutdown_heat;

    if (entity.heat, entity.shutdown) != before {
        events.push(GameEvent::HeatChanged {
            entity: entity.id(),
            heat: entity.heat,
            shutdown: entity.shutdown,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::testing;

    #[test]
    fn test_movement_heat() {
        let mut record = MovementRecord::stationary(Hex::new(0, 0));
        assert_eq!(movement_heat(&record), 0);
        record.mode = Some(MoveMode::Run);
        assert_eq!(movement_heat(&record), 2);
        record.mode = Some(MoveMode::Jump);
        record.hexes = 2;
        assert_eq!(movement_heat(&record), 3);
        record.hexes = 5;
        assert_eq!(movement_heat(&record), 5);
    }

    #[test]
    fn test_sinks_dissipate_but_never_below_zero() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        mech.heat_buildup = 7;
        let mut events = Vec::new();
        end_of_round(&mut mech, 30, &mut events);
        assert_eq!(mech.heat(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_shutdown_and_restart() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        mech.heat = 25;
        mech.heat_buildup = 20;
        let mut events = Vec::new();
        end_of_round(&mut mech, 30, &mut events);
        assert_eq!(mech.heat(), 32);
        assert!(mech.is_shutdown());
        assert_eq!(mech.walk_mp(), 0);

        end_of_round(&mut mech, 30, &mut events);
        assert_eq!(mech.heat(), 19);
        assert!(!mech.is_shutdown());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_vehicles_ignore_heat() {
        let mut tank = testing::entity(testing::VEDETTE, 1, Hex::new(0, 0));
        tank.heat_buildup = 40;
        end_of_round(&mut tank, 30, &mut Vec::new());
        assert_eq!(tank.heat(), 0);
        assert!(!tank.is_shutdown());
    }
}
