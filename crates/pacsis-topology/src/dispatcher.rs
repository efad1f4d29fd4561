//! Applies inbound controller messages to a device tree.
//!
//! Each update replaces exactly one peripheral's state. Updates that do not
//! resolve are discarded with a warning; they never fail the caller.

use pacsis_core::{ActiveState, EntityId, PeripheralKind};
use pacsis_protocol::{Inbound, Update};
use tracing::{debug, warn};

use crate::DeviceTree;
use crate::locator::Resolution;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The peripheral's state was replaced.
    Applied {
        door_id: EntityId,
        id: EntityId,
        kind: PeripheralKind,
        previous: ActiveState,
        current: ActiveState,
    },
    /// No node carries the update's `DoorId`.
    UnknownDoor { door_id: String },
    /// The anchor has no peripheral with the update's `Id`.
    UnknownPeripheral { door_id: String, id: String },
}

impl DispatchOutcome {
    /// Returns `true` if the tree was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }

    /// Returns `true` if the write changed the peripheral's state.
    pub fn changed(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { previous, current, .. } if previous != current)
    }
}

/// Counters over everything dispatched so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: u64,
    pub discarded: u64,
}

/// Routes inbound messages to the peripheral they address.
#[derive(Debug, Default)]
pub struct UpdateDispatcher {
    stats: DispatchStats,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Apply one inbound message to `tree`.
    pub fn dispatch(&mut self, tree: &mut DeviceTree, message: &Inbound) -> DispatchOutcome {
        match message {
            Inbound::Update(update) => self.apply_update(tree, update),
        }
    }

    fn apply_update(&mut self, tree: &mut DeviceTree, update: &Update) -> DispatchOutcome {
        let current = ActiveState::from(update.is_active);

        let slot = match tree.locate(&update.door_id, &update.id) {
            Resolution::Found(slot) => slot,
            Resolution::UnknownAnchor => {
                warn!(door_id = %update.door_id, "Door id not found, update discarded");
                self.stats.discarded += 1;
                return DispatchOutcome::UnknownDoor {
                    door_id: update.door_id.clone(),
                };
            }
            Resolution::UnknownTarget => {
                warn!(
                    door_id = %update.door_id,
                    id = %update.id,
                    "Peripheral id not found, update discarded"
                );
                self.stats.discarded += 1;
                return DispatchOutcome::UnknownPeripheral {
                    door_id: update.door_id.clone(),
                    id: update.id.clone(),
                };
            }
        };

        let (door_id, id) = match (tree.doors().get(slot.door), tree.slot(slot)) {
            (Some(door), Some(peripheral)) => (door.id().clone(), peripheral.id().clone()),
            _ => {
                // Index and tree are built together; a dangling slot means the
                // index is stale.
                warn!(?slot, "Resolved slot is not in the tree, update discarded");
                self.stats.discarded += 1;
                return DispatchOutcome::UnknownPeripheral {
                    door_id: update.door_id.clone(),
                    id: update.id.clone(),
                };
            }
        };

        let previous = tree.set_state(slot, current).unwrap_or_default();
        self.stats.applied += 1;

        debug!(
            door_id = %door_id,
            id = %id,
            kind = %slot.kind,
            %previous,
            %current,
            "Peripheral state updated"
        );

        DispatchOutcome::Applied {
            door_id,
            id,
            kind: slot.kind,
            previous,
            current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> DeviceTree {
        DeviceTree::from_json(
            r#"[
                {"Id": "D1", "DoorMonitor": [{"Id": "M1"}], "Lock": [{"Id": "L1"}, {"Id": "L2", "IsActive": false}]},
                {"Id": "D2", "Lock": [{"Id": "L3"}]}
            ]"#,
        )
        .unwrap()
    }

    fn update(door_id: &str, id: &str, active: bool) -> Inbound {
        Inbound::Update(Update::new(door_id, id, active))
    }

    #[test]
    fn test_update_sets_only_target() {
        let mut tree = tree();
        let before = tree.to_value();
        let mut dispatcher = UpdateDispatcher::new();

        let outcome = dispatcher.dispatch(&mut tree, &update("D1", "L1", true));
        assert!(outcome.is_applied());
        assert!(outcome.changed());
        assert_eq!(tree.peripheral("L1").unwrap().state(), ActiveState::Active);

        // Everything except L1 is untouched.
        let mut after = tree.to_value();
        after[0]["Lock"][0]
            .as_object_mut()
            .unwrap()
            .remove("IsActive");
        assert_eq!(after, before);
    }

    #[test]
    fn test_repeated_update_is_not_a_change() {
        let mut tree = tree();
        let mut dispatcher = UpdateDispatcher::new();

        let outcome = dispatcher.dispatch(&mut tree, &update("D1", "L2", false));
        assert!(outcome.is_applied());
        assert!(!outcome.changed());
    }

    #[test]
    fn test_unknown_door_is_noop() {
        let mut tree = tree();
        let before = tree.to_value();
        let mut dispatcher = UpdateDispatcher::new();

        let outcome = dispatcher.dispatch(&mut tree, &update("D9", "L1", true));
        assert_eq!(
            outcome,
            DispatchOutcome::UnknownDoor {
                door_id: "D9".to_string()
            }
        );
        assert_eq!(tree.to_value(), before);
    }

    #[test]
    fn test_peripheral_of_other_door_is_noop() {
        let mut tree = tree();
        let before = tree.to_value();
        let mut dispatcher = UpdateDispatcher::new();

        let outcome = dispatcher.dispatch(&mut tree, &update("D1", "L3", true));
        assert!(matches!(outcome, DispatchOutcome::UnknownPeripheral { .. }));
        assert_eq!(tree.to_value(), before);
    }

    #[test]
    fn test_stats_count_outcomes() {
        let mut tree = tree();
        let mut dispatcher = UpdateDispatcher::new();

        dispatcher.dispatch(&mut tree, &update("D1", "M1", true));
        dispatcher.dispatch(&mut tree, &update("D2", "L3", true));
        dispatcher.dispatch(&mut tree, &update("D2", "M1", true));

        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                applied: 2,
                discarded: 1
            }
        );
    }

    #[test]
    fn test_updates_apply_in_order() {
        let mut tree = tree();
        let mut dispatcher = UpdateDispatcher::new();

        for active in [true, false, true] {
            dispatcher.dispatch(&mut tree, &update("D1", "M1", active));
        }
        assert_eq!(tree.peripheral("M1").unwrap().state(), ActiveState::Active);
    }
}
