//! Identifier index and update target resolution.
//!
//! Doors and peripherals share one identifier space. The index maps every
//! identifier to the node carrying it, which lets an update's
//! `(DoorId, Id)` pair be resolved with two lookups:
//!
//! 1. `DoorId` is looked up anywhere in the installation; the node found is
//!    the *anchor*.
//! 2. `Id` must name a peripheral inside the anchor's subtree. A door's
//!    subtree is its peripherals; a peripheral's subtree is the peripheral
//!    itself.
//!
//! Doors have no state of their own, so an `Id` that names a door never
//! resolves.

use std::collections::HashMap;

use pacsis_core::{EntityId, PeripheralKind};

use crate::tree::Door;
use crate::{Result, TopologyError};

/// Position of a peripheral inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// Index of the owning door.
    pub door: usize,
    pub kind: PeripheralKind,
    /// Index within the door's collection of `kind`.
    pub index: usize,
}

/// What an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Door { door: usize },
    Peripheral(Slot),
}

/// Result of resolving an update's identifier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The peripheral to update.
    Found(Slot),
    /// No node carries the anchor identifier.
    UnknownAnchor,
    /// The anchor exists but its subtree has no peripheral with the identifier.
    UnknownTarget,
}

/// Map from identifier to node, built once per device tree.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    nodes: HashMap<EntityId, Node>,
}

impl IdIndex {
    /// Index every door and peripheral.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateId` on the first identifier seen
    /// twice, and `TopologyError::MultipleDoorMonitors` for a door with more
    /// than one monitor.
    pub fn build(doors: &[Door]) -> Result<Self> {
        let mut index = IdIndex::default();

        for (door_index, door) in doors.iter().enumerate() {
            let monitors = door.peripherals(PeripheralKind::DoorMonitor).len();
            if monitors > 1 {
                return Err(TopologyError::MultipleDoorMonitors {
                    door: door.id().to_string(),
                    count: monitors,
                });
            }

            index.insert(door.id(), Node::Door { door: door_index })?;

            for kind in PeripheralKind::ALL {
                for (slot_index, peripheral) in door.peripherals(kind).iter().enumerate() {
                    let slot = Slot {
                        door: door_index,
                        kind,
                        index: slot_index,
                    };
                    index.insert(peripheral.id(), Node::Peripheral(slot))?;
                }
            }
        }

        Ok(index)
    }

    fn insert(&mut self, id: &EntityId, node: Node) -> Result<()> {
        if self.nodes.insert(id.clone(), node).is_some() {
            return Err(TopologyError::duplicate(id.as_str()));
        }
        Ok(())
    }

    /// Node carrying `id`, if any.
    pub fn node(&self, id: &str) -> Option<Node> {
        self.nodes.get(id).copied()
    }

    /// Resolve an anchor/target pair to a peripheral slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use pacsis_topology::{DeviceTree, Resolution};
    ///
    /// let tree = DeviceTree::from_json(
    ///     r#"[{"Id":"D1","Lock":[{"Id":"L1"}]},{"Id":"D2","Lock":[{"Id":"L2"}]}]"#,
    /// ).unwrap();
    ///
    /// assert!(matches!(tree.locate("D1", "L1"), Resolution::Found(_)));
    /// assert_eq!(tree.locate("D1", "L2"), Resolution::UnknownTarget);
    /// assert_eq!(tree.locate("D9", "L1"), Resolution::UnknownAnchor);
    /// ```
    pub fn resolve(&self, anchor_id: &str, id: &str) -> Resolution {
        let Some(anchor) = self.node(anchor_id) else {
            return Resolution::UnknownAnchor;
        };

        match (anchor, self.node(id)) {
            (Node::Door { door }, Some(Node::Peripheral(slot))) if slot.door == door => {
                Resolution::Found(slot)
            }
            (Node::Peripheral(slot), _) if anchor_id == id => Resolution::Found(slot),
            _ => Resolution::UnknownTarget,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceTree;
    use rstest::rstest;

    fn tree() -> DeviceTree {
        DeviceTree::from_json(
            r#"[
                {"Id": "D1", "DoorMonitor": [{"Id": "M1"}], "Lock": [{"Id": "L1"}, {"Id": "L2"}]},
                {"Id": "D2", "Reader": [{"Id": "R1"}], "DigitalInput": [{"Id": "I1"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_index_covers_every_node() {
        let tree = tree();
        assert_eq!(tree.index().len(), 7);
        assert_eq!(tree.index().node("D2"), Some(Node::Door { door: 1 }));
        assert_eq!(
            tree.index().node("L2"),
            Some(Node::Peripheral(Slot {
                door: 0,
                kind: PeripheralKind::Lock,
                index: 1
            }))
        );
    }

    #[rstest]
    #[case("D1", "L2", true)]
    #[case("D2", "I1", true)]
    #[case("L1", "L1", true)] // peripheral anchor resolves to itself
    #[case("D1", "R1", false)] // peripheral of another door
    #[case("D1", "D1", false)] // doors carry no state
    #[case("L1", "L2", false)] // sibling is outside a peripheral's subtree
    #[case("D1", "nope", false)]
    fn test_resolve(#[case] anchor: &str, #[case] id: &str, #[case] found: bool) {
        let tree = tree();
        let resolution = tree.locate(anchor, id);
        assert_eq!(
            matches!(resolution, Resolution::Found(_)),
            found,
            "{resolution:?}"
        );
        if let Resolution::Found(slot) = resolution {
            assert_eq!(tree.slot(slot).unwrap().id().as_str(), id);
        }
    }

    #[test]
    fn test_unknown_anchor() {
        assert_eq!(tree().locate("D9", "L1"), Resolution::UnknownAnchor);
    }

    #[test]
    fn test_duplicate_peripheral_id_across_doors() {
        let err = DeviceTree::from_json(
            r#"[{"Id": "D1", "Lock": [{"Id": "X"}]}, {"Id": "D2", "REX": [{"Id": "X"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateId { ref id } if id == "X"));
    }

    #[test]
    fn test_duplicate_between_door_and_peripheral() {
        let err = DeviceTree::from_json(r#"[{"Id": "D1", "Lock": [{"Id": "D1"}]}]"#).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateId { .. }));
    }

    #[test]
    fn test_multiple_door_monitors_rejected() {
        let err = DeviceTree::from_json(
            r#"[{"Id": "D1", "DoorMonitor": [{"Id": "M1"}, {"Id": "M2"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::MultipleDoorMonitors { count: 2, .. }
        ));
    }
}
