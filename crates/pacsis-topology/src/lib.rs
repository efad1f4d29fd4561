//! In-memory model of a door controller installation.
//!
//! The installation is a flat list of doors, each owning its peripherals
//! grouped by kind. A [`DeviceTree`] is built once from the controller's
//! configuration document and afterwards only changes through
//! [`UpdateDispatcher::dispatch`], which sets a single peripheral's state.
//!
//! # Identifier resolution
//!
//! Updates address a peripheral by an anchor identifier (normally the door)
//! and the peripheral identifier. Both live in one identifier space, so the
//! tree builds an [`IdIndex`] up front and refuses documents that reuse an
//! identifier. Resolution is then a pair of map lookups and does not depend
//! on the order in which doors or peripherals are listed.
//!
//! ```
//! use pacsis_core::ActiveState;
//! use pacsis_protocol::{Inbound, Update};
//! use pacsis_topology::{DeviceTree, DispatchOutcome, UpdateDispatcher};
//!
//! let tree_json = r#"[{"Id":"D1","DoorMonitor":[{"Id":"M1"}],"Lock":[{"Id":"L1"}]}]"#;
//! let mut tree = DeviceTree::from_json(tree_json).unwrap();
//! let mut dispatcher = UpdateDispatcher::new();
//!
//! let outcome = dispatcher.dispatch(&mut tree, &Inbound::Update(Update::new("D1", "L1", true)));
//! assert!(matches!(outcome, DispatchOutcome::Applied { .. }));
//! assert_eq!(tree.peripheral("L1").unwrap().state(), ActiveState::Active);
//! ```

pub mod dispatcher;
pub mod error;
pub mod locator;
pub mod tree;

pub use dispatcher::{DispatchOutcome, DispatchStats, UpdateDispatcher};
pub use error::{Result, TopologyError};
pub use locator::{IdIndex, Node, Resolution, Slot};
pub use tree::{DeviceTree, Door, Peripheral};
