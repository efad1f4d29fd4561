//! Doors, peripherals and the tree that owns them.
//!
//! The serde layout follows the controller's configuration document:
//!
//! ```json
//! [
//!   {
//!     "Id": "Door1",
//!     "Reader": [{"Id": "Reader1"}],
//!     "REX": [{"Id": "Rex1"}],
//!     "DoorMonitor": [{"Id": "Monitor1", "IsActive": false}],
//!     "Lock": [{"Id": "Lock1", "IsActive": true}],
//!     "DigitalInput": [],
//!     "DigitalOutput": []
//!   }
//! ]
//! ```
//!
//! Members the client does not interpret (pin numbers, active levels) are
//! kept in `extra` so the document can be written back.

use pacsis_core::{ActiveState, EntityId, PeripheralKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::locator::{IdIndex, Node, Resolution, Slot};
use crate::{Result, TopologyError};

/// A reader, REX button, door monitor, lock or digital I/O contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Peripheral {
    id: EntityId,

    #[serde(default, skip_serializing_if = "ActiveState::is_unknown")]
    is_active: ActiveState,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Peripheral {
    /// Create a peripheral whose state has not been reported yet.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            is_active: ActiveState::Unknown,
            extra: Map::new(),
        }
    }

    /// Set the initial state, as a configuration snapshot would.
    pub fn with_state(mut self, state: ActiveState) -> Self {
        self.is_active = state;
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn state(&self) -> ActiveState {
        self.is_active
    }

    /// Document members not interpreted by the client.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// A physical doorway and the peripherals wired to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    #[serde(rename = "Id")]
    id: EntityId,

    #[serde(rename = "Reader", default)]
    readers: Vec<Peripheral>,

    #[serde(rename = "REX", default)]
    rexes: Vec<Peripheral>,

    #[serde(rename = "DoorMonitor", default)]
    door_monitors: Vec<Peripheral>,

    #[serde(rename = "Lock", default)]
    locks: Vec<Peripheral>,

    #[serde(rename = "DigitalInput", default)]
    digital_inputs: Vec<Peripheral>,

    #[serde(rename = "DigitalOutput", default)]
    digital_outputs: Vec<Peripheral>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Door {
    /// Create a door without peripherals.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            readers: Vec::new(),
            rexes: Vec::new(),
            door_monitors: Vec::new(),
            locks: Vec::new(),
            digital_inputs: Vec::new(),
            digital_outputs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach a peripheral of the given kind.
    pub fn with_peripheral(mut self, kind: PeripheralKind, peripheral: Peripheral) -> Self {
        self.peripherals_mut(kind).push(peripheral);
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Peripherals of one kind, in document order.
    pub fn peripherals(&self, kind: PeripheralKind) -> &[Peripheral] {
        match kind {
            PeripheralKind::Reader => &self.readers,
            PeripheralKind::Rex => &self.rexes,
            PeripheralKind::DoorMonitor => &self.door_monitors,
            PeripheralKind::Lock => &self.locks,
            PeripheralKind::DigitalInput => &self.digital_inputs,
            PeripheralKind::DigitalOutput => &self.digital_outputs,
        }
    }

    fn peripherals_mut(&mut self, kind: PeripheralKind) -> &mut Vec<Peripheral> {
        match kind {
            PeripheralKind::Reader => &mut self.readers,
            PeripheralKind::Rex => &mut self.rexes,
            PeripheralKind::DoorMonitor => &mut self.door_monitors,
            PeripheralKind::Lock => &mut self.locks,
            PeripheralKind::DigitalInput => &mut self.digital_inputs,
            PeripheralKind::DigitalOutput => &mut self.digital_outputs,
        }
    }

    /// Every peripheral of the door with its kind.
    pub fn all_peripherals(&self) -> impl Iterator<Item = (PeripheralKind, &Peripheral)> {
        PeripheralKind::ALL
            .into_iter()
            .flat_map(move |kind| self.peripherals(kind).iter().map(move |p| (kind, p)))
    }

    pub fn locks(&self) -> &[Peripheral] {
        &self.locks
    }

    /// The door monitor, if the door has one.
    pub fn door_monitor(&self) -> Option<&Peripheral> {
        self.door_monitors.first()
    }

    pub fn readers(&self) -> &[Peripheral] {
        &self.readers
    }

    pub fn digital_inputs(&self) -> &[Peripheral] {
        &self.digital_inputs
    }
}

/// The whole installation: doors in document order plus an identifier index.
#[derive(Debug, Clone, Default)]
pub struct DeviceTree {
    doors: Vec<Door>,
    index: IdIndex,
}

impl DeviceTree {
    /// An installation with no doors, as held before configuration arrives.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a tree from doors, indexing every identifier.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateId` if two nodes share an identifier
    /// and `TopologyError::MultipleDoorMonitors` if a door has more than one
    /// monitor.
    pub fn new(doors: Vec<Door>) -> Result<Self> {
        let index = IdIndex::build(&doors)?;
        Ok(Self { doors, index })
    }

    /// Parse a configuration document.
    ///
    /// The top level is either an array of doors or an object whose member
    /// values are doors, taken in document order.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::Malformed` for invalid JSON, otherwise the
    /// errors of [`DeviceTree::from_value`].
    pub fn from_json(document: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(document)?;
        Self::from_value(value)
    }

    /// Build a tree from an already parsed document.
    pub fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Array(items) => items,
            Value::Object(members) => members.into_iter().map(|(_, door)| door).collect(),
            other => {
                return Err(TopologyError::InvalidDocument(format!(
                    "expected an array or object of doors, got {}",
                    json_type(&other)
                )));
            }
        };

        let doors = entries
            .into_iter()
            .map(serde_json::from_value::<Door>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Self::new(doors)
    }

    /// Serialize the tree back to a document, including current states.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.doors
                .iter()
                .map(|door| serde_json::to_value(door).unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Compact JSON text of [`to_value`](Self::to_value).
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    /// Look up a door by identifier.
    pub fn door(&self, id: &str) -> Option<&Door> {
        match self.index.node(id)? {
            Node::Door { door } => self.doors.get(door),
            Node::Peripheral(_) => None,
        }
    }

    /// Look up a peripheral anywhere in the installation.
    pub fn peripheral(&self, id: &str) -> Option<&Peripheral> {
        match self.index.node(id)? {
            Node::Peripheral(slot) => self.slot(slot),
            Node::Door { .. } => None,
        }
    }

    /// Owning door and kind of a peripheral.
    pub fn peripheral_owner(&self, id: &str) -> Option<(&Door, PeripheralKind)> {
        match self.index.node(id)? {
            Node::Peripheral(slot) => Some((self.doors.get(slot.door)?, slot.kind)),
            Node::Door { .. } => None,
        }
    }

    /// Resolve an update's identifier pair.
    pub fn locate(&self, anchor_id: &str, id: &str) -> Resolution {
        self.index.resolve(anchor_id, id)
    }

    pub fn slot(&self, slot: Slot) -> Option<&Peripheral> {
        self.doors
            .get(slot.door)?
            .peripherals(slot.kind)
            .get(slot.index)
    }

    /// Replace the state of the peripheral at `slot`, returning the old state.
    pub(crate) fn set_state(&mut self, slot: Slot, state: ActiveState) -> Option<ActiveState> {
        let peripheral = self
            .doors
            .get_mut(slot.door)?
            .peripherals_mut(slot.kind)
            .get_mut(slot.index)?;
        Some(std::mem::replace(&mut peripheral.is_active, state))
    }

    /// Number of peripherals in the installation.
    pub fn peripheral_count(&self) -> usize {
        self.doors.iter().map(|d| d.all_peripherals().count()).sum()
    }

    /// Number of peripherals whose state has not been reported yet.
    pub fn unknown_count(&self) -> usize {
        self.doors
            .iter()
            .flat_map(Door::all_peripherals)
            .filter(|(_, p)| p.state().is_unknown())
            .count()
    }

    /// Returns `true` once every peripheral has a reported state.
    ///
    /// The controller never signals the end of a resync, so this is the only
    /// completeness signal available: sufficient, but a peripheral the
    /// controller does not report keeps it `false` forever.
    pub fn is_fully_known(&self) -> bool {
        self.unknown_count() == 0
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
