//! Button state derivation.
//!
//! Buttons are recomputed from the device tree on every read; nothing here
//! holds state. A peripheral whose state has not been reported yet makes the
//! button that depends on it blank, so the operator never acts on a guess.
//!
//! # Door button
//!
//! A door's button combines its monitor (open/closed) with all of its locks
//! (an active lock is locked):
//!
//! | all unlocked | door open | label              | action      |
//! |--------------|-----------|--------------------|-------------|
//! | yes          | yes       | `Close Door`       | `CloseDoor` |
//! | yes          | no        | `Open Door`        | `OpenDoor`  |
//! | no           | yes       | `Force Close Door` | `CloseDoor` |
//! | no           | no        | `Force Open Door`  | `OpenDoor`  |
//!
//! A door with no locks counts as all unlocked.
//!
//! # Example
//!
//! ```
//! use pacsis_panel::{ButtonLabel, door_button};
//! use pacsis_topology::DeviceTree;
//!
//! let tree = DeviceTree::from_json(
//!     r#"[{"Id":"D1","DoorMonitor":[{"Id":"M1","IsActive":false}],"Lock":[{"Id":"L1","IsActive":true}]}]"#,
//! ).unwrap();
//!
//! let button = door_button(&tree.doors()[0]);
//! assert_eq!(button.label(), Some(ButtonLabel::ForceOpenDoor));
//! ```

use std::fmt;

use pacsis_core::EntityId;
use pacsis_core::constants::{
    LABEL_ACTIVATE, LABEL_CLOSE_DOOR, LABEL_CONNECT, LABEL_DEACTIVATE, LABEL_DISCONNECT,
    LABEL_FORCE_CLOSE_DOOR, LABEL_FORCE_OPEN_DOOR, LABEL_OPEN_DOOR,
};
use pacsis_protocol::Command;
use pacsis_topology::{Door, Peripheral};

/// Text shown on a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonLabel {
    OpenDoor,
    CloseDoor,
    ForceOpenDoor,
    ForceCloseDoor,
    Activate,
    Deactivate,
    Connect,
    Disconnect,
}

impl ButtonLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonLabel::OpenDoor => LABEL_OPEN_DOOR,
            ButtonLabel::CloseDoor => LABEL_CLOSE_DOOR,
            ButtonLabel::ForceOpenDoor => LABEL_FORCE_OPEN_DOOR,
            ButtonLabel::ForceCloseDoor => LABEL_FORCE_CLOSE_DOOR,
            ButtonLabel::Activate => LABEL_ACTIVATE,
            ButtonLabel::Deactivate => LABEL_DEACTIVATE,
            ButtonLabel::Connect => LABEL_CONNECT,
            ButtonLabel::Disconnect => LABEL_DISCONNECT,
        }
    }
}

impl fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    OpenDoor {
        door_id: EntityId,
        monitor_id: EntityId,
    },
    CloseDoor {
        door_id: EntityId,
        monitor_id: EntityId,
    },
    ActivateInput {
        door_id: EntityId,
        input_id: EntityId,
    },
    DeactivateInput {
        door_id: EntityId,
        input_id: EntityId,
    },
    Connect,
    Disconnect,
}

impl ButtonAction {
    /// Controller command for this action.
    ///
    /// Returns `None` for the connection actions, which never reach the
    /// controller.
    pub fn to_command(&self) -> Option<Command> {
        let command = match self {
            ButtonAction::OpenDoor {
                door_id,
                monitor_id,
            } => Command::open_door(door_id.as_str(), monitor_id.as_str()),
            ButtonAction::CloseDoor {
                door_id,
                monitor_id,
            } => Command::close_door(door_id.as_str(), monitor_id.as_str()),
            ButtonAction::ActivateInput { door_id, input_id } => {
                Command::activate_input(door_id.as_str(), input_id.as_str())
            }
            ButtonAction::DeactivateInput { door_id, input_id } => {
                Command::deactivate_input(door_id.as_str(), input_id.as_str())
            }
            ButtonAction::Connect | ButtonAction::Disconnect => return None,
        };
        Some(command)
    }
}

/// A derived control: a label and what pressing it does, or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Button {
    label: Option<ButtonLabel>,
    action: Option<ButtonAction>,
}

impl Button {
    pub fn new(label: ButtonLabel, action: ButtonAction) -> Self {
        Self {
            label: Some(label),
            action: Some(action),
        }
    }

    /// A button with no label and no action.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn label(&self) -> Option<ButtonLabel> {
        self.label
    }

    pub fn action(&self) -> Option<&ButtonAction> {
        self.action.as_ref()
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_none()
    }

    /// Label text, empty when blank.
    pub fn text(&self) -> &'static str {
        self.label.map(ButtonLabel::as_str).unwrap_or("")
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Derive the open/close button of `door`.
///
/// Blank when the door has no monitor, or when the monitor or any lock has
/// no known state.
pub fn door_button(door: &Door) -> Button {
    let Some(monitor) = door.door_monitor() else {
        return Button::blank();
    };
    let Some(door_open) = monitor.state().as_bool() else {
        return Button::blank();
    };

    let mut all_unlocked = true;
    for lock in door.locks() {
        match lock.state().as_bool() {
            Some(locked) => all_unlocked &= !locked,
            None => return Button::blank(),
        }
    }

    let door_id = door.id().clone();
    let monitor_id = monitor.id().clone();

    let label = match (all_unlocked, door_open) {
        (true, true) => ButtonLabel::CloseDoor,
        (true, false) => ButtonLabel::OpenDoor,
        (false, true) => ButtonLabel::ForceCloseDoor,
        (false, false) => ButtonLabel::ForceOpenDoor,
    };
    let action = if door_open {
        ButtonAction::CloseDoor {
            door_id,
            monitor_id,
        }
    } else {
        ButtonAction::OpenDoor {
            door_id,
            monitor_id,
        }
    };

    Button::new(label, action)
}

/// Derive the activate/deactivate toggle of a digital input on `door`.
pub fn input_button(door: &Door, input: &Peripheral) -> Button {
    let door_id = door.id().clone();
    let input_id = input.id().clone();

    match input.state().as_bool() {
        Some(true) => Button::new(
            ButtonLabel::Deactivate,
            ButtonAction::DeactivateInput { door_id, input_id },
        ),
        Some(false) => Button::new(
            ButtonLabel::Activate,
            ButtonAction::ActivateInput { door_id, input_id },
        ),
        None => Button::blank(),
    }
}

/// Connect/disconnect toggle.
pub fn connection_button(connected: bool) -> Button {
    if connected {
        Button::new(ButtonLabel::Disconnect, ButtonAction::Disconnect)
    } else {
        Button::new(ButtonLabel::Connect, ButtonAction::Connect)
    }
}
