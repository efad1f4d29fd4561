//! Outbound commands issued by the operator.
//!
//! Each variant serializes as a single-key object whose key is the command
//! name understood by the controller. Identifiers and payloads are carried as
//! the operator typed them; [`validate_command`](crate::validate_command)
//! rejects empty values before anything reaches the transport.

use pacsis_core::KeypadKey;
use serde::{Deserialize, Serialize};

/// Door and peripheral a command is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Target {
    pub door_id: String,
    pub id: String,
}

impl Target {
    pub fn new(door_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            door_id: door_id.into(),
            id: id.into(),
        }
    }
}

/// PIN entry at a reader. `pin` is either one key or a whole sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EnterPin {
    pub door_id: String,
    pub id: String,
    #[serde(rename = "PIN")]
    pub pin: String,
}

/// Card swipe at a reader, sent by the controller as a 26-bit Wiegand frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SwipeCard {
    pub door_id: String,
    pub id: String,
    pub facility_code: u32,
    pub card_number: u32,
}

/// Empty payload of [`Command::RequestUpdate`]; serializes as `{}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResyncRequest {}

/// A command sent from the operator to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "EnterPIN")]
    EnterPin(EnterPin),
    SwipeCard(SwipeCard),
    #[serde(rename = "PushREX")]
    PushRex(Target),
    OpenDoor(Target),
    CloseDoor(Target),
    ActivateInput(Target),
    DeactivateInput(Target),
    /// Ask the controller to report the state of every peripheral.
    RequestUpdate(ResyncRequest),
}

impl Command {
    pub fn enter_pin(
        door_id: impl Into<String>,
        reader_id: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Command::EnterPin(EnterPin {
            door_id: door_id.into(),
            id: reader_id.into(),
            pin: pin.into(),
        })
    }

    /// A single keypad press, sent as a one-character PIN.
    pub fn key_press(
        door_id: impl Into<String>,
        reader_id: impl Into<String>,
        key: KeypadKey,
    ) -> Self {
        Command::enter_pin(door_id, reader_id, key.as_char().to_string())
    }

    pub fn swipe_card(
        door_id: impl Into<String>,
        reader_id: impl Into<String>,
        facility_code: u32,
        card_number: u32,
    ) -> Self {
        Command::SwipeCard(SwipeCard {
            door_id: door_id.into(),
            id: reader_id.into(),
            facility_code,
            card_number,
        })
    }

    pub fn push_rex(door_id: impl Into<String>, id: impl Into<String>) -> Self {
        Command::PushRex(Target::new(door_id, id))
    }

    pub fn open_door(door_id: impl Into<String>, monitor_id: impl Into<String>) -> Self {
        Command::OpenDoor(Target::new(door_id, monitor_id))
    }

    pub fn close_door(door_id: impl Into<String>, monitor_id: impl Into<String>) -> Self {
        Command::CloseDoor(Target::new(door_id, monitor_id))
    }

    pub fn activate_input(door_id: impl Into<String>, input_id: impl Into<String>) -> Self {
        Command::ActivateInput(Target::new(door_id, input_id))
    }

    pub fn deactivate_input(door_id: impl Into<String>, input_id: impl Into<String>) -> Self {
        Command::DeactivateInput(Target::new(door_id, input_id))
    }

    pub fn request_update() -> Self {
        Command::RequestUpdate(ResyncRequest {})
    }

    /// Protocol name of the command, as used for the top-level key.
    pub fn name(&self) -> &'static str {
        match self {
            Command::EnterPin(_) => "EnterPIN",
            Command::SwipeCard(_) => "SwipeCard",
            Command::PushRex(_) => "PushREX",
            Command::OpenDoor(_) => "OpenDoor",
            Command::CloseDoor(_) => "CloseDoor",
            Command::ActivateInput(_) => "ActivateInput",
            Command::DeactivateInput(_) => "DeactivateInput",
            Command::RequestUpdate(_) => "RequestUpdate",
        }
    }

    /// Door and peripheral the command addresses, if any.
    pub fn target(&self) -> Option<(&str, &str)> {
        match self {
            Command::EnterPin(p) => Some((&p.door_id, &p.id)),
            Command::SwipeCard(s) => Some((&s.door_id, &s.id)),
            Command::PushRex(t)
            | Command::OpenDoor(t)
            | Command::CloseDoor(t)
            | Command::ActivateInput(t)
            | Command::DeactivateInput(t) => Some((&t.door_id, &t.id)),
            Command::RequestUpdate(_) => None,
        }
    }
}
