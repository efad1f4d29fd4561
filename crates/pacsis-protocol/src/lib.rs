//! Wire protocol between the operator client and the door controller.
//!
//! Every frame is a JSON text frame holding an object with exactly one
//! top-level key. Outbound frames name a [`Command`]; inbound frames are
//! [`Inbound::Update`] reports of a single peripheral's state:
//!
//! ```text
//! client -> controller   {"OpenDoor":{"DoorId":"D1","Id":"M1"}}
//! client -> controller   {"RequestUpdate":{}}
//! controller -> client   {"Update":{"DoorId":"D1","Id":"L1","IsActive":true}}
//! ```
//!
//! # Resynchronisation
//!
//! `RequestUpdate` asks the controller to report every peripheral again. The
//! controller answers with one `Update` per peripheral and no terminator, so
//! a client cannot tell "fully synced" from "more updates pending". Clients
//! must not infer completeness from timing or counts; consumers that need a
//! signal can watch for every peripheral having a known state, which is
//! sufficient but not necessary.
//!
//! Sends are fire-and-forget: no correlation id, acknowledgement or retry.

pub mod codec;
pub mod command;
pub mod error;
pub mod message;
pub mod validation;

pub use codec::ProtocolCodec;
pub use command::{Command, EnterPin, ResyncRequest, SwipeCard, Target};
pub use error::{ProtocolError, Result};
pub use message::{Inbound, Update};
pub use validation::validate_command;
