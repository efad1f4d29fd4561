//! Operator panel for a PACSIS door controller.
//!
//! This crate is what an operator interface sits on top of. It ties the
//! device tree, the update dispatcher and the controller connection together
//! in a [`Session`], and projects peripheral state onto buttons:
//!
//! - [`buttons`]: pure label/action derivation for door, input and
//!   connection controls
//! - [`alerts`]: user-visible notifications with dismissal
//! - [`source`]: where the door configuration document comes from
//! - [`session`]: the single actor that owns the tree and the connection
//!
//! Rendering is left to the caller. A button here only says what it reads
//! and what pressing it does.

pub mod alerts;
pub mod buttons;
pub mod session;
pub mod source;

pub use alerts::{Alert, AlertLevel, AlertLog};
pub use buttons::{Button, ButtonAction, ButtonLabel, connection_button, door_button, input_button};
pub use session::Session;
pub use source::{ConfigSource, ConfigSourceError, FileConfigSource, StaticConfigSource};
