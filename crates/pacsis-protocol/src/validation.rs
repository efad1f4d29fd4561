//! Client-side guard for outbound commands.
//!
//! A command is dropped locally when any identifier or payload field it
//! requires is falsy: an empty string or a zero number. The controller runs
//! its own validation; this guard only keeps obviously incomplete commands
//! off the wire. `RequestUpdate` carries nothing and always passes.

use crate::{Command, ProtocolError, Result};

/// Check that every required field of `command` is present.
///
/// # Errors
///
/// Returns `ProtocolError::MissingField` naming the first empty field.
///
/// # Examples
///
/// ```
/// use pacsis_protocol::{Command, validate_command};
///
/// assert!(validate_command(&Command::open_door("D1", "M1")).is_ok());
/// assert!(validate_command(&Command::enter_pin("D1", "R1", "")).is_err());
/// ```
pub fn validate_command(command: &Command) -> Result<()> {
    let name = command.name();

    if let Some((door_id, id)) = command.target() {
        require_text(name, "DoorId", door_id)?;
        require_text(name, "Id", id)?;
    }

    match command {
        Command::EnterPin(p) => require_text(name, "PIN", &p.pin),
        Command::SwipeCard(s) => {
            require_number(name, "FacilityCode", s.facility_code)?;
            require_number(name, "CardNumber", s.card_number)
        }
        _ => Ok(()),
    }
}

fn require_text(command: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ProtocolError::MissingField { command, field });
    }
    Ok(())
}

fn require_number(command: &'static str, field: &'static str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(ProtocolError::MissingField { command, field });
    }
    Ok(())
}
