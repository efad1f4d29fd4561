use crate::{
    Result,
    constants::{
        KEY_DIGITAL_INPUT, KEY_DIGITAL_OUTPUT, KEY_DOOR_MONITOR, KEY_LOCK, KEY_READER, KEY_REX,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a door or peripheral.
///
/// Identifiers are opaque strings shared by doors and peripherals. The only
/// constraint enforced here is that they are not empty; uniqueness across an
/// installation is checked when a device tree is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Create a new identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidId` if the identifier is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidId {
                message: "identifier must not be empty".to_string(),
            });
        }
        Ok(EntityId(id))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityId::new(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        EntityId::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Last reported state of a peripheral.
///
/// A peripheral starts `Unknown` until the controller reports it, either in
/// the configuration snapshot or through an update. On the wire the state is
/// an optional boolean: absent or `null` is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ActiveState {
    #[default]
    Unknown,
    Active,
    Inactive,
}

impl ActiveState {
    /// Returns `true` once the controller has reported a state.
    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, ActiveState::Unknown)
    }

    /// Returns `true` if the state has never been reported.
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, ActiveState::Unknown)
    }

    /// The reported boolean, if any.
    #[inline]
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            ActiveState::Unknown => None,
            ActiveState::Active => Some(true),
            ActiveState::Inactive => Some(false),
        }
    }
}

impl From<bool> for ActiveState {
    fn from(active: bool) -> Self {
        if active {
            ActiveState::Active
        } else {
            ActiveState::Inactive
        }
    }
}

impl From<Option<bool>> for ActiveState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(ActiveState::Unknown, ActiveState::from)
    }
}

impl From<ActiveState> for Option<bool> {
    fn from(state: ActiveState) -> Self {
        state.as_bool()
    }
}

impl fmt::Display for ActiveState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActiveState::Unknown => write!(f, "unknown"),
            ActiveState::Active => write!(f, "active"),
            ActiveState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Kind of peripheral attached to a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeripheralKind {
    /// Card/PIN reader.
    Reader,
    /// Request-to-exit button.
    Rex,
    /// Door open/closed sensor.
    DoorMonitor,
    /// Electromechanical lock.
    Lock,
    DigitalInput,
    DigitalOutput,
}

impl PeripheralKind {
    /// All kinds, in the order they appear in a door document.
    pub const ALL: [PeripheralKind; 6] = [
        PeripheralKind::Reader,
        PeripheralKind::Rex,
        PeripheralKind::DoorMonitor,
        PeripheralKind::Lock,
        PeripheralKind::DigitalInput,
        PeripheralKind::DigitalOutput,
    ];

    /// Key of this kind's collection inside a door document.
    #[must_use]
    pub fn document_key(self) -> &'static str {
        match self {
            PeripheralKind::Reader => KEY_READER,
            PeripheralKind::Rex => KEY_REX,
            PeripheralKind::DoorMonitor => KEY_DOOR_MONITOR,
            PeripheralKind::Lock => KEY_LOCK,
            PeripheralKind::DigitalInput => KEY_DIGITAL_INPUT,
            PeripheralKind::DigitalOutput => KEY_DIGITAL_OUTPUT,
        }
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.document_key())
    }
}

/// A single key on a reader keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadKey {
    Digit(u8),
    Star,
    Hash,
}

impl KeypadKey {
    /// Character the key is sent as.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            KeypadKey::Digit(d) => char::from(b'0' + d),
            KeypadKey::Star => '*',
            KeypadKey::Hash => '#',
        }
    }
}

impl TryFrom<char> for KeypadKey {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(KeypadKey::Digit(c as u8 - b'0')),
            '*' => Ok(KeypadKey::Star),
            '#' => Ok(KeypadKey::Hash),
            other => Err(Error::InvalidKeypadKey(other)),
        }
    }
}

impl fmt::Display for KeypadKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::KEYPAD_KEYS;
    use rstest::rstest;

    #[test]
    fn test_entity_id_rejects_empty() {
        assert!(EntityId::new("").is_err());
        assert!("".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_roundtrips_through_json() {
        let id = EntityId::new("Door1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Door1\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_deserialize_empty_fails() {
        let result: std::result::Result<EntityId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case(None, ActiveState::Unknown)]
    #[case(Some(true), ActiveState::Active)]
    #[case(Some(false), ActiveState::Inactive)]
    fn test_active_state_from_option(#[case] input: Option<bool>, #[case] expected: ActiveState) {
        let state = ActiveState::from(input);
        assert_eq!(state, expected);
        assert_eq!(state.as_bool(), input);
        assert_eq!(state.is_known(), input.is_some());
    }

    #[test]
    fn test_active_state_null_is_unknown() {
        let state: ActiveState = serde_json::from_str("null").unwrap();
        assert_eq!(state, ActiveState::Unknown);
    }

    #[test]
    fn test_peripheral_kind_document_keys() {
        assert_eq!(PeripheralKind::Rex.document_key(), "REX");
        assert_eq!(PeripheralKind::DoorMonitor.to_string(), "DoorMonitor");
        assert_eq!(PeripheralKind::ALL.len(), 6);
    }

    #[test]
    fn test_display_honours_padding() {
        let id = EntityId::new("D1").unwrap();
        assert_eq!(format!("[{id:<4}]"), "[D1  ]");
        assert_eq!(format!("[{:>5}]", PeripheralKind::Rex), "[  REX]");
    }

    #[test]
    fn test_every_keypad_key_parses() {
        for &c in KEYPAD_KEYS {
            let key = KeypadKey::try_from(c).unwrap();
            assert_eq!(key.as_char(), c);
        }
    }

    #[rstest]
    #[case('a')]
    #[case('+')]
    #[case(' ')]
    fn test_invalid_keypad_key(#[case] c: char) {
        assert_eq!(KeypadKey::try_from(c), Err(Error::InvalidKeypadKey(c)));
    }
}
