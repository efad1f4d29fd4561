//! JSON text codec for protocol frames.
//!
//! The transport delivers whole text frames, so the codec works on complete
//! strings rather than byte streams:
//!
//! ```text
//! Command -> validate -> serde_json -> text frame
//! text frame -> size check -> serde_json -> Inbound
//! ```
//!
//! The device-side half (`decode_command`, `encode_inbound`) is what a
//! controller or a test double needs to talk back to the client.
//!
//! # Example
//!
//! ```
//! use pacsis_protocol::{Command, Inbound, ProtocolCodec, Update};
//!
//! let codec = ProtocolCodec::new();
//! let frame = codec.encode(&Command::open_door("D1", "M1")).unwrap();
//! assert_eq!(frame, r#"{"OpenDoor":{"DoorId":"D1","Id":"M1"}}"#);
//!
//! let inbound = codec
//!     .decode(r#"{"Update":{"DoorId":"D1","Id":"L1","IsActive":false}}"#)
//!     .unwrap();
//! assert_eq!(inbound, Inbound::Update(Update::new("D1", "L1", false)));
//! ```

use crate::{Command, Inbound, ProtocolError, Result, validate_command};

/// Default maximum frame size in bytes (64 KB).
///
/// Update frames are well under 200 bytes; anything near this size is not
/// something the controller produced.
const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Encoder/decoder for protocol text frames.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolCodec {
    max_frame_size: usize,
}

impl ProtocolCodec {
    /// Create a codec with the default maximum frame size.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Encode an outbound command after applying the client-side guard.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MissingField` if the guard rejects the command.
    pub fn encode(&self, command: &Command) -> Result<String> {
        validate_command(command)?;
        Ok(serde_json::to_string(command)?)
    }

    /// Decode an inbound frame from the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too large, not JSON, or not a known
    /// message.
    pub fn decode(&self, frame: &str) -> Result<Inbound> {
        self.check_size(frame)?;
        Ok(serde_json::from_str(frame)?)
    }

    /// Decode a command frame, as the controller does.
    pub fn decode_command(&self, frame: &str) -> Result<Command> {
        self.check_size(frame)?;
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode an inbound message, as the controller does.
    pub fn encode_inbound(&self, message: &Inbound) -> Result<String> {
        Ok(serde_json::to_string(message)?)
    }

    fn check_size(&self, frame: &str) -> Result<()> {
        if frame.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }
        Ok(())
    }
}

impl Default for ProtocolCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Update;

    #[test]
    fn test_encode_rejects_guarded_command() {
        let codec = ProtocolCodec::new();
        let result = codec.encode(&Command::enter_pin("D1", "", "1"));
        assert!(matches!(result, Err(ProtocolError::MissingField { .. })));
    }

    #[test]
    fn test_encode_request_update() {
        let codec = ProtocolCodec::new();
        assert_eq!(
            codec.encode(&Command::request_update()).unwrap(),
            r#"{"RequestUpdate":{}}"#
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        let codec = ProtocolCodec::new();
        assert!(matches!(
            codec.decode("not json at all"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_oversized_frame() {
        let codec = ProtocolCodec::with_max_frame_size(16);
        let frame = r#"{"Update":{"DoorId":"D1","Id":"L1","IsActive":true}}"#;
        assert!(matches!(
            codec.decode(frame),
            Err(ProtocolError::FrameTooLarge { max: 16, .. })
        ));
    }

    #[test]
    fn test_device_side_roundtrip() {
        let codec = ProtocolCodec::new();
        let update = Inbound::Update(Update::new("D2", "I4", false));
        let frame = codec.encode_inbound(&update).unwrap();
        assert_eq!(codec.decode(&frame).unwrap(), update);

        let command = Command::swipe_card("D2", "R1", 7, 42);
        let frame = codec.encode(&command).unwrap();
        assert_eq!(codec.decode_command(&frame).unwrap(), command);
    }
}
