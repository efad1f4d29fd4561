//! Constants shared by the PACSIS client crates.
//!
//! The door controller exposes two endpoints on the same host: an HTTP
//! server for configuration documents and a WebSocket server that carries
//! the command/update protocol:
//!
//! ```text
//! operator ──(ws://host:8888)──> controller   {"OpenDoor":{"DoorId":..,"Id":..}}
//! operator <──(ws://host:8888)── controller   {"Update":{"DoorId":..,"Id":..,"IsActive":..}}
//! ```
//!
//! # Usage
//!
//! ```
//! use pacsis_core::constants::*;
//!
//! assert_eq!(DEFAULT_WEBSOCKET_PORT, 8888);
//! assert_eq!(LABEL_FORCE_OPEN_DOOR, "Force Open Door");
//! ```

// ============================================================================
// Network Endpoints
// ============================================================================

/// Port the controller's WebSocket server listens on.
///
/// Fixed and distinct from the HTTP port; the host is shared with the page
/// (or configuration) origin.
pub const DEFAULT_WEBSOCKET_PORT: u16 = 8888;

/// Default host when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// URL scheme of the update channel. The controller offers no TLS.
pub const WEBSOCKET_SCHEME: &str = "ws";

/// Timeout for the WebSocket opening handshake in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Timeout for sending the close frame during disconnect in milliseconds.
pub const CLOSE_TIMEOUT_MS: u64 = 500;

/// Capacity of the inbound update broadcast channel.
///
/// A subscriber that falls further behind than this loses the oldest
/// updates and is told how many it missed.
pub const UPDATE_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// Configuration Document Keys
// ============================================================================

/// Peripheral collections of a door, in the order the controller lists them.
pub const KEY_READER: &str = "Reader";
pub const KEY_REX: &str = "REX";
pub const KEY_DOOR_MONITOR: &str = "DoorMonitor";
pub const KEY_LOCK: &str = "Lock";
pub const KEY_DIGITAL_INPUT: &str = "DigitalInput";
pub const KEY_DIGITAL_OUTPUT: &str = "DigitalOutput";

// ============================================================================
// Button Labels
// ============================================================================

pub const LABEL_OPEN_DOOR: &str = "Open Door";
pub const LABEL_CLOSE_DOOR: &str = "Close Door";
pub const LABEL_FORCE_OPEN_DOOR: &str = "Force Open Door";
pub const LABEL_FORCE_CLOSE_DOOR: &str = "Force Close Door";
pub const LABEL_ACTIVATE: &str = "Activate";
pub const LABEL_DEACTIVATE: &str = "Deactivate";
pub const LABEL_CONNECT: &str = "Connect";
pub const LABEL_DISCONNECT: &str = "Disconnect";

// ============================================================================
// Keypad
// ============================================================================

/// Keys a reader keypad can forward to the controller.
///
/// The controller encodes each key as a 4-bit Wiegand burst: digits map to
/// their value, `*` to 10 and `#` to 11.
pub const KEYPAD_KEYS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '*', '#'];

// ============================================================================
// Operator Notifications
// ============================================================================

/// Alert raised when no configuration document could be obtained.
pub const ALERT_CONFIG_UNAVAILABLE: &str = "Could not get configuration from controller.";

/// Prefix of the alert raised for a malformed configuration document.
pub const ALERT_CONFIG_MALFORMED: &str = "Door config is not in correct JSON format";
