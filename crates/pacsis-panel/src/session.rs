//! Operator session.
//!
//! A [`Session`] is the single owner of the device tree and the controller
//! connection. Inbound updates are applied one at a time, in the order the
//! controller sent them, by whoever drives [`Session::next_update`]. Buttons
//! are derived from the tree on every call, so they always reflect the last
//! applied update.
//!
//! # Example
//!
//! ```no_run
//! use pacsis_network::ConnectionConfig;
//! use pacsis_panel::{FileConfigSource, Session};
//!
//! # async fn example() {
//! let mut session = Session::new(ConnectionConfig::new("192.168.0.50"));
//! session.refresh_config(&FileConfigSource::new("doors.json")).await;
//! session.connect().await;
//!
//! while let Some(outcome) = session.next_update().await {
//!     if outcome.changed() {
//!         println!("{}", session.door_button("Door1"));
//!     }
//! }
//! # }
//! ```

use pacsis_core::constants::{ALERT_CONFIG_MALFORMED, ALERT_CONFIG_UNAVAILABLE};
use pacsis_core::{KeypadKey, PeripheralKind};
use pacsis_network::{ConnectionConfig, ConnectionError, ConnectionManager, ConnectionState};
use pacsis_protocol::{Command, Inbound};
use pacsis_topology::{DeviceTree, DispatchOutcome, Resolution, UpdateDispatcher};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::alerts::{AlertLevel, AlertLog};
use crate::buttons::{self, Button, ButtonAction};
use crate::source::ConfigSource;

/// Tree, connection and alerts of one operator.
pub struct Session {
    tree: DeviceTree,
    dispatcher: UpdateDispatcher,
    connection: ConnectionManager,
    updates: broadcast::Receiver<Inbound>,
    alerts: AlertLog,
}

impl Session {
    /// Session with an empty tree and no connection.
    pub fn new(config: ConnectionConfig) -> Self {
        let connection = ConnectionManager::new(config);
        let updates = connection.subscribe();

        Self {
            tree: DeviceTree::empty(),
            dispatcher: UpdateDispatcher::new(),
            connection,
            updates,
            alerts: AlertLog::new(),
        }
    }

    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    pub fn dispatcher(&self) -> &UpdateDispatcher {
        &self.dispatcher
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn alerts_mut(&mut self) -> &mut AlertLog {
        &mut self.alerts
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Rebuild the tree from a configuration document.
    ///
    /// A document that does not parse, or that reuses identifiers, raises a
    /// danger alert and leaves the current tree untouched. Returns whether
    /// the tree was replaced.
    pub fn load_config(&mut self, document: &str) -> bool {
        match DeviceTree::from_json(document) {
            Ok(tree) => {
                info!(
                    doors = tree.doors().len(),
                    peripherals = tree.peripheral_count(),
                    "Door configuration loaded"
                );
                self.tree = tree;
                true
            }
            Err(e) => {
                warn!(error = %e, "Door configuration rejected");
                self.alert(format!("{ALERT_CONFIG_MALFORMED}: \"{e}\""));
                false
            }
        }
    }

    /// Fetch a document from `source` and load it.
    ///
    /// A failed fetch raises a danger alert and leaves the tree untouched.
    pub async fn refresh_config<S: ConfigSource>(&mut self, source: &S) -> bool {
        match source.fetch().await {
            Ok(document) => self.load_config(&document),
            Err(e) => {
                warn!(error = %e, "Door configuration unavailable");
                self.alert(ALERT_CONFIG_UNAVAILABLE);
                false
            }
        }
    }

    fn alert(&mut self, message: impl Into<String>) {
        self.alerts.push(AlertLevel::Danger, message);
    }

    // ── Connection ───────────────────────────────────────────────────

    /// Connect to the controller, replacing any existing connection.
    pub async fn connect(&mut self) {
        self.connection.connect().await;
    }

    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
    }

    /// Disconnect if connected, otherwise connect.
    pub async fn toggle_connection(&mut self) {
        if self.connection.is_connected() {
            self.disconnect().await;
        } else {
            self.connect().await;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Close the connection when the operator leaves.
    pub async fn shutdown(&mut self) {
        info!("Session shutting down");
        self.connection.disconnect().await;
    }

    // ── Commands ─────────────────────────────────────────────────────
    //
    // Each returns whether the command was handed to the connection.
    // Commands with a missing field are suppressed here and never sent.

    pub fn open_door(&self, door_id: &str, monitor_id: &str) -> bool {
        self.send(Command::open_door(door_id, monitor_id))
    }

    pub fn close_door(&self, door_id: &str, monitor_id: &str) -> bool {
        self.send(Command::close_door(door_id, monitor_id))
    }

    pub fn push_rex(&self, door_id: &str, rex_id: &str) -> bool {
        self.send(Command::push_rex(door_id, rex_id))
    }

    /// Send a single keypad key as a one-character PIN.
    pub fn press_key(&self, door_id: &str, reader_id: &str, key: KeypadKey) -> bool {
        self.send(Command::key_press(door_id, reader_id, key))
    }

    /// Send a whole PIN sequence at once.
    pub fn enter_pin(&self, door_id: &str, reader_id: &str, pin: &str) -> bool {
        self.send(Command::enter_pin(door_id, reader_id, pin))
    }

    pub fn swipe_card(
        &self,
        door_id: &str,
        reader_id: &str,
        facility_code: u32,
        card_number: u32,
    ) -> bool {
        self.send(Command::swipe_card(door_id, reader_id, facility_code, card_number))
    }

    pub fn activate_input(&self, door_id: &str, input_id: &str) -> bool {
        self.send(Command::activate_input(door_id, input_id))
    }

    pub fn deactivate_input(&self, door_id: &str, input_id: &str) -> bool {
        self.send(Command::deactivate_input(door_id, input_id))
    }

    fn send(&self, command: Command) -> bool {
        let name = command.name();
        match self.connection.send(command) {
            Ok(()) => {
                debug!(command = name, "Command sent");
                true
            }
            Err(ConnectionError::Encode(e)) => {
                debug!(command = name, error = %e, "Command suppressed");
                false
            }
            Err(e) => {
                debug!(command = name, error = %e, "Command not sent");
                false
            }
        }
    }

    // ── Buttons ──────────────────────────────────────────────────────

    /// Open/close button of the door `door_id`; blank for unknown doors.
    pub fn door_button(&self, door_id: &str) -> Button {
        self.tree
            .door(door_id)
            .map(buttons::door_button)
            .unwrap_or_default()
    }

    /// Toggle of the digital input `input_id` on `door_id`.
    ///
    /// Blank when `input_id` is not a digital input of that door.
    pub fn input_button(&self, door_id: &str, input_id: &str) -> Button {
        let Resolution::Found(slot) = self.tree.locate(door_id, input_id) else {
            return Button::blank();
        };
        if slot.kind != PeripheralKind::DigitalInput {
            return Button::blank();
        }

        match (self.tree.doors().get(slot.door), self.tree.slot(slot)) {
            (Some(door), Some(input)) => buttons::input_button(door, input),
            _ => Button::blank(),
        }
    }

    pub fn connection_button(&self) -> Button {
        buttons::connection_button(self.is_connected())
    }

    /// Carry out a button's action. Blank buttons do nothing.
    pub async fn press(&mut self, button: &Button) -> bool {
        match button.action() {
            None => false,
            Some(ButtonAction::Connect) => {
                self.connect().await;
                true
            }
            Some(ButtonAction::Disconnect) => {
                self.disconnect().await;
                true
            }
            Some(action) => match action.to_command() {
                Some(command) => self.send(command),
                None => false,
            },
        }
    }

    // ── Updates ──────────────────────────────────────────────────────

    /// Wait for the next inbound message and apply it.
    ///
    /// If this session fell behind and messages were dropped, a resync is
    /// requested so the tree converges again.
    pub async fn next_update(&mut self) -> Option<DispatchOutcome> {
        loop {
            match self.updates.recv().await {
                Ok(message) => return Some(self.apply(&message)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session fell behind, requesting resync");
                    self.send(Command::request_update());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Apply every message already received without waiting.
    pub fn drain_updates(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.updates.try_recv() {
                Ok(message) => outcomes.push(self.apply(&message)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session fell behind, requesting resync");
                    self.send(Command::request_update());
                }
                Err(_) => return outcomes,
            }
        }
    }

    /// Apply one inbound message to the tree.
    pub fn apply(&mut self, message: &Inbound) -> DispatchOutcome {
        self.dispatcher.dispatch(&mut self.tree, message)
    }
}
