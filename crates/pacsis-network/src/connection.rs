//! WebSocket connection to the door controller.
//!
//! The manager holds at most one live connection. Each connection runs on its
//! own task, which owns the socket and does three things:
//!
//! ```text
//! ConnectionManager
//!     │
//!     ├─ send() ──> mpsc ──┐
//!     │                    ├─> link task ───(WebSocket)───> Controller
//!     ├─ subscribe() <─ broadcast <─┘
//!     └─ state_changes() <─ watch
//! ```
//!
//! - On open, a `RequestUpdate` goes out before anything else, so the
//!   controller replays the state of every peripheral.
//! - Text frames are decoded and broadcast in arrival order. Frames that do
//!   not decode are logged and dropped; they never close the connection.
//! - Commands queued through [`ConnectionManager::send`] are written in
//!   order. Commands queued while the socket is still opening are written
//!   right after the resync request.
//!
//! Connection failures are not returned to the caller. They show up as the
//! state going back to [`ConnectionState::Disconnected`], which is what
//! [`ConnectionManager::is_connected`] reports.
//!
//! There is no automatic reconnect. The caller decides when to connect again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pacsis_core::constants::{
    CLOSE_TIMEOUT_MS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_WEBSOCKET_PORT,
    UPDATE_CHANNEL_CAPACITY, WEBSOCKET_SCHEME,
};
use pacsis_protocol::{Command, Inbound, ProtocolCodec, ProtocolError};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Configuration for the controller connection
///
/// # Example
///
/// ```
/// use pacsis_network::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::new("10.0.0.7")
///     .with_port(9000)
///     .with_connect_timeout(Duration::from_millis(500));
///
/// assert_eq!(config.ws_url(), "ws://10.0.0.7:9000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Controller host name or address
    pub host: String,

    /// WebSocket port
    pub port: u16,

    /// Upper bound on the TCP connect plus WebSocket handshake
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    /// Configuration for `host` with the default port and timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// URL of the controller's WebSocket endpoint.
    pub fn ws_url(&self) -> String {
        // IPv6 literals need brackets in the authority.
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{WEBSOCKET_SCHEME}://[{}]:{}", self.host, self.port)
        } else {
            format!("{WEBSOCKET_SCHEME}://{}:{}", self.host, self.port)
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_WEBSOCKET_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur on the controller connection
///
/// Only `NotConnected` and `Encode` reach callers of
/// [`ConnectionManager::send`]. The transport variants are logged by the
/// connection task and surface as a state change.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No connection is held, or the held one has closed
    #[error("Not connected to controller")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// TCP connect or WebSocket upgrade failed
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The configured host and port do not form a usable URL
    #[error("Invalid controller URL: {0}")]
    InvalidUrl(String),

    /// The command failed the outbound guard or could not be encoded
    #[error("Command rejected: {0}")]
    Encode(#[from] ProtocolError),
}

/// Lifecycle of the held connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection, or the last one closed or failed.
    #[default]
    Disconnected,
    /// Handshake in progress. Sends are queued.
    Connecting,
    /// Frames flow both ways.
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
        };
        f.write_str(name)
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle to one running connection task.
struct Link {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owner of the single controller connection
///
/// # Example
///
/// ```no_run
/// use pacsis_network::{ConnectionConfig, ConnectionManager, ConnectionState};
///
/// # async fn example() {
/// let mut manager = ConnectionManager::new(ConnectionConfig::default());
/// let mut state = manager.state_changes();
///
/// manager.connect().await;
/// let _ = state.wait_for(|s| *s != ConnectionState::Connecting).await;
///
/// if manager.is_connected() {
///     println!("controller is up");
/// }
///
/// manager.disconnect().await;
/// assert!(!manager.is_connected());
/// # }
/// ```
pub struct ConnectionManager {
    config: ConnectionConfig,
    codec: ProtocolCodec,
    link: Option<Link>,
    updates: broadcast::Sender<Inbound>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionManager {
    /// Create a manager. Nothing is connected until [`connect`](Self::connect).
    pub fn new(config: ConnectionConfig) -> Self {
        debug!(url = %config.ws_url(), "Creating connection manager");

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            config,
            codec: ProtocolCodec::new(),
            link: None,
            updates,
            state: Arc::new(state),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a new connection, closing any existing one first.
    ///
    /// Returns once the previous connection is fully closed and the new
    /// attempt has started. Watch [`state_changes`](Self::state_changes) to
    /// learn whether the attempt succeeds.
    pub async fn connect(&mut self) {
        self.disconnect().await;

        let url = self.config.ws_url();
        info!(%url, "Connecting to controller");

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        self.state.send_replace(ConnectionState::Connecting);

        let task = tokio::spawn(run_link(
            url,
            self.config.connect_timeout,
            self.codec,
            outbound_rx,
            self.updates.clone(),
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        self.link = Some(Link {
            outbound,
            cancel,
            task,
        });
    }

    /// Close the held connection and wait for its task to finish.
    ///
    /// Safe to call when nothing is connected.
    pub async fn disconnect(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };

        debug!("Closing controller connection");
        link.cancel.cancel();
        if let Err(e) = link.task.await {
            warn!(error = %e, "Connection task ended abnormally");
        }

        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// `true` while a connection is held and has not closed or failed.
    pub fn is_connected(&self) -> bool {
        self.link.is_some() && self.state() != ConnectionState::Disconnected
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Receive every inbound message from now on.
    ///
    /// Subscriptions survive reconnects. A receiver that falls more than
    /// the channel capacity behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Inbound> {
        self.updates.subscribe()
    }

    /// Queue `command` for the controller.
    ///
    /// Delivery is fire-and-forget; the controller never acknowledges.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::Encode` if the command fails the outbound guard.
    ///   Nothing is sent.
    /// - `ConnectionError::NotConnected` if no live connection is held.
    pub fn send(&self, command: Command) -> Result<(), ConnectionError> {
        let frame = self.codec.encode(&command)?;

        let link = match &self.link {
            Some(link) if self.state() != ConnectionState::Disconnected => link,
            _ => return Err(ConnectionError::NotConnected),
        };

        trace!(command = command.name(), "Queueing command");
        link.outbound
            .send(frame)
            .map_err(|_| ConnectionError::NotConnected)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            debug!("ConnectionManager dropped while connected - connection will be closed");
            link.cancel.cancel();
        }
    }
}

/// Connection task: handshake, resync, then pump frames both ways.
async fn run_link(
    url: String,
    connect_timeout: Duration,
    codec: ProtocolCodec,
    mut outbound: mpsc::UnboundedReceiver<String>,
    updates: broadcast::Sender<Inbound>,
    state: Arc<watch::Sender<ConnectionState>>,
    cancel: CancellationToken,
) {
    let attempt = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Connection attempt cancelled");
            None
        }
        result = open(&url, connect_timeout) => Some(result),
    };

    let ws_stream = match attempt {
        Some(Ok(ws_stream)) => ws_stream,
        Some(Err(e)) => {
            warn!(%url, error = %e, "Connection failed");
            state.send_replace(ConnectionState::Disconnected);
            return;
        }
        None => {
            state.send_replace(ConnectionState::Disconnected);
            return;
        }
    };

    info!(%url, "Connected to controller");
    state.send_replace(ConnectionState::Open);

    let (mut write, mut read) = ws_stream.split();

    match codec.encode(&Command::request_update()) {
        Ok(frame) => {
            if let Err(e) = write.send(Message::text(frame)).await {
                warn!(error = %e, "Failed to send resync request");
                state.send_replace(ConnectionState::Disconnected);
                return;
            }
            debug!("Resync requested");
        }
        Err(e) => warn!(error = %e, "Failed to encode resync request"),
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let close_timeout = Duration::from_millis(CLOSE_TIMEOUT_MS);
                let flush = async {
                    while let Ok(frame) = outbound.try_recv() {
                        write.feed(Message::text(frame)).await?;
                    }
                    write.close().await
                };
                match tokio::time::timeout(close_timeout, flush).await {
                    Ok(Ok(())) => debug!("Close handshake sent"),
                    Ok(Err(e)) => debug!(error = %e, "Error sending close frame"),
                    Err(_) => warn!("Close timeout ({}ms)", close_timeout.as_millis()),
                }
                info!("Connection closed");
                break;
            }
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    trace!(%frame, "Sending frame");
                    if let Err(e) = write.send(Message::text(frame)).await {
                        warn!(error = %e, "Send failed, dropping connection");
                        break;
                    }
                }
                None => {
                    debug!("Command queue closed");
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => publish(&codec, text.as_str(), &updates),
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Controller closed the connection");
                    break;
                }
                Some(Ok(other)) => trace!(?other, "Ignoring non-text frame"),
                Some(Err(e)) => {
                    warn!(error = %e, "Connection error");
                    break;
                }
                None => {
                    info!("Connection stream ended");
                    break;
                }
            },
        }
    }

    state.send_replace(ConnectionState::Disconnected);
}

/// TCP connect plus WebSocket upgrade, bounded by `timeout`.
async fn open(url: &str, timeout: Duration) -> Result<WsStream, ConnectionError> {
    let request = url
        .into_client_request()
        .map_err(|e| ConnectionError::InvalidUrl(e.to_string()))?;

    match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request)).await {
        Ok(Ok((ws_stream, _response))) => Ok(ws_stream),
        Ok(Err(e)) => Err(ConnectionError::Handshake(e.to_string())),
        Err(_) => Err(ConnectionError::ConnectionTimeout(timeout.as_millis() as u64)),
    }
}

/// Decode one text frame and hand it to every subscriber.
fn publish(codec: &ProtocolCodec, frame: &str, updates: &broadcast::Sender<Inbound>) {
    trace!(%frame, "Received frame");

    match codec.decode(frame) {
        Ok(message) => {
            // No subscribers is fine; the frame is simply not observed.
            let _ = updates.send(message);
        }
        Err(e) => debug!(error = %e, %frame, "Dropping undecodable frame"),
    }
}
