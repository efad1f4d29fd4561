//! Network communication layer for PACSIS
//!
//! This crate owns the persistent WebSocket connection to the door
//! controller. It carries outbound commands and fans inbound updates out to
//! any number of subscribers.
//!
//! # Example
//!
//! ```no_run
//! use pacsis_network::{ConnectionConfig, ConnectionManager};
//! use pacsis_protocol::Command;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = ConnectionManager::new(ConnectionConfig::new("192.168.0.50"));
//! let mut updates = manager.subscribe();
//!
//! manager.connect().await;
//! manager.send(Command::open_door("Door1", "Monitor1"))?;
//!
//! while let Ok(message) = updates.recv().await {
//!     println!("{message:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod connection;

pub use connection::{ConnectionConfig, ConnectionError, ConnectionManager, ConnectionState};
