//! Shared vocabulary for the PACSIS door controller client.
//!
//! Every other crate in the workspace builds on the identifiers, the
//! tri-state peripheral state and the constants defined here.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
