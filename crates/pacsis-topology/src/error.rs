//! Error types for building a device tree.

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors that reject a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The same identifier is used by two nodes of the installation.
    #[error("Duplicate identifier: {id}")]
    DuplicateId { id: String },

    /// A door declares more than one door monitor.
    #[error("Door {door} has {count} door monitors, at most one is allowed")]
    MultipleDoorMonitors { door: String, count: usize },

    /// The document is not JSON or a door/peripheral has the wrong shape.
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// The document's top level is neither an array nor an object of doors.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl TopologyError {
    /// Create a new duplicate identifier error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Returns `true` if the document could not be parsed at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::InvalidDocument(_))
    }
}
