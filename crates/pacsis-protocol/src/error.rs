use thiserror::Error;

/// Errors raised while building, encoding or decoding protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A required field of a command was empty or zero.
    #[error("{command}: missing required field {field}")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    /// Frame is not valid JSON or does not match any known message.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame exceeds the configured maximum size.
    #[error("Frame of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
