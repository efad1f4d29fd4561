use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid identifier: {message}")]
    InvalidId { message: String },

    #[error("Invalid keypad key: {0:?}")]
    InvalidKeypadKey(char),
}

pub type Result<T> = std::result::Result<T, Error>;
