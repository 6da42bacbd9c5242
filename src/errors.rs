use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Fatal: the generator cannot start with these parameters
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single send failed. The run loop logs it and moves on.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("malformed packet: {0}")]
    MalformedPacket(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedPacket(msg.into())
    }
}
