//! Error types for the gateway

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Unexpected start-of-frame byte on the serial link
    #[error("Bad start-of-frame byte: {0:#04x}")]
    BadSof(u8),

    /// Serial read made no progress for the whole retry budget
    #[error("Serial read retries exhausted mid-frame")]
    RetryExhausted,

    /// Frame body too short or structurally invalid
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
