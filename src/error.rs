//! Error types for defendum-link

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// defendum-link error types
///
/// Nothing here is fatal to the robot: connection and read errors are
/// retried by the receive loop, malformed frames are dropped and logged,
/// and map errors are reported to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to establish the server connection (retried)
    #[error("Connection failed: {0}")]
    Connection(std::io::Error),

    /// Read failure on an established connection (drives a disconnect)
    #[error("Read error: {0}")]
    Read(std::io::Error),

    /// Write failure on an established connection (sender sees it
    /// immediately, the receive loop drives the state transition)
    #[error("Write error: {0}")]
    Write(std::io::Error),

    /// Remote closed the connection in an orderly fashion
    #[error("Connection closed by remote")]
    Closed,

    /// Send attempted while the link is down (fail fast, never block)
    #[error("Link not connected")]
    NotConnected,

    /// Frame rejected during decode
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Map write outside the grid extent
    #[error("Position ({x}, {y}) outside map bounds")]
    OutOfBounds {
        /// Physical x of the rejected write
        x: i16,
        /// Physical y of the rejected write
        y: i16,
    },

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic I/O error (config file handling)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
