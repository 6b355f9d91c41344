//! # Networking Error Types
//!
//! All errors that can occur between two peers.

use thiserror::Error;

/// Errors that can occur in the networking layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The connect attempt failed or timed out.
    #[error("failed to connect to {addr}: {reason}")]
    ConnectFailure {
        /// Address that was dialled.
        addr: String,
        /// OS error text.
        reason: String,
    },

    /// The peer runs a different protocol version.
    #[error("incompatible versions (peer {peer}, local {local})")]
    ProtocolVersionMismatch {
        /// Version the peer announced.
        peer: String,
        /// Our version.
        local: String,
    },

    /// Bytes or content that do not decode.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A type tag this build does not know.
    #[error("unsupported message type \"{0}\"")]
    UnsupportedMessageType(String),

    /// The stream failed underneath us.
    #[error("transport error: {0}")]
    Transport(String),

    /// The link is closed; nothing more can be sent.
    #[error("peer disconnected")]
    Disconnected,
}

impl From<std::io::Error> for NetError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for networking operations.
pub type NetResult<T> = Result<T, NetError>;
