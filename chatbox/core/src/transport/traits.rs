//! Transport Traits
//!
//! The chatbox core pushes every frame through a single [`SendPrimitive`].
//! Implementations own the wire: UDP for a live client, an in-memory recorder
//! for tests and headless embedding.

use std::io;

use thiserror::Error;

use super::osc::OscMessage;

/// Errors that can occur during transport operations
///
/// These never escape the chatbox controller: they are logged at the transmit
/// call site and the message is treated as lost.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured target cannot be used (empty host, port 0, ...)
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The host name did not resolve to any address
    #[error("Failed to resolve {target}: {source}")]
    Resolve {
        /// The `host:port` that was looked up
        target: String,
        /// The underlying resolver error
        source: io::Error,
    },

    /// Failed to send a packet
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// OSC encoding or decoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error from the underlying socket
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The outbound send primitive consumed by the chatbox core
///
/// Contract: `send` must not block. It may fail, in which case the caller logs
/// the error and drops the message; there is no retry.
pub trait SendPrimitive: Send + Sync {
    /// Send one OSC message
    fn send(&self, message: &OscMessage) -> Result<(), TransportError>;

    /// Human-readable description of where messages go (for logs)
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::InvalidTarget("port 0".to_string());
        assert!(err.to_string().contains("Invalid target"));

        let io_err = io::Error::new(io::ErrorKind::WouldBlock, "buffer full");
        let err = TransportError::from(io_err);
        assert!(err.to_string().contains("IO error"));
    }
}
