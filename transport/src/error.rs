//! Error types for the transport layer.

use std::io;

/// Errors that can occur while framing simulator messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The header section contained invalid UTF-8.
    #[error("invalid UTF-8 in header")]
    InvalidUtf8,

    /// The Content-Length header value could not be parsed as an integer.
    #[error("malformed Content-Length header value")]
    MalformedContentLength,

    /// No Content-Length header was found in the message.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The message body exceeds the configured maximum size.
    #[error("message size {size} exceeds maximum allowed {max}")]
    MessageTooLarge {
        /// The actual message size.
        size: usize,
        /// The maximum allowed size.
        max: usize,
    },

    /// Failed to serialize an outgoing command to JSON.
    #[error("JSON serialization failed: {0}")]
    JsonSerialize(#[source] serde_json::Error),
}

/// Errors surfaced to callers of [`crate::Client`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection to the simulator is gone. Commands sent after this
    /// fail immediately instead of queueing.
    #[error("connection to the simulator lost")]
    ConnectionLost,
}
