//! Testing utilities for the transport layer.
//!
//! This module provides helpers for testing code that talks to the
//! simulator, including in-memory transports, a scriptable simulator
//! stub, and message framing utilities.

mod memory;
mod stub;

pub use memory::MemoryTransport;
pub use stub::SimulatorStub;

use serde::Serialize;

/// Construct a valid wire frame from a JSON-serializable body.
///
/// This is useful for constructing test data that can be fed to an
/// [`crate::UpdateReader`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use transport::testing::frame_message;
///
/// let bytes = frame_message(&json!([["nextline", 3]]));
///
/// assert!(bytes.starts_with(b"Content-Length: "));
/// ```
pub fn frame_message(msg: &impl Serialize) -> Vec<u8> {
    let json = serde_json::to_string(msg).expect("failed to serialize message");
    format!("Content-Length: {}\r\n\r\n{}", json.len(), json).into_bytes()
}

/// Construct multiple wire frames concatenated together.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use transport::testing::frame_messages;
///
/// let bytes = frame_messages(&[
///     json!([["debugline", 3]]),
///     json!([["debugline", 4]]),
/// ]);
/// ```
pub fn frame_messages<T: Serialize>(msgs: &[T]) -> Vec<u8> {
    msgs.iter().flat_map(|m| frame_message(m)).collect()
}
