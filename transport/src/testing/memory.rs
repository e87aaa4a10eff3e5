//! In-memory transport for testing.

use tokio::io::{DuplexStream, duplex};

use crate::transport::SimTransport;

/// An in-memory transport for testing simulator communication.
///
/// `MemoryTransport` uses tokio's [`DuplexStream`] to provide a
/// bidirectional in-memory channel that can be split into read and write
/// halves.
///
/// # Example
///
/// ```
/// use transport::split;
/// use transport::testing::MemoryTransport;
///
/// // Create a connected pair of transports
/// let (client_transport, server_transport) = MemoryTransport::pair();
///
/// // Split into reader/writer pairs
/// let (client_reader, client_writer) = split(client_transport);
/// let (server_reader, server_writer) = split(server_transport);
///
/// // Now client_writer -> server_reader and server_writer -> client_reader
/// ```
pub struct MemoryTransport {
    read: DuplexStream,
    write: DuplexStream,
}

impl MemoryTransport {
    /// Create a connected pair of in-memory transports.
    ///
    /// Bytes written on one transport are read from the other, simulating
    /// a bidirectional connection.
    ///
    /// Uses a default buffer size of 64KB for each direction.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_buffer_size(64 * 1024)
    }

    /// Create a connected pair with a custom buffer size.
    ///
    /// Smaller buffers can be useful for testing backpressure behavior.
    pub fn pair_with_buffer_size(buffer_size: usize) -> (Self, Self) {
        let (a_to_b_write, a_to_b_read) = duplex(buffer_size);
        let (b_to_a_write, b_to_a_read) = duplex(buffer_size);

        let transport_a = MemoryTransport {
            read: b_to_a_read,
            write: a_to_b_write,
        };

        let transport_b = MemoryTransport {
            read: a_to_b_read,
            write: b_to_a_write,
        };

        (transport_a, transport_b)
    }
}

impl SimTransport for MemoryTransport {
    type Read = DuplexStream;
    type Write = DuplexStream;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
