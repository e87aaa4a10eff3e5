//! Transport abstraction and split functionality.
//!
//! This module provides the [`SimTransport`] trait for abstracting over
//! different async byte streams, and the [`split`] function for creating
//! reader/writer pairs.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::reader::UpdateReader;
use crate::writer::CommandWriter;

/// A transport that can be split into separate read and write halves.
///
/// This trait abstracts over different async transports (TCP, in-memory
/// streams) to provide a uniform interface for the protocol layer.
pub trait SimTransport: Send + 'static {
    /// The read half type.
    type Read: AsyncRead + Unpin + Send + 'static;
    /// The write half type.
    type Write: AsyncWrite + Unpin + Send + 'static;

    /// Split the transport into separate read and write halves.
    fn into_split(self) -> (Self::Read, Self::Write);
}

impl SimTransport for TcpStream {
    type Read = OwnedReadHalf;
    type Write = OwnedWriteHalf;

    fn into_split(self) -> (Self::Read, Self::Write) {
        TcpStream::into_split(self)
    }
}

/// Split a transport into an update reader and command writer pair.
///
/// The returned reader and writer can be used independently and
/// concurrently, which is how [`crate::Client`] drives them.
///
/// # Example
///
/// ```ignore
/// use transport::split;
/// use tokio::net::TcpStream;
///
/// let stream = TcpStream::connect("127.0.0.1:31415").await?;
/// let (reader, writer) = split(stream);
/// ```
pub fn split<T: SimTransport>(transport: T) -> (UpdateReader<T::Read>, CommandWriter<T::Write>) {
    let (read, write) = transport.into_split();
    (UpdateReader::new(read), CommandWriter::new(write))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify that TcpStream implements SimTransport (compile-time check)
    fn _assert_tcp_transport(_: impl SimTransport) {}

    fn _check_tcp() {
        fn make_stream() -> TcpStream {
            unimplemented!()
        }
        _assert_tcp_transport(make_stream());
    }
}
