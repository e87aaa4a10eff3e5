//! Async simulator transport layer using tokio.
//!
//! This crate provides the transport layer for the ARM simulator
//! protocol: framing of messages over async byte streams, typed commands
//! and updates, and a connection actor that upper layers drive without
//! touching async code themselves.
//!
//! # Architecture
//!
//! The crate is designed around the tokio-util codec pattern:
//!
//! - [`SimCodec`] implements `Encoder` for [`Command`]s and `Decoder` for
//!   update [`Batch`]es
//! - [`UpdateReader`] wraps an `AsyncRead` to produce a `Stream` of batches
//! - [`CommandWriter`] wraps an `AsyncWrite` to provide a `Sink` for
//!   outgoing commands
//! - [`Client`] owns a connection end to end: it dials in the background,
//!   queues commands sent before the socket opens, and forwards decoded
//!   batches to a channel
//!
//! # Wire format
//!
//! Each frame is a Content-Length header followed by a JSON body. Bodies
//! sent by the simulator are batches of tagged tuples:
//!
//! ```text
//! Content-Length: 31\r\n
//! \r\n
//! [["debugline", 4], ["r0", "2a"]]
//! ```
//!
//! Commands travel the other way as single tagged tuples, one per frame.
//!
//! # Scope
//!
//! This crate intentionally handles only transport concerns:
//! - Encoding outgoing commands to the wire format
//! - Decoding and validating incoming frames into typed updates
//! - Connection lifecycle: queued sends, connectivity loss
//!
//! Routing updates to view regions, mode gating, and everything else that
//! gives the messages meaning belongs in upstream crates (e.g. `viewsync`).

mod client;
mod codec;
mod commands;
mod error;
mod reader;
mod transport;
mod types;
mod updates;
mod writer;

pub mod testing;

// Re-export main types
pub use client::{Client, ClientEvent, ConnectionState};
pub use codec::SimCodec;
pub use commands::{Command, InterruptKind, Language, StepMode};
pub use error::{CodecError, TransportError};
pub use reader::UpdateReader;
pub use transport::{SimTransport, split};
pub use types::{
    Address, Bank, HighlightKind, HighlightTarget, Line, MemoryAccess, MemoryRow, ROW_BYTES,
    format_hex_u32, parse_hex_byte, parse_hex_u32,
};
pub use updates::{Batch, Update, decode_frame, decode_tuple};
pub use writer::CommandWriter;

use std::io;
use tokio::net::{TcpStream, ToSocketAddrs};

/// The port the simulator backend listens on by default.
pub const DEFAULT_SIM_PORT: u16 = 31415;

/// Connect to a simulator and return a reader/writer pair.
///
/// This is the low-level entry point for callers who want to drive the
/// streams themselves; most callers want [`Client::connect`] instead.
///
/// # Example
///
/// ```ignore
/// let (reader, writer) = transport::connect("127.0.0.1:31415").await?;
/// ```
pub async fn connect(
    addr: impl ToSocketAddrs,
) -> io::Result<(
    UpdateReader<tokio::net::tcp::OwnedReadHalf>,
    CommandWriter<tokio::net::tcp::OwnedWriteHalf>,
)> {
    let stream = TcpStream::connect(addr).await?;
    Ok(split(stream))
}
