//! Command writer.
//!
//! This module provides [`CommandWriter`], a typed wrapper around a framed
//! async writer for sending commands to the simulator.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Sink;
use pin_project_lite::pin_project;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::SimCodec;
use crate::commands::Command;
use crate::error::CodecError;

pin_project! {
    /// An async sink for outgoing commands.
    ///
    /// `CommandWriter` wraps an [`AsyncWrite`] destination and encodes
    /// commands to the wire format. It provides a simple `send` method
    /// for common usage.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use transport::{Command, CommandWriter};
    ///
    /// let mut writer = CommandWriter::new(tcp_write_half);
    /// writer.send(Command::Reset).await?;
    /// ```
    pub struct CommandWriter<W> {
        #[pin]
        inner: FramedWrite<W, SimCodec>,
    }
}

impl<W> CommandWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a new command writer from an async write destination.
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(writer, SimCodec::new()),
        }
    }

    /// Create a new command writer with a custom codec.
    pub fn with_codec(writer: W, codec: SimCodec) -> Self {
        Self {
            inner: FramedWrite::new(writer, codec),
        }
    }

    /// Send a command to the simulator.
    ///
    /// This is a convenience method that handles the full send cycle:
    /// feeding the command, flushing, and awaiting completion.
    pub async fn send(&mut self, command: Command) -> Result<(), CodecError> {
        use futures::SinkExt;
        SinkExt::send(&mut self.inner, command).await
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Get a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        self.inner.get_mut()
    }

    /// Consume the writer and return the underlying destination.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W> Sink<Command> for CommandWriter<W>
where
    W: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Command) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}
