//! Connection actor and client handle.
//!
//! [`Client`] owns the lifecycle of one simulator connection. The handle
//! itself is cheap to clone and fully synchronous; an actor task spawned at
//! construction dials the simulator, drains the command queue, and forwards
//! decoded update batches to the channel the caller provided.
//!
//! Commands sent before the connection is open queue up and flush, in
//! order, once the socket is ready. After the connection is lost, sends
//! fail immediately with [`TransportError::ConnectionLost`] instead of
//! queueing forever.

use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::commands::Command;
use crate::error::TransportError;
use crate::transport::{SimTransport, split};
use crate::updates::Batch;

/// Delay between connection attempts while the simulator is not reachable.
const DIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connection attempts before giving up and reporting the connection lost.
const DIAL_ATTEMPTS: u32 = 20;

/// Lifecycle of the simulator connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The actor is still dialing. Commands queue.
    Connecting,
    /// The socket is up. Commands flush as they are sent.
    Open,
    /// The connection is gone and will not come back on its own.
    Closed,
}

/// Events delivered to the channel passed to [`Client::connect`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The socket is open. Sent at most once, before any batch.
    Connected,
    /// One decoded frame, with tuple order preserved.
    Batch(Batch),
    /// The connection is gone. Sent at most once, after which no further
    /// events arrive.
    ConnectionLost { reason: String },
}

/// Handle to the simulator connection.
///
/// # Example
///
/// ```ignore
/// use tokio::sync::mpsc;
/// use transport::{Client, ClientEvent, Command};
///
/// let (events_tx, mut events_rx) = mpsc::unbounded_channel();
/// let client = Client::connect("127.0.0.1:31415", events_tx);
///
/// // Queues until the socket is open, then flushes in order.
/// client.send(Command::Reset)?;
///
/// while let Some(event) = events_rx.recv().await {
///     match event {
///         ClientEvent::Batch(batch) => { /* route updates */ }
///         ClientEvent::Connected => {}
///         ClientEvent::ConnectionLost { reason } => break,
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl Client {
    /// Connect to a simulator over TCP.
    ///
    /// Returns immediately; dialing happens on a background task. Must be
    /// called from within a tokio runtime.
    pub fn connect(addr: impl Into<String>, events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        let addr = addr.into();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        tokio::spawn(async move {
            match dial(&addr).await {
                Some(stream) => run_session(stream, command_rx, events, state_tx).await,
                None => {
                    warn!(%addr, "giving up connecting to the simulator");
                    let _ = state_tx.send(ConnectionState::Closed);
                    let _ = events.send(ClientEvent::ConnectionLost {
                        reason: format!("could not reach the simulator at {addr}"),
                    });
                }
            }
        });

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Drive an already established transport.
    ///
    /// This is how tests plug in an in-memory transport; TCP callers want
    /// [`Client::connect`]. Must be called from within a tokio runtime.
    pub fn from_transport<T: SimTransport>(
        transport: T,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        tokio::spawn(run_session(transport, command_rx, events, state_tx));

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Queue a command for the simulator.
    ///
    /// Never blocks. While the connection is still being established the
    /// command waits in the queue; once the connection has been lost this
    /// fails immediately.
    pub fn send(&self, command: Command) -> Result<(), TransportError> {
        if *self.state.borrow() == ConnectionState::Closed {
            return Err(TransportError::ConnectionLost);
        }
        self.commands
            .send(command)
            .map_err(|_| TransportError::ConnectionLost)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

/// Dial the simulator, retrying on a fixed delay while it is unreachable.
async fn dial(addr: &str) -> Option<TcpStream> {
    for attempt in 1..=DIAL_ATTEMPTS {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, %attempt, "connected to simulator");
                return Some(stream);
            }
            Err(error) => {
                debug!(%addr, %attempt, %error, "simulator not reachable yet");
                sleep(DIAL_RETRY_DELAY).await;
            }
        }
    }
    None
}

/// The connection actor: drains the command queue into the write half and
/// forwards decoded batches from the read half, until either side ends.
async fn run_session<T: SimTransport>(
    transport: T,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
    state: watch::Sender<ConnectionState>,
) {
    let (mut reader, mut writer) = split(transport);

    let _ = state.send(ConnectionState::Open);
    if events.send(ClientEvent::Connected).is_err() {
        debug!("event channel closed before the connection opened");
        let _ = state.send(ConnectionState::Closed);
        return;
    }

    let reason = loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(command) => {
                        debug!(tag = command.tag(), "sending command");
                        if let Err(error) = writer.send(command).await {
                            break Some(format!("send failed: {error}"));
                        }
                    }
                    // Every handle is gone; tear down quietly.
                    None => break None,
                }
            }
            frame = reader.next() => {
                match frame {
                    // Empty batches come from recovered-over bodies; there
                    // is nothing to deliver.
                    Some(Ok(batch)) if batch.is_empty() => {}
                    Some(Ok(batch)) => {
                        if events.send(ClientEvent::Batch(batch)).is_err() {
                            debug!("event channel closed");
                            break None;
                        }
                    }
                    Some(Err(error)) => break Some(format!("receive failed: {error}")),
                    None => break Some("connection closed by the simulator".to_string()),
                }
            }
        }
    };

    let _ = state.send(ConnectionState::Closed);
    if let Some(reason) = reason {
        warn!(%reason, "connection lost");
        let _ = events.send(ClientEvent::ConnectionLost { reason });
    }
}
