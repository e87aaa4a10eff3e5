//! The synchronizer handle shared by frontends.

use std::sync::{Arc, Mutex};

use eyre::WrapErr;
use tokio::sync::mpsc;
use tracing::debug;
use transport::{
    Address, Client, ClientEvent, DEFAULT_SIM_PORT, Language, Line, MemoryAccess, StepMode,
};

use crate::config::SyncConfig;
use crate::events::ViewEvent;
use crate::internals::SyncInternals;
use crate::mode::{InputSurfaces, Mode};
use crate::views::{FieldRegistry, ValueFormat, ViewState};

/// Keeps the view model in lockstep with a running simulator.
///
/// The handle is cheap to share: all state lives behind a mutex, and a
/// background task applies incoming batches in arrival order. Frontends
/// subscribe to [`ViewEvent`]s via [`Synchronizer::events`] and read the
/// current state through [`Synchronizer::with_view`].
pub struct Synchronizer {
    internals: Arc<Mutex<SyncInternals>>,
    rx: crossbeam_channel::Receiver<ViewEvent>,
    processor: Option<tokio::task::JoinHandle<()>>,
    _runtime: Option<tokio::runtime::Runtime>,
}

impl Synchronizer {
    /// Connect to a simulator over TCP, bringing up a runtime of our own.
    ///
    /// The connection is established in the background; commands sent in
    /// the meantime are queued and flushed once it opens.
    #[tracing::instrument(skip(addr, config, registry))]
    pub fn connect(
        addr: impl Into<String>,
        config: SyncConfig,
        registry: FieldRegistry,
    ) -> eyre::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("creating tokio runtime")?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut sync = {
            let _guard = runtime.enter();
            let client = Client::connect(addr, events_tx);
            Self::attach(client, events_rx, config, registry)
        };
        sync._runtime = Some(runtime);
        Ok(sync)
    }

    /// Connect to a simulator on the default port on localhost.
    #[tracing::instrument(skip(config, registry))]
    pub fn connect_default(config: SyncConfig, registry: FieldRegistry) -> eyre::Result<Self> {
        Self::connect(format!("127.0.0.1:{DEFAULT_SIM_PORT}"), config, registry)
    }

    /// Drive an existing client. Must be called from within a tokio
    /// runtime; the caller keeps ownership of that runtime.
    pub fn attach(
        client: Client,
        events: mpsc::UnboundedReceiver<ClientEvent>,
        config: SyncConfig,
        registry: FieldRegistry,
    ) -> Self {
        let (publisher, rx) = crossbeam_channel::unbounded();
        let internals = Arc::new(Mutex::new(SyncInternals::new(
            client, publisher, config, registry,
        )));

        let background_internals = Arc::clone(&internals);
        let processor = tokio::spawn(async move {
            process_events(background_internals, events).await;
        });

        Self {
            internals,
            rx,
            processor: Some(processor),
            _runtime: None,
        }
    }

    /// Channel of view change notifications, in the order the changes
    /// were applied.
    pub fn events(&self) -> crossbeam_channel::Receiver<ViewEvent> {
        self.rx.clone()
    }

    /// Read the view state under the lock.
    pub fn with_view<T>(&self, f: impl FnOnce(&ViewState) -> T) -> T {
        let internals = self.internals.lock().unwrap();
        f(internals.view())
    }

    pub fn mode(&self) -> Mode {
        self.internals.lock().unwrap().mode()
    }

    /// Whether the last mode change is still waiting for the backend.
    pub fn is_mode_provisional(&self) -> bool {
        self.internals.lock().unwrap().is_mode_provisional()
    }

    pub fn is_connected(&self) -> bool {
        self.internals.lock().unwrap().is_connected()
    }

    pub fn input_surfaces(&self) -> InputSurfaces {
        self.internals.lock().unwrap().input_surfaces()
    }

    /// Instruction address a source line assembled to, if any.
    pub fn address_of_line(&self, line: Line) -> Option<Address> {
        self.internals.lock().unwrap().address_of_line(line)
    }

    /// Assemble the given source and enter run mode.
    pub fn start(&self, source: &str, language: Language) -> eyre::Result<()> {
        self.internals.lock().unwrap().start(source, language)
    }

    /// Stop the simulation and return to edit mode.
    pub fn stop(&self) -> eyre::Result<()> {
        self.internals.lock().unwrap().stop()
    }

    /// Advance the simulation.
    pub fn step(&self, mode: StepMode) -> eyre::Result<()> {
        self.internals.lock().unwrap().step(mode)
    }

    /// Rewind the simulation to its initial state without reassembling.
    pub fn reset_simulator(&self) -> eyre::Result<()> {
        self.internals.lock().unwrap().reset_simulator()
    }

    /// Toggle an instruction breakpoint. Returns whether the line now
    /// has one.
    pub fn toggle_breakpoint(&self, line: Line) -> eyre::Result<bool> {
        self.internals.lock().unwrap().toggle_breakpoint(line)
    }

    /// Ask the backend to toggle a memory breakpoint; the resulting set
    /// comes back as an update.
    pub fn set_memory_breakpoint(&self, addr: Address, access: MemoryAccess) -> eyre::Result<()> {
        self.internals
            .lock()
            .unwrap()
            .set_memory_breakpoint(addr, access)
    }

    /// Submit a memory cell edit, e.g. `"ff"` typed into the grid.
    pub fn edit_memory_cell(&self, addr: Address, text: &str) -> eyre::Result<()> {
        self.internals.lock().unwrap().edit_memory_cell(addr, text)
    }

    pub fn set_value_format(&self, format: ValueFormat) {
        self.internals.lock().unwrap().set_value_format(format);
    }

    pub fn set_follow_pc(&self, follow: bool) {
        self.internals.lock().unwrap().set_follow_pc(follow);
    }

    /// Track the pointer over the memory grid; `None` leaves it.
    pub fn set_hover(&self, addr: Option<Address>) {
        self.internals.lock().unwrap().set_hover(addr);
    }

    /// Turn the memory grid to the page containing `addr`.
    pub fn jump_to_address(&self, addr: Address) {
        self.internals.lock().unwrap().jump_to_address(addr);
    }

    pub fn set_memory_page(&self, page: usize) {
        self.internals.lock().unwrap().set_memory_page(page);
    }

    pub fn dismiss_notice(&self) {
        self.internals.lock().unwrap().dismiss_notice();
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        // The processor holds a clone of the internals Arc; stop it so
        // the state is actually released.
        if let Some(processor) = self.processor.take() {
            processor.abort();
        }
    }
}

async fn process_events(
    internals: Arc<Mutex<SyncInternals>>,
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
) {
    while let Some(event) = events.recv().await {
        internals.lock().unwrap().handle_client_event(event);
    }
    debug!("client event stream ended");
}
