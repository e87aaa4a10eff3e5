//! Message routing and view mutation.
//!
//! [`SyncInternals`] is the single writer of the view state. The
//! processor task feeds it decoded client events under the
//! synchronizer's lock, and user actions call into it the same way.
//! Updates within a batch are applied strictly in order, each to
//! completion, so no frontend ever observes a half-applied batch.

use eyre::WrapErr;
use tracing::{debug, warn};
use transport::{
    Address, Client, ClientEvent, Command, HighlightTarget, Language, Line, MemoryAccess,
    StepMode, Update,
};

use crate::config::{InterruptConfig, SyncConfig};
use crate::events::{Region, ViewEvent};
use crate::mode::{InputSurfaces, Mode, ModeGate, input_surfaces};
use crate::views::{FieldRegistry, Severity, ValueFormat, ViewState};

const CONNECTION_LOST_NOTICE: &str = "connection to the simulator lost";

pub(crate) struct SyncInternals {
    client: Client,
    publisher: crossbeam_channel::Sender<ViewEvent>,
    mode: ModeGate,
    connected: bool,
    follow_pc: bool,
    animation_speed_ms: u32,
    interrupt: Option<InterruptConfig>,
    /// Instruction address for each source line, from the last `line2addr`.
    line_table: Vec<Option<Address>>,
    view: ViewState,
}

impl SyncInternals {
    pub(crate) fn new(
        client: Client,
        publisher: crossbeam_channel::Sender<ViewEvent>,
        config: SyncConfig,
        registry: FieldRegistry,
    ) -> Self {
        let view = ViewState::new(&config, registry);
        Self {
            client,
            publisher,
            mode: ModeGate::new(),
            connected: true,
            follow_pc: config.follow_pc,
            animation_speed_ms: config.animation_speed_ms,
            interrupt: config.interrupt,
            line_table: Vec::new(),
            view,
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn handle_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Connected => debug!("connected to the simulator"),
            ClientEvent::Batch(batch) => {
                for update in batch {
                    self.apply_update(update);
                }
            }
            ClientEvent::ConnectionLost { reason } => self.on_connection_lost(&reason),
        }
    }

    fn apply_update(&mut self, update: Update) {
        match update {
            Update::CodeError { line, message } => {
                if self.view.annotations.push(line, message, Severity::Error) {
                    self.emit(ViewEvent::Updated(Region::Annotations));
                }
            }
            Update::InstructionBreakpoints(lines) => {
                self.view.breakpoints.replace_all(lines);
                self.emit(ViewEvent::Updated(Region::Breakpoints));
            }
            Update::DebugLine(line) => {
                if !self.mode.is_running() {
                    debug!("ignoring debug line while editing");
                    return;
                }
                self.mode.confirm_running();
                // A new position means the previous step's touched cells
                // and fields are stale.
                self.view.memory.clear_highlights();
                self.view.fields.clear_highlights();
                if let Some(line) = self.view.debug_position.set_current(line, self.follow_pc) {
                    self.emit(ViewEvent::ScrollTo(line));
                }
                self.emit(ViewEvent::Updated(Region::DebugPosition));
                self.emit(ViewEvent::Updated(Region::Memory));
                self.emit(ViewEvent::Updated(Region::Fields));
            }
            Update::NextLine(line) => {
                if !self.mode.is_running() {
                    debug!("ignoring next line while editing");
                    return;
                }
                self.mode.confirm_running();
                self.view.debug_position.set_next(Some(line));
                self.emit(ViewEvent::Updated(Region::DebugPosition));
            }
            Update::Highlight { kind, targets } => {
                let mut memory_touched = false;
                let mut fields_touched = false;
                for target in targets {
                    match target {
                        HighlightTarget::Memory(addr) => {
                            self.view.memory.add_highlights(kind, [addr]);
                            memory_touched = true;
                        }
                        HighlightTarget::Field(id) => {
                            fields_touched |= self.view.fields.add_highlight(&id, kind);
                        }
                    }
                }
                if memory_touched {
                    self.emit(ViewEvent::Updated(Region::Memory));
                }
                if fields_touched {
                    self.emit(ViewEvent::Updated(Region::Fields));
                }
            }
            Update::CurrentInstruction(addrs) => {
                if !self.mode.is_running() {
                    debug!("ignoring current instruction while editing");
                    return;
                }
                self.mode.confirm_running();
                let first = addrs.first().copied();
                self.view.memory.set_current_instruction(addrs);
                if self.follow_pc {
                    if let Some(addr) = first {
                        if let Some(page) = self.view.memory.follow(addr) {
                            self.emit(ViewEvent::PageChanged(page));
                        }
                    }
                }
                self.emit(ViewEvent::Updated(Region::Memory));
            }
            Update::MemoryPatch(cells) => {
                self.view.memory.patch(&cells);
                self.emit(ViewEvent::Updated(Region::Memory));
            }
            Update::MemoryLoad(rows) => {
                self.view.memory.load(rows);
                self.emit(ViewEvent::Updated(Region::Memory));
            }
            Update::MemoryBreakpoints { access, addrs } => {
                if access == MemoryAccess::Execute {
                    if !self.mode.is_running() {
                        debug!("ignoring execute breakpoints while editing");
                        return;
                    }
                    self.mode.confirm_running();
                }
                self.view.memory.set_breakpoints(access, addrs);
                self.emit(ViewEvent::Updated(Region::Memory));
            }
            Update::LineTable(table) => {
                self.line_table = table;
                // The backend just (re)entered the simulation and has no
                // breakpoints yet; hand ours over before any further
                // update is processed.
                let lines = self.view.breakpoints.lines();
                if let Err(error) = self.send(Command::InstructionBreakpoints { lines }) {
                    warn!(%error, "failed to re-send instruction breakpoints");
                }
            }
            Update::Banking(bank) => {
                self.view.banner.set_bank(bank);
                self.emit(ViewEvent::Updated(Region::Banner));
            }
            Update::Disassembly(text) => {
                self.view.banner.set_disassembly(text);
                self.emit(ViewEvent::Updated(Region::Banner));
            }
            Update::Error(message) => {
                self.view.banner.set_notice(message.clone());
                self.emit(ViewEvent::Notice(message));
                self.emit(ViewEvent::Updated(Region::Banner));
            }
            Update::DisableField(id) => {
                if self.view.fields.disable(&id) {
                    self.emit(ViewEvent::Updated(Region::Fields));
                }
            }
            Update::EditMode => {
                // The backend can also force this, e.g. when the program
                // ran to completion.
                let was_running = self.mode.confirm_edit();
                if was_running {
                    self.full_reset();
                    self.emit(ViewEvent::ModeChanged(Mode::Edit));
                }
            }
            Update::Field { id, value } => {
                if self.view.fields.set(&id, value) {
                    self.emit(ViewEvent::Updated(Region::Fields));
                }
            }
            Update::Unknown { tag } => {
                tracing::trace!(%tag, "skipping unrecognized update");
            }
        }
    }

    fn on_connection_lost(&mut self, reason: &str) {
        if !self.connected {
            return;
        }
        self.connected = false;
        warn!(%reason, "lost connection to the simulator");
        self.full_reset();
        self.view.banner.set_notice(CONNECTION_LOST_NOTICE.to_string());
        self.emit(ViewEvent::ConnectionLost);
        self.emit(ViewEvent::Notice(CONNECTION_LOST_NOTICE.to_string()));
    }

    fn full_reset(&mut self) {
        self.view.reset();
        self.line_table.clear();
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.publisher.send(event);
    }

    fn send(&mut self, command: Command) -> eyre::Result<()> {
        match self.client.send(command) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.on_connection_lost(&error.to_string());
                Err(error).wrap_err("sending command to the simulator")
            }
        }
    }

    /// Keep actions from touching the view once the connection is gone;
    /// in particular a reset here would wipe the connection-lost notice.
    fn ensure_connected(&self) -> eyre::Result<()> {
        if self.connected {
            Ok(())
        } else {
            eyre::bail!("not connected to the simulator")
        }
    }

    // ---- user actions ----

    /// Begin a run: reset the view, switch to run mode, and submit the
    /// source. Every call starts a fresh run, even from run mode.
    #[tracing::instrument(skip(self, source))]
    pub(crate) fn start(&mut self, source: &str, language: Language) -> eyre::Result<()> {
        self.ensure_connected()?;
        self.mode.request_running();
        self.full_reset();
        self.emit(ViewEvent::ModeChanged(Mode::Running));
        self.send(Command::Assemble {
            source: source.to_string(),
            language,
        })?;
        if let Some(interrupt) = self.interrupt {
            self.send(Command::Interrupt {
                active: true,
                kind: interrupt.kind,
                period: interrupt.period,
                first: interrupt.first,
            })?;
        }
        Ok(())
    }

    /// Leave the simulation. The view resets right away; the backend's
    /// `edit_mode` later confirms the switch.
    #[tracing::instrument(skip(self))]
    pub(crate) fn stop(&mut self) -> eyre::Result<()> {
        self.ensure_connected()?;
        if self.mode.request_edit() {
            self.full_reset();
            self.emit(ViewEvent::ModeChanged(Mode::Edit));
        }
        self.send(Command::Stop)
    }

    pub(crate) fn step(&mut self, mode: StepMode) -> eyre::Result<()> {
        self.ensure_connected()?;
        if !self.mode.is_running() {
            eyre::bail!("the simulator is not running");
        }
        self.send(Command::Execute {
            mode,
            speed: self.animation_speed_ms,
        })
    }

    pub(crate) fn reset_simulator(&mut self) -> eyre::Result<()> {
        self.ensure_connected()?;
        if !self.mode.is_running() {
            eyre::bail!("the simulator is not running");
        }
        self.send(Command::Reset)
    }

    /// Toggle a gutter breakpoint and push the full set to the backend.
    #[tracing::instrument(skip(self))]
    pub(crate) fn toggle_breakpoint(&mut self, line: Line) -> eyre::Result<bool> {
        self.ensure_connected()?;
        let now_set = self.view.breakpoints.toggle(line);
        self.emit(ViewEvent::Updated(Region::Breakpoints));
        let lines = self.view.breakpoints.lines();
        self.send(Command::InstructionBreakpoints { lines })?;
        Ok(now_set)
    }

    pub(crate) fn set_memory_breakpoint(
        &mut self,
        addr: Address,
        access: MemoryAccess,
    ) -> eyre::Result<()> {
        self.ensure_connected()?;
        if !self.mode.is_running() {
            eyre::bail!("the simulator is not running");
        }
        self.send(Command::MemoryBreakpoint { addr, access })
    }

    /// Submit an in-place edit of one memory cell. The grid is not
    /// changed locally; the authoritative value comes back as a patch.
    pub(crate) fn edit_memory_cell(&mut self, addr: Address, text: &str) -> eyre::Result<()> {
        self.ensure_connected()?;
        if !self.mode.is_running() {
            eyre::bail!("the simulator is not running");
        }
        // The cell editor truncates input to two characters.
        let truncated: String = text.trim().chars().take(2).collect();
        let value = transport::parse_hex_byte(&truncated)
            .ok_or_else(|| eyre::eyre!("{truncated:?} is not a hex byte"))?;
        if self.view.memory.cell(addr).is_none() {
            eyre::bail!(
                "memory at {} is not mapped",
                transport::format_hex_u32(addr)
            );
        }
        self.send(Command::MemoryChange { addr, value })
    }

    pub(crate) fn set_value_format(&mut self, format: ValueFormat) {
        self.view.fields.set_format(format);
        self.emit(ViewEvent::Updated(Region::Fields));
    }

    pub(crate) fn set_follow_pc(&mut self, follow: bool) {
        self.follow_pc = follow;
    }

    pub(crate) fn set_hover(&mut self, addr: Option<Address>) {
        self.view.memory.set_hover(addr);
        self.emit(ViewEvent::Updated(Region::Memory));
    }

    pub(crate) fn jump_to_address(&mut self, addr: Address) {
        let page = self.view.memory.page_of(addr);
        self.change_page(page);
    }

    pub(crate) fn set_memory_page(&mut self, page: usize) {
        self.change_page(page);
    }

    fn change_page(&mut self, page: usize) {
        if self.view.memory.set_page(page) {
            self.emit(ViewEvent::PageChanged(self.view.memory.page()));
            self.emit(ViewEvent::Updated(Region::Memory));
        }
    }

    pub(crate) fn dismiss_notice(&mut self) {
        self.view.banner.dismiss_notice();
        self.emit(ViewEvent::Updated(Region::Banner));
    }

    // ---- reads ----

    pub(crate) fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub(crate) fn is_mode_provisional(&self) -> bool {
        self.mode.is_provisional()
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn input_surfaces(&self) -> InputSurfaces {
        input_surfaces(self.mode.mode(), self.connected)
    }

    pub(crate) fn address_of_line(&self, line: Line) -> Option<Address> {
        self.line_table.get(line).copied().flatten()
    }

    pub(crate) fn view(&self) -> &ViewState {
        &self.view
    }
}
