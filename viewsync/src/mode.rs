//! The edit/run mode gate.

/// Which side of the edit/run boundary the interface is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The user is writing source; simulation state is stale.
    Edit,
    /// A program is assembled and the simulator drives the view.
    Running,
}

/// Tracks the current mode and whether it has been confirmed.
///
/// User actions switch the mode immediately so the interface feels
/// responsive, but the switch stays provisional until the backend's own
/// traffic confirms it: an `edit_mode` update confirms Edit, and any
/// run-gated update arriving while in Running confirms Running.
#[derive(Debug)]
pub struct ModeGate {
    mode: Mode,
    provisional: bool,
}

impl Default for ModeGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeGate {
    /// The interface starts in Edit, confirmed: that is what a fresh
    /// backend session is in.
    pub fn new() -> Self {
        Self {
            mode: Mode::Edit,
            provisional: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == Mode::Running
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional
    }

    /// User pressed start. Returns true when the mode changed.
    pub(crate) fn request_running(&mut self) -> bool {
        let changed = self.mode != Mode::Running;
        self.mode = Mode::Running;
        self.provisional = true;
        changed
    }

    /// User pressed stop. Returns true when the mode changed.
    pub(crate) fn request_edit(&mut self) -> bool {
        let changed = self.mode != Mode::Edit;
        self.mode = Mode::Edit;
        self.provisional = true;
        changed
    }

    /// The backend says it is in edit mode. Returns true when this was a
    /// transition rather than a confirmation.
    pub(crate) fn confirm_edit(&mut self) -> bool {
        let changed = self.mode != Mode::Edit;
        self.mode = Mode::Edit;
        self.provisional = false;
        changed
    }

    /// Run-gated traffic arrived while in Running, which is as good a
    /// confirmation as the backend gives.
    pub(crate) fn confirm_running(&mut self) {
        if self.mode == Mode::Running {
            self.provisional = false;
        }
    }
}

/// Which groups of controls accept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSurfaces {
    /// The source editor.
    pub editor: bool,
    /// Step, run, and reset buttons.
    pub simulation_controls: bool,
    /// Assembly-time settings like the interrupt generator.
    pub configuration: bool,
    /// In-place edits of memory cells.
    pub memory_edits: bool,
}

/// The enable/disable matrix for the two modes, with everything off once
/// the connection is gone.
pub fn input_surfaces(mode: Mode, connected: bool) -> InputSurfaces {
    if !connected {
        return InputSurfaces {
            editor: false,
            simulation_controls: false,
            configuration: false,
            memory_edits: false,
        };
    }
    match mode {
        Mode::Edit => InputSurfaces {
            editor: true,
            simulation_controls: false,
            configuration: true,
            memory_edits: false,
        },
        Mode::Running => InputSurfaces {
            editor: false,
            simulation_controls: true,
            configuration: false,
            memory_edits: true,
        },
    }
}
