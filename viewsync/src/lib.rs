//! View synchronization for the ARM simulator.
//!
//! The simulator backend owns all execution state and streams view
//! updates over the wire; this crate turns that stream into a coherent,
//! queryable view model. A [`Synchronizer`] drives one connection:
//!
//! * updates are applied in arrival order, one batch at a time, by a
//!   background task;
//! * each view region (editor annotations, breakpoints, debug position,
//!   memory grid, register fields, banner) keeps its own state under
//!   [`ViewState`];
//! * frontends learn about changes through [`ViewEvent`]s and read
//!   state with [`Synchronizer::with_view`];
//! * a [`Mode`] gate keeps run-time-only updates from leaking into the
//!   editor after the user stops the simulation.
//!
//! ```no_run
//! # fn main() -> eyre::Result<()> {
//! use viewsync::{FieldRegistry, SyncConfig, Synchronizer};
//!
//! let sync = Synchronizer::connect_default(
//!     SyncConfig::default(),
//!     FieldRegistry::simulator_defaults(),
//! )?;
//! sync.start("mov r0, #42", transport::Language::Arm)?;
//! for event in sync.events() {
//!     // redraw the affected region
//!     # let _ = event;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod events;
mod internals;
mod mode;
mod synchronizer;
pub mod views;

pub use config::{InterruptConfig, SyncConfig};
pub use events::{Region, ViewEvent};
pub use mode::{InputSurfaces, Mode, input_surfaces};
pub use synchronizer::Synchronizer;
pub use views::{
    Annotation, Annotations, Banner, Breakpoints, CellView, DebugPosition, FieldRegistry,
    FieldSpec, Fields, MemoryGrid, Overlay, RowView, Severity, ValueFormat, ViewState,
    format_value,
};
