//! View regions.
//!
//! Each region owns one slice of the interface's state and nothing else.
//! The synchronizer's router is the only writer; frontends read
//! snapshots through [`crate::Synchronizer::with_view`].

mod annotations;
mod banner;
mod breakpoints;
mod debug_position;
mod memory;
mod registers;

pub use annotations::{Annotation, Annotations, Severity};
pub use banner::Banner;
pub use breakpoints::Breakpoints;
pub use debug_position::DebugPosition;
pub use memory::{CellView, MemoryGrid, Overlay, RowView, addr_of, col_of, row_of};
pub use registers::{FieldRegistry, FieldSpec, Fields, ValueFormat, format_value};

use crate::config::SyncConfig;

/// All view state, one field per region.
#[derive(Debug)]
pub struct ViewState {
    pub annotations: Annotations,
    pub breakpoints: Breakpoints,
    pub debug_position: DebugPosition,
    pub memory: MemoryGrid,
    pub fields: Fields,
    pub banner: Banner,
}

impl ViewState {
    pub(crate) fn new(config: &SyncConfig, registry: FieldRegistry) -> Self {
        Self {
            annotations: Annotations::new(config.dedupe_annotations),
            breakpoints: Breakpoints::new(),
            debug_position: DebugPosition::new(),
            memory: MemoryGrid::new(config.rows_per_page),
            fields: Fields::new(registry, config.value_format),
            banner: Banner::new(),
        }
    }

    /// Clear every piece of per-run state.
    ///
    /// Instruction breakpoints are deliberately not part of this: the set
    /// belongs to the source text and carries across runs.
    pub(crate) fn reset(&mut self) {
        self.annotations.clear();
        self.debug_position.clear();
        self.memory.reset();
        self.fields.reset();
        self.banner.reset();
    }
}
