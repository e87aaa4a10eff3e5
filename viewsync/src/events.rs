//! Events published to interface frontends.

use transport::Line;

use crate::mode::Mode;

/// One slice of the view. Carried by [`ViewEvent::Updated`] so a
/// frontend can re-render just the part that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Annotations,
    Breakpoints,
    DebugPosition,
    Memory,
    Fields,
    Banner,
}

/// Notifications from the synchronizer.
///
/// Everything stateful is read back through
/// [`crate::Synchronizer::with_view`]; events only say that something
/// happened, never carry the state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The interface switched between edit and run mode. The view has
    /// been reset: entering [`Mode::Running`] starts a fresh run, and
    /// entering [`Mode::Edit`] discards the finished one.
    ModeChanged(Mode),
    /// A region's data changed; re-render it.
    Updated(Region),
    /// Bring this source line into view.
    ScrollTo(Line),
    /// The memory viewer jumped to another page.
    PageChanged(usize),
    /// A user-facing message, also stored on the banner.
    Notice(String),
    /// The connection is gone for good and the view has been reset.
    ConnectionLost,
}
