//! Current and next execution line markers.

use transport::Line;

/// Tracks the two execution markers in the editor and decides when the
/// view should scroll.
///
/// The backend repeats the current line on almost every step, so blindly
/// scrolling on every message would pin the editor in place. A scroll is
/// only requested when the reported line differs from the last one that
/// was shown; a cleared marker keeps the last line on record so that a
/// later repeat of the same line stays quiet.
#[derive(Debug, Default)]
pub struct DebugPosition {
    current: Option<Line>,
    next: Option<Line>,
    last_shown: Option<Line>,
}

impl DebugPosition {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Move the current-line marker. Returns the line to scroll to, if
    /// the caller should scroll at all.
    pub(crate) fn set_current(&mut self, line: Option<Line>, follow: bool) -> Option<Line> {
        match line {
            Some(line) => {
                self.current = Some(line);
                let changed = self.last_shown != Some(line);
                self.last_shown = Some(line);
                if changed && follow { Some(line) } else { None }
            }
            None => {
                // Marker removed; the recorded line survives on purpose.
                self.current = None;
                None
            }
        }
    }

    pub(crate) fn set_next(&mut self, line: Option<Line>) {
        self.next = line;
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
        self.next = None;
        self.last_shown = None;
    }

    /// Line of the instruction about to execute.
    pub fn current(&self) -> Option<Line> {
        self.current
    }

    /// Line that will execute after the current one.
    pub fn next(&self) -> Option<Line> {
        self.next
    }
}
