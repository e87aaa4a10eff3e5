//! Instruction breakpoints shown as gutter markers.

use std::collections::BTreeSet;

use transport::Line;

/// The set of source lines carrying an instruction breakpoint.
///
/// This set deliberately survives run/edit transitions and view resets;
/// only an explicit full-set message from the backend or a user toggle
/// changes it.
#[derive(Debug, Default)]
pub struct Breakpoints {
    lines: BTreeSet<Line>,
}

impl Breakpoints {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set, as the backend's full-set message does.
    /// Existing markers not in `lines` disappear.
    pub(crate) fn replace_all(&mut self, lines: impl IntoIterator<Item = Line>) {
        self.lines = lines.into_iter().collect();
    }

    /// Toggle one line. Returns true when the line now has a breakpoint.
    pub(crate) fn toggle(&mut self, line: Line) -> bool {
        if self.lines.remove(&line) {
            false
        } else {
            self.lines.insert(line);
            true
        }
    }

    pub fn contains(&self, line: Line) -> bool {
        self.lines.contains(&line)
    }

    /// Marker lines in ascending order.
    pub fn lines(&self) -> Vec<Line> {
        self.lines.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_all_recreates_the_exact_set() {
        let mut breakpoints = Breakpoints::new();
        breakpoints.toggle(1);
        breakpoints.toggle(9);

        breakpoints.replace_all(vec![4, 2, 4]);
        assert_eq!(breakpoints.lines(), vec![2, 4]);
        assert!(!breakpoints.contains(1));
    }

    #[test]
    fn replacing_twice_with_the_same_list_changes_nothing() {
        let mut breakpoints = Breakpoints::new();
        breakpoints.replace_all(vec![3, 7]);
        let first = breakpoints.lines();

        breakpoints.replace_all(vec![3, 7]);
        assert_eq!(breakpoints.lines(), first);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut breakpoints = Breakpoints::new();
        assert!(breakpoints.toggle(5));
        assert!(breakpoints.contains(5));
        assert!(!breakpoints.toggle(5));
        assert!(!breakpoints.contains(5));
    }

    #[test]
    fn lines_are_ordered() {
        let mut breakpoints = Breakpoints::new();
        for line in [9, 1, 5] {
            breakpoints.toggle(line);
        }
        assert_eq!(breakpoints.lines(), vec![1, 5, 9]);
    }
}
