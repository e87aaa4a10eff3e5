//! Assembler diagnostics shown in the editor gutter.

use transport::Line;

/// Severity of an editor annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One gutter annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub line: Line,
    pub message: String,
    pub severity: Severity,
}

/// Accumulated assembler diagnostics.
///
/// Each incoming diagnostic appends to the list and the full list is
/// what gets rendered, so a frontend never has to diff. With `dedupe`
/// enabled, a second diagnostic for a line that already has one is
/// ignored instead of piling up.
#[derive(Debug)]
pub struct Annotations {
    entries: Vec<Annotation>,
    dedupe: bool,
}

impl Annotations {
    pub(crate) fn new(dedupe: bool) -> Self {
        Self {
            entries: Vec::new(),
            dedupe,
        }
    }

    /// Record a diagnostic. Returns false when deduplication dropped it.
    pub(crate) fn push(&mut self, line: Line, message: String, severity: Severity) -> bool {
        if self.dedupe && self.entries.iter().any(|entry| entry.line == line) {
            return false;
        }
        self.entries.push(Annotation {
            line,
            message,
            severity,
        });
        true
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// The full list to render, in arrival order.
    pub fn entries(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_accumulate_in_order() {
        let mut annotations = Annotations::new(false);
        annotations.push(3, "bad operand".to_string(), Severity::Error);
        annotations.push(7, "unknown mnemonic".to_string(), Severity::Error);
        annotations.push(3, "bad operand".to_string(), Severity::Error);

        let lines: Vec<_> = annotations.entries().iter().map(|a| a.line).collect();
        assert_eq!(lines, vec![3, 7, 3]);
    }

    #[test]
    fn dedupe_keeps_the_first_entry_per_line() {
        let mut annotations = Annotations::new(true);
        assert!(annotations.push(3, "first".to_string(), Severity::Error));
        assert!(!annotations.push(3, "second".to_string(), Severity::Error));

        assert_eq!(annotations.entries().len(), 1);
        assert_eq!(annotations.entries()[0].message, "first");
    }

    #[test]
    fn clear_empties_the_list() {
        let mut annotations = Annotations::new(false);
        annotations.push(1, "oops".to_string(), Severity::Error);
        annotations.clear();
        assert!(annotations.is_empty());
    }
}
