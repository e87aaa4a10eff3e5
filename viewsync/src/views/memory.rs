//! Paginated memory viewer state.
//!
//! The grid holds the byte dump the simulator last sent, one overlay set
//! per decoration kind, and the current page. Overlays are additive: a
//! cell can be a watched address and the one just written at the same
//! time, and the renderer stacks the classes.

use std::collections::{BTreeMap, BTreeSet};

use transport::{Address, HighlightKind, MemoryAccess, MemoryRow, ROW_BYTES, format_hex_u32};

/// Overlay classes a cell can carry, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Read by the last instruction.
    HighlightRead,
    /// Written by the last instruction.
    HighlightWrite,
    BreakRead,
    BreakWrite,
    BreakReadWrite,
    BreakExecute,
    /// Byte of the instruction currently executing.
    CurrentInstruction,
    /// Cell under the pointer.
    Hover,
}

/// Snapshot of one rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub addr: Address,
    /// Two hex digits, or `--` for an unmapped byte.
    pub text: String,
    pub overlays: Vec<Overlay>,
}

/// Snapshot of one rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub base: Address,
    pub label: String,
    pub cells: Vec<CellView>,
}

/// Row index of an address: each row holds [`ROW_BYTES`] bytes.
pub fn row_of(addr: Address) -> u32 {
    addr / ROW_BYTES as u32
}

/// Column of an address within its row.
pub fn col_of(addr: Address) -> usize {
    (addr % ROW_BYTES as u32) as usize
}

/// Inverse of [`row_of`] and [`col_of`].
pub fn addr_of(row: u32, col: usize) -> Address {
    row * ROW_BYTES as u32 + col as u32
}

/// The memory viewer's data and decorations.
#[derive(Debug)]
pub struct MemoryGrid {
    rows_per_page: usize,
    rows: BTreeMap<Address, [Option<u8>; ROW_BYTES]>,
    page: usize,
    highlight_read: BTreeSet<Address>,
    highlight_write: BTreeSet<Address>,
    break_read: BTreeSet<Address>,
    break_write: BTreeSet<Address>,
    break_read_write: BTreeSet<Address>,
    break_execute: BTreeSet<Address>,
    current_instruction: BTreeSet<Address>,
    hover: Option<Address>,
}

impl MemoryGrid {
    pub(crate) fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page: rows_per_page.max(1),
            rows: BTreeMap::new(),
            page: 0,
            highlight_read: BTreeSet::new(),
            highlight_write: BTreeSet::new(),
            break_read: BTreeSet::new(),
            break_write: BTreeSet::new(),
            break_read_write: BTreeSet::new(),
            break_execute: BTreeSet::new(),
            current_instruction: BTreeSet::new(),
            hover: None,
        }
    }

    /// Replace the whole dump, keeping the current page where possible.
    pub(crate) fn load(&mut self, rows: Vec<MemoryRow>) {
        self.rows = rows.into_iter().map(|row| (row.base, row.cells)).collect();
        self.page = self.page.min(self.page_count() - 1);
    }

    /// Apply byte-level changes without touching the page.
    pub(crate) fn patch(&mut self, cells: &[(Address, u8)]) {
        for &(addr, value) in cells {
            let base = addr - col_of(addr) as Address;
            let row = self.rows.entry(base).or_insert([None; ROW_BYTES]);
            row[col_of(addr)] = Some(value);
        }
    }

    /// The byte at `addr`, or `None` for an unmapped cell.
    pub fn cell(&self, addr: Address) -> Option<u8> {
        let base = addr - col_of(addr) as Address;
        self.rows.get(&base).and_then(|row| row[col_of(addr)])
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.rows_per_page).max(1)
    }

    /// Page showing `addr`, assuming the dump starts at address zero.
    pub fn page_of(&self, addr: Address) -> usize {
        addr as usize / (self.rows_per_page * ROW_BYTES)
    }

    /// Switch pages, clamped to the dataset. Returns true when the page
    /// actually changed.
    pub(crate) fn set_page(&mut self, page: usize) -> bool {
        let clamped = page.min(self.page_count() - 1);
        if clamped == self.page {
            false
        } else {
            self.page = clamped;
            true
        }
    }

    /// Follow execution to `addr`: switch page only when the address is
    /// off the current one. Returns the new page when a switch happened.
    pub(crate) fn follow(&mut self, addr: Address) -> Option<usize> {
        let target = self.page_of(addr);
        if target != self.page && self.set_page(target) {
            Some(self.page)
        } else {
            None
        }
    }

    /// Union in freshly touched cells. Cleared by the next step's
    /// position update, not here.
    pub(crate) fn add_highlights(
        &mut self,
        kind: HighlightKind,
        addrs: impl IntoIterator<Item = Address>,
    ) {
        let set = match kind {
            HighlightKind::Read => &mut self.highlight_read,
            HighlightKind::Write => &mut self.highlight_write,
        };
        set.extend(addrs);
    }

    pub(crate) fn clear_highlights(&mut self) {
        self.highlight_read.clear();
        self.highlight_write.clear();
    }

    /// Replace the breakpoint set for one access kind.
    pub(crate) fn set_breakpoints(&mut self, access: MemoryAccess, addrs: Vec<Address>) {
        let set = match access {
            MemoryAccess::Read => &mut self.break_read,
            MemoryAccess::Write => &mut self.break_write,
            MemoryAccess::ReadWrite => &mut self.break_read_write,
            MemoryAccess::Execute => &mut self.break_execute,
        };
        *set = addrs.into_iter().collect();
    }

    pub fn breakpoints(&self, access: MemoryAccess) -> Vec<Address> {
        let set = match access {
            MemoryAccess::Read => &self.break_read,
            MemoryAccess::Write => &self.break_write,
            MemoryAccess::ReadWrite => &self.break_read_write,
            MemoryAccess::Execute => &self.break_execute,
        };
        set.iter().copied().collect()
    }

    pub(crate) fn set_current_instruction(&mut self, addrs: Vec<Address>) {
        self.current_instruction = addrs.into_iter().collect();
    }

    pub(crate) fn set_hover(&mut self, addr: Option<Address>) {
        self.hover = addr;
    }

    /// All decorations on one cell, in rendering order.
    pub fn overlays_at(&self, addr: Address) -> Vec<Overlay> {
        let mut overlays = Vec::new();
        if self.highlight_read.contains(&addr) {
            overlays.push(Overlay::HighlightRead);
        }
        if self.highlight_write.contains(&addr) {
            overlays.push(Overlay::HighlightWrite);
        }
        if self.break_read.contains(&addr) {
            overlays.push(Overlay::BreakRead);
        }
        if self.break_write.contains(&addr) {
            overlays.push(Overlay::BreakWrite);
        }
        if self.break_read_write.contains(&addr) {
            overlays.push(Overlay::BreakReadWrite);
        }
        if self.break_execute.contains(&addr) {
            overlays.push(Overlay::BreakExecute);
        }
        if self.current_instruction.contains(&addr) {
            overlays.push(Overlay::CurrentInstruction);
        }
        if self.hover == Some(addr) {
            overlays.push(Overlay::Hover);
        }
        overlays
    }

    /// Drop everything: dump, decorations, and page.
    pub(crate) fn reset(&mut self) {
        self.rows.clear();
        self.page = 0;
        self.highlight_read.clear();
        self.highlight_write.clear();
        self.break_read.clear();
        self.break_write.clear();
        self.break_read_write.clear();
        self.break_execute.clear();
        self.current_instruction.clear();
        self.hover = None;
    }

    /// Render snapshot of the current page.
    pub fn page_rows(&self) -> Vec<RowView> {
        self.rows
            .iter()
            .skip(self.page * self.rows_per_page)
            .take(self.rows_per_page)
            .map(|(base, cells)| RowView {
                base: *base,
                label: format_hex_u32(*base),
                cells: cells
                    .iter()
                    .enumerate()
                    .map(|(offset, cell)| {
                        let addr = base + offset as Address;
                        CellView {
                            addr,
                            text: match cell {
                                Some(value) => format!("{value:02x}"),
                                None => "--".to_string(),
                            },
                            overlays: self.overlays_at(addr),
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(base: Address, values: &[(usize, u8)]) -> MemoryRow {
        let mut cells = [None; ROW_BYTES];
        for &(col, value) in values {
            cells[col] = Some(value);
        }
        MemoryRow { base, cells }
    }

    fn grid_with_rows(count: u32) -> MemoryGrid {
        let mut grid = MemoryGrid::new(20);
        let rows = (0..count)
            .map(|i| row(i * ROW_BYTES as Address, &[(0, i as u8)]))
            .collect();
        grid.load(rows);
        grid
    }

    #[test]
    fn row_and_column_math() {
        assert_eq!(row_of(0x0000), 0);
        assert_eq!(col_of(0x0000), 0);
        assert_eq!(row_of(0x1234), 0x123);
        assert_eq!(col_of(0x1234), 4);
        for addr in [0u32, 5, 16, 17, 0xffff_fff0] {
            assert_eq!(addr_of(row_of(addr), col_of(addr)), addr);
        }
    }

    #[test]
    fn page_math_follows_row_count() {
        let grid = grid_with_rows(60);
        assert_eq!(grid.page_count(), 3);
        assert_eq!(grid.page_of(0), 0);
        assert_eq!(grid.page_of(319), 0);
        assert_eq!(grid.page_of(320), 1);
        assert_eq!(grid.page_of(640), 2);
    }

    #[test]
    fn follow_switches_page_only_when_needed() {
        let mut grid = grid_with_rows(60);
        assert_eq!(grid.follow(0x10), None);
        assert_eq!(grid.page(), 0);

        assert_eq!(grid.follow(320), Some(1));
        assert_eq!(grid.page(), 1);

        // Already on the right page.
        assert_eq!(grid.follow(400), None);
    }

    #[test]
    fn patch_updates_cells_without_changing_the_page() {
        let mut grid = grid_with_rows(60);
        grid.set_page(2);

        grid.patch(&[(0x14, 0xab), (0x15, 0xcd)]);
        assert_eq!(grid.cell(0x14), Some(0xab));
        assert_eq!(grid.cell(0x15), Some(0xcd));
        assert_eq!(grid.page(), 2);
    }

    #[test]
    fn load_replaces_the_dump_and_clamps_the_page() {
        let mut grid = grid_with_rows(60);
        grid.set_page(2);

        grid.load(vec![row(0, &[(3, 0x42)])]);
        assert_eq!(grid.page(), 0);
        assert_eq!(grid.cell(3), Some(0x42));
        assert_eq!(grid.cell(0x100), None);
    }

    #[test]
    fn overlays_stack_in_a_fixed_order() {
        let mut grid = grid_with_rows(1);
        grid.add_highlights(HighlightKind::Write, [0x04]);
        grid.set_breakpoints(MemoryAccess::ReadWrite, vec![0x04]);
        grid.set_hover(Some(0x04));

        assert_eq!(
            grid.overlays_at(0x04),
            vec![
                Overlay::HighlightWrite,
                Overlay::BreakReadWrite,
                Overlay::Hover
            ]
        );
    }

    #[test]
    fn highlights_union_until_cleared() {
        let mut grid = grid_with_rows(1);
        grid.add_highlights(HighlightKind::Read, [0x00]);
        grid.add_highlights(HighlightKind::Read, [0x01]);
        assert_eq!(grid.overlays_at(0x00), vec![Overlay::HighlightRead]);
        assert_eq!(grid.overlays_at(0x01), vec![Overlay::HighlightRead]);

        grid.clear_highlights();
        assert!(grid.overlays_at(0x00).is_empty());
    }

    #[test]
    fn page_rows_renders_labels_and_placeholders() {
        let mut grid = MemoryGrid::new(20);
        grid.load(vec![row(0x20, &[(0, 0xde), (1, 0xad)])]);

        let rows = grid.page_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "0x00000020");
        assert_eq!(rows[0].cells[0].text, "de");
        assert_eq!(rows[0].cells[1].text, "ad");
        assert_eq!(rows[0].cells[2].text, "--");
        assert_eq!(rows[0].cells.len(), ROW_BYTES);
    }

    #[test]
    fn reset_drops_everything() {
        let mut grid = grid_with_rows(60);
        grid.set_page(2);
        grid.add_highlights(HighlightKind::Read, [0x00]);
        grid.set_breakpoints(MemoryAccess::Execute, vec![0x08]);

        grid.reset();
        assert_eq!(grid.page(), 0);
        assert_eq!(grid.page_count(), 1);
        assert!(grid.overlays_at(0x00).is_empty());
        assert!(grid.breakpoints(MemoryAccess::Execute).is_empty());
        assert!(grid.page_rows().is_empty());
    }
}
