//! Terminal grid state buffer and cursor tracking.
//!
//! The grid owns the cell matrix, the cursor and the "pen" (attributes and
//! colors applied to newly printed characters). Editing operations follow
//! xterm semantics closely enough for full-screen programs such as vim and
//! less: a scrolling region, deferred auto-wrap at the right margin, and an
//! alternate screen buffer.

use std::ops::Range;

use vimfu_core::{Bounds, Cell, CellAttributes, Color, Dimensions, Position};

/// Cursor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Current position
    pub position: Position,
    /// Visibility
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            position: Position::origin(),
            visible: true,
        }
    }
}

impl Cursor {
    /// Create a new cursor at origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create cursor at specific position.
    pub fn at(position: Position) -> Self {
        Self {
            position,
            visible: true,
        }
    }
}

/// Cursor position plus pen, as stored by DECSC.
#[derive(Debug, Clone)]
struct SavedCursor {
    position: Position,
    attrs: CellAttributes,
    fg: Color,
    bg: Color,
}

/// Terminal grid state buffer.
#[derive(Debug)]
pub struct Grid {
    /// Cell storage (row-major order)
    cells: Vec<Cell>,
    /// Grid dimensions
    dimensions: Dimensions,
    /// Cursor state
    cursor: Cursor,
    /// Saved cursor (for save/restore operations)
    saved_cursor: Option<SavedCursor>,
    /// Scroll region (top, bottom) - 0-indexed, inclusive
    scroll_region: (u16, u16),
    /// Current cell attributes for new characters
    current_attrs: CellAttributes,
    /// Current foreground color
    current_fg: Color,
    /// Current background color
    current_bg: Color,
    /// Cursor sits past the right margin; the next print wraps first
    wrap_pending: bool,
    /// Primary screen contents while the alternate screen is active
    primary: Option<Vec<Cell>>,
}

impl Grid {
    /// Create a new grid with the given dimensions.
    ///
    /// All cells are initialized to default (empty space).
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            cells: vec![Cell::default(); dimensions.cell_count()],
            dimensions,
            cursor: Cursor::default(),
            saved_cursor: None,
            scroll_region: (0, dimensions.rows.saturating_sub(1)),
            current_attrs: CellAttributes::default(),
            current_fg: Color::Default,
            current_bg: Color::Default,
            wrap_pending: false,
            primary: None,
        }
    }

    fn index(&self, row: u16, col: u16) -> usize {
        row as usize * self.dimensions.cols as usize + col as usize
    }

    fn row_range(&self, row: u16) -> Range<usize> {
        let start = self.index(row, 0);
        start..start + self.dimensions.cols as usize
    }

    /// Blank cell in the current background color.
    fn blank(&self) -> Cell {
        Cell::blank_with_bg(self.current_bg)
    }

    fn fill(&mut self, range: Range<usize>) {
        let blank = self.blank();
        let end = range.end.min(self.cells.len());
        let start = range.start.min(end);
        for cell in &mut self.cells[start..end] {
            *cell = blank.clone();
        }
    }

    /// Get cell at position (immutable).
    ///
    /// Returns None if position is out of bounds.
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        if row < self.dimensions.rows && col < self.dimensions.cols {
            self.cells.get(self.index(row, col))
        } else {
            None
        }
    }

    /// Get mutable cell at position.
    ///
    /// Returns None if position is out of bounds.
    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        if row < self.dimensions.rows && col < self.dimensions.cols {
            let idx = self.index(row, col);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Get entire row as a slice.
    ///
    /// Returns None if row is out of bounds.
    pub fn row(&self, row: u16) -> Option<&[Cell]> {
        if row < self.dimensions.rows {
            Some(&self.cells[self.row_range(row)])
        } else {
            None
        }
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Extract text from a specific region.
    ///
    /// Trailing whitespace is trimmed from each line.
    pub fn extract_text(&self, bounds: &Bounds) -> String {
        let mut lines = Vec::with_capacity(bounds.height as usize);
        for row in bounds.row..bounds.row.saturating_add(bounds.height) {
            let line: String = (bounds.col..bounds.col.saturating_add(bounds.width))
                .filter_map(|col| self.cell(row, col))
                .map(|cell| cell.character)
                .collect();
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    /// Convert entire grid to plain text.
    pub fn to_plain_text(&self) -> String {
        self.extract_text(&Bounds::full(self.dimensions))
    }

    /// Get cursor reference.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Get dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Check if cursor is visible.
    pub fn cursor_visible(&self) -> bool {
        self.cursor.visible
    }

    /// Show or hide the cursor.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor.visible = visible;
    }

    /// Move the cursor, clamped to the grid.
    pub fn move_to(&mut self, row: u16, col: u16) {
        self.wrap_pending = false;
        self.cursor.position = Position::new(
            row.min(self.dimensions.rows.saturating_sub(1)),
            col.min(self.dimensions.cols.saturating_sub(1)),
        );
    }

    /// Get current cell attributes.
    pub fn current_attrs(&self) -> &CellAttributes {
        &self.current_attrs
    }

    /// Set current cell attributes.
    pub fn set_current_attrs(&mut self, attrs: CellAttributes) {
        self.current_attrs = attrs;
    }

    /// Get current foreground color.
    pub fn current_fg(&self) -> Color {
        self.current_fg
    }

    /// Set current foreground color.
    pub fn set_current_fg(&mut self, color: Color) {
        self.current_fg = color;
    }

    /// Get current background color.
    pub fn current_bg(&self) -> Color {
        self.current_bg
    }

    /// Set current background color.
    pub fn set_current_bg(&mut self, color: Color) {
        self.current_bg = color;
    }

    /// Reset attributes and colors to defaults.
    pub fn reset_pen(&mut self) {
        self.current_attrs = CellAttributes::default();
        self.current_fg = Color::Default;
        self.current_bg = Color::Default;
    }

    /// Write a character at the cursor and advance.
    ///
    /// Writing into the last column leaves the cursor there with a pending
    /// wrap; the wrap (and a scroll, at the bottom margin) happens on the
    /// next printed character.
    pub fn put_char(&mut self, c: char) {
        if self.wrap_pending {
            self.wrap_pending = false;
            self.cursor.position.col = 0;
            self.linefeed();
        }

        let Position { row, col } = self.cursor.position;
        let cell = Cell::styled(c, self.current_fg, self.current_bg, self.current_attrs);
        if let Some(slot) = self.cell_mut(row, col) {
            *slot = cell;
        }

        if col + 1 >= self.dimensions.cols {
            self.wrap_pending = true;
        } else {
            self.cursor.position.col = col + 1;
        }
    }

    /// Move down one row, scrolling the region at its bottom margin (IND).
    pub fn linefeed(&mut self) {
        self.wrap_pending = false;
        let row = self.cursor.position.row;
        if row == self.scroll_region.1 {
            self.scroll_up(1);
        } else if row + 1 < self.dimensions.rows {
            self.cursor.position.row = row + 1;
        }
    }

    /// Move up one row, scrolling the region at its top margin (RI).
    pub fn reverse_index(&mut self) {
        self.wrap_pending = false;
        let row = self.cursor.position.row;
        if row == self.scroll_region.0 {
            self.scroll_down(1);
        } else if row > 0 {
            self.cursor.position.row = row - 1;
        }
    }

    /// Return to column 0.
    pub fn carriage_return(&mut self) {
        self.wrap_pending = false;
        self.cursor.position.col = 0;
    }

    /// Move one column left, stopping at the margin.
    pub fn backspace(&mut self) {
        self.wrap_pending = false;
        self.cursor.position.col = self.cursor.position.col.saturating_sub(1);
    }

    /// Advance to the next 8-column tab stop.
    pub fn tab(&mut self) {
        let next_tab = (self.cursor.position.col / 8 + 1) * 8;
        self.cursor.position.col = next_tab.min(self.dimensions.cols.saturating_sub(1));
    }

    /// Current scroll region (top, bottom), 0-indexed and inclusive.
    pub fn scroll_region(&self) -> (u16, u16) {
        self.scroll_region
    }

    /// Set the scroll region (DECSTBM) and home the cursor.
    ///
    /// Regions that are empty or extend past the grid are ignored.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        if top < bottom && bottom < self.dimensions.rows {
            self.scroll_region = (top, bottom);
            self.move_to(0, 0);
        }
    }

    /// Shift rows `top..=bottom` up by `n`, blanking the vacated rows.
    fn shift_rows_up(&mut self, top: u16, bottom: u16, n: u16) {
        let n = n.min(bottom - top + 1) as usize;
        if n == 0 {
            return;
        }
        let cols = self.dimensions.cols as usize;
        let start = self.index(top, 0);
        let end = self.index(bottom, 0) + cols;
        self.cells[start..end].rotate_left(n * cols);
        self.fill(end - n * cols..end);
    }

    /// Shift rows `top..=bottom` down by `n`, blanking the vacated rows.
    fn shift_rows_down(&mut self, top: u16, bottom: u16, n: u16) {
        let n = n.min(bottom - top + 1) as usize;
        if n == 0 {
            return;
        }
        let cols = self.dimensions.cols as usize;
        let start = self.index(top, 0);
        let end = self.index(bottom, 0) + cols;
        self.cells[start..end].rotate_right(n * cols);
        self.fill(start..start + n * cols);
    }

    /// Scroll the region up by n lines (SU).
    pub fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        self.shift_rows_up(top, bottom, n);
    }

    /// Scroll the region down by n lines (SD).
    pub fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        self.shift_rows_down(top, bottom, n);
    }

    fn cursor_in_region(&self) -> bool {
        let row = self.cursor.position.row;
        row >= self.scroll_region.0 && row <= self.scroll_region.1
    }

    /// Insert n blank lines at the cursor row (IL).
    pub fn insert_lines(&mut self, n: u16) {
        if self.cursor_in_region() {
            self.shift_rows_down(self.cursor.position.row, self.scroll_region.1, n);
            self.carriage_return();
        }
    }

    /// Delete n lines at the cursor row (DL).
    pub fn delete_lines(&mut self, n: u16) {
        if self.cursor_in_region() {
            self.shift_rows_up(self.cursor.position.row, self.scroll_region.1, n);
            self.carriage_return();
        }
    }

    /// Insert n blank characters at the cursor, shifting the rest right (ICH).
    pub fn insert_chars(&mut self, n: u16) {
        let Position { row, col } = self.cursor.position;
        let n = n.min(self.dimensions.cols - col) as usize;
        let range = self.row_range(row);
        let start = range.start + col as usize;
        self.cells[start..range.end].rotate_right(n);
        self.fill(start..start + n);
    }

    /// Delete n characters at the cursor, shifting the rest left (DCH).
    pub fn delete_chars(&mut self, n: u16) {
        let Position { row, col } = self.cursor.position;
        let n = n.min(self.dimensions.cols - col) as usize;
        let range = self.row_range(row);
        let start = range.start + col as usize;
        self.cells[start..range.end].rotate_left(n);
        self.fill(range.end - n..range.end);
    }

    /// Blank n characters from the cursor without shifting (ECH).
    pub fn erase_chars(&mut self, n: u16) {
        let Position { row, col } = self.cursor.position;
        let range = self.row_range(row);
        let start = range.start + col as usize;
        self.fill(start..(start + n as usize).min(range.end));
    }

    /// Erase in display (ED): 0 below, 1 above, 2/3 everything.
    pub fn erase_display(&mut self, mode: u16) {
        let cursor = self.index(self.cursor.position.row, self.cursor.position.col);
        match mode {
            0 => self.fill(cursor..self.cells.len()),
            1 => self.fill(0..cursor + 1),
            2 | 3 => self.fill(0..self.cells.len()),
            _ => {}
        }
    }

    /// Erase in line (EL): 0 right of cursor, 1 left of cursor, 2 whole line.
    pub fn erase_line(&mut self, mode: u16) {
        let range = self.row_range(self.cursor.position.row);
        let cursor = range.start + self.cursor.position.col as usize;
        match mode {
            0 => self.fill(cursor..range.end),
            1 => self.fill(range.start..cursor + 1),
            2 => self.fill(range),
            _ => {}
        }
    }

    /// Save cursor position and pen.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            position: self.cursor.position,
            attrs: self.current_attrs,
            fg: self.current_fg,
            bg: self.current_bg,
        });
    }

    /// Restore saved cursor position and pen.
    ///
    /// Without a prior save the cursor homes and the pen resets.
    pub fn restore_cursor(&mut self) {
        match self.saved_cursor.clone() {
            Some(saved) => {
                self.move_to(saved.position.row, saved.position.col);
                self.current_attrs = saved.attrs;
                self.current_fg = saved.fg;
                self.current_bg = saved.bg;
            }
            None => {
                self.move_to(0, 0);
                self.reset_pen();
            }
        }
    }

    /// Whether the alternate screen buffer is active.
    pub fn is_alternate_screen(&self) -> bool {
        self.primary.is_some()
    }

    /// Switch to a cleared alternate screen, optionally saving the cursor first.
    pub fn enter_alternate_screen(&mut self, save_cursor: bool) {
        if self.primary.is_some() {
            return;
        }
        if save_cursor {
            self.save_cursor();
        }
        let alternate = vec![Cell::default(); self.dimensions.cell_count()];
        self.primary = Some(std::mem::replace(&mut self.cells, alternate));
    }

    /// Return to the primary screen, optionally restoring the saved cursor.
    pub fn leave_alternate_screen(&mut self, restore_cursor: bool) {
        if let Some(primary) = self.primary.take() {
            self.cells = primary;
            if restore_cursor {
                self.restore_cursor();
            }
        }
    }

    /// Resize grid, preserving content where possible.
    ///
    /// Content from the top-left corner is preserved up to the smaller of
    /// old and new dimensions. Cursor is clamped to new bounds and the
    /// scroll region resets to the full screen.
    pub fn resize(&mut self, new_dimensions: Dimensions) {
        let old = self.dimensions;
        self.cells = resize_cells(&self.cells, old, new_dimensions);
        if let Some(primary) = self.primary.take() {
            self.primary = Some(resize_cells(&primary, old, new_dimensions));
        }

        self.dimensions = new_dimensions;
        self.scroll_region = (0, new_dimensions.rows.saturating_sub(1));
        let Position { row, col } = self.cursor.position;
        self.move_to(row, col);
    }

    /// Clear the entire grid.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    /// Clear a specific region.
    pub fn clear_region(&mut self, bounds: &Bounds) {
        for row in bounds.row..bounds.row.saturating_add(bounds.height) {
            for col in bounds.col..bounds.col.saturating_add(bounds.width) {
                if let Some(cell) = self.cell_mut(row, col) {
                    *cell = Cell::default();
                }
            }
        }
    }

    /// Full reset (RIS): primary screen, cleared, cursor home, default pen.
    pub fn reset(&mut self) {
        *self = Grid::new(self.dimensions);
    }
}

fn resize_cells(cells: &[Cell], old: Dimensions, new: Dimensions) -> Vec<Cell> {
    let mut resized = vec![Cell::default(); new.cell_count()];
    let copy_rows = old.rows.min(new.rows) as usize;
    let copy_cols = old.cols.min(new.cols) as usize;

    for row in 0..copy_rows {
        let old_start = row * old.cols as usize;
        let new_start = row * new.cols as usize;
        resized[new_start..new_start + copy_cols]
            .clone_from_slice(&cells[old_start..old_start + copy_cols]);
    }
    resized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(grid: &mut Grid, text: &str) {
        for c in text.chars() {
            grid.put_char(c);
        }
    }

    fn row_text(grid: &Grid, row: u16) -> String {
        grid.row(row).unwrap().iter().map(|c| c.character).collect()
    }

    #[test]
    fn test_grid_new() {
        let grid = Grid::new(Dimensions::new(24, 80));
        assert_eq!(grid.dimensions().rows, 24);
        assert_eq!(grid.dimensions().cols, 80);
        assert_eq!(grid.cursor().position, Position::origin());
        assert!(grid.cursor_visible());
        assert_eq!(grid.scroll_region(), (0, 23));
    }

    #[test]
    fn test_grid_cell_access() {
        let mut grid = Grid::new(Dimensions::new(10, 10));

        assert_eq!(grid.cell(0, 0).unwrap().character, ' ');

        if let Some(cell) = grid.cell_mut(5, 5) {
            cell.character = 'X';
        }
        assert_eq!(grid.cell(5, 5).unwrap().character, 'X');

        assert!(grid.cell(10, 10).is_none());
        assert!(grid.cell_mut(10, 10).is_none());
        assert!(grid.row(10).is_none());
    }

    #[test]
    fn test_grid_extract_text() {
        let mut grid = Grid::new(Dimensions::new(5, 10));
        grid.move_to(1, 0);
        write(&mut grid, "HELLO");

        assert_eq!(grid.extract_text(&Bounds::new(1, 0, 10, 1)), "HELLO");
        assert_eq!(grid.to_plain_text(), "\nHELLO\n\n\n");
    }

    #[test]
    fn test_put_char_uses_pen() {
        let mut grid = Grid::new(Dimensions::new(3, 10));
        grid.set_current_fg(Color::Red);
        grid.set_current_attrs(CellAttributes::default().with_bold());
        grid.put_char('A');

        let cell = grid.cell(0, 0).unwrap();
        assert_eq!(cell.character, 'A');
        assert_eq!(cell.fg, Color::Red);
        assert!(cell.attrs.bold);
        assert_eq!(grid.cursor().position, Position::new(0, 1));
    }

    #[test]
    fn test_deferred_wrap() {
        let mut grid = Grid::new(Dimensions::new(3, 4));
        write(&mut grid, "abcd");
        // Cursor stays on the last column until the next print
        assert_eq!(grid.cursor().position, Position::new(0, 3));

        grid.put_char('e');
        assert_eq!(row_text(&grid, 0), "abcd");
        assert_eq!(row_text(&grid, 1), "e   ");
        assert_eq!(grid.cursor().position, Position::new(1, 1));
    }

    #[test]
    fn test_wrap_scrolls_at_bottom() {
        let mut grid = Grid::new(Dimensions::new(2, 3));
        write(&mut grid, "abcdefg");
        assert_eq!(row_text(&grid, 0), "def");
        assert_eq!(row_text(&grid, 1), "g  ");
    }

    #[test]
    fn test_linefeed_scrolls_region_only() {
        let mut grid = Grid::new(Dimensions::new(4, 3));
        for (row, ch) in ['a', 'b', 'c', 'd'].into_iter().enumerate() {
            grid.move_to(row as u16, 0);
            grid.put_char(ch);
        }

        grid.set_scroll_region(1, 2);
        assert_eq!(grid.cursor().position, Position::origin());

        grid.move_to(2, 0);
        grid.linefeed();
        assert_eq!(row_text(&grid, 0), "a  ");
        assert_eq!(row_text(&grid, 1), "c  ");
        assert_eq!(row_text(&grid, 2), "   ");
        assert_eq!(row_text(&grid, 3), "d  ");
    }

    #[test]
    fn test_reverse_index_at_top() {
        let mut grid = Grid::new(Dimensions::new(3, 2));
        write(&mut grid, "ab");
        grid.move_to(0, 0);
        grid.reverse_index();
        assert_eq!(row_text(&grid, 0), "  ");
        assert_eq!(row_text(&grid, 1), "ab");
    }

    #[test]
    fn test_invalid_scroll_region_ignored() {
        let mut grid = Grid::new(Dimensions::new(5, 5));
        grid.set_scroll_region(3, 3);
        grid.set_scroll_region(2, 9);
        assert_eq!(grid.scroll_region(), (0, 4));
    }

    #[test]
    fn test_insert_delete_lines() {
        let mut grid = Grid::new(Dimensions::new(4, 2));
        for (row, ch) in ['a', 'b', 'c', 'd'].into_iter().enumerate() {
            grid.move_to(row as u16, 0);
            grid.put_char(ch);
        }

        grid.move_to(1, 1);
        grid.insert_lines(1);
        let rows: Vec<String> = (0..4).map(|r| row_text(&grid, r)).collect();
        assert_eq!(rows, ["a ", "  ", "b ", "c "]);
        assert_eq!(grid.cursor().position, Position::new(1, 0));

        grid.delete_lines(2);
        let rows: Vec<String> = (0..4).map(|r| row_text(&grid, r)).collect();
        assert_eq!(rows, ["a ", "c ", "  ", "  "]);
    }

    #[test]
    fn test_insert_delete_erase_chars() {
        let mut grid = Grid::new(Dimensions::new(1, 6));
        write(&mut grid, "abcdef");

        grid.move_to(0, 1);
        grid.insert_chars(2);
        assert_eq!(row_text(&grid, 0), "a  bcd");

        grid.delete_chars(3);
        assert_eq!(row_text(&grid, 0), "acd   ");

        grid.move_to(0, 0);
        grid.erase_chars(2);
        assert_eq!(row_text(&grid, 0), "  d   ");

        // Counts larger than the line are clamped
        grid.delete_chars(100);
        assert_eq!(row_text(&grid, 0), "      ");
    }

    #[test]
    fn test_erase_uses_current_background() {
        let mut grid = Grid::new(Dimensions::new(2, 4));
        grid.set_current_bg(Color::Blue);
        grid.erase_line(2);

        assert_eq!(grid.cell(0, 0).unwrap().bg, Color::Blue);
        assert_eq!(grid.cell(1, 0).unwrap().bg, Color::Default);
    }

    #[test]
    fn test_erase_display_modes() {
        let mut grid = Grid::new(Dimensions::new(3, 3));
        write(&mut grid, "abcdefghi");

        grid.move_to(1, 1);
        grid.erase_display(0);
        assert_eq!(grid.to_plain_text(), "abc\nd\n");

        let mut grid = Grid::new(Dimensions::new(3, 3));
        write(&mut grid, "abcdefghi");
        grid.move_to(1, 1);
        grid.erase_display(1);
        assert_eq!(grid.to_plain_text(), "\n  f\nghi");

        grid.erase_display(2);
        assert_eq!(grid.to_plain_text(), "\n\n");
    }

    #[test]
    fn test_cursor_save_restore() {
        let mut grid = Grid::new(Dimensions::new(24, 80));

        grid.move_to(10, 20);
        grid.set_current_fg(Color::Green);
        grid.save_cursor();

        grid.move_to(5, 5);
        grid.reset_pen();

        grid.restore_cursor();
        assert_eq!(grid.cursor().position, Position::new(10, 20));
        assert_eq!(grid.current_fg(), Color::Green);

        // The saved state survives a restore
        grid.move_to(0, 0);
        grid.restore_cursor();
        assert_eq!(grid.cursor().position, Position::new(10, 20));
    }

    #[test]
    fn test_alternate_screen() {
        let mut grid = Grid::new(Dimensions::new(2, 5));
        write(&mut grid, "shell");

        grid.enter_alternate_screen(true);
        assert!(grid.is_alternate_screen());
        assert_eq!(grid.to_plain_text(), "\n");

        grid.move_to(1, 0);
        write(&mut grid, "vim");
        grid.leave_alternate_screen(true);

        assert!(!grid.is_alternate_screen());
        assert_eq!(grid.to_plain_text(), "shell\n");
        assert_eq!(grid.cursor().position, Position::new(0, 4));
    }

    #[test]
    fn test_grid_resize_preserve() {
        let mut grid = Grid::new(Dimensions::new(5, 5));
        for row in 0..5 {
            for col in 0..5 {
                if let Some(cell) = grid.cell_mut(row, col) {
                    cell.character = 'A';
                }
            }
        }

        grid.resize(Dimensions::new(10, 10));
        assert_eq!(grid.dimensions(), Dimensions::new(10, 10));
        assert_eq!(grid.cell(4, 4).unwrap().character, 'A');
        assert_eq!(grid.cell(9, 9).unwrap().character, ' ');
        assert_eq!(grid.scroll_region(), (0, 9));
    }

    #[test]
    fn test_grid_resize_shrink_clamps_cursor() {
        let mut grid = Grid::new(Dimensions::new(10, 10));
        if let Some(cell) = grid.cell_mut(2, 2) {
            cell.character = 'M';
        }
        grid.move_to(9, 9);

        grid.resize(Dimensions::new(5, 5));
        assert_eq!(grid.cell(2, 2).unwrap().character, 'M');
        assert_eq!(grid.cursor().position, Position::new(4, 4));
    }

    #[test]
    fn test_resize_keeps_primary_screen() {
        let mut grid = Grid::new(Dimensions::new(3, 3));
        write(&mut grid, "ab");
        grid.enter_alternate_screen(false);
        grid.resize(Dimensions::new(4, 4));
        grid.leave_alternate_screen(false);
        assert_eq!(row_text(&grid, 0), "ab  ");
    }

    #[test]
    fn test_grid_clear_region() {
        let mut grid = Grid::new(Dimensions::new(5, 5));
        write(&mut grid, &"X".repeat(24));

        grid.clear_region(&Bounds::new(1, 1, 2, 2));
        assert_eq!(grid.cell(1, 1).unwrap().character, ' ');
        assert_eq!(grid.cell(2, 2).unwrap().character, ' ');
        assert_eq!(grid.cell(0, 0).unwrap().character, 'X');
        assert_eq!(grid.cell(3, 3).unwrap().character, 'X');
    }

    #[test]
    fn test_reset() {
        let mut grid = Grid::new(Dimensions::new(3, 3));
        write(&mut grid, "abc");
        grid.set_cursor_visible(false);
        grid.enter_alternate_screen(true);
        grid.reset();

        assert!(!grid.is_alternate_screen());
        assert!(grid.cursor_visible());
        assert_eq!(grid.to_plain_text(), "\n\n");
    }
}
