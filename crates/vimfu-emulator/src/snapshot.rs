//! Copy-on-read screen snapshots.
//!
//! The PTY reader thread is the only writer of the grid. Readers never hold
//! the grid: they copy it into a [`ScreenSnapshot`] under a short lock and
//! work on the copy. Each snapshot carries the generation counter at the time
//! of the copy, so two snapshots can be compared for staleness cheaply.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vimfu_core::{Cell, Dimensions};

use crate::grid::Grid;

/// Cursor location and visibility at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CursorState {
    /// Row index (0-based)
    pub row: u16,
    /// Column index (0-based)
    pub col: u16,
    /// Whether the cursor is shown
    pub visible: bool,
}

impl CursorState {
    /// Create a cursor state.
    pub fn new(row: u16, col: u16, visible: bool) -> Self {
        Self { row, col, visible }
    }
}

/// Immutable copy of the terminal grid and cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    dimensions: Dimensions,
    cells: Vec<Cell>,
    cursor: CursorState,
    generation: u64,
}

impl ScreenSnapshot {
    /// Copy a grid, tagging the copy with `generation`.
    pub fn from_grid(grid: &Grid, generation: u64) -> Self {
        let cursor = grid.cursor();
        Self {
            dimensions: grid.dimensions(),
            cells: grid.cells().to_vec(),
            cursor: CursorState::new(cursor.position.row, cursor.position.col, cursor.visible),
            generation,
        }
    }

    /// Geometry of the snapshot.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Cursor at snapshot time.
    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// Number of grid mutations observed before this copy was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cell at a position, `None` when out of bounds.
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        if row < self.dimensions.rows && col < self.dimensions.cols {
            self.cells
                .get(row as usize * self.dimensions.cols as usize + col as usize)
        } else {
            None
        }
    }

    /// One full row of cells.
    pub fn row(&self, row: u16) -> Option<&[Cell]> {
        if row < self.dimensions.rows {
            let start = row as usize * self.dimensions.cols as usize;
            Some(&self.cells[start..start + self.dimensions.cols as usize])
        } else {
            None
        }
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.dimensions.cols.max(1) as usize)
    }

    /// Row text with exactly `cols` characters.
    pub fn row_text(&self, row: u16) -> Option<String> {
        self.row(row)
            .map(|cells| cells.iter().map(|c| c.character).collect())
    }

    /// Screen lines with trailing whitespace removed.
    pub fn lines(&self) -> Vec<String> {
        self.rows()
            .map(|cells| {
                let line: String = cells.iter().map(|c| c.character).collect();
                line.trim_end().to_string()
            })
            .collect()
    }

    /// Whole screen as newline-joined trimmed lines.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}
