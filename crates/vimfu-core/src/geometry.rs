//! Geometry types for terminal coordinates and regions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Position in the terminal grid (row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    /// Row index (0-based)
    pub row: u16,
    /// Column index (0-based)
    pub col: u16,
}

impl Position {
    /// Create a new position.
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Origin position (0, 0).
    pub fn origin() -> Self {
        Self { row: 0, col: 0 }
    }
}

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Dimensions {
    /// Number of rows
    pub rows: u16,
    /// Number of columns
    pub cols: u16,
}

impl Dimensions {
    /// Create new dimensions.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Total cell count (rows * cols).
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Reject zero-sized geometry, which no pty or grid can hold.
    pub fn validate(self) -> Result<Self> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

/// Rectangular region of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Bounds {
    /// Starting row
    pub row: u16,
    /// Starting column
    pub col: u16,
    /// Width in columns
    pub width: u16,
    /// Height in rows
    pub height: u16,
}

impl Bounds {
    /// Create new bounds.
    pub fn new(row: u16, col: u16, width: u16, height: u16) -> Self {
        Self {
            row,
            col,
            width,
            height,
        }
    }

    /// Bounds covering a whole grid.
    pub fn full(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.cols, dimensions.rows)
    }

    /// Check if a position is contained within these bounds.
    pub fn contains(&self, pos: &Position) -> bool {
        pos.row >= self.row
            && pos.row < self.row + self.height
            && pos.col >= self.col
            && pos.col < self.col + self.width
    }
}
