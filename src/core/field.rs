//! Playfield - the cell grid and row operations
//!
//! The grid is TOTAL_ROWS x FIELD_WIDTH cells of u8 color codes
//! (0 = empty), row 0 at the top of the hidden band. Only whole rows ever
//! move: a cleared row is dropped by shifting everything above it down one
//! row and zero-filling row 0.

use crate::core::piece::ActivePiece;
use crate::types::{FIELD_WIDTH, TOTAL_ROWS};

/// The playfield grid, hidden overflow rows included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    rows: [[u8; FIELD_WIDTH]; TOTAL_ROWS],
}

impl Field {
    /// Create an empty field
    pub fn new() -> Self {
        Self {
            rows: [[0; FIELD_WIDTH]; TOTAL_ROWS],
        }
    }

    /// Cell code at (x, y); None when out of the grid
    pub fn cell(&self, x: i8, y: i8) -> Option<u8> {
        if x < 0 || x >= FIELD_WIDTH as i8 || y < 0 || y >= TOTAL_ROWS as i8 {
            return None;
        }
        Some(self.rows[y as usize][x as usize])
    }

    /// Set a cell code; returns false when out of the grid
    pub fn set_cell(&mut self, x: i8, y: i8, code: u8) -> bool {
        if x < 0 || x >= FIELD_WIDTH as i8 || y < 0 || y >= TOTAL_ROWS as i8 {
            return false;
        }
        self.rows[y as usize][x as usize] = code;
        true
    }

    /// All rows, top (hidden) first
    pub fn rows(&self) -> &[[u8; FIELD_WIDTH]; TOTAL_ROWS] {
        &self.rows
    }

    /// True when the piece cannot sit at its current position: an occupied
    /// mask cell crosses the left/right bounds, reaches past the bottom, or
    /// overlaps a locked cell. Rows above the grid only conflict with the
    /// horizontal bounds, never with content.
    pub fn has_conflict(&self, piece: &ActivePiece) -> bool {
        piece.cells().any(|(x, y, _)| {
            x < 0
                || x >= FIELD_WIDTH as i8
                || y >= TOTAL_ROWS as i8
                || (y >= 0 && self.rows[y as usize][x as usize] != 0)
        })
    }

    /// Copy every occupied mask cell into the grid at the piece's position.
    /// Cells outside the grid are skipped; the caller guarantees the piece
    /// came from a conflict-free state.
    pub fn lock(&mut self, piece: &ActivePiece) {
        for (x, y, code) in piece.cells() {
            self.set_cell(x, y, code);
        }
    }

    /// Remove every full row and return how many were removed.
    ///
    /// Scans bottom to top; on a full row, rows above shift down one and
    /// row 0 zero-fills, then the same index is examined again because it
    /// now holds shifted content.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut i = TOTAL_ROWS;
        while i > 0 {
            let row = i - 1;
            if self.rows[row].iter().all(|&c| c != 0) {
                self.rows.copy_within(0..row, 1);
                self.rows[0] = [0; FIELD_WIDTH];
                cleared += 1;
            } else {
                i -= 1;
            }
        }
        cleared
    }

    /// Zero the entire grid
    pub fn clear(&mut self) {
        self.rows = [[0; FIELD_WIDTH]; TOTAL_ROWS];
    }

    /// Fill one row completely (test scaffolding for clear scenarios)
    pub fn fill_row(&mut self, y: usize, code: u8) {
        self.rows[y] = [code; FIELD_WIDTH];
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}
