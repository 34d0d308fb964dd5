//! Active piece value type
//!
//! A plain {kind, orientation, anchor} triple; geometry comes from the
//! piece catalog. Coordinates are playfield cells, y counted from the top
//! of the hidden band, and may be negative while a rotation adaptation
//! pushes the piece above the grid.

use crate::core::tiles::{mask, TileMask};
use crate::types::{Orientation, PieceKind, SPAWN_X, SPAWN_Y};

/// The falling piece: kind, orientation and top-left anchor of its 4x4 mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub orientation: Orientation,
    pub x: i8,
    pub y: i8,
}

impl ActivePiece {
    /// New piece at the spawn anchor, facing North
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            orientation: Orientation::North,
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    /// Mask for the current orientation
    pub fn mask(&self) -> TileMask {
        mask(self.kind, self.orientation)
    }

    /// Copy shifted by (dx, dy)
    pub fn translated(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Absolute (x, y, code) of every occupied mask cell
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8, u8)> {
        let mask = self.mask();
        let (px, py) = (self.x, self.y);
        (0..4).flat_map(move |i| {
            (0..4).filter_map(move |j| {
                let code = mask[i][j];
                (code != 0).then(|| (px + j as i8, py + i as i8, code))
            })
        })
    }
}
