//! Piece catalog - immutable tetromino geometry
//!
//! Each kind has one canonical 4x4 mask in the North orientation; the other
//! three orientations are derived by an index transform on demand, so no
//! rotated copies are stored. Mask cells carry the kind's color code.

use crate::types::{Orientation, PieceKind};

/// A 4x4 cell mask; 0 = empty, otherwise the kind's color code
pub type TileMask = [[u8; 4]; 4];

const L_MASK: TileMask = [
    [0, 0, 0, 0],
    [0, 1, 0, 0],
    [0, 1, 0, 0],
    [0, 1, 1, 0],
];

const J_MASK: TileMask = [
    [0, 0, 0, 0],
    [0, 0, 2, 0],
    [0, 0, 2, 0],
    [0, 2, 2, 0],
];

const S_MASK: TileMask = [
    [0, 0, 0, 0],
    [0, 3, 3, 0],
    [3, 3, 0, 0],
    [0, 0, 0, 0],
];

const Z_MASK: TileMask = [
    [0, 0, 0, 0],
    [4, 4, 0, 0],
    [0, 4, 4, 0],
    [0, 0, 0, 0],
];

const T_MASK: TileMask = [
    [0, 0, 0, 0],
    [5, 5, 5, 0],
    [0, 5, 0, 0],
    [0, 0, 0, 0],
];

const I_MASK: TileMask = [
    [0, 6, 0, 0],
    [0, 6, 0, 0],
    [0, 6, 0, 0],
    [0, 6, 0, 0],
];

const O_MASK: TileMask = [
    [0, 0, 0, 0],
    [0, 7, 7, 0],
    [0, 7, 7, 0],
    [0, 0, 0, 0],
];

/// North-orientation base mask for a kind
fn base_mask(kind: PieceKind) -> &'static TileMask {
    match kind {
        PieceKind::L => &L_MASK,
        PieceKind::J => &J_MASK,
        PieceKind::S => &S_MASK,
        PieceKind::Z => &Z_MASK,
        PieceKind::T => &T_MASK,
        PieceKind::I => &I_MASK,
        PieceKind::O => &O_MASK,
    }
}

/// Get the mask for a kind at the given orientation
///
/// Transform from the North base, for mask indices i (row) and j (column):
/// East `base[3-j][i]`, South `base[3-i][3-j]`, West `base[j][3-i]`.
pub fn mask(kind: PieceKind, orientation: Orientation) -> TileMask {
    let base = base_mask(kind);
    let mut out = [[0u8; 4]; 4];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = match orientation {
                Orientation::North => base[i][j],
                Orientation::East => base[3 - j][i],
                Orientation::South => base[3 - i][3 - j],
                Orientation::West => base[j][3 - i],
            };
        }
    }
    out
}
