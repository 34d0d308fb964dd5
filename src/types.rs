//! Core types shared across the engine
//! This module contains pure data types with no external dependencies

/// Visible playfield dimensions
pub const FIELD_WIDTH: usize = 10;
pub const FIELD_HEIGHT: usize = 20;

/// Hidden rows above the visible area that absorb piece spawn
pub const HIDDEN_ROWS: usize = 4;

/// Total grid rows including the hidden band
pub const TOTAL_ROWS: usize = FIELD_HEIGHT + HIDDEN_ROWS;

/// Spawn anchor of a fresh piece (top-left corner of its 4x4 mask)
pub const SPAWN_X: i8 = 3;
pub const SPAWN_Y: i8 = 0;

/// Tick loop period in milliseconds
pub const TICK_MS: u64 = 20;

/// Gravity thresholds by speed level 0..=9 (ticks per one-cell descent,
/// smaller entry = faster gravity)
pub const SPEED_STEPS: [u32; 10] = [25, 20, 16, 12, 9, 6, 4, 2, 1, 0];

/// Move-repeat period factors by sensitivity level 0..=9
/// (repeat period = TICK_MS * entry)
pub const SENSITIVITY_STEPS: [u64; 10] = [17, 14, 11, 9, 7, 5, 4, 3, 2, 1];

/// The first repetition after activating a move-repeat loop waits this many
/// steady-state periods (tap debounce)
pub const REPEAT_DEBOUNCE_FACTOR: u64 = 2;

/// Soft lock fires after this many gravity periods resting on a surface
pub const LOCK_DELAY_FACTOR: u32 = 2;

/// Hard lock overrides lock-delay resets after this many gravity periods
pub const HARD_LOCK_FACTOR: u32 = 5;

/// Gravity threshold divisor while soft drop is engaged
pub const SOFT_DROP_DIVISOR: u32 = 2;

/// Points awarded for clearing 0..=4 rows at once
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 1000];

/// Default configuration levels
pub const DEFAULT_SPEED_LEVEL: usize = 5;
pub const DEFAULT_SENSITIVITY_LEVEL: usize = 7;

/// Upcoming pieces exposed by the preview query
pub const PREVIEW_COUNT: usize = 5;

/// Tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    L,
    J,
    S,
    Z,
    T,
    I,
    O,
}

impl PieceKind {
    /// All kinds in color-code order; one full bag is a permutation of this
    pub const ALL: [PieceKind; 7] = [
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
        PieceKind::I,
        PieceKind::O,
    ];

    /// Display color code (1..=7, 0 is the empty cell)
    pub fn code(&self) -> u8 {
        match self {
            PieceKind::L => 1,
            PieceKind::J => 2,
            PieceKind::S => 3,
            PieceKind::Z => 4,
            PieceKind::T => 5,
            PieceKind::I => 6,
            PieceKind::O => 7,
        }
    }
}

/// Piece orientations (North = spawn orientation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    /// Quarter turn clockwise
    pub fn cw(&self) -> Self {
        match self {
            Orientation::North => Orientation::East,
            Orientation::East => Orientation::South,
            Orientation::South => Orientation::West,
            Orientation::West => Orientation::North,
        }
    }

    /// Quarter turn counter-clockwise
    pub fn ccw(&self) -> Self {
        match self {
            Orientation::North => Orientation::West,
            Orientation::West => Orientation::South,
            Orientation::South => Orientation::East,
            Orientation::East => Orientation::North,
        }
    }

    /// Half turn
    pub fn half(&self) -> Self {
        self.cw().cw()
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Initial state; field, queue, score and clock are all empty
    Prepare,
    /// Ticking; the only state that accepts gameplay commands
    Playing,
    /// Timers stopped, state frozen, resumable
    Pause,
    /// Terminal until reset; state frozen for display
    Over,
}

/// Payload of a status-changed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: GameStatus,
    pub current: GameStatus,
}

/// Notification queued by a session mutation, fanned out to listeners
/// after the session lock is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    StatusChanged(StatusChange),
    TileModified,
}
