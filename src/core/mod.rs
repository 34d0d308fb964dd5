//! Core simulation: playfield, pieces, bag randomizer and the session
//! state machine. Everything here is synchronous and deterministic; the
//! threaded harness lives in `crate::engine`.

pub mod bag;
pub mod field;
pub mod piece;
pub mod session;
pub mod tiles;

pub use bag::PieceBag;
pub use field::Field;
pub use piece::ActivePiece;
pub use session::Session;
