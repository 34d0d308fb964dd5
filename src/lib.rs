//! blockfall - a falling-block puzzle simulation engine
//!
//! The crate is split into a deterministic core and a threaded harness:
//!
//! - [`core`] holds the playfield, the seven-piece catalog, the bag
//!   randomizer and [`Session`], the synchronous state machine that
//!   implements every game rule.
//! - [`engine`] wraps a session in [`Engine`], a thread-safe handle with
//!   background loops for gravity ticks and horizontal move repeat, and a
//!   listener API for status and display updates.
//!
//! ```no_run
//! use blockfall::{Engine, GameStatus};
//!
//! let engine = Engine::new(42);
//! engine.start();
//! engine.move_left();
//! engine.hard_drop();
//! assert_eq!(engine.status(), GameStatus::Playing);
//! ```

pub mod core;
pub mod engine;
pub mod types;

pub use crate::core::{ActivePiece, Field, PieceBag, Session};
pub use crate::engine::{Engine, StatusListener, TileListener};
pub use crate::types::{EngineEvent, GameStatus, Orientation, PieceKind, StatusChange};
