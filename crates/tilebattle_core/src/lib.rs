//! # TILEBATTLE Core Engine
//!
//! Deterministic 2048 logic shared by the solo game and both sides of a duel.
//!
//! ## Architecture Rules
//!
//! 1. **No I/O** - the grid and session never touch files or sockets
//! 2. **Injected randomness** - every grid owns a seedable `ChaCha8Rng`
//! 3. **Single mutation path** - boards change only through `Game::execute_move`
//!    or a reset
//!
//! ## Example
//!
//! ```rust
//! use tilebattle_core::{Direction, Game, Outcome};
//!
//! let mut game = Game::new(42);
//! let points = game.execute_move(Direction::Left);
//! assert_eq!(game.score(), points);
//! assert_eq!(game.outcome(), Outcome::None);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod grid;
pub mod session;
pub mod timer;

pub use grid::{
    Board, Direction, Grid, GameRng, MoveResult, Outcome, Tile, TileId, Tiles, GRID_SIZE,
    WIN_TILE,
};
pub use error::{SnapshotError, SnapshotResult};
pub use session::{Game, GameSnapshot, MAX_ELAPSED};
pub use timer::Timer;
