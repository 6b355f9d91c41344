//! # Grid Engine
//!
//! The 4x4 board plus the random source that spawns its tiles, guarded by a
//! single lock.
//!
//! ## Thread Safety
//!
//! ```text
//! Update tick:  grid.move_tiles(dir) ──┐
//!                                      ├──> Mutex<GridState { board, rng }>
//! Debug read:   grid.debug_string() ───┘
//! ```
//!
//! A move holds the lock from flag clearing to spawn, so a concurrent read
//! sees the board either before or after the whole move.

mod board;
mod direction;
mod tile;

pub use board::{transpose, Board, MoveResult, Outcome, Tiles, GRID_SIZE, WIN_TILE};
pub use direction::Direction;
pub use tile::{new_tile_value, Tile, TileId, EMPTY};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random source used by every grid.
pub type GameRng = ChaCha8Rng;

/// Board and random source, always locked together.
struct GridState {
    board: Board,
    rng: GameRng,
}

/// A lock-guarded board with its own injected random source.
pub struct Grid {
    state: Mutex<GridState>,
}

impl Grid {
    /// Creates a grid seeded with `seed` and reset to a start-of-game board.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_rng(GameRng::seed_from_u64(seed))
    }

    /// Creates a grid seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_rng(GameRng::from_entropy())
    }

    /// Creates a grid with the given random source and a fresh start-of-game
    /// board.
    #[must_use]
    pub fn from_rng(mut rng: GameRng) -> Self {
        let board = Board::seeded(&mut rng);
        Self::from_board(board, rng)
    }

    /// Wraps an existing board.
    #[must_use]
    pub fn from_board(board: Board, rng: GameRng) -> Self {
        Self {
            state: Mutex::new(GridState { board, rng }),
        }
    }

    /// Moves every tile in `direction`, spawning one new tile if anything
    /// moved. Returns the points gained.
    ///
    /// `last_move` is recorded even when the board is blocked.
    pub fn move_tiles(&self, direction: Direction) -> u32 {
        let mut state = self.state.lock();
        let GridState { board, rng } = &mut *state;

        let result = board.slide(direction, rng);
        if result.moved {
            let spawned = board.spawn_tile(rng);
            tracing::debug!("Moved {}: +{} points, spawned {:?}", direction, result.points, spawned);
        } else {
            tracing::debug!("Move {} blocked", direction);
        }
        board.set_last_move(direction);

        result.points
    }

    /// Resets the board to two seed tiles at distinct random cells.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let GridState { board, rng } = &mut *state;
        *board = Board::seeded(rng);
    }

    /// Current outcome, recomputed from the board.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.state.lock().board.outcome()
    }

    /// Copy of the board.
    #[must_use]
    pub fn board(&self) -> Board {
        self.state.lock().board.clone()
    }

    /// Copy of the tile matrix.
    #[must_use]
    pub fn tiles(&self) -> Tiles {
        *self.state.lock().board.tiles()
    }

    /// Last attempted direction.
    #[must_use]
    pub fn last_move(&self) -> Option<Direction> {
        self.state.lock().board.last_move()
    }

    /// Number of non-empty tiles.
    #[must_use]
    pub fn num_tiles(&self) -> usize {
        self.state.lock().board.num_tiles()
    }

    /// Value of the highest tile.
    #[must_use]
    pub fn highest_tile(&self) -> u32 {
        self.state.lock().board.highest_tile()
    }

    /// Fixed-width dump of the board.
    #[must_use]
    pub fn debug_string(&self) -> String {
        self.state.lock().board.debug_string()
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("board", &self.state.lock().board)
            .finish_non_exhaustive()
    }
}
