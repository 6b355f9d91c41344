//! # Board Mechanics
//!
//! Pure slide/merge rules over a 4x4 matrix of tiles.
//!
//! ## Move Algorithm
//!
//! ```text
//! clear combined flags
//! loop {
//!     for each row: perform at most ONE slide-or-merge step
//!     if no row stepped: break
//! }
//! ```
//!
//! A row step scans from the wall the tiles travel towards and acts on the
//! first tile that can move one cell. Multi-cell slides are repeated single
//! steps. Vertical moves transpose the matrix, run the row step, and
//! transpose back. The `combined` flag stops a merged tile from merging
//! again within the same move.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::tile::{new_tile_value, Tile, TileId};
use crate::error::{SnapshotError, SnapshotResult};

/// Width and height of the grid.
pub const GRID_SIZE: usize = 4;

/// Any tile at or above this value wins the game.
pub const WIN_TILE: u32 = 2048;

/// The tile matrix, indexed `[row][column]`. `[0][0]` is the top left cell.
pub type Tiles = [[Tile; GRID_SIZE]; GRID_SIZE];

/// Outcome of a game, derived from the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Still playing.
    None,
    /// A winning tile exists.
    Win,
    /// The board is gridlocked.
    Lose,
}

/// Result of sliding a board without spawning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveResult {
    /// True if any tile slid or merged.
    pub moved: bool,
    /// Value of the most recent merge, 0 if nothing merged.
    pub points: u32,
}

/// The tile matrix and the last attempted move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Tiles, `[row][column]`.
    tiles: Tiles,
    /// Last attempted direction, moved or not.
    #[serde(rename = "lastMove")]
    last_move: Option<Direction>,
}

impl Board {
    /// Creates a board of empty tiles, each with a fresh identity.
    pub fn empty<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let tiles = std::array::from_fn(|_| {
            std::array::from_fn(|_| Tile::empty(TileId::generate(rng)))
        });
        Self {
            tiles,
            last_move: None,
        }
    }

    /// Creates a board from raw values (`[row][column]`), each tile with a
    /// fresh identity.
    pub fn from_values<R: Rng + ?Sized>(values: [[u32; GRID_SIZE]; GRID_SIZE], rng: &mut R) -> Self {
        let tiles = std::array::from_fn(|row| {
            std::array::from_fn(|col| Tile::with_value(values[row][col], TileId::generate(rng)))
        });
        Self {
            tiles,
            last_move: None,
        }
    }

    /// Creates an empty board and seeds two tiles at two distinct cells.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut board = Self::empty(rng);
        let first = rng.gen_range(0..GRID_SIZE * GRID_SIZE);
        let mut second = rng.gen_range(0..GRID_SIZE * GRID_SIZE);
        while second == first {
            second = rng.gen_range(0..GRID_SIZE * GRID_SIZE);
        }
        for cell in [first, second] {
            board.tiles[cell / GRID_SIZE][cell % GRID_SIZE].value = new_tile_value(rng);
        }
        board
    }

    /// Returns the tile matrix.
    #[inline]
    #[must_use]
    pub const fn tiles(&self) -> &Tiles {
        &self.tiles
    }

    /// Returns the tile at `row`, `col`.
    #[inline]
    #[must_use]
    pub const fn tile(&self, row: usize, col: usize) -> &Tile {
        &self.tiles[row][col]
    }

    /// Returns the raw values, `[row][column]`.
    #[must_use]
    pub fn values(&self) -> [[u32; GRID_SIZE]; GRID_SIZE] {
        std::array::from_fn(|row| std::array::from_fn(|col| self.tiles[row][col].value))
    }

    /// Returns the last attempted direction.
    #[inline]
    #[must_use]
    pub const fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    /// Records the last attempted direction.
    #[inline]
    pub fn set_last_move(&mut self, direction: Direction) {
        self.last_move = Some(direction);
    }

    /// Slides and merges every tile in `direction` until nothing moves.
    ///
    /// Does not spawn a tile and does not record `last_move`; see
    /// [`Grid::move_tiles`](super::Grid::move_tiles) for the full move.
    pub fn slide<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> MoveResult {
        self.clear_combined();

        // Row steps only understand rows; columns are rows of the transpose
        if direction.is_vertical() {
            self.tiles = transpose(&self.tiles);
        }

        let mut result = MoveResult::default();
        loop {
            let mut moved_this_pass = false;
            for row in &mut self.tiles {
                if let Some(points) = step_row(row, direction, rng) {
                    moved_this_pass = true;
                    if points > 0 {
                        result.points = points;
                    }
                }
            }
            if !moved_this_pass {
                break;
            }
            result.moved = true;
        }

        if direction.is_vertical() {
            self.tiles = transpose(&self.tiles);
        }

        result
    }

    /// Spawns a 2 (90%) or 4 (10%) in a uniformly random empty cell.
    ///
    /// Returns the spawned value, or `None` if the board is full.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u32> {
        let empty: Vec<(usize, usize)> = Self::cells()
            .filter(|&(r, c)| self.tiles[r][c].is_empty())
            .collect();
        if empty.is_empty() {
            return None;
        }
        let (row, col) = empty[rng.gen_range(0..empty.len())];
        let value = new_tile_value(rng);
        self.tiles[row][col] = Tile::with_value(value, TileId::generate(rng));
        Some(value)
    }

    /// Clears the `combined` flag of every tile.
    pub fn clear_combined(&mut self) {
        for tile in self.tiles.iter_mut().flatten() {
            tile.combined = false;
        }
    }

    /// Number of non-empty tiles.
    #[must_use]
    pub fn num_tiles(&self) -> usize {
        self.tiles.iter().flatten().filter(|t| !t.is_empty()).count()
    }

    /// Sum of all tile values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.tiles.iter().flatten().map(|t| u64::from(t.value)).sum()
    }

    /// Value of the highest tile.
    #[must_use]
    pub fn highest_tile(&self) -> u32 {
        self.tiles.iter().flatten().map(|t| t.value).max().unwrap_or(0)
    }

    /// Current outcome. Recomputed on every call.
    ///
    /// A winning tile wins even on a gridlocked board.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.highest_tile() >= WIN_TILE {
            Outcome::Win
        } else if self.is_gridlocked() {
            Outcome::Lose
        } else {
            Outcome::None
        }
    }

    /// True when no cell is empty and no two neighbours (row- or
    /// column-wise) hold equal values.
    #[must_use]
    pub fn is_gridlocked(&self) -> bool {
        if self.tiles.iter().flatten().any(Tile::is_empty) {
            return false;
        }
        let has_pair = |tiles: &Tiles| {
            tiles
                .iter()
                .any(|row| row.windows(2).any(|pair| pair[0].value == pair[1].value))
        };
        !has_pair(&self.tiles) && !has_pair(&transpose(&self.tiles))
    }

    /// Fixed-width dump of the board, one row per line.
    #[must_use]
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        for row in &self.tiles {
            for tile in row {
                out.push_str(&tile.padded());
                out.push('|');
            }
            out.push('\n');
        }
        out
    }

    /// Checks that every tile is empty or a power of two of at least 2.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidTile`] for the first bad tile, in
    /// row-major order.
    pub fn validate(&self) -> SnapshotResult<()> {
        for (row, col) in Self::cells() {
            let value = self.tiles[row][col].value;
            if value != 0 && (value < 2 || !value.is_power_of_two()) {
                return Err(SnapshotError::InvalidTile { row, col, value });
            }
        }
        Ok(())
    }

    fn cells() -> impl Iterator<Item = (usize, usize)> {
        (0..GRID_SIZE).flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
    }
}

/// Performs one slide-or-merge step on a row.
///
/// Returns `Some(points)` if a tile moved (points is 0 for a plain slide),
/// `None` if every tile in the row is blocked.
fn step_row<R: Rng + ?Sized>(
    row: &mut [Tile; GRID_SIZE],
    direction: Direction,
    rng: &mut R,
) -> Option<u32> {
    let reverse = direction.is_reverse();

    for k in 0..GRID_SIZE {
        let i = if reverse { GRID_SIZE - 1 - k } else { k };

        // Next cell towards the direction of travel
        let next = if reverse { i + 1 } else { i.wrapping_sub(1) };
        if next >= GRID_SIZE {
            continue;
        }
        if row[i].is_empty() {
            continue;
        }

        let mergeable = row[next].value == row[i].value && !row[i].combined && !row[next].combined;
        // Tiles too large to add up stay put
        let merged = mergeable.then(|| row[next].value.checked_add(row[i].value)).flatten();
        if let Some(value) = merged {
            row[next] = Tile {
                value,
                combined: true,
                id: TileId::generate(rng),
            };
            row[i] = Tile::empty(TileId::generate(rng));
            return Some(value);
        }
        if !row[next].is_empty() {
            continue;
        }

        // A slid tile is a new tile as far as identity goes
        row[next] = Tile {
            id: TileId::generate(rng),
            ..row[i]
        };
        row[i] = Tile::empty(TileId::generate(rng));
        return Some(0);
    }

    None
}

/// Swaps rows and columns.
#[must_use]
pub fn transpose(tiles: &Tiles) -> Tiles {
    std::array::from_fn(|row| std::array::from_fn(|col| tiles[col][row]))
}
