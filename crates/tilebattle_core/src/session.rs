//! # Game Session
//!
//! One grid, its score, the best score seen and a pausable timer.
//!
//! `Game::execute_move` is the only way gameplay changes a session. A
//! [`GameSnapshot`] is the value copy that travels to the opponent and to
//! save files.

use std::time::Duration;

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};
use crate::grid::{Board, Direction, GameRng, Grid, Outcome};
use crate::timer::Timer;

/// Longest timer reading a snapshot may carry: one hundred years.
pub const MAX_ELAPSED: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A live game session.
#[derive(Debug)]
pub struct Game {
    grid: Grid,
    score: u32,
    high_score: u32,
    timer: Timer,
}

impl Game {
    /// Creates a session whose grid is seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_grid(Grid::new(seed))
    }

    /// Creates a session seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_grid(Grid::from_entropy())
    }

    /// Creates a session around an existing grid.
    #[must_use]
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            score: 0,
            high_score: 0,
            timer: Timer::new(),
        }
    }

    /// Rebuilds a live session from a snapshot, with a fresh random source.
    ///
    /// The restored timer is paused. Snapshots from outside the process
    /// should pass [`GameSnapshot::validate`] first.
    #[must_use]
    pub fn restore(snapshot: GameSnapshot, seed: u64) -> Self {
        let GameSnapshot {
            board,
            score,
            high_score,
            elapsed,
        } = snapshot;
        Self {
            grid: Grid::from_board(board, GameRng::seed_from_u64(seed)),
            score,
            high_score: high_score.max(score),
            timer: Timer::with_elapsed(elapsed),
        }
    }

    /// Applies a move and adds the points to the score. Returns the points.
    pub fn execute_move(&mut self, direction: Direction) -> u32 {
        let points = self.grid.move_tiles(direction);
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
        }
        points
    }

    /// Starts a new board and zeroes the score. The timer keeps running.
    pub fn reset_keep_timer(&mut self) {
        self.grid.reset();
        self.score = 0;
        tracing::debug!("Game reset (timer kept at {:?})", self.timer.elapsed());
    }

    /// Starts a new board, zeroes the score and the timer.
    pub fn reset(&mut self) {
        self.reset_keep_timer();
        self.timer.reset();
    }

    /// Current score.
    #[inline]
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Best score seen by this session.
    #[inline]
    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Carries a best score over from an earlier session.
    pub fn set_high_score(&mut self, high_score: u32) {
        self.high_score = high_score.max(self.score);
    }

    /// Outcome of the board.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.grid.outcome()
    }

    /// The grid.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The elapsed-time counter.
    #[inline]
    #[must_use]
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Mutable access to the elapsed-time counter.
    #[inline]
    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Value copy of the session.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.grid.board(),
            score: self.score,
            high_score: self.high_score,
            elapsed: self.timer.elapsed(),
        }
    }
}

/// Serializable copy of a session.
///
/// The opponent mirror is one of these, replaced wholesale on every update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Tiles and last move.
    pub board: Board,
    /// Score at the time of the copy.
    pub score: u32,
    /// Best score at the time of the copy.
    pub high_score: u32,
    /// Timer reading at the time of the copy.
    pub elapsed: Duration,
}

impl GameSnapshot {
    /// Outcome of the copied board.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    /// Checks that the snapshot describes a reachable game.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidTile`] for a tile that is neither
    /// empty nor a power of two of at least 2, and
    /// [`SnapshotError::ElapsedOutOfRange`] for a timer reading above
    /// [`MAX_ELAPSED`].
    pub fn validate(&self) -> SnapshotResult<()> {
        self.board.validate()?;
        if self.elapsed > MAX_ELAPSED {
            return Err(SnapshotError::ElapsedOutOfRange(self.elapsed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GRID_SIZE;

    fn game_with(values: [[u32; GRID_SIZE]; GRID_SIZE]) -> Game {
        let mut rng = GameRng::seed_from_u64(3);
        let board = Board::from_values(values, &mut rng);
        Game::from_grid(Grid::from_board(board, rng))
    }

    #[test]
    fn test_score_accumulates_points() {
        let mut game = game_with([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);

        let points = game.execute_move(Direction::Left);
        assert_eq!(points, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.high_score(), 4);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut game = Game::new(11);
        let mut last = 0;
        for i in 0..200 {
            game.execute_move(Direction::ALL[i % 4]);
            assert!(game.score() >= last);
            assert!(game.high_score() >= game.score());
            last = game.score();
        }
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut game = game_with([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.execute_move(Direction::Left);
        game.timer_mut().resume();

        game.reset_keep_timer();
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 4);
        assert_eq!(game.grid().num_tiles(), 2);
        assert!(game.timer().is_running());

        game.reset();
        assert!(!game.timer().is_running());
        assert_eq!(game.timer().elapsed(), Duration::ZERO);
        assert_eq!(game.high_score(), 4);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut game = Game::new(21);
        game.execute_move(Direction::Up);
        game.execute_move(Direction::Left);
        let snapshot = game.snapshot();

        let restored = Game::restore(snapshot.clone(), 99);
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.outcome(), game.outcome());
    }

    #[test]
    fn test_snapshot_validation() {
        let mut game = Game::new(13);
        game.execute_move(Direction::Right);
        assert_eq!(game.snapshot().validate(), Ok(()));

        let mut snapshot = game.snapshot();
        snapshot.elapsed = Duration::MAX;
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::ElapsedOutOfRange(Duration::MAX))
        );

        let bad = game_with([[6, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).snapshot();
        assert!(matches!(bad.validate(), Err(SnapshotError::InvalidTile { value: 6, .. })));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let game = Game::new(5);
        let json = serde_json::to_value(game.snapshot()).expect("serialize");

        assert!(json.get("highScore").is_some());
        assert!(json["board"].get("lastMove").is_some());
        let decoded: GameSnapshot = serde_json::from_value(json).expect("deserialize");
        assert_eq!(decoded, game.snapshot());
    }
}
