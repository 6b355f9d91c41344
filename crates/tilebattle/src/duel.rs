//! # Duel Match
//!
//! Head-to-head play: our own session on one side, the opponent's mirror on
//! the other.
//!
//! ## Update Tick
//!
//! ```text
//! key ──try_send──▶ [move queue, bounded] ──▶ tick(): at most one move
//!                                                  │
//!                                                  ├─▶ execute_move
//!                                                  ├─▶ broadcast_game
//!                                                  └─▶ combined outcome
//! ```
//!
//! Only one move is applied per tick so presentation can animate each one.
//! A full queue drops the key press instead of blocking the input thread.
//!
//! ## Combined Outcome
//!
//! We lose if our board is gridlocked or the opponent reached the winning
//! tile. We win if we reached it or the opponent is gridlocked. Losing is
//! checked first.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tilebattle_core::{Direction, Game, GameSnapshot, Outcome};
use tilebattle_networking::{PeerSync, RelayHandle, SyncEvent};
use tilebattle_shared::constants::MOVE_QUEUE_CAPACITY;

use crate::input::Key;

/// Where the match stands from our side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// Nobody has won yet.
    Playing,
    /// We won.
    Won,
    /// We lost.
    Lost,
}

impl Default for MatchOutcome {
    fn default() -> Self {
        Self::Playing
    }
}

impl MatchOutcome {
    /// Combines our outcome with the opponent's.
    #[must_use]
    pub fn combine(own: Outcome, opponent: Outcome) -> Self {
        if own == Outcome::Lose || opponent == Outcome::Win {
            Self::Lost
        } else if own == Outcome::Win || opponent == Outcome::Lose {
            Self::Won
        } else {
            Self::Playing
        }
    }

    /// True once the match is decided.
    #[inline]
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Everything presentation needs for one frame.
#[derive(Clone, Debug)]
pub struct DuelView {
    /// Our session.
    pub own: GameSnapshot,
    /// Opponent's latest snapshot, once one has arrived.
    pub opponent: Option<Arc<GameSnapshot>>,
    /// Opponent's display name.
    pub opponent_name: String,
    /// Combined outcome.
    pub outcome: MatchOutcome,
    /// False once the link is gone.
    pub connected: bool,
}

/// A running head-to-head match.
pub struct DuelMatch {
    sync: Arc<PeerSync>,
    relay: Option<RelayHandle>,
    game: Arc<Mutex<Game>>,
    moves_tx: Sender<Direction>,
    moves_rx: Receiver<Direction>,
    opponent: String,
    outcome: MatchOutcome,
}

impl DuelMatch {
    /// Enters the match screen with the default queue capacity.
    ///
    /// See [`Self::with_capacity`].
    #[must_use]
    pub fn new(sync: Arc<PeerSync>, relay: Option<RelayHandle>) -> Self {
        Self::with_capacity(sync, relay, MOVE_QUEUE_CAPACITY)
    }

    /// Enters the match screen: starts the timer and tells the peer we are
    /// ready for its snapshot.
    ///
    /// Without a relay, inbound events are polled on each [`Self::tick`].
    #[must_use]
    pub fn with_capacity(
        sync: Arc<PeerSync>,
        relay: Option<RelayHandle>,
        queue_capacity: usize,
    ) -> Self {
        let game = Arc::clone(sync.local());
        game.lock().timer_mut().resume();

        if let Err(e) = sync.screen_loaded() {
            tracing::warn!("Failed to announce match screen: {}", e);
        }

        let opponent = sync.peer_name().unwrap_or_else(|| "Opponent".to_string());
        tracing::info!("Match against {} started", opponent);

        let (moves_tx, moves_rx) = bounded(queue_capacity.max(1));
        Self {
            sync,
            relay,
            game,
            moves_tx,
            moves_rx,
            opponent,
            outcome: MatchOutcome::Playing,
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Queues a move for the next tick. Returns false if it was dropped.
    pub fn queue_move(&self, direction: Direction) -> bool {
        match self.moves_tx.try_send(direction) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Move queue full, dropping {}", direction);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Applies one key: arrows are queued, reset happens immediately.
    pub fn handle_key(&self, key: Key) -> bool {
        match key.direction() {
            Some(direction) => self.queue_move(direction),
            None => {
                self.reset();
                true
            }
        }
    }

    /// Starts a new board and zeroes the score. The timer keeps running.
    pub fn reset(&self) {
        self.game.lock().reset_keep_timer();
        self.broadcast();
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Runs one update: applies at most one queued move, broadcasts it,
    /// handles peer notifications and recomputes the outcome.
    pub fn tick(&mut self) -> MatchOutcome {
        if self.relay.is_none() {
            self.sync.poll();
        }

        if self.outcome.is_over() {
            // The match is decided; late key presses go nowhere
            while self.moves_rx.try_recv().is_ok() {}
        } else if let Ok(direction) = self.moves_rx.try_recv() {
            self.game.lock().execute_move(direction);
            self.broadcast();
        }

        for event in self.sync.drain_events() {
            match event {
                SyncEvent::PeerRenamed { username } | SyncEvent::PeerJoined { username } => {
                    self.opponent = username;
                }
                SyncEvent::ConnectionLost { reason } => match reason {
                    Some(e) => tracing::warn!("Lost connection with {}: {}", self.opponent, e),
                    None => tracing::info!("{} has left the game", self.opponent),
                },
                other => tracing::debug!("Match event: {:?}", other),
            }
        }

        self.outcome = self.compute_outcome();
        self.outcome
    }

    fn compute_outcome(&self) -> MatchOutcome {
        let opponent = self
            .sync
            .mirror()
            .map_or(Outcome::None, |snapshot| snapshot.outcome());
        let mut game = self.game.lock();
        let outcome = MatchOutcome::combine(game.outcome(), opponent);

        // The clock runs while the match is live, and freezes once decided
        if outcome.is_over() {
            if game.timer().is_running() {
                tracing::info!("Match over: {:?} after {:?}", outcome, game.timer().elapsed());
            }
            game.timer_mut().pause();
        } else {
            game.timer_mut().resume();
        }
        outcome
    }

    fn broadcast(&self) {
        if let Err(e) = self.sync.broadcast_game() {
            tracing::warn!("Failed to send game update: {}", e);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Outcome as of the last tick.
    #[inline]
    #[must_use]
    pub const fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    /// Opponent's display name.
    #[must_use]
    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    /// Our session.
    #[must_use]
    pub fn game(&self) -> &Arc<Mutex<Game>> {
        &self.game
    }

    /// The synchronizer behind this match.
    #[must_use]
    pub fn sync(&self) -> &Arc<PeerSync> {
        &self.sync
    }

    /// Moves waiting for a tick.
    #[must_use]
    pub fn queued_moves(&self) -> usize {
        self.moves_rx.len()
    }

    /// Copies what presentation needs for one frame.
    #[must_use]
    pub fn view(&self) -> DuelView {
        DuelView {
            own: self.game.lock().snapshot(),
            opponent: self.sync.mirror(),
            opponent_name: self.opponent.clone(),
            outcome: self.outcome,
            connected: self.sync.is_connected(),
        }
    }

    /// Pauses the timer, closes the link and stops the relay.
    pub fn leave(&mut self) {
        self.game.lock().timer_mut().pause();
        self.sync.leave();
        if let Some(relay) = self.relay.take() {
            relay.stop();
        }
    }
}

impl Drop for DuelMatch {
    fn drop(&mut self) {
        self.leave();
    }
}

impl std::fmt::Debug for DuelMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuelMatch")
            .field("opponent", &self.opponent)
            .field("outcome", &self.outcome)
            .field("queued_moves", &self.moves_rx.len())
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}
