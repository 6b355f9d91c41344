//! # Solo Game
//!
//! Keys go straight to the session; there is no queue and no opponent.
//! The timer starts with the first move rather than on entry, and the game
//! is saved to the store when the player leaves.

use rand::rngs::OsRng;
use rand::RngCore;
use tilebattle_core::{Game, GameSnapshot};

use crate::input::Key;
use crate::store::{Store, StoreError, StoreResult, SOLO_SAVE_KEY};

/// Single-player front end.
#[derive(Debug)]
pub struct SoloGame {
    game: Game,
    store: Store,
}

impl SoloGame {
    /// Starts a fresh game that will be saved into `store`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            game: Game::from_entropy(),
            store,
        }
    }

    /// Resumes the saved game, or starts a fresh one if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the save does not decode or holds
    /// an impossible game, or the read error.
    pub fn load(store: Store) -> StoreResult<Self> {
        let Some(bytes) = store.read_bytes(SOLO_SAVE_KEY)? else {
            tracing::info!("No saved game, starting fresh");
            return Ok(Self::new(store));
        };

        let corrupt = |reason: String| StoreError::Corrupt {
            key: SOLO_SAVE_KEY.to_string(),
            reason,
        };
        let snapshot: GameSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        snapshot.validate().map_err(|e| corrupt(e.to_string()))?;
        tracing::info!(
            "Restored saved game (score {}, {} tiles)",
            snapshot.score,
            snapshot.board.num_tiles()
        );

        Ok(Self {
            game: Game::restore(snapshot, OsRng.next_u64()),
            store,
        })
    }

    /// Applies one key. Returns the points scored.
    pub fn handle_key(&mut self, key: Key) -> u32 {
        match key.direction() {
            Some(direction) => {
                self.game.timer_mut().resume();
                self.game.execute_move(direction)
            }
            None => {
                self.game.reset();
                0
            }
        }
    }

    /// Pauses the timer and writes the game to the store.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub fn save(&mut self) -> StoreResult<()> {
        self.game.timer_mut().pause();
        let bytes = serde_json::to_vec(&self.game.snapshot()).map_err(|e| StoreError::Corrupt {
            key: SOLO_SAVE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.save_bytes(SOLO_SAVE_KEY, &bytes)
    }

    /// The session, for presentation.
    #[inline]
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_store;
    use std::time::Duration;
    use tilebattle_core::Direction;

    #[test]
    fn test_timer_starts_on_first_move() {
        let mut solo = SoloGame::new(temp_store("solo_timer"));
        assert!(!solo.game().timer().is_running());

        let _ = solo.handle_key(Key::Left);
        assert!(solo.game().timer().is_running());

        std::fs::remove_dir_all(solo.store.dir()).ok();
    }

    #[test]
    fn test_reset_zeroes_score_and_timer() {
        let mut solo = SoloGame::new(temp_store("solo_reset"));
        for key in [Key::Left, Key::Up, Key::Right, Key::Down].repeat(10) {
            let _ = solo.handle_key(key);
        }

        let _ = solo.handle_key(Key::Reset);
        assert_eq!(solo.game().score(), 0);
        assert_eq!(solo.game().grid().num_tiles(), 2);
        assert!(!solo.game().timer().is_running());
        assert_eq!(solo.game().timer().elapsed(), Duration::ZERO);

        std::fs::remove_dir_all(solo.store.dir()).ok();
    }

    #[test]
    fn test_save_then_load_restores_board() {
        let store = temp_store("solo_save");
        let mut solo = SoloGame::new(store.clone());
        for direction in Direction::ALL.repeat(5) {
            let _ = solo.handle_key(match direction {
                Direction::Up => Key::Up,
                Direction::Down => Key::Down,
                Direction::Left => Key::Left,
                Direction::Right => Key::Right,
            });
        }
        solo.save().unwrap();
        let saved = solo.game().snapshot();
        assert!(!solo.game().timer().is_running());

        let restored = SoloGame::load(store.clone()).unwrap();
        assert_eq!(restored.game().snapshot(), saved);
        assert!(!restored.game().timer().is_running());

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_load_without_save_starts_fresh() {
        let store = temp_store("solo_fresh");
        let solo = SoloGame::load(store.clone()).unwrap();
        assert_eq!(solo.game().score(), 0);
        assert_eq!(solo.game().grid().num_tiles(), 2);
        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_corrupt_save_is_reported() {
        let store = temp_store("solo_corrupt");
        store.save_bytes(SOLO_SAVE_KEY, b"{\"score\":").unwrap();
        assert!(matches!(
            SoloGame::load(store.clone()),
            Err(StoreError::Corrupt { .. })
        ));
        std::fs::remove_dir_all(store.dir()).ok();
    }

    /// Writes a fresh game's save after `edit` has tampered with its JSON.
    fn write_edited_save(store: &Store, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut json = serde_json::to_value(Game::new(17).snapshot()).unwrap();
        edit(&mut json);
        store.save_bytes(SOLO_SAVE_KEY, &serde_json::to_vec(&json).unwrap()).unwrap();
    }

    #[test]
    fn test_impossible_tile_in_save_is_corrupt() {
        let store = temp_store("solo_bad_tile");
        write_edited_save(&store, |json| json["board"]["tiles"][0][0]["val"] = 3.into());

        assert!(matches!(
            SoloGame::load(store.clone()),
            Err(StoreError::Corrupt { .. })
        ));
        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_overlong_elapsed_in_save_is_corrupt() {
        let store = temp_store("solo_bad_elapsed");
        write_edited_save(&store, |json| {
            json["elapsed"] = serde_json::json!({ "secs": u64::MAX, "nanos": 999_999_999 });
        });

        assert!(matches!(
            SoloGame::load(store.clone()),
            Err(StoreError::Corrupt { .. })
        ));
        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_huge_tiles_in_save_play_without_merging() {
        let store = temp_store("solo_huge_tiles");
        write_edited_save(&store, |json| {
            for row in 0..4 {
                for col in 0..4 {
                    json["board"]["tiles"][row][col]["val"] = 0.into();
                }
            }
            let row = &mut json["board"]["tiles"][0];
            row[0]["val"] = (1u32 << 31).into();
            row[1]["val"] = (1u32 << 31).into();
        });

        let mut solo = SoloGame::load(store.clone()).unwrap();
        assert_eq!(solo.handle_key(Key::Left), 0);
        let values = solo.game().grid().board().values();
        assert_eq!(&values[0][..2], &[1 << 31, 1 << 31]);

        std::fs::remove_dir_all(store.dir()).ok();
    }
}
