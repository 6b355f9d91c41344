//! # Tiles
//!
//! A tile is a value (0 for an empty cell), a "combined this turn" flag and
//! an opaque identity. The presentation layer keys animations on identity,
//! so a fresh one is drawn whenever a cell's content is created or replaced.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value stored in an empty cell.
pub const EMPTY: u32 = 0;

/// Opaque tile identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(Uuid);

impl TileId {
    /// Draws a fresh identity from the grid's random source.
    ///
    /// Drawing from the injected source (instead of the OS) keeps a seeded
    /// grid fully reproducible, identities included.
    #[inline]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single cell of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile value: 0 when empty, otherwise a power of two >= 2.
    #[serde(rename = "val")]
    pub value: u32,
    /// Set when the tile was produced by a merge during the current move.
    #[serde(rename = "cmb")]
    pub combined: bool,
    /// Identity of the cell content.
    pub id: TileId,
}

impl Tile {
    /// Creates an empty tile with the given identity.
    #[inline]
    #[must_use]
    pub const fn empty(id: TileId) -> Self {
        Self {
            value: EMPTY,
            combined: false,
            id,
        }
    }

    /// Creates a tile holding `value`.
    #[inline]
    #[must_use]
    pub const fn with_value(value: u32, id: TileId) -> Self {
        Self {
            value,
            combined: false,
            id,
        }
    }

    /// Returns true if the cell holds no tile.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value == EMPTY
    }

    /// Value centred in a 7 character column, for debug dumps.
    #[must_use]
    pub fn padded(&self) -> String {
        format!("{:^7}", self.value)
    }
}

/// Value for a newly spawned tile: 2 with probability 0.9, otherwise 4.
#[inline]
pub fn new_tile_value<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    if rng.gen::<f64>() >= 0.9 {
        4
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_identity_is_seed_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(TileId::generate(&mut a), TileId::generate(&mut b));
        assert_ne!(TileId::generate(&mut a), TileId::generate(&mut a));
    }

    #[test]
    fn test_new_tile_value_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut fours = 0;
        for _ in 0..10_000 {
            match new_tile_value(&mut rng) {
                2 => {}
                4 => fours += 1,
                other => panic!("unexpected tile value {other}"),
            }
        }
        // 10% expected, generous bounds
        assert!((700..1300).contains(&fours), "got {fours} fours");
    }

    #[test]
    fn test_padded_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tile = Tile::with_value(2048, TileId::generate(&mut rng));
        assert_eq!(tile.padded().len(), 7);
        assert!(Tile::empty(TileId::generate(&mut rng)).is_empty());
    }
}
