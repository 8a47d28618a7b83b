//! Serializable game snapshots.
//!
//! The core exports and rehydrates a plain data shape; the storage medium and
//! key naming belong to the embedding application. Snapshots carry a version
//! field, and anything malformed or from another version is discarded in
//! favor of a fresh board rather than partially repaired.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::spawn::TileSource;
use crate::{Coord, Game, MergeKey, Tile};

/// Bump when the snapshot shape changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full persistable game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<K> {
    pub version: u32,
    pub size: usize,
    /// Row-major, exactly `size * size` tiles.
    pub board: Vec<Tile<K>>,
    pub score: u64,
    pub highest: K,
    pub move_count: u64,
    pub game_ended: bool,
}

impl<K: Serialize> Snapshot<K> {
    pub fn to_json(&self) -> String {
        // Snapshot contains only plain data; serialization cannot fail.
        serde_json::to_string(self).expect("snapshot is plain data")
    }
}

impl<K: DeserializeOwned> Snapshot<K> {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
    #[error("snapshot board does not form a {size}x{size} grid")]
    Shape { size: usize },
}

impl<K: MergeKey, S: TileSource<K>> Game<K, S> {
    /// Export the full game state.
    pub fn snapshot(&self) -> Snapshot<K> {
        Snapshot {
            version: SNAPSHOT_VERSION,
            size: self.size,
            board: self.tiles.clone(),
            score: self.score,
            highest: self.highest.clone(),
            move_count: self.move_count,
            game_ended: self.ended,
        }
    }

    /// Replace this game's state with a snapshot.
    ///
    /// Validates the version and the board shape (tile count and row-major
    /// positions); on error the game is left unchanged. Any active drag
    /// session is aborted.
    pub fn load(&mut self, snap: Snapshot<K>) -> Result<(), SnapshotError> {
        if snap.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snap.version));
        }
        if snap.size < 2 || snap.board.len() != snap.size * snap.size {
            return Err(SnapshotError::Shape { size: snap.size });
        }
        for (i, tile) in snap.board.iter().enumerate() {
            if tile.pos != Coord::new(i % snap.size, i / snap.size) {
                return Err(SnapshotError::Shape { size: snap.size });
            }
        }

        self.size = snap.size;
        self.tiles = snap.board;
        self.score = snap.score;
        self.highest = snap.highest;
        self.move_count = snap.move_count;
        self.ended = snap.game_ended;
        self.next_id = self.tiles.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.spawner.reset();
        self.spawner.observe_highest(&self.highest);
        self.session.abort();
        self.move_in_flight = false;
        Ok(())
    }
}
