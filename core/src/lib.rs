//! # 1+1 Match-and-Shift Core Engine
//!
//! A pure Rust implementation of the "1+1" drag-to-merge puzzle with a
//! deterministic, seedable PRNG for reproducible gameplay. Designed for easy
//! integration with CLI and WebAssembly front ends.
//!
//! Unlike classic 2048, the board is always fully populated. A move drags one
//! tile into an equal neighbor: the two merge, the tiles behind the vacated
//! cell shift one step toward it, and a fresh tile spawns at the wall the
//! chain came from. The game ends when no two adjacent tiles match anywhere.
//!
//! ## Example
//!
//! ```rust
//! use one_plus_one_core::{Coord, Direction, Game};
//!
//! let mut game = Game::new(42); // 5x5 board, every tile starts at 1
//! let outcome = game.try_move(Coord::new(1, 2), Direction::Right);
//! println!("Score: {}, Accepted: {}", game.score(), outcome.accepted);
//! ```

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gesture;
pub mod snapshot;
pub mod spawn;

pub use gesture::{DragSession, GestureConfig, GestureUpdate};
pub use snapshot::{Snapshot, SnapshotError, SNAPSHOT_VERSION};
pub use spawn::{TileSource, WeightedPowerSpawner};

use gesture::SessionEvent;

/// Default board edge length. The original game shipped 5x5 and 7x7 variants.
pub const DEFAULT_BOARD_SIZE: usize = 5;

/// A cell position on the board. `x` is the column, `y` the row, both in
/// `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }

    /// Step by `(dx, dy)`, returning `None` when the result leaves the board.
    pub fn offset(self, dx: isize, dy: isize, size: usize) -> Option<Coord> {
        let x = self.x as isize + dx;
        let y = self.y as isize + dy;
        if x < 0 || y < 0 || x >= size as isize || y >= size as isize {
            None
        } else {
            Some(Coord::new(x as usize, y as usize))
        }
    }
}

/// The four directions a tile can be dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step as `(dx, dy)`.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Build a direction from axis-locked displacement signs. Exactly one of
    /// the two signs must be nonzero.
    pub fn from_signs(dx: i8, dy: i8) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    /// Get all four directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }
}

/// The attribute compared for equality to permit a merge.
///
/// The engine only needs equality plus a way to compute the merge result and
/// its score reward; numeric power-of-two tiles are the shipped variant, an
/// opaque category token works just as well.
pub trait MergeKey: Clone + PartialEq + fmt::Debug {
    /// The key left on the target cell after merging two equal keys.
    fn merged(&self) -> Self;
    /// Score contribution of a merge: the pre-merge value, not the result.
    fn reward(&self) -> u64;
    /// Whether this key outranks `other` for the center-cell milestone.
    fn ranks_above(&self, other: &Self) -> bool;
}

impl MergeKey for u32 {
    fn merged(&self) -> u32 {
        self * 2
    }

    fn reward(&self) -> u64 {
        u64::from(*self)
    }

    fn ranks_above(&self, other: &u32) -> bool {
        self > other
    }
}

/// A tile: a stable identity for animation correlation, a position, and a
/// merge key. Plain data; rendering behavior lives entirely outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile<K> {
    pub id: u32,
    pub pos: Coord,
    pub key: K,
}

impl<K> Tile<K> {
    /// Whether this tile sits on the exact center cell of a `size` board.
    /// Only the score tracker cares.
    pub fn is_center(&self, size: usize) -> bool {
        self.pos.x == size / 2 && self.pos.y == size / 2
    }
}

/// Semantic events derived from one committed move, in emission order.
/// The render layer sequences its own animation delays from these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameEvent<K> {
    /// A chain tile's key advanced one cell toward the vacancy.
    TileMoved {
        id: u32,
        from: Coord,
        to: Coord,
        animate: bool,
    },
    /// The target cell absorbed the dragged tile.
    TileMerged { id: u32, at: Coord, key: K },
    /// A fresh tile appeared at the trailing wall.
    TileSpawned { id: u32, at: Coord, key: K },
    ScoreChanged { delta: u64 },
    /// A new center-cell milestone was reached.
    HighestChanged { key: K },
    GameEnded,
}

/// Result of attempting a move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveOutcome<K> {
    /// Whether the merge was legal and applied.
    pub accepted: bool,
    /// Points earned by this move (pre-merge value of the dragged tile).
    pub reward: u64,
    /// Whether the game is over after this move.
    pub ended: bool,
    /// Derived events, empty when rejected.
    pub events: Vec<GameEvent<K>>,
}

impl<K> MoveOutcome<K> {
    fn rejected(ended: bool) -> Self {
        MoveOutcome {
            accepted: false,
            reward: 0,
            ended,
            events: Vec::new(),
        }
    }
}

/// The 1+1 game state.
///
/// Owns a `size`x`size` grid of tiles in row-major order. Every cell holds
/// exactly one tile at all times; a vacancy exists only transiently inside a
/// single move's shift computation. Generic over the merge key `K` and the
/// refill source `S`; the default pairing is power-of-two values with the
/// value-weighted spawner.
#[derive(Clone)]
pub struct Game<K: MergeKey = u32, S: TileSource<K> = WeightedPowerSpawner> {
    size: usize,
    tiles: Vec<Tile<K>>,
    score: u64,
    highest: K,
    initial: K,
    move_count: u64,
    ended: bool,
    next_id: u32,
    rng: SmallRng,
    spawner: S,
    session: DragSession,
    move_in_flight: bool,
}

impl Game<u32, WeightedPowerSpawner> {
    /// Create a new game with the given seed on the default 5x5 board.
    /// Every tile starts at value 1.
    pub fn new(seed: u64) -> Self {
        Self::with_size(seed, DEFAULT_BOARD_SIZE)
    }

    /// Create a new game on a `size`x`size` board.
    pub fn with_size(seed: u64, size: usize) -> Self {
        Self::with_parts(
            seed,
            size,
            1,
            WeightedPowerSpawner::new(1),
            GestureConfig::default(),
        )
    }

    /// Rehydrate a game from a JSON snapshot.
    pub fn from_json(json: &str, seed: u64) -> Result<Self, SnapshotError> {
        let snap: Snapshot<u32> = Snapshot::from_json(json)?;
        let mut game = Self::new(seed);
        game.load(snap)?;
        Ok(game)
    }

    /// Rehydrate from a JSON snapshot, falling back to a fresh board when the
    /// data is malformed or from an incompatible version. Never fails.
    pub fn restore_or_new(json: &str, seed: u64) -> Self {
        match Self::from_json(json, seed) {
            Ok(game) => game,
            Err(err) => {
                log::warn!("discarding saved game: {}", err);
                Self::new(seed)
            }
        }
    }
}

impl<K: MergeKey, S: TileSource<K>> Game<K, S> {
    /// Create a game from explicit parts: seed, board size, the key every
    /// fresh tile starts with, a refill source, and the gesture geometry.
    pub fn with_parts(
        seed: u64,
        size: usize,
        initial: K,
        spawner: S,
        gesture: GestureConfig,
    ) -> Self {
        assert!(size >= 2, "board size must be at least 2");
        let mut next_id = 0;
        let tiles = fresh_tiles(size, &initial, &mut next_id);
        Game {
            size,
            tiles,
            score: 0,
            highest: initial.clone(),
            initial,
            move_count: 0,
            ended: false,
            next_id,
            rng: SmallRng::seed_from_u64(seed),
            spawner,
            session: DragSession::new(gesture),
            move_in_flight: false,
        }
    }

    /// Reset to a fresh board with counters zeroed, independent of any
    /// persisted state.
    pub fn reset(&mut self, seed: u64) {
        self.next_id = 0;
        self.tiles = fresh_tiles(self.size, &self.initial, &mut self.next_id);
        self.score = 0;
        self.highest = self.initial.clone();
        self.move_count = 0;
        self.ended = false;
        self.rng = SmallRng::seed_from_u64(seed);
        self.spawner.reset();
        self.session.abort();
        self.move_in_flight = false;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The exact center cell, the score milestone location.
    pub fn center(&self) -> Coord {
        Coord::new(self.size / 2, self.size / 2)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Highest key ever reached at the center cell. Drives the spawn domain.
    pub fn highest(&self) -> &K {
        &self.highest
    }

    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    /// Whether the board is terminal and play has stopped.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Get the tile at `at`. Panics when `at` is out of bounds.
    pub fn tile(&self, at: Coord) -> &Tile<K> {
        &self.tiles[self.index(at)]
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[Tile<K>] {
        &self.tiles
    }

    /// Row-major copy of the merge keys, for bindings.
    pub fn keys(&self) -> Vec<K> {
        self.tiles.iter().map(|t| t.key.clone()).collect()
    }

    // -------------------------------------------------------------------------
    // Gesture boundary
    // -------------------------------------------------------------------------

    /// Rendered tile edge length the commit threshold derives from.
    pub fn tile_width(&self) -> f64 {
        self.session.config().tile_width
    }

    /// Reconfigure the gesture geometry for the embedder's rendered tile
    /// size. Takes effect from the next sample.
    pub fn set_tile_width(&mut self, tile_width: f64) {
        self.session.set_config(GestureConfig { tile_width });
    }

    /// Begin a drag session on the tile at `origin`.
    ///
    /// Returns `false` (a no-op) while another session is active, while a
    /// committed move is still in flight, after the game has ended, or when
    /// `origin` is off the board.
    pub fn start_drag(&mut self, origin: Coord) -> bool {
        if self.ended || self.move_in_flight {
            return false;
        }
        if origin.x >= self.size || origin.y >= self.size {
            return false;
        }
        self.session.start(origin)
    }

    /// Feed one pointer displacement sample (pixels since the previous
    /// sample) into the active drag session.
    ///
    /// Under the threshold this reports a proportional axis-locked offset and
    /// the cell a commit would currently target. Crossing the threshold
    /// commits exactly one move for the session; later samples are ignored.
    pub fn drag_sample(&mut self, dx: f64, dy: f64) -> GestureUpdate<K> {
        match self.session.sample(dx, dy) {
            SessionEvent::Inactive => GestureUpdate::Ignored,
            SessionEvent::Tracking { offset, signs } => {
                let probe = self.probe_target(self.session.origin(), signs);
                GestureUpdate::Tracking { offset, probe }
            }
            SessionEvent::Commit { origin, signs } => {
                let dir = match Direction::from_signs(signs.0, signs.1) {
                    Some(dir) => dir,
                    None => return GestureUpdate::RejectedOffBoard,
                };
                let (dx, dy) = dir.delta();
                if origin.offset(dx, dy, self.size).is_none() {
                    // Dragging an edge tile off the board never reaches the
                    // merge validator.
                    return GestureUpdate::RejectedOffBoard;
                }
                let outcome = self.try_move(origin, dir);
                if outcome.accepted {
                    self.move_in_flight = true;
                }
                GestureUpdate::Committed(outcome)
            }
        }
    }

    /// End the active drag session.
    ///
    /// A session stopped under the threshold retracts (the visual offset
    /// returns to zero); a committed session simply closes. Also releases the
    /// in-flight guard so the next session can start.
    pub fn stop_drag(&mut self) -> GestureUpdate<K> {
        self.move_in_flight = false;
        if !self.session.is_active() {
            return GestureUpdate::Ignored;
        }
        if self.session.stop() {
            GestureUpdate::Retracted
        } else {
            GestureUpdate::Ignored
        }
    }

    fn probe_target(&self, origin: Coord, signs: (i8, i8)) -> Option<Coord> {
        if signs == (0, 0) {
            return None;
        }
        origin.offset(signs.0 as isize, signs.1 as isize, self.size)
    }

    // -------------------------------------------------------------------------
    // Two-phase move API
    // -------------------------------------------------------------------------

    /// Validate and apply a single move: merge `origin` into the adjacent
    /// cell in `dir`, shift the trailing chain, refill the wall cell.
    ///
    /// All derived events are returned synchronously; the caller sequences
    /// its own animation before starting the next session. Rejection (out of
    /// bounds target or mismatched keys) is the common case, not an error,
    /// and leaves the board untouched.
    pub fn try_move(&mut self, origin: Coord, dir: Direction) -> MoveOutcome<K> {
        if self.ended {
            return MoveOutcome::rejected(true);
        }
        if origin.x >= self.size || origin.y >= self.size {
            return MoveOutcome::rejected(false);
        }
        match self.merge_target(origin, dir) {
            Some(target) => self.apply_move(origin, target, dir),
            None => MoveOutcome::rejected(false),
        }
    }

    /// Every `(origin, direction)` pair whose merge would be accepted.
    pub fn legal_moves(&self) -> Vec<(Coord, Direction)> {
        let mut moves = Vec::new();
        for y in 0..self.size {
            for x in 0..self.size {
                let origin = Coord::new(x, y);
                for dir in Direction::all() {
                    if self.merge_target(origin, dir).is_some() {
                        moves.push((origin, dir));
                    }
                }
            }
        }
        moves
    }

    // -------------------------------------------------------------------------
    // Terminal detection
    // -------------------------------------------------------------------------

    /// True when no two adjacent tiles match anywhere, horizontally or
    /// vertically. Evaluated only after a move's shift and refill settle.
    pub fn is_terminal(&self) -> bool {
        !self.has_horizontal_match() && !self.has_vertical_match()
    }

    fn has_horizontal_match(&self) -> bool {
        for y in 0..self.size {
            for x in 0..self.size - 1 {
                if self.tile(Coord::new(x, y)).key == self.tile(Coord::new(x + 1, y)).key {
                    return true;
                }
            }
        }
        false
    }

    fn has_vertical_match(&self) -> bool {
        for x in 0..self.size {
            for y in 0..self.size - 1 {
                if self.tile(Coord::new(x, y)).key == self.tile(Coord::new(x, y + 1)).key {
                    return true;
                }
            }
        }
        false
    }

    // -------------------------------------------------------------------------
    // Private methods
    // -------------------------------------------------------------------------

    fn index(&self, at: Coord) -> usize {
        at.y * self.size + at.x
    }

    /// The merge validator: the adjacent cell in `dir`, if it exists and its
    /// key equals the origin's. Compares by value, never identity.
    fn merge_target(&self, origin: Coord, dir: Direction) -> Option<Coord> {
        let (dx, dy) = dir.delta();
        let target = origin.offset(dx, dy, self.size)?;
        if self.tile(origin).key == self.tile(target).key {
            Some(target)
        } else {
            None
        }
    }

    /// Ordered cells from the vacated origin to the trailing wall, walking
    /// away from the direction of motion. Length is always `d + 1` where `d`
    /// is the origin's distance to that wall.
    fn shift_chain(&self, origin: Coord, dir: Direction) -> Vec<Coord> {
        let (dx, dy) = dir.delta();
        let mut chain = vec![origin];
        let mut cur = origin;
        while let Some(next) = cur.offset(-dx, -dy, self.size) {
            chain.push(next);
            cur = next;
        }
        chain
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn apply_move(&mut self, origin: Coord, target: Coord, dir: Direction) -> MoveOutcome<K> {
        let mut events = Vec::new();

        let pre_key = self.tile(origin).key.clone();
        let reward = pre_key.reward();
        let merged = pre_key.merged();

        let ti = self.index(target);
        self.tiles[ti].key = merged;
        events.push(GameEvent::TileMerged {
            id: self.tiles[ti].id,
            at: target,
            key: self.tiles[ti].key.clone(),
        });

        // Single forward pass: each chain cell takes the key of the next one
        // out, so no vacancy ever persists.
        let chain = self.shift_chain(origin, dir);
        assert_eq!(chain[0], origin, "shift chain must start at the vacancy");
        for w in chain.windows(2) {
            let (to, from) = (w[0], w[1]);
            let from_idx = self.index(from);
            let moved_id = self.tiles[from_idx].id;
            let key = self.tiles[from_idx].key.clone();
            let to_idx = self.index(to);
            self.tiles[to_idx].key = key;
            events.push(GameEvent::TileMoved {
                id: moved_id,
                from,
                to,
                animate: true,
            });
        }

        // The cell nearest the trailing wall gets a brand new tile.
        let wall = chain[chain.len() - 1];
        let key = self.spawner.next_key(&mut self.rng);
        let id = self.alloc_id();
        let wi = self.index(wall);
        self.tiles[wi] = Tile {
            id,
            pos: wall,
            key: key.clone(),
        };
        events.push(GameEvent::TileSpawned { id, at: wall, key });

        self.score += reward;
        events.push(GameEvent::ScoreChanged { delta: reward });

        if self.tiles[ti].is_center(self.size) && self.tiles[ti].key.ranks_above(&self.highest) {
            self.highest = self.tiles[ti].key.clone();
            self.spawner.observe_highest(&self.highest);
            events.push(GameEvent::HighestChanged {
                key: self.highest.clone(),
            });
        }

        self.move_count += 1;

        // Terminal check runs only after the refill settles; the spawned tile
        // can itself create or remove a match.
        if self.is_terminal() {
            self.ended = true;
            events.push(GameEvent::GameEnded);
        }

        log::debug!(
            "move #{}: {:?} -> {:?} ({:?}), reward {}, chain {}, ended {}",
            self.move_count,
            origin,
            target,
            dir,
            reward,
            chain.len(),
            self.ended
        );

        MoveOutcome {
            accepted: true,
            reward,
            ended: self.ended,
            events,
        }
    }
}

fn fresh_tiles<K: MergeKey>(size: usize, initial: &K, next_id: &mut u32) -> Vec<Tile<K>> {
    let mut tiles = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            tiles.push(Tile {
                id: *next_id,
                pos: Coord::new(x, y),
                key: initial.clone(),
            });
            *next_id += 1;
        }
    }
    tiles
}

impl<K, S> fmt::Debug for Game<K, S>
where
    K: MergeKey,
    S: TileSource<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Game {{ size: {}, score: {}, moves: {}, ended: {} }}",
            self.size, self.score, self.move_count, self.ended
        )?;
        for y in 0..self.size {
            for x in 0..self.size {
                write!(f, " {:?}", self.tile(Coord::new(x, y)).key)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<K, S> fmt::Display for Game<K, S>
where
    K: MergeKey + fmt::Display,
    S: TileSource<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Score: {}  Highest: {}  Moves: {}",
            self.score, self.highest, self.move_count
        )?;
        let rule: String = "+------".repeat(self.size) + "+";
        writeln!(f, "{}", rule)?;
        for y in 0..self.size {
            write!(f, "|")?;
            for x in 0..self.size {
                let cell = self.tile(Coord::new(x, y)).key.to_string();
                write!(f, "{:^6}|", cell)?;
            }
            writeln!(f)?;
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Refill source that always produces the same key, for deterministic
    /// board surgery in tests.
    #[derive(Clone)]
    struct FixedSpawner(u32);

    impl TileSource<u32> for FixedSpawner {
        fn next_key<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> u32 {
            self.0
        }
        fn observe_highest(&mut self, _key: &u32) {}
        fn reset(&mut self) {}
    }

    fn fixed_game(size: usize, spawn: u32) -> Game<u32, FixedSpawner> {
        Game::with_parts(0, size, 1, FixedSpawner(spawn), GestureConfig::default())
    }

    fn set_keys<S: TileSource<u32>>(game: &mut Game<u32, S>, keys: &[u32]) {
        assert_eq!(keys.len(), game.size * game.size);
        for (tile, key) in game.tiles.iter_mut().zip(keys) {
            tile.key = *key;
        }
    }

    // -------------------------------------------------------------------------
    // Merge + shift correctness
    // -------------------------------------------------------------------------

    #[test]
    fn test_merge_into_center_scenario() {
        // 5x5, all ones; drag the tile left of center rightward into center.
        let mut game = Game::new(7);
        let origin = Coord::new(1, 2);
        let outcome = game.try_move(origin, Direction::Right);

        assert!(outcome.accepted);
        assert_eq!(outcome.reward, 1);
        assert_eq!(game.score(), 1);
        assert_eq!(game.tile(Coord::new(2, 2)).key, 2);
        // Spawn domain is still {1}, so the wall cell refills with 1.
        assert_eq!(game.tile(Coord::new(0, 2)).key, 1);
        assert_eq!(game.tile(origin).key, 1);
        assert_eq!(game.tiles().len(), 25);
        assert!(!game.is_ended());
    }

    #[test]
    fn test_shift_chain_length_is_distance_plus_one() {
        let game = Game::new(0);
        // Moving right, the trailing wall is the left edge (x = 0).
        assert_eq!(game.shift_chain(Coord::new(3, 2), Direction::Right).len(), 4);
        assert_eq!(game.shift_chain(Coord::new(1, 2), Direction::Right).len(), 2);
        // Origin already at the trailing wall: single-cell chain.
        assert_eq!(game.shift_chain(Coord::new(0, 2), Direction::Right).len(), 1);
        assert_eq!(game.shift_chain(Coord::new(2, 4), Direction::Up).len(), 1);
        assert_eq!(game.shift_chain(Coord::new(2, 0), Direction::Up).len(), 5);
    }

    #[test]
    fn test_chain_shifts_keys_toward_vacancy() {
        let mut game = fixed_game(5, 9);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            2, 4, 8, 8, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
        ]);
        // Drag (2,2)=8 right into (3,2)=8; chain [(2,2),(1,2),(0,2)] shifts.
        let outcome = game.try_move(Coord::new(2, 2), Direction::Right);
        assert!(outcome.accepted);
        assert_eq!(game.tile(Coord::new(3, 2)).key, 16);
        assert_eq!(game.tile(Coord::new(2, 2)).key, 4);
        assert_eq!(game.tile(Coord::new(1, 2)).key, 2);
        assert_eq!(game.tile(Coord::new(0, 2)).key, 9);
        // Cells outside the affected line are untouched.
        assert_eq!(game.tile(Coord::new(4, 2)).key, 1);
        assert_eq!(game.tile(Coord::new(2, 1)).key, 1);
    }

    #[test]
    fn test_wall_adjacent_origin_refills_directly() {
        let mut game = fixed_game(5, 9);
        let outcome = game.try_move(Coord::new(0, 2), Direction::Right);
        assert!(outcome.accepted);
        assert_eq!(game.tile(Coord::new(1, 2)).key, 2);
        assert_eq!(game.tile(Coord::new(0, 2)).key, 9);
    }

    #[test]
    fn test_merge_conservation() {
        let mut game = Game::new(11);
        let outcome = game.try_move(Coord::new(2, 1), Direction::Down);
        assert!(outcome.accepted);
        assert_eq!(game.tiles().len(), game.size() * game.size());
        // Every cell still holds a tile at its own coordinates.
        for (i, tile) in game.tiles().iter().enumerate() {
            assert_eq!(tile.pos, Coord::new(i % 5, i / 5));
        }
    }

    #[test]
    fn test_vertical_move_shifts_column() {
        let mut game = fixed_game(5, 9);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 1, 4, 1, 1,
            1, 1, 2, 1, 1,
            1, 1, 8, 1, 1,
            1, 1, 8, 1, 1,
            1, 1, 1, 1, 1,
        ]);
        // Drag (2,3) up into (2,2); the chain walks down to the bottom wall.
        let outcome = game.try_move(Coord::new(2, 3), Direction::Up);
        assert!(outcome.accepted);
        assert_eq!(game.tile(Coord::new(2, 2)).key, 16);
        assert_eq!(game.tile(Coord::new(2, 3)).key, 1);
        assert_eq!(game.tile(Coord::new(2, 4)).key, 9);
        assert_eq!(game.tile(Coord::new(2, 0)).key, 4);
        assert_eq!(game.tile(Coord::new(2, 1)).key, 2);
    }

    // -------------------------------------------------------------------------
    // Rejection paths
    // -------------------------------------------------------------------------

    #[test]
    fn test_mismatched_keys_rejected_without_mutation() {
        let mut game = fixed_game(5, 9);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 2, 1, 2, 1,
            2, 1, 2, 1, 2,
            1, 2, 1, 2, 1,
            2, 1, 2, 1, 2,
            1, 2, 1, 2, 1,
        ]);
        let before = game.keys();
        let outcome = game.try_move(Coord::new(1, 2), Direction::Right);
        assert!(!outcome.accepted);
        assert_eq!(outcome.reward, 0);
        assert!(outcome.events.is_empty());
        assert_eq!(game.keys(), before);
        assert_eq!(game.score(), 0);
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_target_rejected() {
        let mut game = Game::new(3);
        let before = game.keys();
        assert!(!game.try_move(Coord::new(0, 2), Direction::Left).accepted);
        assert!(!game.try_move(Coord::new(4, 2), Direction::Right).accepted);
        assert!(!game.try_move(Coord::new(2, 0), Direction::Up).accepted);
        assert!(!game.try_move(Coord::new(2, 4), Direction::Down).accepted);
        assert!(!game.try_move(Coord::new(9, 9), Direction::Down).accepted);
        assert_eq!(game.keys(), before);
    }

    #[test]
    fn test_move_after_game_end_rejected() {
        let mut game = fixed_game(2, 8);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 1,
            2, 4,
        ]);
        let outcome = game.try_move(Coord::new(0, 0), Direction::Right);
        assert!(outcome.accepted);
        assert!(outcome.ended);
        assert!(game.is_ended());
        let after = game.keys();
        let next = game.try_move(Coord::new(0, 1), Direction::Right);
        assert!(!next.accepted);
        assert!(next.ended);
        assert_eq!(game.keys(), after);
    }

    // -------------------------------------------------------------------------
    // Scoring and the center milestone
    // -------------------------------------------------------------------------

    #[test]
    fn test_reward_is_pre_merge_value() {
        let mut game = fixed_game(5, 9);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 4, 4, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
        ]);
        let outcome = game.try_move(Coord::new(1, 2), Direction::Right);
        assert!(outcome.accepted);
        assert_eq!(outcome.reward, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.tile(Coord::new(2, 2)).key, 8);
    }

    #[test]
    fn test_milestone_only_at_center() {
        let mut game = fixed_game(5, 9);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            8, 8, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
        ]);
        // A big merge away from the center does not move the milestone.
        let outcome = game.try_move(Coord::new(0, 0), Direction::Right);
        assert!(outcome.accepted);
        assert_eq!(*game.highest(), 1);
        assert!(!outcome
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::HighestChanged { .. })));
    }

    #[test]
    fn test_milestone_at_center_updates_and_notifies() {
        let mut game = Game::new(3);
        let outcome = game.try_move(Coord::new(1, 2), Direction::Right);
        assert!(outcome.accepted);
        assert_eq!(*game.highest(), 2);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::HighestChanged { key: 2 })));
    }

    // -------------------------------------------------------------------------
    // Terminal detection
    // -------------------------------------------------------------------------

    #[test]
    fn test_terminal_on_checkerboard() {
        let mut game = fixed_game(5, 9);
        let keys: Vec<u32> = (0..25)
            .map(|i| if (i % 5 + i / 5) % 2 == 0 { 1 } else { 2 })
            .collect();
        set_keys(&mut game, &keys);
        assert!(game.is_terminal());
        assert!(game.legal_moves().is_empty());

        // Matching a single neighbor flips it back.
        let mut keys = keys;
        keys[1] = 1; // (1,0) now equals (0,0)
        set_keys(&mut game, &keys);
        assert!(!game.is_terminal());
    }

    #[test]
    fn test_fresh_board_not_terminal() {
        let game = Game::new(42);
        assert!(!game.is_terminal());
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_terminal_checked_after_refill() {
        // The spawned tile itself decides terminality: with a fixed spawn of
        // 2 the refilled corner matches its neighbors and the game goes on.
        let mut game = fixed_game(2, 2);
        #[rustfmt::skip]
        set_keys(&mut game, &[
            1, 1,
            2, 4,
        ]);
        let outcome = game.try_move(Coord::new(0, 0), Direction::Right);
        assert!(outcome.accepted);
        // Board is now [2, 2 / 2, 4]: matches exist, not terminal.
        assert!(!outcome.ended);
        assert!(!game.is_ended());
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    #[test]
    fn test_event_sequence_for_accepted_move() {
        let mut game = fixed_game(5, 9);
        let outcome = game.try_move(Coord::new(2, 2), Direction::Right);
        assert!(outcome.accepted);

        assert!(matches!(
            outcome.events[0],
            GameEvent::TileMerged {
                at: Coord { x: 3, y: 2 },
                key: 2,
                ..
            }
        ));
        // Chain [(2,2),(1,2),(0,2)]: two shift events, then the spawn.
        let moved = outcome
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::TileMoved { .. }))
            .count();
        assert_eq!(moved, 2);
        assert!(outcome.events.iter().any(|e| matches!(
            e,
            GameEvent::TileSpawned {
                at: Coord { x: 0, y: 2 },
                key: 9,
                ..
            }
        )));
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::ScoreChanged { delta: 1 })));
    }

    #[test]
    fn test_spawned_tile_gets_fresh_id() {
        let mut game = Game::new(5);
        let old_id = game.tile(Coord::new(0, 2)).id;
        let outcome = game.try_move(Coord::new(1, 2), Direction::Right);
        assert!(outcome.accepted);
        let new_id = game.tile(Coord::new(0, 2)).id;
        assert_ne!(old_id, new_id);
        // Ids stay unique across the whole board.
        let mut ids: Vec<u32> = game.tiles().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }

    // -------------------------------------------------------------------------
    // Gesture boundary (through the engine)
    // -------------------------------------------------------------------------

    #[test]
    fn test_drag_commits_exactly_one_move() {
        let mut game = Game::new(3);
        assert!(game.start_drag(Coord::new(1, 2)));

        // 19px projected displacement: still tracking (threshold is 20).
        match game.drag_sample(19.0, 3.0) {
            GestureUpdate::Tracking { probe, .. } => {
                assert_eq!(probe, Some(Coord::new(2, 2)));
            }
            other => panic!("expected tracking, got {:?}", other),
        }

        // 21px cumulative: commits a move to the right.
        match game.drag_sample(2.0, 0.0) {
            GestureUpdate::Committed(outcome) => {
                assert!(outcome.accepted);
                assert_eq!(game.tile(Coord::new(2, 2)).key, 2);
            }
            other => panic!("expected commit, got {:?}", other),
        }

        // Further samples in the same session mutate nothing.
        assert_eq!(game.drag_sample(40.0, 0.0), GestureUpdate::Ignored);
        assert_eq!(game.move_count(), 1);
        game.stop_drag();
        assert_eq!(game.move_count(), 1);
    }

    #[test]
    fn test_reentrant_start_is_noop() {
        let mut game = Game::new(3);
        assert!(game.start_drag(Coord::new(1, 1)));
        assert!(!game.start_drag(Coord::new(3, 3)));
        // The original session is still the active one.
        match game.drag_sample(25.0, 0.0) {
            GestureUpdate::Committed(outcome) => {
                assert!(outcome.accepted);
                assert_eq!(game.tile(Coord::new(2, 1)).key, 2);
            }
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_start_blocked_until_committed_move_settles() {
        let mut game = Game::new(3);
        assert!(game.start_drag(Coord::new(1, 2)));
        game.drag_sample(25.0, 0.0);
        // Committed but not yet stopped: no new session may begin.
        assert!(!game.start_drag(Coord::new(0, 0)));
        game.stop_drag();
        assert!(game.start_drag(Coord::new(0, 0)));
    }

    #[test]
    fn test_edge_drag_off_board_rejected_before_validation() {
        let mut game = Game::new(3);
        let before = game.keys();
        assert!(game.start_drag(Coord::new(0, 2)));
        match game.drag_sample(-25.0, 0.0) {
            GestureUpdate::RejectedOffBoard => {}
            other => panic!("expected off-board rejection, got {:?}", other),
        }
        assert_eq!(game.keys(), before);
        assert_eq!(game.move_count(), 0);
        // Session is consumed; a new one works after stop.
        game.stop_drag();
        assert!(game.start_drag(Coord::new(0, 2)));
    }

    #[test]
    fn test_sub_threshold_stop_retracts() {
        let mut game = Game::new(3);
        assert!(game.start_drag(Coord::new(2, 2)));
        game.drag_sample(10.0, 0.0);
        assert_eq!(game.stop_drag(), GestureUpdate::Retracted);
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_tile_width_scales_commit_threshold() {
        // 80px tiles need a 40px drag to commit, not the default 20px.
        let mut game = Game::new(3);
        game.set_tile_width(80.0);
        assert_eq!(game.tile_width(), 80.0);

        assert!(game.start_drag(Coord::new(1, 2)));
        assert!(matches!(
            game.drag_sample(21.0, 0.0),
            GestureUpdate::Tracking { .. }
        ));
        match game.drag_sample(19.0, 0.0) {
            GestureUpdate::Committed(outcome) => assert!(outcome.accepted),
            other => panic!("expected commit at 40px, got {:?}", other),
        }
    }

    #[test]
    fn test_start_drag_rejects_bad_origins() {
        let mut game = Game::new(3);
        assert!(!game.start_drag(Coord::new(5, 0)));
        assert!(!game.start_drag(Coord::new(0, 17)));
    }

    // -------------------------------------------------------------------------
    // Determinism, reset, display
    // -------------------------------------------------------------------------

    #[test]
    fn test_spawn_determinism() {
        let mut a = Game::new(12345);
        let mut b = Game::new(12345);
        for _ in 0..10 {
            let (origin, dir) = a.legal_moves()[0];
            a.try_move(origin, dir);
            let (origin, dir) = b.legal_moves()[0];
            b.try_move(origin, dir);
            assert_eq!(a.keys(), b.keys());
            assert_eq!(a.score(), b.score());
        }
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut game = Game::new(42);
        game.try_move(Coord::new(1, 2), Direction::Right);
        game.try_move(Coord::new(3, 2), Direction::Left);
        assert!(game.score() > 0);

        game.reset(42);
        assert_eq!(game.score(), 0);
        assert_eq!(game.move_count(), 0);
        assert_eq!(*game.highest(), 1);
        assert!(!game.is_ended());
        assert!(game.keys().iter().all(|&k| k == 1));
    }

    #[test]
    fn test_display_format() {
        let game = Game::new(42);
        let display = format!("{}", game);
        assert!(display.contains("Score:"));
        assert!(display.contains("+------+"));
    }
}
