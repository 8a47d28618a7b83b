//! # 1+1 WebAssembly Bindings
//!
//! This crate provides JavaScript-friendly bindings to the 1+1 match-and-shift
//! engine using wasm-bindgen. It wraps the core engine and exposes a
//! class-like API mirroring the gesture boundary: the page forwards raw
//! pointer events, the engine answers with semantic updates the page animates.

use one_plus_one_core::{Coord, Game, GestureConfig, GestureUpdate, WeightedPowerSpawner};
use wasm_bindgen::prelude::*;

/// WebAssembly wrapper for the 1+1 game.
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game with the given seed, board edge length, and the
    /// page's rendered tile edge length in pixels (drags commit at half of
    /// it).
    ///
    /// The seed is a 64-bit integer used to initialize the deterministic RNG.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, size: usize, tile_width: f64) -> WasmGame {
        WasmGame {
            game: Game::with_parts(
                seed,
                size,
                1,
                WeightedPowerSpawner::new(1),
                GestureConfig { tile_width },
            ),
        }
    }

    /// Update the rendered tile size, e.g. after a responsive re-layout.
    #[wasm_bindgen(js_name = setTileWidth)]
    pub fn set_tile_width(&mut self, tile_width: f64) {
        self.game.set_tile_width(tile_width);
    }

    /// Reset to a fresh board with counters zeroed.
    pub fn restart(&mut self, seed: u64) {
        self.game.reset(seed);
    }

    /// Begin a drag session on the tile at (x, y).
    ///
    /// Returns false while another session or committed move is in flight,
    /// after the game ended, or for off-board coordinates.
    #[wasm_bindgen(js_name = startDrag)]
    pub fn start_drag(&mut self, x: usize, y: usize) -> bool {
        self.game.start_drag(Coord::new(x, y))
    }

    /// Feed one pointer displacement sample (pixels since the previous one).
    ///
    /// Returns a tagged object: `tracking` with the axis-locked offset and
    /// probe cell, `committed` with the full move outcome and its events,
    /// `rejectedOffBoard`, `retracted`, or `ignored`.
    #[wasm_bindgen(js_name = dragSample)]
    pub fn drag_sample(&mut self, dx: f64, dy: f64) -> JsValue {
        to_js(&self.game.drag_sample(dx, dy))
    }

    /// End the active drag session.
    #[wasm_bindgen(js_name = stopDrag)]
    pub fn stop_drag(&mut self) -> JsValue {
        to_js(&self.game.stop_drag())
    }

    /// Get the current merge keys as a Uint32Array (row-major order).
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> Vec<u32> {
        self.game.keys()
    }

    /// Get the current score.
    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u64 {
        self.game.score()
    }

    /// Get the highest value ever reached at the center cell.
    #[wasm_bindgen(js_name = getHighest)]
    pub fn get_highest(&self) -> u32 {
        *self.game.highest()
    }

    /// Get the number of committed moves.
    #[wasm_bindgen(js_name = getMoveCount)]
    pub fn get_move_count(&self) -> u64 {
        self.game.move_count()
    }

    /// Check if the game is over (no adjacent equal pair anywhere).
    #[wasm_bindgen(js_name = isDone)]
    pub fn is_done(&self) -> bool {
        self.game.is_ended()
    }

    /// Export the full game state as a JSON string for persistence.
    /// The caller chooses the storage medium and key name.
    pub fn snapshot(&self) -> String {
        self.game.snapshot().to_json()
    }

    /// Rehydrate from a JSON snapshot. Malformed or incompatible data falls
    /// back to a fresh board seeded with `seed`; this never throws.
    pub fn restore(&mut self, json: &str, seed: u64) {
        let tile_width = self.game.tile_width();
        self.game = Game::restore_or_new(json, seed);
        self.game.set_tile_width(tile_width);
    }
}

fn to_js(update: &GestureUpdate<u32>) -> JsValue {
    serde_wasm_bindgen::to_value(update).unwrap_or(JsValue::NULL)
}
