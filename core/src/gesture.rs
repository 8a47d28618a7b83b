//! Drag-session state machine.
//!
//! Turns a stream of raw pointer displacement samples into at most one
//! discrete directional move per session. A session tracks a cumulative
//! displacement, projects it onto its dominant axis (axis-lock), and commits
//! the moment the projection crosses half a tile width. The dominant axis may
//! flip while under the threshold; it freezes at commit time.

use crate::{Coord, MoveOutcome};
use serde::Serialize;

/// Gesture geometry the engine is configured with. The core knows nothing
/// about pixels beyond this one scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Rendered tile edge length in pixels.
    pub tile_width: f64,
}

impl GestureConfig {
    /// Displacement at which a drag commits: half a tile.
    pub fn threshold(&self) -> f64 {
        self.tile_width / 2.0
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig { tile_width: 40.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Tracking,
    /// The one move of this session has been emitted; samples are ignored
    /// until the session stops.
    Committed,
}

/// Per-session interpreter state. Owned by the game; nothing here touches the
/// board.
#[derive(Debug, Clone)]
pub struct DragSession {
    config: GestureConfig,
    state: State,
    origin: Coord,
    acc_x: f64,
    acc_y: f64,
}

/// What one sample did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SessionEvent {
    /// No active session, or the session already committed.
    Inactive,
    /// Under threshold: axis-locked visual offset plus current signs.
    Tracking { offset: (f64, f64), signs: (i8, i8) },
    /// Threshold crossed: exactly one of these per session.
    Commit { origin: Coord, signs: (i8, i8) },
}

impl DragSession {
    pub(crate) fn new(config: GestureConfig) -> Self {
        DragSession {
            config,
            state: State::Idle,
            origin: Coord::new(0, 0),
            acc_x: 0.0,
            acc_y: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != State::Idle
    }

    pub(crate) fn origin(&self) -> Coord {
        self.origin
    }

    pub(crate) fn config(&self) -> GestureConfig {
        self.config
    }

    pub(crate) fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Begin a session. Re-entrant starts while one is active are no-ops.
    pub(crate) fn start(&mut self, origin: Coord) -> bool {
        if self.state != State::Idle {
            return false;
        }
        self.state = State::Tracking;
        self.origin = origin;
        self.acc_x = 0.0;
        self.acc_y = 0.0;
        true
    }

    /// Accumulate one displacement sample (pixels since the previous sample).
    pub(crate) fn sample(&mut self, dx: f64, dy: f64) -> SessionEvent {
        match self.state {
            State::Idle | State::Committed => SessionEvent::Inactive,
            State::Tracking => {
                self.acc_x += dx;
                self.acc_y += dy;
                let (ox, oy) = self.axis_locked();
                let signs = (sign(ox), sign(oy));
                if ox.abs().max(oy.abs()) >= self.config.threshold() {
                    self.state = State::Committed;
                    SessionEvent::Commit {
                        origin: self.origin,
                        signs,
                    }
                } else {
                    SessionEvent::Tracking {
                        offset: (ox, oy),
                        signs,
                    }
                }
            }
        }
    }

    /// End the session. Returns `true` when it was stopped under threshold,
    /// i.e. the visual layer should retract the tile to its cell.
    pub(crate) fn stop(&mut self) -> bool {
        let retract = self.state == State::Tracking;
        self.abort();
        retract
    }

    pub(crate) fn abort(&mut self) {
        self.state = State::Idle;
        self.acc_x = 0.0;
        self.acc_y = 0.0;
    }

    /// Project the cumulative displacement onto its dominant axis; the other
    /// axis is zeroed. Ties go to the horizontal axis.
    fn axis_locked(&self) -> (f64, f64) {
        if self.acc_x.abs() >= self.acc_y.abs() {
            (self.acc_x, 0.0)
        } else {
            (0.0, self.acc_y)
        }
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Engine-level result of one gesture event, for the render collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GestureUpdate<K> {
    /// Session active, under threshold: proportional axis-locked offset plus
    /// the cell a commit would currently target (`None` when the drag points
    /// off the board).
    Tracking {
        offset: (f64, f64),
        probe: Option<Coord>,
    },
    /// The session's one move was committed and validated.
    Committed(MoveOutcome<K>),
    /// Threshold crossed pointing off the board: session consumed, no move,
    /// offset retracts.
    RejectedOffBoard,
    /// Session stopped under threshold: offset returns to zero.
    Retracted,
    /// Sample or stop outside any active session, or after commit.
    Ignored,
}
