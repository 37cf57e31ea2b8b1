use serde::{Deserialize, Serialize};

use crate::constants::{MAX_LEVEL, MAX_WORLD};
use crate::error::CoreError;

// ── Primitives ──────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }
}

/// Axis-aligned rectangle anchored at its bottom-left corner, y up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap; rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Opaque handle to a body owned by a `PhysicsWorld`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

// ── Input ───────────────────────────────────────────────────

/// Button bitmask constants.
pub mod button {
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const JUMP: u8 = 4;
}

// ── Levels ──────────────────────────────────────────────────

/// One-based (world, level) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelKey {
    pub world: i32,
    pub level: i32,
}

impl LevelKey {
    pub const fn new(world: i32, level: i32) -> Self {
        LevelKey { world, level }
    }

    /// Clamp into the playable grid. Never fails.
    pub fn clamped(world: i32, level: i32) -> Self {
        LevelKey {
            world: world.clamp(1, MAX_WORLD),
            level: level.clamp(1, MAX_LEVEL),
        }
    }

    /// Strict variant of [`LevelKey::clamped`] for callers that want to report
    /// a bad index before falling back.
    pub fn checked(world: i32, level: i32) -> Result<Self, CoreError> {
        if (1..=MAX_WORLD).contains(&world) && (1..=MAX_LEVEL).contains(&level) {
            Ok(LevelKey { world, level })
        } else {
            Err(CoreError::InvalidLevelIndex { world, level })
        }
    }
}

impl std::fmt::Display for LevelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.world, self.level)
    }
}

// ── Multiplayer ─────────────────────────────────────────────

/// Player state exchanged with the (mock) multiplayer synchronizer.
/// Positions and velocities are in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub player_id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub is_jumping: bool,
    pub is_moving_left: bool,
    pub is_moving_right: bool,
    /// Milliseconds, supplied by the caller's clock.
    pub timestamp: u64,
}

// ── Screens ─────────────────────────────────────────────────

/// Navigation targets the session can hand off to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    LevelSelect { world: i32 },
}

// ── Config ──────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Horizontal speed, m/s.
    pub speed: f64,
    /// Upward impulse, N·s.
    pub jump_impulse: f64,
    pub density: f64,
    pub friction: f64,
    /// Sprite size in pixels; also the collision box.
    pub texture_width: f64,
    pub texture_height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub pixels_per_meter: f64,
    pub gravity: f64,
    pub fixed_dt: f64,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub player: PlayerConfig,
    pub sync_interval_ms: u64,
}

// ── Render snapshot ─────────────────────────────────────────

/// Everything a renderer needs for one frame, in pixel space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub player: Rect,
    pub remote_players: Vec<Rect>,
    pub platforms: Vec<Rect>,
    pub door: Rect,
    pub level_complete: bool,
    pub paused: bool,
}
