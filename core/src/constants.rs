// World units are meters, y up. Pixel values are level-designer coordinates.

// Scale
pub const PPM: f64 = 100.0;

// Simulation
pub const GRAVITY: f64 = -9.8;
pub const FIXED_DT: f64 = 1.0 / 60.0;
pub const VELOCITY_ITERATIONS: u32 = 6;
pub const POSITION_ITERATIONS: u32 = 2;
/// Gap (meters) under which two bodies still count as touching.
pub const CONTACT_SKIN: f64 = 0.005;

// Player
pub const PLAYER_SPEED: f64 = 2.5;
pub const JUMP_IMPULSE: f64 = 2.0;
pub const PLAYER_DENSITY: f64 = 5.0;
pub const PLAYER_FRICTION: f64 = 0.2;
pub const PLAYER_TEXTURE_WIDTH: f64 = 30.0;
pub const PLAYER_TEXTURE_HEIGHT: f64 = 30.0;
pub const PLAYER_START_X: f64 = 150.0;
pub const PLAYER_START_Y: f64 = 320.0;

/// Where a finished player is parked, in meters. Far outside any level.
pub const OFF_WORLD_X: f64 = -1000.0;
pub const OFF_WORLD_Y: f64 = 1000.0;

// Platforms
pub const PLATFORM_FRICTION: f64 = 5.0;
pub const PLATFORM_WIDTH: f64 = 300.0;
pub const PLATFORM_HEIGHT: f64 = 20.0;

// Door, in pixels
pub const DOOR_WIDTH: f64 = 50.0;
pub const DOOR_HEIGHT: f64 = 80.0;
pub const DOOR_INSET: f64 = 70.0;

// Level grid
pub const MAX_WORLD: i32 = 4;
pub const MAX_LEVEL: i32 = 6;

// Multiplayer sync
pub const SYNC_INTERVAL_MS: u64 = 100;
