use crate::constants::*;
use crate::types::*;

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            speed: PLAYER_SPEED,
            jump_impulse: JUMP_IMPULSE,
            density: PLAYER_DENSITY,
            friction: PLAYER_FRICTION,
            texture_width: PLAYER_TEXTURE_WIDTH,
            texture_height: PLAYER_TEXTURE_HEIGHT,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Tuning used by the shipped game: 100 px/m, Earth gravity, 60 Hz.
pub fn default_config() -> SessionConfig {
    SessionConfig {
        pixels_per_meter: PPM,
        gravity: GRAVITY,
        fixed_dt: FIXED_DT,
        velocity_iterations: VELOCITY_ITERATIONS,
        position_iterations: POSITION_ITERATIONS,
        player: PlayerConfig::default(),
        sync_interval_ms: SYNC_INTERVAL_MS,
    }
}
