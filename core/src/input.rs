use tracing::trace;

use crate::error::CoreError;
use crate::physics::PhysicsWorld;
use crate::player::Player;
use crate::types::button;

/// Pending movement intents plus the contact-derived grounded flag.
///
/// Button handlers only record intents; the session forwards them to the
/// player once per tick. `grounded` is written by the contact consumer and by
/// `jump`, never by button handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputHandler {
    moving_left: bool,
    moving_right: bool,
    grounded: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_left(&mut self) {
        self.moving_left = true;
    }

    pub fn move_right(&mut self) {
        self.moving_right = true;
    }

    pub fn stop_movement(&mut self) {
        self.moving_left = false;
        self.moving_right = false;
    }

    /// Replace the held directions from a button bitmask. Jump is edge-free
    /// and handled separately.
    pub fn hold_buttons(&mut self, buttons: u8) {
        self.stop_movement();
        if buttons & button::LEFT != 0 {
            self.move_left();
        }
        if buttons & button::RIGHT != 0 {
            self.move_right();
        }
    }

    pub fn moving_left(&self) -> bool {
        self.moving_left
    }

    pub fn moving_right(&self) -> bool {
        self.moving_right
    }

    pub fn set_grounded(&mut self, grounded: bool) {
        trace!(grounded, "grounded changed");
        self.grounded = grounded;
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn update_movement(
        &self,
        player: &mut Player,
        world: &mut PhysicsWorld,
    ) -> Result<(), CoreError> {
        player.update_movement(world, self.moving_left, self.moving_right)
    }

    /// Jump only from the ground. Grounded drops immediately so a second call
    /// before the next contact does nothing. Returns whether the impulse fired.
    pub fn jump(&mut self, player: &mut Player, world: &mut PhysicsWorld) -> Result<bool, CoreError> {
        if !self.grounded {
            return Ok(false);
        }
        player.jump(world)?;
        self.grounded = false;
        Ok(true)
    }
}
