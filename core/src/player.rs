use tracing::debug;

use crate::error::CoreError;
use crate::physics::{BodyDef, PhysicsWorld};
use crate::types::{BodyId, PlayerConfig, PlayerData, Rect, Vec2};

/// A dynamic body driven either by local input or, when `remote_id` is set,
/// by state patches from the synchronizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    body: BodyId,
    speed: f64,
    jump_impulse: f64,
    /// World units.
    start: Vec2,
    /// Sprite size in pixels.
    texture: Vec2,
    moving_left: bool,
    moving_right: bool,
    jumping: bool,
    remote_id: Option<String>,
}

impl Player {
    /// `start_px` is the body center in pixels.
    pub fn local(
        world: &mut PhysicsWorld,
        start_px: Vec2,
        config: &PlayerConfig,
        ppm: f64,
    ) -> Result<Self, CoreError> {
        Self::spawn(world, start_px, config, ppm, None)
    }

    pub fn remote(
        world: &mut PhysicsWorld,
        remote_id: impl Into<String>,
        start_px: Vec2,
        config: &PlayerConfig,
        ppm: f64,
    ) -> Result<Self, CoreError> {
        Self::spawn(world, start_px, config, ppm, Some(remote_id.into()))
    }

    fn spawn(
        world: &mut PhysicsWorld,
        start_px: Vec2,
        config: &PlayerConfig,
        ppm: f64,
        remote_id: Option<String>,
    ) -> Result<Self, CoreError> {
        let start = Vec2::new(start_px.x / ppm, start_px.y / ppm);
        let half = Vec2::new(
            config.texture_width / 2.0 / ppm,
            config.texture_height / 2.0 / ppm,
        );
        let def = BodyDef::dynamic(start, half, config.density)
            .with_friction(config.friction)
            .with_fixed_rotation(true);
        let body = world.create_body(def)?;
        Ok(Player {
            body,
            speed: config.speed,
            jump_impulse: config.jump_impulse,
            start,
            texture: Vec2::new(config.texture_width, config.texture_height),
            moving_left: false,
            moving_right: false,
            jumping: false,
            remote_id,
        })
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn is_local(&self) -> bool {
        self.remote_id.is_none()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn moving_left(&self) -> bool {
        self.moving_left
    }

    pub fn moving_right(&self) -> bool {
        self.moving_right
    }

    pub fn jumping(&self) -> bool {
        self.jumping
    }

    pub fn position(&self, world: &PhysicsWorld) -> Result<Vec2, CoreError> {
        Ok(world.body(self.body)?.position())
    }

    pub fn velocity(&self, world: &PhysicsWorld) -> Result<Vec2, CoreError> {
        Ok(world.body(self.body)?.velocity())
    }

    /// Left is evaluated first and right second, so holding both moves right.
    /// With neither held the current velocity is left alone.
    pub fn update_movement(
        &mut self,
        world: &mut PhysicsWorld,
        move_left: bool,
        move_right: bool,
    ) -> Result<(), CoreError> {
        self.moving_left = move_left;
        self.moving_right = move_right;
        if move_left {
            let vy = world.body(self.body)?.velocity().y;
            world.set_velocity(self.body, Vec2::new(-self.speed, vy))?;
        }
        if move_right {
            let vy = world.body(self.body)?.velocity().y;
            world.set_velocity(self.body, Vec2::new(self.speed, vy))?;
        }
        Ok(())
    }

    /// Unconditional upward impulse. Callers own the grounded check.
    pub fn jump(&mut self, world: &mut PhysicsWorld) -> Result<(), CoreError> {
        world.apply_impulse(self.body, Vec2::new(0.0, self.jump_impulse))?;
        self.jumping = true;
        debug!(body = %self.body, "jump");
        Ok(())
    }

    /// Clears the airborne flag once a contact supports the player again.
    pub fn land(&mut self) {
        self.jumping = false;
    }

    /// Below the bottom of the world.
    pub fn is_falling(&self, world: &PhysicsWorld) -> Result<bool, CoreError> {
        Ok(world.body(self.body)?.position().y < 0.0)
    }

    /// Back to the start position at rest. Grounded state belongs to the caller.
    pub fn respawn(&mut self, world: &mut PhysicsWorld) -> Result<(), CoreError> {
        world.set_transform(self.body, self.start)?;
        world.set_velocity(self.body, Vec2::ZERO)?;
        world.set_awake(self.body, true)?;
        self.jumping = false;
        debug!(body = %self.body, x = self.start.x, y = self.start.y, "respawn");
        Ok(())
    }

    /// Overwrite state from a synchronizer patch. Returns `false` without
    /// touching anything when this player is local.
    pub fn apply_remote_state(
        &mut self,
        world: &mut PhysicsWorld,
        data: &PlayerData,
    ) -> Result<bool, CoreError> {
        if self.remote_id.is_none() {
            return Ok(false);
        }
        world.set_transform(self.body, Vec2::new(data.x, data.y))?;
        world.set_velocity(self.body, Vec2::new(data.vx, data.vy))?;
        self.jumping = data.is_jumping;
        self.moving_left = data.is_moving_left;
        self.moving_right = data.is_moving_right;
        Ok(true)
    }

    pub fn snapshot(
        &self,
        world: &PhysicsWorld,
        player_id: &str,
        timestamp: u64,
    ) -> Result<PlayerData, CoreError> {
        let body = world.body(self.body)?;
        Ok(PlayerData {
            player_id: player_id.to_string(),
            x: body.position().x,
            y: body.position().y,
            vx: body.velocity().x,
            vy: body.velocity().y,
            is_jumping: self.jumping,
            is_moving_left: self.moving_left,
            is_moving_right: self.moving_right,
            timestamp,
        })
    }

    /// Sprite-sized box centered on the body, in pixels.
    pub fn pixel_rect(&self, world: &PhysicsWorld, ppm: f64) -> Result<Rect, CoreError> {
        let p = world.body(self.body)?.position();
        Ok(Rect::new(
            p.x * ppm - self.texture.x / 2.0,
            p.y * ppm - self.texture.y / 2.0,
            self.texture.x,
            self.texture.y,
        ))
    }
}
