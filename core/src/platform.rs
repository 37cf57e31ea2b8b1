use crate::constants::PLATFORM_FRICTION;
use crate::error::CoreError;
use crate::physics::{BodyDef, PhysicsWorld};
use crate::types::{BodyId, Rect, Vec2};

/// A static slab placed from level-designer pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    body: BodyId,
    /// Pixel-space rectangle as authored.
    rect: Rect,
}

impl Platform {
    /// `rect` is bottom-left anchored, in pixels. The body is centered on it.
    pub fn new(world: &mut PhysicsWorld, rect: Rect, ppm: f64) -> Result<Self, CoreError> {
        let c = rect.center();
        let center = Vec2::new(c.x / ppm, c.y / ppm);
        let half = Vec2::new(rect.width / 2.0 / ppm, rect.height / 2.0 / ppm);
        let body = world.create_body(BodyDef::fixed(center, half).with_friction(PLATFORM_FRICTION))?;
        Ok(Platform { body, rect })
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Body center in world units.
    pub fn position(&self, world: &PhysicsWorld) -> Result<Vec2, CoreError> {
        Ok(world.body(self.body)?.position())
    }

    /// Top surface in pixels.
    pub fn top(&self) -> f64 {
        self.rect.y + self.rect.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GRAVITY, PPM};
    use crate::physics::BodyKind;

    #[test]
    fn body_is_centered_on_pixel_rect() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, GRAVITY));
        let p = Platform::new(&mut world, Rect::new(100.0, 100.0, 300.0, 20.0), PPM).unwrap();
        let body = world.body(p.body()).unwrap();
        assert_eq!(body.kind(), BodyKind::Static);
        assert_eq!(body.position(), Vec2::new(2.5, 1.1));
        assert_eq!(body.half_extents(), Vec2::new(1.5, 0.1));
        assert_eq!(body.friction(), PLATFORM_FRICTION);
        assert_eq!(p.top(), 120.0);
    }
}
