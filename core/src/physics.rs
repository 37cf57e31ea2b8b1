use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constants::CONTACT_SKIN;
use crate::error::CoreError;
use crate::types::{BodyId, Vec2};

// ── Bodies ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Construction parameters for a body. Sizes are half-extents in meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub half_extents: Vec2,
    pub density: f64,
    pub friction: f64,
    pub fixed_rotation: bool,
}

impl BodyDef {
    pub fn fixed(position: Vec2, half_extents: Vec2) -> Self {
        BodyDef {
            kind: BodyKind::Static,
            position,
            half_extents,
            density: 0.0,
            friction: 0.2,
            fixed_rotation: false,
        }
    }

    pub fn dynamic(position: Vec2, half_extents: Vec2, density: f64) -> Self {
        BodyDef {
            kind: BodyKind::Dynamic,
            position,
            half_extents,
            density,
            friction: 0.2,
            fixed_rotation: false,
        }
    }

    pub fn with_friction(self, friction: f64) -> Self {
        BodyDef { friction, ..self }
    }

    pub fn with_fixed_rotation(self, fixed_rotation: bool) -> Self {
        BodyDef {
            fixed_rotation,
            ..self
        }
    }
}

/// Axis-aligned box. Rotation is never simulated.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    id: BodyId,
    kind: BodyKind,
    position: Vec2,
    velocity: Vec2,
    half_extents: Vec2,
    /// Zero for static bodies.
    mass: f64,
    friction: f64,
    fixed_rotation: bool,
    awake: bool,
}

impl RigidBody {
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn bottom(&self) -> f64 {
        self.position.y - self.half_extents.y
    }

    /// Per-axis separation to `other`. Negative values mean penetration depth.
    fn gap(&self, other: &RigidBody) -> (f64, f64) {
        let gx = (self.position.x - other.position.x).abs()
            - (self.half_extents.x + other.half_extents.x);
        let gy = (self.position.y - other.position.y).abs()
            - (self.half_extents.y + other.half_extents.y);
        (gx, gy)
    }

    fn touches(&self, other: &RigidBody) -> bool {
        let (gx, gy) = self.gap(other);
        gx <= CONTACT_SKIN && gy <= CONTACT_SKIN
    }
}

// ── Contacts ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Begin,
    End,
}

/// Produced by [`PhysicsWorld::step`]. `body_a` is always the body created first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub body_a: BodyId,
    pub body_b: BodyId,
}

impl ContactEvent {
    pub fn involves(&self, id: BodyId) -> bool {
        self.body_a == id || self.body_b == id
    }
}

/// Axis and direction a dynamic body is pushed out along.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Manifold {
    normal: Vec2,
    depth: f64,
}

/// Normal pointing from `fixed` toward `body`, along the axis of least
/// penetration. Ties resolve vertically.
fn manifold(body: &RigidBody, fixed: &RigidBody) -> Option<Manifold> {
    let (gx, gy) = body.gap(fixed);
    if gx >= 0.0 || gy >= 0.0 {
        return None;
    }
    let (px, py) = (-gx, -gy);
    if px < py {
        let dir = if body.position.x >= fixed.position.x { 1.0 } else { -1.0 };
        Some(Manifold {
            normal: Vec2::new(dir, 0.0),
            depth: px,
        })
    } else {
        let dir = if body.position.y >= fixed.position.y { 1.0 } else { -1.0 };
        Some(Manifold {
            normal: Vec2::new(0.0, dir),
            depth: py,
        })
    }
}

/// Box2D's friction mixing rule.
fn mix_friction(a: f64, b: f64) -> f64 {
    (a * b).sqrt()
}

// ── World ───────────────────────────────────────────────────

/// Owns every body. Bodies are never removed individually; `teardown` drops
/// them all at once and the world refuses further use.
#[derive(Clone, Debug)]
pub struct PhysicsWorld {
    gravity: Vec2,
    bodies: Vec<RigidBody>,
    /// Touching (lower, higher) id pairs as of the last step.
    contacts: BTreeSet<(BodyId, BodyId)>,
    live: bool,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        PhysicsWorld {
            gravity,
            bodies: Vec::new(),
            contacts: BTreeSet::new(),
            live: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    fn ensure_live(&self) -> Result<(), CoreError> {
        if self.live {
            Ok(())
        } else {
            Err(CoreError::InvalidState("physics world has been torn down"))
        }
    }

    pub fn create_body(&mut self, def: BodyDef) -> Result<BodyId, CoreError> {
        self.ensure_live()?;
        let id = BodyId(self.bodies.len() as u32);
        let mass = match def.kind {
            BodyKind::Static => 0.0,
            BodyKind::Dynamic => {
                def.density * (2.0 * def.half_extents.x) * (2.0 * def.half_extents.y)
            }
        };
        self.bodies.push(RigidBody {
            id,
            kind: def.kind,
            position: def.position,
            velocity: Vec2::ZERO,
            half_extents: def.half_extents,
            mass,
            friction: def.friction,
            fixed_rotation: def.fixed_rotation,
            awake: true,
        });
        Ok(id)
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody, CoreError> {
        self.ensure_live()?;
        self.bodies.get(id.index()).ok_or(CoreError::UnknownBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody, CoreError> {
        self.ensure_live()?;
        self.bodies
            .get_mut(id.index())
            .ok_or(CoreError::UnknownBody(id))
    }

    /// Bodies in creation order.
    pub fn bodies(&self) -> Result<&[RigidBody], CoreError> {
        self.ensure_live()?;
        Ok(&self.bodies)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Ignored for static bodies.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), CoreError> {
        let body = self.body_mut(id)?;
        if body.is_dynamic() {
            body.velocity = velocity;
        }
        Ok(())
    }

    /// Changes velocity by `impulse / mass` and wakes the body. Ignored for
    /// static bodies.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> Result<(), CoreError> {
        let body = self.body_mut(id)?;
        if body.is_dynamic() && body.mass > 0.0 {
            body.velocity.x += impulse.x / body.mass;
            body.velocity.y += impulse.y / body.mass;
            body.awake = true;
        }
        Ok(())
    }

    /// Ignored for static bodies.
    pub fn set_transform(&mut self, id: BodyId, position: Vec2) -> Result<(), CoreError> {
        let body = self.body_mut(id)?;
        if body.is_dynamic() {
            body.position = position;
        }
        Ok(())
    }

    pub fn set_awake(&mut self, id: BodyId, awake: bool) -> Result<(), CoreError> {
        self.body_mut(id)?.awake = awake;
        Ok(())
    }

    /// Whether the pair was touching at the end of the last step.
    pub fn in_contact(&self, a: BodyId, b: BodyId) -> Result<bool, CoreError> {
        self.ensure_live()?;
        let key = if a <= b { (a, b) } else { (b, a) };
        Ok(self.contacts.contains(&key))
    }

    /// Advance the simulation by one fixed step and return the contact
    /// transitions it produced.
    ///
    /// Sub-step order:
    ///  1. Integrate awake dynamic bodies (gravity, then position)
    ///  2. Position passes: push dynamic bodies out of static ones
    ///  3. Velocity passes: drop approaching velocity on touching pairs
    ///  4. Diff the touching set against the previous step
    pub fn step(
        &mut self,
        dt: f64,
        velocity_iterations: u32,
        position_iterations: u32,
    ) -> Result<Vec<ContactEvent>, CoreError> {
        self.ensure_live()?;

        // 1. Integrate
        let gravity = self.gravity;
        for body in self.bodies.iter_mut() {
            if !body.is_dynamic() || !body.awake {
                continue;
            }
            body.velocity.x += gravity.x * dt;
            body.velocity.y += gravity.y * dt;
            body.position.x += body.velocity.x * dt;
            body.position.y += body.velocity.y * dt;
        }

        // 2. Position passes
        for _ in 0..position_iterations.max(1) {
            if !self.resolve_penetrations() {
                break;
            }
        }

        // 3. Velocity passes
        for _ in 0..velocity_iterations {
            self.resolve_approach();
        }

        // 4. Contact transitions
        Ok(self.update_contacts())
    }

    /// One pass over dynamic/static pairs. Returns whether anything moved.
    fn resolve_penetrations(&mut self) -> bool {
        let mut moved = false;
        for i in 0..self.bodies.len() {
            if !self.bodies[i].is_dynamic() || !self.bodies[i].awake {
                continue;
            }
            for j in 0..self.bodies.len() {
                if self.bodies[j].is_dynamic() {
                    continue;
                }
                let Some(m) = manifold(&self.bodies[i], &self.bodies[j]) else {
                    continue;
                };
                let mu = mix_friction(self.bodies[i].friction, self.bodies[j].friction);
                let body = &mut self.bodies[i];
                body.position.x += m.normal.x * m.depth;
                body.position.y += m.normal.y * m.depth;

                let vn = body.velocity.x * m.normal.x + body.velocity.y * m.normal.y;
                if vn < 0.0 {
                    body.velocity.x -= m.normal.x * vn;
                    body.velocity.y -= m.normal.y * vn;

                    // Coulomb friction against the removed normal velocity
                    let budget = mu * -vn;
                    if m.normal.y != 0.0 {
                        body.velocity.x = approach_zero(body.velocity.x, budget);
                    } else {
                        body.velocity.y = approach_zero(body.velocity.y, budget);
                    }
                }
                moved = true;
            }
        }
        moved
    }

    fn resolve_approach(&mut self) {
        for i in 0..self.bodies.len() {
            if !self.bodies[i].is_dynamic() || !self.bodies[i].awake {
                continue;
            }
            for j in 0..self.bodies.len() {
                if self.bodies[j].is_dynamic() || !self.bodies[i].touches(&self.bodies[j]) {
                    continue;
                }
                let normal = touching_normal(&self.bodies[i], &self.bodies[j]);
                let body = &mut self.bodies[i];
                let vn = body.velocity.x * normal.x + body.velocity.y * normal.y;
                if vn < 0.0 {
                    body.velocity.x -= normal.x * vn;
                    body.velocity.y -= normal.y * vn;
                }
            }
        }
    }

    /// Recompute the touching set. Ends are reported before begins so a body
    /// that slides from one platform onto the next stays supported.
    fn update_contacts(&mut self) -> Vec<ContactEvent> {
        let mut current = BTreeSet::new();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                // Only dynamic/static pairs generate contacts
                if a.is_dynamic() == b.is_dynamic() {
                    continue;
                }
                if a.touches(b) {
                    current.insert((a.id, b.id));
                }
            }
        }

        let mut events = Vec::new();
        for &(a, b) in self.contacts.difference(&current) {
            trace!(%a, %b, "end contact");
            events.push(ContactEvent {
                kind: ContactKind::End,
                body_a: a,
                body_b: b,
            });
        }
        for &(a, b) in current.difference(&self.contacts) {
            trace!(%a, %b, "begin contact");
            events.push(ContactEvent {
                kind: ContactKind::Begin,
                body_a: a,
                body_b: b,
            });
        }
        self.contacts = current;
        events
    }

    /// Release every body. Idempotent; every later call fails with
    /// `InvalidState`.
    pub fn teardown(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.live = false;
    }
}

fn approach_zero(v: f64, budget: f64) -> f64 {
    if v > 0.0 {
        (v - budget).max(0.0)
    } else {
        (v + budget).min(0.0)
    }
}

/// Contact normal for a touching (not necessarily penetrating) pair: the axis
/// with the larger gap is the separating one.
fn touching_normal(body: &RigidBody, fixed: &RigidBody) -> Vec2 {
    let (gx, gy) = body.gap(fixed);
    if gx > gy {
        let dir = if body.position.x >= fixed.position.x { 1.0 } else { -1.0 };
        Vec2::new(dir, 0.0)
    } else {
        let dir = if body.position.y >= fixed.position.y { 1.0 } else { -1.0 };
        Vec2::new(0.0, dir)
    }
}
