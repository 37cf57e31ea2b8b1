use tracing::debug;

use crate::constants::*;
use crate::error::CoreError;
use crate::physics::PhysicsWorld;
use crate::platform::Platform;
use crate::types::{LevelKey, Rect, Vec2};

/// Static layout of one level. Coordinates are pixels, bottom-left anchored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelLayout {
    pub key: LevelKey,
    pub platforms: &'static [Rect],
    /// Player body center at spawn.
    pub start: Vec2,
    /// Index into `platforms` of the slab carrying the door.
    pub door_on: usize,
}

impl LevelLayout {
    /// Append this level's platforms to `platforms`, in table order.
    pub fn build(
        &self,
        world: &mut PhysicsWorld,
        platforms: &mut Vec<Platform>,
        ppm: f64,
    ) -> Result<(), CoreError> {
        for rect in self.platforms {
            platforms.push(Platform::new(world, *rect, ppm)?);
        }
        debug!(level = %self.key, count = self.platforms.len(), "level built");
        Ok(())
    }

    /// Door rectangle standing on its platform, in pixels.
    pub fn door(&self) -> Rect {
        let slab = self.platforms[self.door_on];
        Rect::new(
            slab.x + slab.width - DOOR_INSET,
            slab.y + slab.height,
            DOOR_WIDTH,
            DOOR_HEIGHT,
        )
    }
}

const fn slab(x: f64, y: f64) -> Rect {
    Rect::new(x, y, PLATFORM_WIDTH, PLATFORM_HEIGHT)
}

const START: Vec2 = Vec2::new(PLAYER_START_X, PLAYER_START_Y);

macro_rules! level {
    ($world:expr, $level:expr, door_on: $door:expr, [$(($x:expr, $y:expr)),* $(,)?]) => {
        LevelLayout {
            key: LevelKey::new($world, $level),
            platforms: &[$(slab($x, $y)),*],
            start: START,
            door_on: $door,
        }
    };
}

static LEVELS: [[LevelLayout; MAX_LEVEL as usize]; MAX_WORLD as usize] = [
    [
        level!(1, 1, door_on: 2, [(100.0, 100.0), (400.0, 120.0), (700.0, 170.0), (400.0, 240.0), (50.0, 240.0)]),
        level!(1, 2, door_on: 2, [(100.0, 160.0), (300.0, 220.0), (550.0, 180.0)]),
        level!(1, 3, door_on: 2, [(120.0, 120.0), (420.0, 200.0), (720.0, 260.0)]),
        level!(1, 4, door_on: 2, [(100.0, 110.0), (420.0, 170.0), (740.0, 230.0)]),
        level!(1, 5, door_on: 2, [(200.0, 120.0), (500.0, 180.0), (800.0, 240.0)]),
        level!(1, 6, door_on: 2, [(120.0, 160.0), (420.0, 120.0), (720.0, 200.0)]),
    ],
    [
        level!(2, 1, door_on: 2, [(100.0, 100.0), (400.0, 160.0), (700.0, 220.0)]),
        level!(2, 2, door_on: 2, [(160.0, 100.0), (460.0, 160.0), (760.0, 220.0)]),
        level!(2, 3, door_on: 3, [(90.0, 130.0), (380.0, 190.0), (680.0, 250.0), (380.0, 310.0)]),
        level!(2, 4, door_on: 3, [(110.0, 100.0), (420.0, 150.0), (730.0, 200.0), (420.0, 260.0)]),
        level!(2, 5, door_on: 2, [(130.0, 120.0), (440.0, 170.0), (750.0, 230.0)]),
        level!(2, 6, door_on: 2, [(120.0, 120.0), (420.0, 180.0), (720.0, 240.0)]),
    ],
    [
        level!(3, 1, door_on: 3, [(100.0, 120.0), (360.0, 180.0), (620.0, 240.0), (880.0, 300.0)]),
        level!(3, 2, door_on: 2, [(140.0, 100.0), (440.0, 150.0), (740.0, 210.0)]),
        level!(3, 3, door_on: 2, [(140.0, 120.0), (440.0, 180.0), (740.0, 240.0)]),
        level!(3, 4, door_on: 3, [(100.0, 140.0), (380.0, 200.0), (660.0, 140.0), (940.0, 210.0)]),
        level!(3, 5, door_on: 3, [(120.0, 100.0), (420.0, 160.0), (720.0, 220.0), (420.0, 280.0)]),
        level!(3, 6, door_on: 3, [(110.0, 130.0), (400.0, 190.0), (690.0, 250.0), (980.0, 310.0)]),
    ],
    [
        level!(4, 1, door_on: 3, [(100.0, 120.0), (400.0, 180.0), (700.0, 240.0), (1000.0, 300.0)]),
        level!(4, 2, door_on: 4, [(130.0, 100.0), (420.0, 160.0), (710.0, 220.0), (420.0, 280.0), (130.0, 340.0)]),
        level!(4, 3, door_on: 3, [(100.0, 110.0), (380.0, 170.0), (660.0, 230.0), (940.0, 290.0)]),
        level!(4, 4, door_on: 4, [(120.0, 140.0), (400.0, 200.0), (680.0, 140.0), (960.0, 200.0), (680.0, 260.0)]),
        level!(4, 5, door_on: 4, [(100.0, 100.0), (400.0, 160.0), (700.0, 220.0), (1000.0, 280.0), (700.0, 340.0)]),
        level!(4, 6, door_on: 5, [(120.0, 120.0), (420.0, 180.0), (720.0, 240.0), (1020.0, 300.0), (720.0, 360.0), (420.0, 420.0)]),
    ],
];

/// Total lookup: out-of-range indices are clamped into the grid.
pub fn get_level(world: i32, level: i32) -> &'static LevelLayout {
    let key = LevelKey::clamped(world, level);
    &LEVELS[(key.world - 1) as usize][(key.level - 1) as usize]
}

/// Strict lookup for callers that want to report a bad index.
pub fn get_level_checked(world: i32, level: i32) -> Result<&'static LevelLayout, CoreError> {
    let key = LevelKey::checked(world, level)?;
    Ok(get_level(key.world, key.level))
}

/// Every level, world-major.
pub fn all_levels() -> impl Iterator<Item = &'static LevelLayout> {
    LEVELS.iter().flat_map(|w| w.iter())
}
