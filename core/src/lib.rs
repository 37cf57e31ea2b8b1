pub mod constants;
pub mod deferred;
pub mod error;
pub mod hash;
pub mod init;
pub mod input;
pub mod levels;
pub mod physics;
pub mod platform;
pub mod player;
pub mod progress;
pub mod replay;
pub mod session;
pub mod sync;
pub mod types;

pub use constants::*;
pub use error::{CoreError, ProgressError};
pub use hash::*;
pub use init::*;
pub use levels::{all_levels, get_level, get_level_checked, LevelLayout};
pub use physics::{BodyDef, BodyKind, ContactEvent, ContactKind, PhysicsWorld, RigidBody};
pub use progress::{JsonFileProgress, MemoryProgress, ProgressStore};
pub use replay::{run_script, InputScript, SessionSummary};
pub use session::{GameplaySession, Navigator, SessionPhase};
pub use types::*;
