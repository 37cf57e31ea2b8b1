use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreError;
use crate::hash::hash_script;
use crate::progress::ProgressStore;
use crate::session::{GameplaySession, Navigator, SessionPhase};
use crate::types::{LevelKey, Screen, SessionConfig, Vec2};

/// Recorded held-button bitmasks, one per frame, for one level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputScript {
    pub world: i32,
    pub level: i32,
    pub ticks: Vec<u8>,
}

/// Outcome of replaying a script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub level: LevelKey,
    /// Frames fed before the script ran out or the session exited.
    pub frames: u64,
    /// Frames actually simulated.
    pub ticks: u64,
    pub phase: SessionPhase,
    pub completed: bool,
    pub respawns: u32,
    /// World units. `None` once the world has been torn down.
    pub final_position: Option<Vec2>,
    pub navigated_to: Option<Screen>,
    pub script_hash: [u8; 32],
}

/// Remembers the last navigation request.
#[derive(Debug, Default)]
struct LastScreen(Option<Screen>);

impl Navigator for LastScreen {
    fn navigate_to(&mut self, screen: Screen) {
        self.0 = Some(screen);
    }
}

/// Replay `script` headlessly. Stops early once the session exits.
pub fn run_script(
    script: &InputScript,
    config: SessionConfig,
    progress: &mut dyn ProgressStore,
) -> Result<SessionSummary, CoreError> {
    let mut nav = LastScreen::default();
    let summary = {
        let mut session = GameplaySession::new(script.world, script.level, config, progress, &mut nav)?;
        let mut frames = 0u64;
        for &buttons in &script.ticks {
            if session.is_exiting() {
                break;
            }
            session.hold_buttons(buttons)?;
            session.frame()?;
            frames += 1;
        }
        let final_position = if session.world().is_live() {
            Some(session.player().position(session.world())?)
        } else {
            None
        };
        SessionSummary {
            level: session.key(),
            frames,
            ticks: session.tick(),
            phase: session.phase(),
            completed: session.is_level_complete(),
            respawns: session.respawns(),
            final_position,
            navigated_to: None,
            script_hash: hash_script(script),
        }
    };
    info!(level = %summary.level, frames = summary.frames, completed = summary.completed, "script finished");
    Ok(SessionSummary {
        navigated_to: nav.0,
        ..summary
    })
}
