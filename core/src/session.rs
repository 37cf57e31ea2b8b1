use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{OFF_WORLD_X, OFF_WORLD_Y};
use crate::deferred::{Deferred, DeferredSlot};
use crate::error::CoreError;
use crate::input::InputHandler;
use crate::levels::get_level;
use crate::physics::{ContactEvent, ContactKind, PhysicsWorld};
use crate::platform::Platform;
use crate::player::Player;
use crate::progress::ProgressStore;
use crate::sync::SyncThrottle;
use crate::types::*;

/// Screen flow owned by the surrounding application.
pub trait Navigator {
    fn navigate_to(&mut self, screen: Screen);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    Completing,
    Exiting,
}

/// One play-through of one level.
///
/// The session owns the world and everything in it. Collaborators are
/// borrowed for the session's lifetime.
pub struct GameplaySession<'a> {
    key: LevelKey,
    config: SessionConfig,
    world: PhysicsWorld,
    player: Player,
    remote_players: Vec<Player>,
    platforms: Vec<Platform>,
    input: InputHandler,
    door: Rect,
    paused: bool,
    level_complete: bool,
    exiting: bool,
    deferred: DeferredSlot,
    sync: SyncThrottle,
    tick: u64,
    respawns: u32,
    progress: &'a mut dyn ProgressStore,
    navigator: &'a mut dyn Navigator,
}

impl<'a> GameplaySession<'a> {
    /// Out-of-range indices are clamped, never rejected.
    pub fn new(
        world_index: i32,
        level_index: i32,
        config: SessionConfig,
        progress: &'a mut dyn ProgressStore,
        navigator: &'a mut dyn Navigator,
    ) -> Result<Self, CoreError> {
        if let Err(err) = LevelKey::checked(world_index, level_index) {
            warn!(%err, "clamping level request");
        }
        let layout = get_level(world_index, level_index);
        let ppm = config.pixels_per_meter;

        let mut world = PhysicsWorld::new(Vec2::new(0.0, config.gravity));
        let mut platforms = Vec::new();
        layout.build(&mut world, &mut platforms, ppm)?;
        let player = Player::local(&mut world, layout.start, &config.player, ppm)?;

        info!(level = %layout.key, "session started");
        Ok(GameplaySession {
            key: layout.key,
            sync: SyncThrottle::new(config.sync_interval_ms),
            config,
            world,
            player,
            remote_players: Vec::new(),
            platforms,
            input: InputHandler::new(),
            door: layout.door(),
            paused: false,
            level_complete: false,
            exiting: false,
            deferred: DeferredSlot::new(),
            tick: 0,
            respawns: 0,
            progress,
            navigator,
        })
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn key(&self) -> LevelKey {
        self.key
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn door(&self) -> Rect {
        self.door
    }

    pub fn is_grounded(&self) -> bool {
        self.input.is_grounded()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_level_complete(&self) -> bool {
        self.level_complete
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    /// Frames simulated so far. Paused frames do not count.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn respawns(&self) -> u32 {
        self.respawns
    }

    pub fn phase(&self) -> SessionPhase {
        if self.exiting {
            SessionPhase::Exiting
        } else if self.level_complete {
            SessionPhase::Completing
        } else {
            SessionPhase::Playing
        }
    }

    // ── Input boundary ──────────────────────────────────────

    pub fn move_left(&mut self) {
        self.input.move_left();
    }

    pub fn move_right(&mut self) {
        self.input.move_right();
    }

    pub fn stop_movement(&mut self) {
        self.input.stop_movement();
    }

    /// Apply a held-button bitmask: directions replace the current ones and
    /// JUMP attempts a jump.
    pub fn hold_buttons(&mut self, buttons: u8) -> Result<bool, CoreError> {
        self.input.hold_buttons(buttons);
        if buttons & button::JUMP != 0 {
            self.jump()
        } else {
            Ok(false)
        }
    }

    /// Returns whether an impulse was applied.
    pub fn jump(&mut self) -> Result<bool, CoreError> {
        if self.exiting || self.paused || self.level_complete {
            return Ok(false);
        }
        self.input.jump(&mut self.player, &mut self.world)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Leave for level select after this frame without recording progress.
    pub fn back(&mut self) {
        if !self.exiting {
            self.schedule_exit();
        }
    }

    // ── Frame loop ──────────────────────────────────────────

    /// Simulate, snapshot for rendering, then drain deferred work.
    /// Returns `None` once the session has exited.
    pub fn frame(&mut self) -> Result<Option<RenderFrame>, CoreError> {
        self.update()?;
        let frame = self.render_frame()?;
        self.end_frame();
        Ok(frame)
    }

    /// Simulation half of a frame.
    ///
    /// Sub-step order:
    ///  0. Nothing once exiting; nothing but rendering while paused
    ///  1. Forward held intents to the local player
    ///  2. Step the world at the fixed dt
    ///  3. Consume contact events (grounded flag, landing)
    ///  4. Respawn a local player that fell out of the world
    ///  5. Door check, until the level is complete
    pub fn update(&mut self) -> Result<(), CoreError> {
        // 0. Gates
        if self.exiting || self.paused {
            return Ok(());
        }

        // 1. Movement
        if !self.level_complete {
            self.input.update_movement(&mut self.player, &mut self.world)?;
        }

        // 2. Step
        let events = self.world.step(
            self.config.fixed_dt,
            self.config.velocity_iterations,
            self.config.position_iterations,
        )?;

        // 3. Contacts
        self.apply_contacts(&events);

        if !self.level_complete {
            // 4. Fall → respawn
            if self.player.is_falling(&self.world)? {
                self.player.respawn(&mut self.world)?;
                self.respawns += 1;
            }

            // 5. Door
            if self.player_at_door()? {
                self.complete()?;
            }
        }

        self.tick += 1;
        Ok(())
    }

    fn apply_contacts(&mut self, events: &[ContactEvent]) {
        let body = self.player.body();
        for ev in events.iter().filter(|ev| ev.involves(body)) {
            match ev.kind {
                ContactKind::Begin => {
                    self.input.set_grounded(true);
                    self.player.land();
                }
                ContactKind::End => self.input.set_grounded(false),
            }
        }
    }

    /// Player sprite box against the door, both in pixels and both at full
    /// size.
    fn player_at_door(&self) -> Result<bool, CoreError> {
        let rect = self
            .player
            .pixel_rect(&self.world, self.config.pixels_per_meter)?;
        Ok(rect.overlaps(&self.door))
    }

    /// Playing → Completing. Runs once: callers gate on `level_complete`.
    fn complete(&mut self) -> Result<(), CoreError> {
        self.level_complete = true;
        let body = self.player.body();
        self.world.set_velocity(body, Vec2::ZERO)?;
        self.world
            .set_transform(body, Vec2::new(OFF_WORLD_X, OFF_WORLD_Y))?;
        self.world.set_awake(body, false)?;
        self.progress.mark_completed(self.key.world, self.key.level);
        info!(level = %self.key, tick = self.tick, "level complete");
        self.schedule_exit();
        Ok(())
    }

    fn schedule_exit(&mut self) {
        let task = Deferred::ExitToLevelSelect {
            world: self.key.world,
        };
        if let Err(err) = self.deferred.schedule(task) {
            debug!(%err, "exit already scheduled");
        }
    }

    /// Pixel-space snapshot for the renderer. `None` once exited.
    pub fn render_frame(&self) -> Result<Option<RenderFrame>, CoreError> {
        if self.exiting {
            return Ok(None);
        }
        let ppm = self.config.pixels_per_meter;
        let remote_players = self
            .remote_players
            .iter()
            .map(|p| p.pixel_rect(&self.world, ppm))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(RenderFrame {
            player: self.player.pixel_rect(&self.world, ppm)?,
            remote_players,
            platforms: self.platforms.iter().map(Platform::rect).collect(),
            door: self.door,
            level_complete: self.level_complete,
            paused: self.paused,
        }))
    }

    /// Frame boundary: run whatever was deferred during this frame.
    pub fn end_frame(&mut self) {
        if let Some(task) = self.deferred.take() {
            self.run_deferred(task);
        }
    }

    fn run_deferred(&mut self, task: Deferred) {
        if self.exiting {
            return;
        }
        match task {
            Deferred::ExitToLevelSelect { world } => {
                self.exiting = true;
                info!(level = %self.key, "leaving for level select");
                self.navigator.navigate_to(Screen::LevelSelect { world });
                self.dispose();
            }
        }
    }

    fn dispose(&mut self) {
        self.world.teardown();
        self.platforms.clear();
        self.remote_players.clear();
    }

    // ── Multiplayer boundary ────────────────────────────────

    /// Spawn a patch-driven player at the level start. Adding a known id is a
    /// no-op.
    pub fn add_remote_player(&mut self, remote_id: &str) -> Result<(), CoreError> {
        if self.exiting {
            return Err(CoreError::InvalidState("session has exited"));
        }
        if self
            .remote_players
            .iter()
            .any(|p| p.remote_id() == Some(remote_id))
        {
            return Ok(());
        }
        let start = get_level(self.key.world, self.key.level).start;
        let player = Player::remote(
            &mut self.world,
            remote_id,
            start,
            &self.config.player,
            self.config.pixels_per_meter,
        )?;
        debug!(remote_id, body = %player.body(), "remote player joined");
        self.remote_players.push(player);
        Ok(())
    }

    pub fn remote_players(&self) -> &[Player] {
        &self.remote_players
    }

    /// Returns whether the patch matched a remote player.
    pub fn apply_remote_patch(&mut self, data: &PlayerData) -> Result<bool, CoreError> {
        if self.exiting {
            return Ok(false);
        }
        let Some(player) = self
            .remote_players
            .iter_mut()
            .find(|p| p.remote_id() == Some(data.player_id.as_str()))
        else {
            debug!(player_id = %data.player_id, "patch for unknown player");
            return Ok(false);
        };
        player.apply_remote_state(&mut self.world, data)
    }

    /// Local snapshot for the synchronizer, rate limited by the configured
    /// interval.
    pub fn outbound_snapshot(
        &mut self,
        local_id: &str,
        now_ms: u64,
    ) -> Result<Option<PlayerData>, CoreError> {
        if self.exiting || !self.sync.ready(now_ms) {
            return Ok(None);
        }
        Ok(Some(self.player.snapshot(&self.world, local_id, now_ms)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::default_config;
    use crate::progress::MemoryProgress;

    #[derive(Default)]
    struct Nav {
        visits: Vec<Screen>,
    }

    impl Navigator for Nav {
        fn navigate_to(&mut self, screen: Screen) {
            self.visits.push(screen);
        }
    }

    /// Counts every call, duplicates included.
    #[derive(Default)]
    struct CountingProgress {
        inner: MemoryProgress,
        marks: usize,
    }

    impl ProgressStore for CountingProgress {
        fn mark_completed(&mut self, world: i32, level: i32) {
            self.marks += 1;
            self.inner.mark_completed(world, level);
        }

        fn is_completed(&self, world: i32, level: i32) -> bool {
            self.inner.is_completed(world, level)
        }

        fn completed_count(&self) -> usize {
            self.inner.completed_count()
        }
    }

    /// Park the local player in the middle of the door.
    fn move_to_door(s: &mut GameplaySession<'_>) {
        let ppm = s.config.pixels_per_meter;
        let c = s.door.center();
        let body = s.player.body();
        s.world
            .set_transform(body, Vec2::new(c.x / ppm, c.y / ppm))
            .unwrap();
        s.world.set_velocity(body, Vec2::ZERO).unwrap();
    }

    fn land(s: &mut GameplaySession<'_>) {
        for _ in 0..240 {
            s.frame().unwrap();
            if s.is_grounded() {
                return;
            }
        }
        panic!("player never landed");
    }

    #[test]
    fn new_session_builds_level() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let s = GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
        assert_eq!(s.key(), LevelKey::new(1, 1));
        assert_eq!(s.platforms().len(), 5);
        assert_eq!(s.world().body_count(), 6);
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert!(!s.is_grounded());
        assert_eq!(s.door(), get_level(1, 1).door());
    }

    #[test]
    fn out_of_range_request_is_clamped() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let s = GameplaySession::new(9, -2, default_config(), &mut progress, &mut nav).unwrap();
        assert_eq!(s.key(), LevelKey::new(4, 1));
    }

    #[test]
    fn grounded_follows_contacts() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let mut s = GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();

        for _ in 0..240 {
            s.frame().unwrap();
            let touching = s
                .world()
                .bodies()
                .unwrap()
                .iter()
                .filter(|b| !b.is_dynamic())
                .any(|b| s.world().in_contact(s.player().body(), b.id()).unwrap());
            assert_eq!(s.is_grounded(), touching);
            if touching {
                break;
            }
        }
        assert!(s.is_grounded());
        // Lands on the slab at (50, 240); its top is 260 px
        let rect = s.render_frame().unwrap().unwrap().player;
        assert!((rect.y - 260.0).abs() < 1e-6);
        assert_eq!(s.player().velocity(s.world()).unwrap().y, 0.0);
    }

    #[test]
    fn jump_leaves_ground_once() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let mut s = GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
        land(&mut s);

        assert!(s.jump().unwrap());
        assert!(!s.jump().unwrap());
        assert!(!s.is_grounded());
        assert!(s.player().jumping());

        s.frame().unwrap();
        assert!(!s.is_grounded());
        assert!(s.player().velocity(s.world()).unwrap().y > 0.0);

        // Comes back down onto the same slab
        land(&mut s);
        assert!(!s.player().jumping());
    }

    #[test]
    fn falling_out_of_the_world_respawns() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        // Nothing under the start position on 1:5
        let mut s = GameplaySession::new(1, 5, default_config(), &mut progress, &mut nav).unwrap();
        for _ in 0..240 {
            s.frame().unwrap();
            if s.respawns() > 0 {
                break;
            }
        }
        assert_eq!(s.respawns(), 1);
        assert_eq!(s.player().position(s.world()).unwrap(), s.player().start());
        assert_eq!(s.player().velocity(s.world()).unwrap(), Vec2::ZERO);
        assert!(!s.player().is_falling(s.world()).unwrap());
    }

    #[test]
    fn completion_runs_after_the_frame() {
        let mut progress = CountingProgress::default();
        let mut nav = Nav::default();
        {
            let mut s =
                GameplaySession::new(2, 3, default_config(), &mut progress, &mut nav).unwrap();
            move_to_door(&mut s);

            s.update().unwrap();
            assert!(s.is_level_complete());
            assert_eq!(s.phase(), SessionPhase::Completing);
            assert!(s.world().is_live());
            let parked = s.player().position(s.world()).unwrap();
            assert_eq!(parked, Vec2::new(OFF_WORLD_X, OFF_WORLD_Y));
            assert_eq!(s.player().velocity(s.world()).unwrap(), Vec2::ZERO);

            // Rendering still sees the live world this frame
            assert!(s.render_frame().unwrap().unwrap().level_complete);

            s.end_frame();
            assert_eq!(s.phase(), SessionPhase::Exiting);
            assert!(!s.world().is_live());
            assert_eq!(s.frame().unwrap(), None);
            assert!(!s.jump().unwrap());
        }
        assert_eq!(progress.marks, 1);
        assert!(progress.is_completed(2, 3));
        assert_eq!(nav.visits, vec![Screen::LevelSelect { world: 2 }]);
    }

    #[test]
    fn lingering_in_the_doorway_transitions_once() {
        let mut progress = CountingProgress::default();
        let mut nav = Nav::default();
        {
            let mut s =
                GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
            for _ in 0..10 {
                if s.world().is_live() {
                    move_to_door(&mut s);
                }
                s.frame().unwrap();
                assert!(s.is_level_complete());
            }
        }
        assert_eq!(progress.marks, 1);
        assert_eq!(nav.visits.len(), 1);
    }

    #[test]
    fn paused_session_does_not_simulate() {
        let mut progress = CountingProgress::default();
        let mut nav = Nav::default();
        {
            let mut s =
                GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
            s.pause();
            let before = s.player().position(s.world()).unwrap();
            s.move_right();
            for _ in 0..5 {
                let frame = s.frame().unwrap();
                assert!(frame.unwrap().paused);
            }
            assert_eq!(s.player().position(s.world()).unwrap(), before);
            assert_eq!(s.tick(), 0);

            move_to_door(&mut s);
            s.frame().unwrap();
            assert!(!s.is_level_complete());

            s.resume();
            s.frame().unwrap();
            assert!(s.is_exiting());
        }
        assert_eq!(progress.marks, 1);
    }

    #[test]
    fn back_exits_without_progress() {
        let mut progress = CountingProgress::default();
        let mut nav = Nav::default();
        {
            let mut s =
                GameplaySession::new(3, 2, default_config(), &mut progress, &mut nav).unwrap();
            s.frame().unwrap();
            s.back();
            s.back();
            assert_eq!(s.phase(), SessionPhase::Playing);
            s.frame().unwrap();
            assert!(s.is_exiting());
            s.back();
            s.frame().unwrap();
        }
        assert_eq!(progress.marks, 0);
        assert_eq!(nav.visits, vec![Screen::LevelSelect { world: 3 }]);
    }

    #[test]
    fn back_and_completion_in_one_frame_navigate_once() {
        let mut progress = CountingProgress::default();
        let mut nav = Nav::default();
        {
            let mut s =
                GameplaySession::new(1, 2, default_config(), &mut progress, &mut nav).unwrap();
            s.back();
            move_to_door(&mut s);
            s.frame().unwrap();
            assert!(s.is_exiting());
        }
        assert_eq!(progress.marks, 1);
        assert_eq!(nav.visits.len(), 1);
    }

    #[test]
    fn same_intents_same_outcome() {
        let run = || {
            let mut progress = MemoryProgress::new();
            let mut nav = Nav::default();
            let mut s =
                GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
            for t in 0..180u32 {
                let buttons = match t % 60 {
                    0..=19 => button::RIGHT,
                    20..=29 => button::RIGHT | button::JUMP,
                    30..=44 => button::LEFT,
                    _ => 0,
                };
                s.hold_buttons(buttons).unwrap();
                s.frame().unwrap();
            }
            (s.player().position(s.world()).unwrap(), s.respawns())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn remote_players_take_patches() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let mut s = GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
        s.add_remote_player("guest").unwrap();
        s.add_remote_player("guest").unwrap();
        assert_eq!(s.remote_players().len(), 1);

        let patch = PlayerData {
            player_id: "guest".into(),
            x: 5.0,
            y: 3.0,
            vx: 0.0,
            vy: 0.0,
            is_jumping: false,
            is_moving_left: false,
            is_moving_right: true,
            timestamp: 10,
        };
        assert!(s.apply_remote_patch(&patch).unwrap());
        let remote = &s.remote_players()[0];
        assert_eq!(remote.position(s.world()).unwrap(), Vec2::new(5.0, 3.0));
        assert!(remote.moving_right());

        let stranger = PlayerData {
            player_id: "nobody".into(),
            ..patch
        };
        assert!(!s.apply_remote_patch(&stranger).unwrap());

        // Remote bodies never drive the local grounded flag
        assert!(!s.is_grounded());
        let frame = s.frame().unwrap().unwrap();
        assert_eq!(frame.remote_players.len(), 1);
    }

    #[test]
    fn outbound_snapshots_are_throttled() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let mut s = GameplaySession::new(1, 1, default_config(), &mut progress, &mut nav).unwrap();
        let first = s.outbound_snapshot("me", 0).unwrap().unwrap();
        assert_eq!(first.player_id, "me");
        assert!(s.outbound_snapshot("me", 50).unwrap().is_none());
        assert!(s.outbound_snapshot("me", 100).unwrap().is_some());
        s.back();
        s.end_frame();
        assert!(s.outbound_snapshot("me", 1_000).unwrap().is_none());
    }

    #[test]
    fn grounded_tracks_landing_and_walking_off_an_edge() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        // 2:1 opens with a lone slab at (100, 100, 300, 20) under the start
        let mut s = GameplaySession::new(2, 1, default_config(), &mut progress, &mut nav).unwrap();
        let slab = s.platforms()[0].body();
        assert_eq!(s.platforms()[0].rect(), Rect::new(100.0, 100.0, 300.0, 20.0));

        let mut landed = false;
        for _ in 0..120 {
            assert!(!s.is_grounded());
            s.frame().unwrap();
            if s.world().in_contact(s.player().body(), slab).unwrap() {
                landed = true;
                break;
            }
        }
        assert!(landed, "player never landed");
        assert!(s.is_grounded());
        assert_eq!(s.player().velocity(s.world()).unwrap().y, 0.0);
        let rect = s.render_frame().unwrap().unwrap().player;
        assert!((rect.y - 120.0).abs() < 1e-6);

        // Walk off the left edge at x = 100 px without jumping
        s.move_left();
        let mut walked_off = false;
        for _ in 0..60 {
            s.frame().unwrap();
            if s.world().in_contact(s.player().body(), slab).unwrap() {
                assert!(s.is_grounded());
            } else {
                assert!(!s.is_grounded());
                assert!(!s.player().jumping());
                assert_eq!(s.respawns(), 0);
                walked_off = true;
                break;
            }
        }
        assert!(walked_off, "player never left the slab");
    }

    #[test]
    fn configured_sync_interval_has_a_floor() {
        let mut progress = MemoryProgress::new();
        let mut nav = Nav::default();
        let config = SessionConfig {
            sync_interval_ms: 0,
            ..default_config()
        };
        let mut s = GameplaySession::new(1, 1, config, &mut progress, &mut nav).unwrap();
        assert!(s.outbound_snapshot("me", 0).unwrap().is_some());
        assert!(s.outbound_snapshot("me", 16).unwrap().is_none());
        assert!(s.outbound_snapshot("me", 100).unwrap().is_some());
    }
}
