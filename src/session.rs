//! Session state machine
//!
//! Owns the phase, the board, the settings and the single outstanding frame
//! handle. Everything outside the tick loop (keys, buttons, the settings form)
//! enters through here, and everything visible or audible leaves through the
//! [`Sink`].
//!
//! Phases: `NotStarted -> Running <-> Paused`, `Running -> Ended`, and
//! `Ended -> Running` only through an explicit [`Session::start`].

use glam::Vec2;

use crate::controls::Command;
use crate::scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
use crate::settings::{ConfigError, Settings};
use crate::sim::{Direction, Entity, GamePhase, GameState, Positions, TickOutcome, move_player, tick};
use crate::sink::Sink;

pub struct Session<S: Sink, F: FrameScheduler> {
    phase: GamePhase,
    state: GameState,
    settings: Settings,
    settings_panel_open: bool,
    /// Active tick-loop handle; at most one at a time
    frame: Option<FrameHandle>,
    sink: S,
    scheduler: F,
}

impl<S: Sink, F: FrameScheduler> Session<S, F> {
    /// Create a session with default settings
    pub fn new(sink: S, scheduler: F) -> Self {
        Self::build(Settings::default(), sink, scheduler)
    }

    /// Create a session with validated initial settings
    pub fn with_settings(settings: Settings, sink: S, scheduler: F) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::build(settings, sink, scheduler))
    }

    fn build(settings: Settings, sink: S, scheduler: F) -> Self {
        let mut session = Self {
            phase: GamePhase::NotStarted,
            state: GameState::new(),
            settings,
            settings_panel_open: false,
            frame: None,
            sink,
            scheduler,
        };
        session.sync_sink();
        session
    }

    /// Push initial volume, styles and positions to the sink
    fn sync_sink(&mut self) {
        self.sink.set_volume(self.settings.volume);
        self.sink.on_config_updated(&self.settings);
        self.notify_positions();
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn positions(&self) -> Positions {
        self.state.positions
    }

    pub fn player(&self) -> Vec2 {
        self.state.positions.get(Entity::Player)
    }

    pub fn pursuer(&self) -> Vec2 {
        self.state.positions.get(Entity::Pursuer)
    }

    /// Ticks run in the current round
    pub fn ticks(&self) -> u64 {
        self.state.time_ticks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_panel_open(&self) -> bool {
        self.settings_panel_open
    }

    /// Handle of the frame the tick loop is waiting on
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    // === Lifecycle ===

    /// Start a round. Only valid while awaiting start (NotStarted or Ended).
    pub fn start(&mut self) {
        if !self.phase.awaiting_start() {
            log::debug!("Start ignored while {}", self.phase.as_str());
            return;
        }

        // Ended already put both entities back on their spawn points
        self.state.time_ticks = 0;
        self.phase = GamePhase::Running;
        log::info!("Game started");

        self.notify_positions();
        self.play_music();
        self.schedule_frame();
        self.sink.on_start();
    }

    /// Flip between Running and Paused. No-op otherwise.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => {
                // Cancel first so no tick can land after Paused is set
                self.cancel_frame();
                self.phase = GamePhase::Paused;
                self.sink.pause_audio();
                self.sink.on_pause();
                log::info!("Game paused");
            }
            GamePhase::Paused => {
                self.phase = GamePhase::Running;
                log::info!("Game resumed");
                self.play_music();
                self.schedule_frame();
                self.sink.on_resume();
            }
            GamePhase::NotStarted | GamePhase::Ended => {}
        }
    }

    /// Frame callback from the scheduler
    ///
    /// Stale handles (cancelled or superseded) are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        if self.frame != Some(handle) {
            log::debug!("Ignoring stale frame {:?}", handle);
            return;
        }
        self.frame = None;

        if self.phase != GamePhase::Running {
            return;
        }

        let outcome = tick(&mut self.state, self.settings.pursuer_speed);
        self.notify_positions();

        match outcome {
            TickOutcome::Continue => self.schedule_frame(),
            TickOutcome::Caught => self.end_round(),
        }
    }

    /// Pursuer touched the player
    fn end_round(&mut self) {
        self.cancel_frame();
        self.phase = GamePhase::Ended;
        log::info!("Caught after {} ticks", self.state.time_ticks);

        self.sink.stop_audio();
        // Alert while the caught positions are still on screen
        self.sink.on_caught();
        self.state.reset();
        self.notify_positions();
    }

    // === Input ===

    /// Move the player one step. Returns false when ignored (not running).
    pub fn move_input(&mut self, dir: Direction) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }

        let area = self.sink.area_bounds();
        let player = move_player(
            self.state.positions.get(Entity::Player),
            dir,
            self.settings.player_speed,
            area,
        );
        self.state.positions.set(Entity::Player, player);
        self.notify_positions();
        true
    }

    /// Dispatch a DOM key name
    pub fn handle_key(&mut self, key: &str) {
        match Command::from_key(key) {
            Some(Command::Escape) => self.escape(),
            Some(Command::Move(dir)) => {
                self.move_input(dir);
            }
            None => {}
        }
    }

    fn escape(&mut self) {
        if self.phase.awaiting_start() {
            return;
        }

        if self.settings_panel_open {
            self.set_settings_panel(false);
            if self.phase == GamePhase::Paused {
                self.toggle_pause();
            }
        } else {
            self.toggle_pause();
        }
    }

    /// Show/hide the settings panel
    ///
    /// During a round, opening pauses and closing resumes.
    pub fn toggle_settings_panel(&mut self) {
        let open = !self.settings_panel_open;
        self.set_settings_panel(open);

        if !self.phase.in_round() {
            return;
        }
        match (open, self.phase) {
            (true, GamePhase::Running) | (false, GamePhase::Paused) => self.toggle_pause(),
            _ => {}
        }
    }

    fn set_settings_panel(&mut self, open: bool) {
        self.settings_panel_open = open;
        log::debug!("Settings panel {}", if open { "opened" } else { "closed" });
        self.sink.on_settings_panel(open);
    }

    // === Settings ===

    /// Apply a full settings submission
    ///
    /// Nothing changes when validation fails. Submitting while paused resumes.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.validate()?;

        let track_changed = settings.music_track != self.settings.music_track;
        self.settings = settings;
        log::debug!("Settings applied: {:?}", self.settings);

        self.sink.set_volume(self.settings.volume);
        if track_changed {
            self.sink.stop_audio();
            if self.phase == GamePhase::Running {
                self.play_music();
            }
        }
        self.sink.on_config_updated(&self.settings);

        if self.settings_panel_open {
            self.set_settings_panel(false);
        }
        if self.phase == GamePhase::Paused {
            self.toggle_pause();
        }
        Ok(())
    }

    // === Helpers ===

    fn notify_positions(&mut self) {
        let positions = self.state.positions;
        self.sink
            .notify_positions(positions.player(), positions.pursuer());
    }

    /// Play the selected track; "none" pauses instead
    fn play_music(&mut self) {
        if self.settings.music_track.is_none() {
            self.sink.pause_audio();
            return;
        }
        if let Err(e) = self
            .sink
            .play_audio(&self.settings.music_track, self.settings.volume)
        {
            log::info!("Music needs user interaction before it can play ({})", e);
        }
    }

    fn schedule_frame(&mut self) {
        debug_assert!(self.frame.is_none(), "tick loop already scheduled");
        self.frame = Some(self.scheduler.request_frame());
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

impl<S: Sink> Session<S, ManualScheduler> {
    /// Fire the next pending frame. Returns false when none is pending.
    pub fn advance_frame(&mut self) -> bool {
        match self.scheduler.take_next() {
            Some(handle) => {
                self.on_frame(handle);
                true
            }
            None => false,
        }
    }

    /// Fire up to `max` frames, returning how many ran
    pub fn run_frames(&mut self, max: usize) -> usize {
        let mut ran = 0;
        while ran < max && self.advance_frame() {
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MusicTrack;
    use crate::consts::*;
    use crate::sink::{RecordingSink, SinkEvent};

    type TestSession = Session<RecordingSink, ManualScheduler>;

    fn session() -> TestSession {
        let mut session = Session::new(RecordingSink::default(), ManualScheduler::new());
        session.sink_mut().drain();
        session
    }

    fn started() -> TestSession {
        let mut session = session();
        session.start();
        session.sink_mut().drain();
        session
    }

    #[test]
    fn test_new_session_syncs_sink() {
        let session = Session::new(RecordingSink::default(), ManualScheduler::new());
        assert_eq!(session.phase(), GamePhase::NotStarted);
        assert_eq!(
            session.sink().last_positions(),
            Some((PLAYER_START, PURSUER_START))
        );
        assert!(session.sink().events.contains(&SinkEvent::SetVolume(0.5)));
        assert_eq!(session.scheduler().pending(), 0);
    }

    #[test]
    fn test_start_runs_loop_and_music() {
        let mut session = session();
        session.start();
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.scheduler().pending(), 1);
        assert!(session.pending_frame().is_some());

        let events = &session.sink().events;
        assert!(events.contains(&SinkEvent::Start));
        assert!(events.contains(&SinkEvent::PlayAudio {
            track: MusicTrack::from(DEFAULT_MUSIC_TRACK),
            volume: 0.5,
        }));
    }

    #[test]
    fn test_start_is_noop_while_running_or_paused() {
        let mut session = started();
        session.start();
        assert_eq!(session.scheduler().pending(), 1);
        assert!(session.sink().events.is_empty());

        session.toggle_pause();
        session.sink_mut().drain();
        session.start();
        assert_eq!(session.phase(), GamePhase::Paused);
        assert_eq!(session.scheduler().pending(), 0);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_tick_moves_pursuer_and_notifies() {
        let mut session = started();
        assert!(session.advance_frame());
        assert_eq!(session.pursuer(), Vec2::new(299.0, 299.0));
        assert_eq!(
            session.sink().events,
            vec![SinkEvent::Positions {
                player: PLAYER_START,
                pursuer: Vec2::new(299.0, 299.0),
            }]
        );
        // Re-scheduled itself
        assert_eq!(session.scheduler().pending(), 1);
    }

    #[test]
    fn test_caught_after_151_ticks() {
        let mut session = started();
        let ran = session.run_frames(1000);
        assert_eq!(ran, 151);
        assert_eq!(session.phase(), GamePhase::Ended);
    }

    #[test]
    fn test_caught_resets_and_stops() {
        let mut session = started();
        session.run_frames(1000);

        assert_eq!(session.phase(), GamePhase::Ended);
        assert_eq!(session.player(), PLAYER_START);
        assert_eq!(session.pursuer(), PURSUER_START);
        assert_eq!(session.pending_frame(), None);
        assert_eq!(session.scheduler().pending(), 0);

        let events = &session.sink().events;
        let stop = events.iter().position(|e| *e == SinkEvent::StopAudio);
        let caught = events.iter().position(|e| *e == SinkEvent::Caught);
        assert!(stop.is_some() && caught.is_some());
        assert_eq!(
            session.sink().last_positions(),
            Some((PLAYER_START, PURSUER_START))
        );

        // No automatic restart
        assert!(!session.advance_frame());
    }

    #[test]
    fn test_caught_alert_precedes_reset() {
        let mut session = started();
        session.run_frames(1000);

        let events = &session.sink().events;
        let caught = events.iter().position(|e| *e == SinkEvent::Caught).unwrap();
        let before = events[..caught]
            .iter()
            .rev()
            .find_map(|e| match e {
                SinkEvent::Positions { pursuer, .. } => Some(*pursuer),
                _ => None,
            });
        assert_eq!(before, Some(Vec2::new(149.0, 149.0)));
        assert_eq!(
            events[caught + 1..],
            [SinkEvent::Positions {
                player: PLAYER_START,
                pursuer: PURSUER_START,
            }]
        );
    }

    #[test]
    fn test_restart_after_caught() {
        let mut session = started();
        session.run_frames(1000);
        session.start();
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.scheduler().pending(), 1);
        assert_eq!(session.run_frames(1000), 151);
    }

    #[test]
    fn test_move_before_start_is_ignored() {
        let mut session = session();
        assert!(!session.move_input(Direction::Right));
        session.handle_key("ArrowRight");
        assert_eq!(session.player(), PLAYER_START);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_move_while_running() {
        let mut session = started();
        session.handle_key("ArrowRight");
        assert_eq!(session.player(), Vec2::new(140.0, 100.0));
        assert_eq!(
            session.sink().last_positions(),
            Some((Vec2::new(140.0, 100.0), PURSUER_START))
        );

        // Unknown keys do nothing
        session.sink_mut().drain();
        session.handle_key("q");
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_move_clamped_to_sink_area() {
        let mut session = Session::new(
            RecordingSink::new(Vec2::new(200.0, 200.0)),
            ManualScheduler::new(),
        );
        session.start();
        for _ in 0..10 {
            session.move_input(Direction::Down);
            session.move_input(Direction::Right);
        }
        assert_eq!(session.player(), Vec2::new(150.0, 150.0));
        for _ in 0..10 {
            session.move_input(Direction::Up);
        }
        assert_eq!(session.player().y, 0.0);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut session = started();
        session.run_frames(10);
        let frozen = session.positions();

        session.toggle_pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        assert_eq!(session.pending_frame(), None);
        assert_eq!(session.scheduler().pending(), 0);
        assert!(session.sink().events.contains(&SinkEvent::PauseAudio));
        assert!(session.sink().events.contains(&SinkEvent::Pause));

        assert!(!session.advance_frame());
        assert!(!session.move_input(Direction::Left));
        assert_eq!(session.positions(), frozen);
    }

    #[test]
    fn test_toggle_pause_twice_resumes() {
        let mut session = started();
        session.run_frames(5);
        let before = session.positions();

        session.toggle_pause();
        session.toggle_pause();
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.positions(), before);
        assert_eq!(session.scheduler().pending(), 1);
        assert!(session.sink().events.contains(&SinkEvent::Resume));

        assert!(session.advance_frame());
        assert_eq!(session.pursuer(), before.pursuer() - Vec2::ONE);
    }

    #[test]
    fn test_toggle_pause_noop_before_start() {
        let mut session = session();
        session.toggle_pause();
        assert_eq!(session.phase(), GamePhase::NotStarted);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_stale_frame_ignored() {
        let mut session = started();
        let stale = session.pending_frame().unwrap();
        session.toggle_pause();
        session.toggle_pause();
        let ticks = session.ticks();

        session.on_frame(stale);
        assert_eq!(session.ticks(), ticks);
        assert_eq!(session.pursuer(), PURSUER_START);
    }

    #[test]
    fn test_single_outstanding_frame() {
        let mut session = started();
        for _ in 0..20 {
            session.advance_frame();
            assert!(session.scheduler().pending() <= 1);
        }

        // Every path that requests a frame does so with none outstanding
        for i in 0..10 {
            match i % 3 {
                0 => session.toggle_pause(),
                1 => session.toggle_settings_panel(),
                _ => session.handle_key("Escape"),
            }
            session.advance_frame();
            assert!(session.scheduler().pending() <= 1);
            assert_eq!(session.pending_frame().is_some(), session.phase() == GamePhase::Running);
        }
    }

    #[test]
    fn test_escape_before_start_ignored() {
        let mut session = session();
        session.handle_key("Escape");
        assert_eq!(session.phase(), GamePhase::NotStarted);
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_escape_toggles_pause() {
        let mut session = started();
        session.handle_key("Escape");
        assert_eq!(session.phase(), GamePhase::Paused);
        session.handle_key("Escape");
        assert_eq!(session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_settings_panel_pauses_and_resumes() {
        let mut session = started();
        session.toggle_settings_panel();
        assert!(session.settings_panel_open());
        assert_eq!(session.phase(), GamePhase::Paused);

        session.toggle_settings_panel();
        assert!(!session.settings_panel_open());
        assert_eq!(session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_escape_closes_settings_panel() {
        let mut session = started();
        session.toggle_settings_panel();
        session.handle_key("Escape");
        assert!(!session.settings_panel_open());
        assert_eq!(session.phase(), GamePhase::Running);
        assert!(session.sink().events.contains(&SinkEvent::SettingsPanel(false)));
    }

    #[test]
    fn test_settings_panel_before_start_does_not_pause() {
        let mut session = session();
        session.toggle_settings_panel();
        assert!(session.settings_panel_open());
        assert_eq!(session.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn test_new_track_while_running_restarts_music() {
        let mut session = started();
        session.run_frames(3);
        let before = session.positions();
        session.sink_mut().drain();

        let new_track = MusicTrack::from("ASSETS/MUSIC/track2.mp3");
        let settings = Settings {
            music_track: new_track.clone(),
            ..session.settings().clone()
        };
        session.apply_settings(settings).unwrap();

        let audio = session.sink().audio_events();
        let stop = audio.iter().position(|e| **e == SinkEvent::StopAudio).unwrap();
        let play = audio
            .iter()
            .position(|e| {
                **e == SinkEvent::PlayAudio {
                    track: new_track.clone(),
                    volume: 0.5,
                }
            })
            .unwrap();
        assert!(stop < play);
        assert_eq!(session.positions(), before);
        assert_eq!(session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_new_track_while_paused_plays_on_resume() {
        let mut session = started();
        session.toggle_settings_panel();
        assert_eq!(session.phase(), GamePhase::Paused);
        session.sink_mut().drain();

        let new_track = MusicTrack::from("ASSETS/MUSIC/track2.mp3");
        let settings = Settings {
            music_track: new_track.clone(),
            ..session.settings().clone()
        };
        session.apply_settings(settings).unwrap();

        let events = &session.sink().events;
        let stop = events.iter().position(|e| *e == SinkEvent::StopAudio).unwrap();
        let play = events
            .iter()
            .position(|e| {
                *e == SinkEvent::PlayAudio {
                    track: new_track.clone(),
                    volume: 0.5,
                }
            })
            .unwrap();
        let resume = events.iter().position(|e| *e == SinkEvent::Resume).unwrap();
        assert!(stop < play);
        assert!(play < resume);
        assert_eq!(
            events.iter().filter(|e| matches!(e, SinkEvent::PlayAudio { .. })).count(),
            1
        );
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.scheduler().pending(), 1);
    }

    #[test]
    fn test_same_track_does_not_restart_music() {
        let mut session = started();
        let settings = Settings {
            volume: 0.9,
            ..session.settings().clone()
        };
        session.apply_settings(settings).unwrap();
        assert_eq!(
            session.sink().audio_events(),
            vec![&SinkEvent::SetVolume(0.9)]
        );
    }

    #[test]
    fn test_new_track_before_start_does_not_play() {
        let mut session = session();
        let settings = Settings {
            music_track: MusicTrack::from("ASSETS/MUSIC/track3.mp3"),
            ..Settings::default()
        };
        session.apply_settings(settings).unwrap();
        assert!(
            !session
                .sink()
                .events
                .iter()
                .any(|e| matches!(e, SinkEvent::PlayAudio { .. }))
        );
    }

    #[test]
    fn test_settings_while_paused_resume() {
        let mut session = started();
        session.toggle_settings_panel();
        assert_eq!(session.phase(), GamePhase::Paused);

        let settings = Settings {
            pursuer_speed: 4.0,
            ..Settings::default()
        };
        session.apply_settings(settings).unwrap();
        assert_eq!(session.phase(), GamePhase::Running);
        assert!(!session.settings_panel_open());

        // New speed applies from the next tick
        session.advance_frame();
        assert_eq!(session.pursuer(), Vec2::new(296.0, 296.0));
    }

    #[test]
    fn test_invalid_settings_change_nothing() {
        let mut session = started();
        let bad = Settings {
            player_speed: -3.0,
            ..Settings::default()
        };
        assert!(session.apply_settings(bad).is_err());
        assert_eq!(session.settings(), &Settings::default());
        assert!(session.sink().events.is_empty());
    }

    #[test]
    fn test_with_settings_validates() {
        let bad = Settings {
            volume: 2.0,
            ..Settings::default()
        };
        assert!(Session::with_settings(bad, RecordingSink::default(), ManualScheduler::new()).is_err());
    }

    #[test]
    fn test_playback_rejection_is_swallowed() {
        let mut sink = RecordingSink::default();
        sink.reject_playback = true;
        let mut session = Session::new(sink, ManualScheduler::new());
        session.start();
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.scheduler().pending(), 1);
        assert!(session.advance_frame());
    }

    #[test]
    fn test_no_music_pauses_instead_of_playing() {
        let settings = Settings {
            music_track: MusicTrack::None,
            ..Settings::default()
        };
        let mut session =
            Session::with_settings(settings, RecordingSink::default(), ManualScheduler::new())
                .unwrap();
        session.sink_mut().drain();
        session.start();
        let audio = session.sink().audio_events();
        assert_eq!(audio, vec![&SinkEvent::PauseAudio]);
    }
}
