//! Chaser entry point
//!
//! Web: wires the DOM, the `<audio>` element and `requestAnimationFrame` to a
//! [`chaser::Session`]. Native: plays one headless round and logs it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        Document, HtmlAudioElement, HtmlElement, HtmlInputElement, HtmlSelectElement,
        KeyboardEvent, Window,
    };

    use chaser::{
        AudioError, FrameHandle, FrameScheduler, MusicTrack, Session, Settings, SettingsForm, Sink,
    };

    type WebSession = Session<DomSink, RafScheduler>;

    /// Look up an element by id and cast it
    fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
            .dyn_into::<T>()
            .map_err(|_| JsValue::from_str(&format!("#{id} has the wrong element type")))
    }

    /// Sink backed by DOM styles and an `<audio>` element
    struct DomSink {
        window: Window,
        player: HtmlElement,
        pursuer: HtmlElement,
        game_area: HtmlElement,
        pause_overlay: HtmlElement,
        settings_area: HtmlElement,
        music: HtmlAudioElement,
        /// Track currently loaded into `music`
        loaded_track: Option<MusicTrack>,
    }

    impl DomSink {
        fn new(window: Window, document: &Document) -> Result<Self, JsValue> {
            Ok(Self {
                player: element(document, "player")?,
                pursuer: element(document, "enemie")?,
                game_area: element(document, "game-area")?,
                pause_overlay: element(document, "pause-overlay")?,
                settings_area: element(document, "settings-area")?,
                music: element(document, "game-music")?,
                loaded_track: None,
                window,
            })
        }

        fn place(el: &HtmlElement, pos: Vec2) {
            let _ = el
                .style()
                .set_property("transform", &format!("translate({}px, {}px)", pos.x, pos.y));
        }

        fn set_visible(el: &HtmlElement, visible: bool) {
            let classes = el.class_list();
            let _ = if visible {
                classes.add_1("visible")
            } else {
                classes.remove_1("visible")
            };
        }
    }

    impl Sink for DomSink {
        fn notify_positions(&mut self, player: Vec2, pursuer: Vec2) {
            Self::place(&self.player, player);
            Self::place(&self.pursuer, pursuer);
        }

        fn area_bounds(&self) -> Vec2 {
            Vec2::new(
                self.game_area.client_width() as f32,
                self.game_area.client_height() as f32,
            )
        }

        fn on_start(&mut self) {
            Self::set_visible(&self.pause_overlay, false);
        }

        fn on_pause(&mut self) {
            Self::set_visible(&self.pause_overlay, true);
        }

        fn on_resume(&mut self) {
            Self::set_visible(&self.pause_overlay, false);
        }

        fn on_caught(&mut self) {
            let _ = self.window.alert_with_message("The pursuer caught you!");
        }

        fn on_config_updated(&mut self, settings: &Settings) {
            let _ = self
                .game_area
                .style()
                .set_property("background-color", settings.theme.background_color());
            let image = if settings.has_sprite() {
                format!("url('{}')", settings.pursuer_sprite)
            } else {
                "none".to_string()
            };
            let _ = self.pursuer.style().set_property("background-image", &image);
        }

        fn on_settings_panel(&mut self, open: bool) {
            Self::set_visible(&self.settings_area, open);
        }

        fn play_audio(&mut self, track: &MusicTrack, volume: f32) -> Result<(), AudioError> {
            if self.loaded_track.as_ref() != Some(track) {
                self.music.set_src(track.as_str());
                self.loaded_track = Some(track.clone());
            }
            self.music.set_volume(volume as f64);

            let promise = self
                .music
                .play()
                .map_err(|e| AudioError::Playback(format!("{e:?}")))?;
            // Autoplay rejections arrive asynchronously
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::info!("Music needs user interaction before it can play ({e:?})");
                }
            });
            Ok(())
        }

        fn pause_audio(&mut self) {
            let _ = self.music.pause();
        }

        fn stop_audio(&mut self) {
            let _ = self.music.pause();
            self.music.set_current_time(0.0);
        }

        fn set_volume(&mut self, volume: f32) {
            self.music.set_volume(volume as f64);
        }
    }

    /// `requestAnimationFrame`-backed scheduler
    ///
    /// The callback slot is filled once the session exists; the callback
    /// reads `last` to learn which handle fired.
    struct RafScheduler {
        window: Window,
        callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
        last: Rc<Cell<Option<i32>>>,
    }

    impl FrameScheduler for RafScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            let id = match self.callback.borrow().as_ref() {
                Some(cb) => self
                    .window
                    .request_animation_frame(cb.as_ref().unchecked_ref())
                    .unwrap_or_else(|e| {
                        log::error!("requestAnimationFrame failed: {e:?}");
                        0
                    }),
                None => {
                    log::error!("Frame callback not installed");
                    0
                }
            };
            self.last.set(Some(id));
            FrameHandle(id)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            let _ = self.window.cancel_animation_frame(handle.0);
            if self.last.get() == Some(handle.0) {
                self.last.set(None);
            }
        }
    }

    /// Read the settings form inputs
    fn read_form(document: &Document) -> Result<SettingsForm, JsValue> {
        Ok(SettingsForm {
            player_speed: element::<HtmlInputElement>(document, "player-speed")?.value(),
            pursuer_speed: element::<HtmlInputElement>(document, "enemie-speed")?.value(),
            dark_mode: element::<HtmlInputElement>(document, "dark-mode")?.checked(),
            pursuer_sprite: element::<HtmlSelectElement>(document, "enemie-image")?.value(),
            music_track: element::<HtmlSelectElement>(document, "music-track")?.value(),
            volume: element::<HtmlInputElement>(document, "music-volume")?.value(),
        })
    }

    /// Pre-fill the settings form
    fn fill_form(document: &Document, form: &SettingsForm) -> Result<(), JsValue> {
        element::<HtmlInputElement>(document, "player-speed")?.set_value(&form.player_speed);
        element::<HtmlInputElement>(document, "enemie-speed")?.set_value(&form.pursuer_speed);
        element::<HtmlInputElement>(document, "dark-mode")?.set_checked(form.dark_mode);
        element::<HtmlSelectElement>(document, "enemie-image")?.set_value(&form.pursuer_sprite);
        element::<HtmlSelectElement>(document, "music-track")?.set_value(&form.music_track);
        element::<HtmlInputElement>(document, "music-volume")?.set_value(&form.volume);
        Ok(())
    }

    fn on_click(
        document: &Document,
        id: &str,
        mut handler: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        let target: HtmlElement = element(document, id)?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| handler());
        target.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_input_handlers(
        window: &Window,
        document: &Document,
        session: Rc<RefCell<WebSession>>,
    ) -> Result<(), JsValue> {
        // Start button
        {
            let session = session.clone();
            on_click(document, "start-button", move || session.borrow_mut().start())?;
        }

        // Settings panel toggle
        {
            let session = session.clone();
            on_click(document, "settings-toggle-button", move || {
                session.borrow_mut().toggle_settings_panel()
            })?;
        }

        // Settings submit
        {
            let session = session.clone();
            let doc = document.clone();
            let window = window.clone();
            let form: HtmlElement = element(document, "settings-form")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                let result = read_form(&doc)
                    .map_err(|e| format!("{e:?}"))
                    .and_then(|form| form.parse().map_err(|e| e.to_string()))
                    .and_then(|settings| {
                        session
                            .borrow_mut()
                            .apply_settings(settings)
                            .map_err(|e| e.to_string())
                    });
                match result {
                    Ok(()) => {
                        log::info!("Settings updated");
                        let _ = window.alert_with_message("Settings updated!");
                    }
                    Err(e) => {
                        log::warn!("Settings rejected: {e}");
                        let _ = window.alert_with_message(&format!("Invalid settings: {e}"));
                    }
                }
            });
            form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard: movement and Escape
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                session.borrow_mut().handle_key(&event.key());
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Chaser starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let callback = Rc::new(RefCell::new(None));
        let last = Rc::new(Cell::new(None));
        let scheduler = RafScheduler {
            window: window.clone(),
            callback: callback.clone(),
            last: last.clone(),
        };
        let sink = DomSink::new(window.clone(), &document)?;
        let session = Rc::new(RefCell::new(Session::new(sink, scheduler)));

        // Install the frame callback now that the session exists
        {
            let session = session.clone();
            *callback.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
                let Some(id) = last.take() else { return };
                session.borrow_mut().on_frame(FrameHandle(id));
            }));
        }

        fill_form(
            &document,
            &SettingsForm::from_settings(session.borrow().settings()),
        )?;
        setup_input_handlers(&window, &document, session)?;

        log::info!("Chaser ready, press START");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;

    use glam::Vec2;

    use chaser::sim::{Direction, GamePhase};
    use chaser::{AudioError, ManualScheduler, MusicTrack, Session, Settings, Sink};

    /// Frames before the demo gives up (~5 minutes at 60 Hz)
    const MAX_FRAMES: usize = 60 * 60 * 5;

    /// Sink that narrates to the log
    pub struct LogSink {
        area: Vec2,
    }

    impl LogSink {
        pub fn new(area: Vec2) -> Self {
            Self { area }
        }
    }

    impl Sink for LogSink {
        fn notify_positions(&mut self, player: Vec2, pursuer: Vec2) {
            log::trace!("player {player} pursuer {pursuer}");
        }

        fn area_bounds(&self) -> Vec2 {
            self.area
        }

        fn on_caught(&mut self) {
            log::info!("The pursuer caught you!");
        }

        fn on_config_updated(&mut self, settings: &Settings) {
            log::debug!(
                "theme {} sprite {}",
                settings.theme.as_str(),
                settings.pursuer_sprite
            );
        }

        fn play_audio(&mut self, track: &MusicTrack, volume: f32) -> Result<(), AudioError> {
            log::debug!("(no audio output) would play {track} at {volume:.2}");
            Err(AudioError::Unavailable)
        }

        fn pause_audio(&mut self) {}

        fn stop_audio(&mut self) {}

        fn set_volume(&mut self, _volume: f32) {}
    }

    /// Read a settings JSON file
    pub fn load_settings(path: &Path) -> Result<Settings, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
        Settings::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Play one round where the player flees right, then down, along the edge
    pub fn run(settings: Settings, area: Vec2) -> Result<(), chaser::ConfigError> {
        let mut session = Session::with_settings(settings, LogSink::new(area), ManualScheduler::new())?;
        session.start();

        let mut frames = 0;
        while session.phase() == GamePhase::Running && frames < MAX_FRAMES {
            // One key press every half second
            if frames % 30 == 0 {
                let dir = if session.player().x < area.x / 2.0 {
                    Direction::Right
                } else {
                    Direction::Down
                };
                session.move_input(dir);
            }
            if !session.advance_frame() {
                break;
            }
            frames += 1;
        }

        match session.phase() {
            GamePhase::Ended => log::info!("Round over after {frames} frames"),
            phase => log::info!("Stopped after {frames} frames while {}", phase.as_str()),
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// JSON settings file, defaults are used when omitted
    settings: Option<std::path::PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    let args = Args::parse();
    log::info!("Chaser (native) starting...");
    log::info!("The browser build is the real game - run with `trunk serve`");

    let settings = match args.settings.as_deref().map(headless::load_settings) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            log::error!("{e}");
            std::process::exit(1);
        }
        None => chaser::Settings::default(),
    };

    if let Err(e) = headless::run(settings, chaser::consts::DEFAULT_AREA) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
