//! Host embedding surface
//!
//! `ChorusKing` is everything the application shell talks to: lifecycle,
//! visibility, mode flow and the per-frame driver. It never calls back into
//! the shell; the shell reads state through accessors.

use glam::Vec2;

use crate::audio::{AudioBackend, AudioEngine};
use crate::consts::MAX_FRAME_MS;
use crate::error::InitError;
use crate::input::{GamepadState, InputManager, InputState, KeyboardState};
use crate::level::{self, DEMO_LEVEL_ID};
use crate::settings::Settings;
use crate::sim::{DemoAi, GameEvent, GamePhase, GameState, tick};

/// DOM id of the element the game mounts into
pub const CONTAINER_ID: &str = "game-container";

/// The element the game renders into, as measured by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// AI plays the demo level
    Attract,
    /// A human plays the named level
    Level(String),
}

pub struct ChorusKing {
    audio: AudioEngine,
    input: InputManager,
    demo_ai: DemoAi,
    settings: Settings,
    session: Option<GameState>,
    mode: Mode,
    container: ContainerHandle,
    /// Paused by the player or the shell
    paused: bool,
    /// Page hidden; independent of `paused`
    hidden: bool,
    ready: bool,
    destroyed: bool,
    now_ms: f64,
    last_frame_ms: Option<f64>,
    pause_held: bool,
}

impl ChorusKing {
    /// Validate the container, build audio and start attract mode
    pub fn initialize(
        container: Option<ContainerHandle>,
        backend: Box<dyn AudioBackend>,
        seed: u64,
        now_ms: f64,
    ) -> Result<Self, InitError> {
        let container = container.ok_or_else(|| InitError::ContainerMissing(CONTAINER_ID.to_string()))?;
        if container.width == 0 || container.height == 0 {
            return Err(InitError::EmptyContainer {
                id: container.id,
                width: container.width,
                height: container.height,
            });
        }

        let settings = Settings::load();
        let mut audio = AudioEngine::new(backend, seed, now_ms);
        let mut input = InputManager::new();
        settings.apply_to(&mut audio, &mut input);

        log::info!(
            "Chorus King initialized in '{}' ({}x{}), seed {seed}",
            container.id,
            container.width,
            container.height
        );

        let mut game = Self {
            audio,
            input,
            demo_ai: DemoAi::new(seed),
            settings,
            session: None,
            mode: Mode::Attract,
            container,
            paused: false,
            hidden: false,
            ready: false,
            destroyed: false,
            now_ms,
            last_frame_ms: None,
            pause_held: false,
        };
        game.start_attract();
        Ok(game)
    }

    // === Lifecycle ===

    /// Release audio and drop the session. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.audio.destroy();
        self.session = None;
        self.ready = false;
        self.destroyed = true;
        log::info!("Chorus King destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {width}x{height}");
            return;
        }
        self.container.width = width;
        self.container.height = height;
        log::debug!("Resized to {width}x{height}");
    }

    pub fn container(&self) -> &ContainerHandle {
        &self.container
    }

    /// Called once the first frame has been presented
    pub fn mark_ready(&mut self) {
        if self.ready || self.destroyed {
            return;
        }
        self.ready = true;
        log::info!("Ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        if let Some(session) = self.session.as_mut() {
            if session.phase == GamePhase::Playing {
                session.phase = GamePhase::Paused;
            }
        }
        log::info!("Paused");
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(session) = self.session.as_mut() {
            if session.phase == GamePhase::Paused {
                session.phase = GamePhase::Playing;
            }
        }
        log::info!("Resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Page visibility: hidden halts the simulation and (per settings) mutes
    pub fn set_visibility(&mut self, visible: bool) {
        if self.hidden == !visible {
            return;
        }
        self.hidden = !visible;
        if self.settings.mute_on_hidden {
            self.audio.set_page_visible(visible);
        }
        log::info!("Page {}", if visible { "visible" } else { "hidden" });
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// First user gesture: audio output may start
    pub fn unlock_audio(&mut self) {
        self.audio.unlock();
    }

    // === Settings ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        settings.apply_to(&mut self.audio, &mut self.input);
        if !settings.mute_on_hidden {
            self.audio.set_page_visible(true);
        } else {
            self.audio.set_page_visible(!self.hidden);
        }
        settings.save();
        self.settings = settings;
    }

    // === Modes ===

    /// Load a level for human play. Unknown ids are logged and ignored.
    pub fn start_level(&mut self, id: &str) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(level) = level::load_level(id) else {
            return false;
        };
        self.begin(GameState::from_level(&level));
        self.mode = Mode::Level(id.to_string());
        log::info!("Starting level '{id}'");
        true
    }

    /// Hand control to the demo AI on the demo level
    pub fn start_attract(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let level = match level::demo_level() {
            Ok(level) => level,
            Err(e) => {
                log::error!("Demo level unavailable: {e}");
                return false;
            }
        };
        self.begin(GameState::from_level(&level));
        self.mode = Mode::Attract;
        log::info!("Attract mode on '{DEMO_LEVEL_ID}'");
        true
    }

    /// Move on from a completed level. Returns false at the end of the run.
    pub fn advance_level(&mut self) -> bool {
        let next = match &self.session {
            Some(session) if session.phase == GamePhase::LevelComplete => session.goal.next_level.clone(),
            _ => None,
        };
        match next {
            Some(next) => self.start_level(&next),
            None => false,
        }
    }

    fn begin(&mut self, session: GameState) {
        self.audio.stop_all_music();
        self.audio.set_bpm(session.bpm, self.now_ms);
        self.audio.start_background_music(self.now_ms);
        self.input.reset();
        self.demo_ai.reset();
        self.paused = false;
        self.session = Some(session);
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn session(&self) -> Option<&GameState> {
        self.session.as_ref()
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioEngine {
        &mut self.audio
    }

    pub fn input(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Events from the last simulated frame
    pub fn events(&self) -> &[GameEvent] {
        self.session.as_ref().map(|s| s.events.as_slice()).unwrap_or(&[])
    }

    /// Camera scroll for the renderer
    pub fn camera_scroll(&self) -> Vec2 {
        self.session.as_ref().map(|s| s.camera_scroll).unwrap_or(Vec2::ZERO)
    }

    // === Frame ===

    /// Drive one rendered frame. Returns the input the simulation consumed.
    pub fn frame(&mut self, now_ms: f64, keyboard: &KeyboardState, gamepad: Option<&GamepadState>) -> InputState {
        if self.destroyed {
            return InputState::default();
        }
        let elapsed_ms = match self.last_frame_ms {
            Some(last) => ((now_ms - last).max(0.0) as f32).min(MAX_FRAME_MS),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.now_ms = now_ms;

        // Devices are always polled so edges stay coherent across modes
        let human = self.input.update(keyboard, gamepad);
        if human.pause && !self.pause_held && matches!(self.mode, Mode::Level(_)) {
            if self.paused {
                self.resume();
            } else {
                self.pause();
            }
        }
        self.pause_held = human.pause;

        if !self.ready || self.paused || self.hidden {
            self.audio.update(now_ms);
            return InputState::default();
        }
        let Some(session) = self.session.as_mut() else {
            self.audio.update(now_ms);
            return InputState::default();
        };

        // Exactly one source per frame
        let input = match self.mode {
            Mode::Attract => self.demo_ai.tick(now_ms, &session.perception()),
            Mode::Level(_) => human,
        };

        tick(session, &input, elapsed_ms, &mut self.audio);
        // Beat clock, fades and cues advance after the simulation
        self.audio.update(now_ms);

        let mut restart_attract = false;
        for event in &session.events {
            match (&self.mode, event) {
                (Mode::Attract, GameEvent::Respawned) => self.demo_ai.reset(),
                (Mode::Attract, GameEvent::LevelComplete { .. }) => restart_attract = true,
                (Mode::Level(_), GameEvent::PlayerHit) => self.input.strong_vibration(),
                (Mode::Level(_), GameEvent::NoteCollected { .. }) => self.input.light_vibration(),
                _ => {}
            }
        }
        if restart_attract {
            log::info!("Demo run complete, restarting");
            self.start_attract();
        }
        input
    }
}
