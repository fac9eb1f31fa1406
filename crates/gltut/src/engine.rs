//! Headless tutorial driver
//!
//! [`Engine`] stands in for a windowed main loop without a
//! window: it owns the backend, the clock and an event queue, and feeds a
//! [`Tutorial`] resize, key and display calls in the same order a host would.

use std::collections::{BTreeMap, VecDeque};

use crate::application::{AppError, AppEvent, FrameInfo, Tutorial};
use crate::assets::Resources;
use crate::core::TutorialConfig;
use crate::foundation::time::FrameClock;
use crate::input::{KeyAction, KeyCode, KeyEvent};
use crate::render::RenderBackend;

/// Time step of a manual clock, one 60 Hz frame
pub const FIXED_FRAME_TIME: f64 = 1.0 / 60.0;

/// Main engine struct
///
/// Drives one tutorial against a backend.
pub struct Engine<B: RenderBackend> {
    config: TutorialConfig,
    backend: B,
    resources: Resources,
    clock: FrameClock,
    tutorial: Box<dyn Tutorial>,
    events: VecDeque<AppEvent>,
    scheduled: BTreeMap<u64, Vec<AppEvent>>,
    frame: u64,
    started: bool,
    running: bool,
}

impl<B: RenderBackend> Engine<B> {
    /// Create an engine; nothing is called on the tutorial yet
    ///
    /// The clock is manual and advances [`FIXED_FRAME_TIME`] per frame.
    ///
    /// # Errors
    /// [`AppError::Config`] if the configuration is invalid,
    /// [`AppError::Asset`] if the shader directory cannot be read.
    pub fn new(config: TutorialConfig, backend: B, tutorial: Box<dyn Tutorial>) -> Result<Self, AppError> {
        config.validate()?;
        let resources = Resources::from_config(&config)?;
        Ok(Self {
            config,
            backend,
            resources,
            clock: FrameClock::manual(),
            tutorial,
            events: VecDeque::new(),
            scheduled: BTreeMap::new(),
            frame: 0,
            started: false,
            running: true,
        })
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the resources built from the configuration
    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Initialize the tutorial and send it the configured window size
    ///
    /// Called by [`run_frames`](Self::run_frames) if needed; calling it again
    /// does nothing.
    ///
    /// # Errors
    /// Whatever the tutorial's `init` or `reshape` returns.
    pub fn start(&mut self) -> Result<(), AppError> {
        if self.started {
            return Ok(());
        }
        log::info!(
            "Starting '{}' at {}x{}",
            self.tutorial.name(),
            self.config.window.width,
            self.config.window.height
        );
        self.tutorial.init(&mut self.backend, &mut self.resources)?;
        self.tutorial
            .reshape(&mut self.backend, self.config.window.width, self.config.window.height)?;
        self.started = true;
        Ok(())
    }

    /// Queue an event for the next frame
    pub fn push_event(&mut self, event: AppEvent) {
        self.events.push_back(event);
    }

    /// Queue a key event for the next frame
    pub fn send_key(&mut self, event: KeyEvent) {
        self.push_event(AppEvent::Key(event));
    }

    /// Deliver an event just before frame `frame` is drawn
    pub fn schedule(&mut self, frame: u64, event: AppEvent) {
        self.scheduled.entry(frame).or_default().push(event);
    }

    /// Draw up to `count` frames
    ///
    /// Each frame first delivers queued events, then calls `display`. Stops
    /// early when the tutorial is closed. Returns the number of frames drawn.
    ///
    /// # Errors
    /// The first error from the tutorial; the engine stops running.
    pub fn run_frames(&mut self, count: u64) -> Result<u64, AppError> {
        self.start()?;
        let mut drawn = 0;
        while drawn < count && self.running {
            if let Err(err) = self.step() {
                log::error!("'{}' failed on frame {}: {err}", self.tutorial.name(), self.frame);
                self.running = false;
                return Err(err);
            }
            if self.running {
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    fn step(&mut self) -> Result<(), AppError> {
        if let Some(events) = self.scheduled.remove(&self.frame) {
            self.events.extend(events);
        }
        while let Some(event) = self.events.pop_front() {
            self.handle_event(event)?;
            if !self.running {
                return Ok(());
            }
        }

        self.clock.tick();
        let info = FrameInfo {
            index: self.frame,
            elapsed: self.clock.elapsed() as f32,
            delta: self.clock.delta_time(),
        };
        self.tutorial.display(&mut self.backend, &info)?;
        log::trace!("Frame {} drawn at {:.3}s", info.index, info.elapsed);

        self.frame += 1;
        if self.clock.is_manual() {
            self.clock.advance(FIXED_FRAME_TIME);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<(), AppError> {
        match event {
            AppEvent::CloseRequested => self.quit(),
            AppEvent::Key(KeyEvent {
                key: KeyCode::Escape,
                action: KeyAction::Press,
                ..
            }) => self.quit(),
            AppEvent::Key(KeyEvent { key, action, mods }) => self.tutorial.keyboard(key, action, mods),
            AppEvent::Resized { width, height } => {
                self.config.window.width = width;
                self.config.window.height = height;
                self.tutorial.reshape(&mut self.backend, width, height)?;
            }
        }
        Ok(())
    }

    /// Stop the engine; later frames are not drawn
    pub fn quit(&mut self) {
        if self.running {
            log::info!("Closing '{}' after {} frames", self.tutorial.name(), self.frame);
        }
        self.running = false;
    }

    /// Whether frames are still being drawn
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Frames drawn so far
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &TutorialConfig {
        &self.config
    }

    /// Backend
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Tutorial being driven
    #[must_use]
    pub fn tutorial(&self) -> &dyn Tutorial {
        self.tutorial.as_ref()
    }

    /// Give back the backend
    pub fn into_backend(self) -> B {
        self.backend
    }
}
