//! Tutorial trait and lifecycle
//!
//! A tutorial is a scene that sets up its programs and meshes once, then
//! draws frames and reacts to keys and window size changes. It only talks to
//! the host through a [`RenderBackend`].

use thiserror::Error;

use crate::assets::{AssetError, Resources};
use crate::config::ConfigError;
use crate::input::{KeyAction, KeyCode, KeyEvent, Modifiers};
use crate::render::{RenderBackend, RenderError};

/// Timing of the frame being drawn
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInfo {
    /// Frame number, starting at 0
    pub index: u64,
    /// Seconds since the tutorial started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Tutorial lifecycle trait
///
/// The engine calls [`init`](Tutorial::init) once, [`reshape`](Tutorial::reshape)
/// with the initial window size, then [`display`](Tutorial::display) every
/// frame. Key events arrive between frames.
pub trait Tutorial {
    /// Short name used by the registry and in logs
    fn name(&self) -> &'static str;

    /// Create programs, buffers and fixed render state
    ///
    /// # Errors
    /// Any asset or backend failure.
    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError>;

    /// Draw one frame
    ///
    /// # Errors
    /// Any backend failure.
    fn display(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInfo) -> Result<(), AppError>;

    /// React to a key
    ///
    /// Escape never reaches this method; the engine handles it.
    fn keyboard(&mut self, _key: KeyCode, _action: KeyAction, _mods: Modifiers) {}

    /// The window was resized
    ///
    /// # Errors
    /// Any backend failure.
    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        backend.viewport(0, 0, width, height);
        Ok(())
    }
}

/// Events delivered to a running tutorial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Key input
    Key(KeyEvent),
    /// Window was resized
    Resized {
        /// New window width
        width: u32,
        /// New window height
        height: u32,
    },
    /// Window close requested
    CloseRequested,
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend call or render resource failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
