//! # gltut
//!
//! Headless framework for OpenGL 3.3 tutorial scenes.
//!
//! Scenes never touch a graphics context directly. They link GLSL programs
//! whose interfaces are reflected from source, load meshes from the XML mesh
//! format, and issue draws through the [`render::RenderBackend`] trait. The
//! in-crate [`render::RecordingBackend`] checks every call against the linked
//! program interfaces and records it, which is how the tests and the CLI run
//! the tutorials without a window.
//!
//! ## Features
//!
//! - **Mesh format**: XML parser, validation, VAO layout and procedural generators
//! - **Shaders**: GLSL 330 reflection, stage linking and a built-in shader library
//! - **Uniform blocks**: std140 mirrors shared across programs
//! - **Scenes**: matrix stacks and joint hierarchies for model transforms
//! - **Tutorials**: ten scenes, from a single triangle to a world-space camera
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gltut::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     gltut::foundation::logging::init("info");
//!     let tutorial = gltut::tutorials::create("world").ok_or_else(|| AppError::Custom("no such tutorial".into()))?;
//!     let mut engine = Engine::new(TutorialConfig::default(), RecordingBackend::new(), tutorial)?;
//!     engine.run_frames(60)?;
//!     println!("{}", engine.backend().summary());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod application;
pub mod assets;
pub mod config;
pub mod engine;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;
pub mod tutorials;

pub use application::{AppError, AppEvent, FrameInfo, Tutorial};
pub use engine::Engine;

/// Common imports for scene authors and hosts
pub mod prelude {
    pub use crate::{
        application::{AppError, AppEvent, FrameInfo, Tutorial},
        assets::{mesh::MeshData, Resources},
        core::{ProjectionConfig, TutorialConfig},
        engine::Engine,
        foundation::math::{Mat4, Mat4Ext, Vec3, Vec4},
        input::{KeyAction, KeyCode, KeyEvent, Modifiers},
        render::{Mesh, Program, RecordingBackend, RenderBackend, UniformValue},
        scene::{MatrixStack, PushStack},
    };
}
