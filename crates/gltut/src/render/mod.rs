//! # Rendering
//!
//! The rendering layer sits between the tutorial scenes and whatever host owns
//! the graphics context. Scenes work with [`Program`], [`Mesh`] and
//! [`UniformBlockBuffer`]; those issue calls through the [`RenderBackend`]
//! trait, which a host implements. [`RecordingBackend`] is the in-crate
//! implementation used by tests and the CLI.
//!
//! ## Modules
//!
//! - [`shader`]: GLSL reflection, program linking and the built-in shader library
//! - [`backend`]: the host contract and resource handles
//! - [`recorder`]: validating backend that records calls
//! - [`types`]: capability, depth, clear and uniform value vocabulary

pub mod backend;
pub mod mesh;
pub mod program;
pub mod recorder;
pub mod shader;
pub mod types;
pub mod ubo;

pub use backend::{BackendResult, BufferHandle, ProgramHandle, RenderBackend, UniformLocation, VertexArrayHandle};
pub use mesh::Mesh;
pub use program::Program;
pub use recorder::{BackendCall, CallSummary, RecordingBackend};
pub use types::{
    BufferTarget, BufferUsage, Capability, ClearFlags, CullMode, DepthFunc, FrontFace, UniformValue,
};
pub use ubo::{GlobalMatrices, Std140Block, UniformBlockBuffer, GLOBAL_MATRICES_BINDING};

use crate::assets::mesh::MeshError;
use crate::render::shader::ShaderError;

/// Errors reported by the rendering layer
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A uniform could not be set
    ///
    /// Raised for a missing program, an unknown location or name, or a
    /// value whose type differs from the declaration.
    #[error("Invalid uniform: {0}")]
    InvalidUniform(String),

    /// A draw call was rejected
    ///
    /// Raised when no program or vertex array is bound, or when the draw
    /// reads outside its buffers.
    #[error("Invalid draw: {0}")]
    InvalidDraw(String),

    /// A mesh has no VAO with this name
    #[error("Unknown VAO '{0}'")]
    UnknownVao(String),

    /// A buffer update does not fit in the buffer
    #[error("Buffer {buffer} overflow: {len} bytes at offset {offset} exceed its {size} bytes")]
    BufferOverflow {
        /// Buffer handle value
        buffer: u64,
        /// Start of the write
        offset: usize,
        /// Bytes written
        len: usize,
        /// Buffer size
        size: usize,
    },

    /// A handle does not name a live object of the expected kind
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    /// Shader reflection or linking failed
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),

    /// Mesh data was rejected
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}
