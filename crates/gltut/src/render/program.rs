//! Linked shader programs

use crate::render::backend::{BackendResult, ProgramHandle, RenderBackend, UniformLocation};
use crate::render::shader::{ProgramInterface, ShaderLibrary};
use crate::render::types::UniformValue;
use crate::render::RenderError;

/// A program created in a backend together with its linked interface
#[derive(Debug, Clone)]
pub struct Program {
    handle: ProgramHandle,
    interface: ProgramInterface,
}

impl Program {
    /// Create the program object for a linked interface
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn new(backend: &mut dyn RenderBackend, interface: ProgramInterface) -> BackendResult<Self> {
        let handle = backend.create_program(&interface)?;
        Ok(Self { handle, interface })
    }

    /// Link `vertex` and `fragment` from a library and create the program
    ///
    /// # Errors
    /// [`RenderError::Shader`] when a source is missing or fails to link.
    pub fn load(
        backend: &mut dyn RenderBackend,
        library: &ShaderLibrary,
        vertex: &str,
        fragment: &str,
    ) -> BackendResult<Self> {
        let interface = library.link(vertex, fragment)?;
        log::debug!("Creating program {vertex} + {fragment}");
        Self::new(backend, interface)
    }

    /// Backend handle
    #[must_use]
    pub const fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Linked interface
    #[must_use]
    pub const fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    /// Location of a uniform the program must declare
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] if the program has no such uniform.
    pub fn uniform_location(&self, name: &str) -> BackendResult<UniformLocation> {
        self.optional_uniform_location(name).ok_or_else(|| {
            RenderError::InvalidUniform(format!(
                "'{name}' is not a uniform of {} + {}",
                self.interface.vertex_shader, self.interface.fragment_shader
            ))
        })
    }

    /// Location of a uniform, or `None` when the program does not use it
    #[must_use]
    pub fn optional_uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.interface.uniform(name).map(|u| UniformLocation {
            program: self.handle,
            location: u.location,
        })
    }

    /// Index of a uniform block
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] if the program has no such block.
    pub fn uniform_block_index(&self, name: &str) -> BackendResult<u32> {
        self.interface.block(name).map(|b| b.index).ok_or_else(|| {
            RenderError::InvalidUniform(format!(
                "'{name}' is not a uniform block of {} + {}",
                self.interface.vertex_shader, self.interface.fragment_shader
            ))
        })
    }

    /// Attach a uniform block to a binding point
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] for an unknown block, or a backend error.
    pub fn bind_uniform_block(&self, backend: &mut dyn RenderBackend, name: &str, binding: u32) -> BackendResult<()> {
        let index = self.uniform_block_index(name)?;
        backend.bind_uniform_block(self.handle, index, binding)
    }

    /// Make this the current program
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn bind(&self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        backend.use_program(Some(self.handle))
    }

    /// Set a uniform; the program must be current
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] from the backend on a type mismatch.
    pub fn set_uniform(
        &self,
        backend: &mut dyn RenderBackend,
        location: UniformLocation,
        value: impl Into<UniformValue>,
    ) -> BackendResult<()> {
        backend.set_uniform(location, value.into())
    }

    /// Look up a uniform by name and set it; the program must be current
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] for an unknown name or a type mismatch.
    pub fn set_named_uniform(
        &self,
        backend: &mut dyn RenderBackend,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> BackendResult<()> {
        let location = self.uniform_location(name)?;
        self.set_uniform(backend, location, value)
    }
}
