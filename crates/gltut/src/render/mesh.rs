//! Meshes uploaded to a backend
//!
//! A [`Mesh`] owns the buffers and vertex arrays created from a
//! [`MeshData`] and replays its rendering commands.

use crate::assets::mesh::{DrawCommand, MeshData, MeshLayout};
use crate::render::backend::{BackendResult, BufferHandle, RenderBackend, VertexArrayHandle};
use crate::render::types::{BufferTarget, BufferUsage, Capability};
use crate::render::RenderError;

/// GPU-side mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    vertex_buffer: BufferHandle,
    index_buffer: Option<BufferHandle>,
    vertex_array: VertexArrayHandle,
    named_vertex_arrays: Vec<(String, VertexArrayHandle)>,
    draws: Vec<DrawCommand>,
}

impl Mesh {
    /// Validate `data`, pack it and create every backend object
    ///
    /// The default vertex array enables all attributes; each named VAO gets
    /// its own vertex array over the same buffers.
    ///
    /// # Errors
    /// [`RenderError::Mesh`] if the data is inconsistent, or a backend error.
    pub fn upload(data: &MeshData, backend: &mut dyn RenderBackend) -> BackendResult<Self> {
        Self::upload_with_usage(data, backend, BufferUsage::StaticDraw)
    }

    /// Same as [`upload`](Self::upload) with a usage hint for the vertex buffer
    ///
    /// Scenes that rewrite their vertices every frame pass
    /// [`BufferUsage::StreamDraw`].
    ///
    /// # Errors
    /// See [`upload`](Self::upload).
    pub fn upload_with_usage(data: &MeshData, backend: &mut dyn RenderBackend, usage: BufferUsage) -> BackendResult<Self> {
        data.validate()?;
        let layout = MeshLayout::build(data);

        let vertex_buffer = backend.create_buffer(BufferTarget::Array, &layout.vertex_data, usage)?;
        let index_buffer = if layout.has_indices() {
            Some(backend.create_buffer(BufferTarget::ElementArray, &layout.index_data, BufferUsage::StaticDraw)?)
        } else {
            None
        };

        let vertex_array = backend.create_vertex_array(vertex_buffer, &layout.bindings, index_buffer)?;
        let named_vertex_arrays = layout
            .vaos
            .iter()
            .map(|vao| {
                backend
                    .create_vertex_array(vertex_buffer, &vao.bindings, index_buffer)
                    .map(|handle| (vao.name.clone(), handle))
            })
            .collect::<BackendResult<Vec<_>>>()?;
        backend.bind_vertex_array(None)?;

        log::debug!(
            "Uploaded mesh: {} vertices, {} draws, {} named VAOs",
            data.vertex_count(),
            layout.draws.len(),
            named_vertex_arrays.len()
        );
        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_array,
            named_vertex_arrays,
            draws: layout.draws,
        })
    }

    /// Array buffer handle
    #[must_use]
    pub const fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Element buffer handle, if the mesh is indexed
    #[must_use]
    pub const fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Draw calls issued by [`render`](Self::render)
    #[must_use]
    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    /// Whether the mesh has a named VAO
    #[must_use]
    pub fn has_vao(&self, name: &str) -> bool {
        self.named_vertex_arrays.iter().any(|(n, _)| n == name)
    }

    /// Issue every rendering command with all attributes enabled
    ///
    /// # Errors
    /// Whatever the backend reports for the draws.
    pub fn render(&self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        self.render_with(backend, self.vertex_array, 0)
    }

    /// Issue every rendering command with `base_vertex` added to each vertex index
    ///
    /// Lets several objects share one index list over a single vertex buffer.
    ///
    /// # Errors
    /// [`RenderError::InvalidDraw`] if an array draw would start before vertex 0,
    /// or whatever the backend reports.
    pub fn render_base_vertex(&self, backend: &mut dyn RenderBackend, base_vertex: i32) -> BackendResult<()> {
        self.render_with(backend, self.vertex_array, base_vertex)
    }

    /// Issue every rendering command with the attributes of a named VAO
    ///
    /// # Errors
    /// [`RenderError::UnknownVao`] if the mesh has no VAO called `name`.
    pub fn render_vao(&self, backend: &mut dyn RenderBackend, name: &str) -> BackendResult<()> {
        let vertex_array = self
            .named_vertex_arrays
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handle)| *handle)
            .ok_or_else(|| RenderError::UnknownVao(name.to_string()))?;
        self.render_with(backend, vertex_array, 0)
    }

    fn render_with(
        &self,
        backend: &mut dyn RenderBackend,
        vertex_array: VertexArrayHandle,
        base_vertex: i32,
    ) -> BackendResult<()> {
        backend.bind_vertex_array(Some(vertex_array))?;
        let result = self.issue_draws(backend, base_vertex);
        let unbind = backend.bind_vertex_array(None);
        result.and(unbind)
    }

    fn issue_draws(&self, backend: &mut dyn RenderBackend, base_vertex: i32) -> BackendResult<()> {
        for draw in &self.draws {
            match *draw {
                DrawCommand::Elements {
                    primitive,
                    index_type,
                    count,
                    offset,
                    primitive_restart,
                } => {
                    let count = u32::try_from(count)
                        .map_err(|_| RenderError::InvalidDraw(format!("{count} indices in one draw")))?;
                    if let Some(index) = primitive_restart {
                        backend.enable(Capability::PrimitiveRestart);
                        backend.primitive_restart_index(index);
                    }
                    let result = backend.draw_elements_base_vertex(primitive, index_type, count, offset, base_vertex);
                    if primitive_restart.is_some() {
                        backend.disable(Capability::PrimitiveRestart);
                    }
                    result?;
                }
                DrawCommand::Arrays { primitive, first, count } => {
                    let first = first
                        .checked_add_signed(base_vertex)
                        .ok_or_else(|| RenderError::InvalidDraw(format!("first vertex {first} + {base_vertex}")))?;
                    backend.draw_arrays(primitive, first, count)?;
                }
            }
        }
        Ok(())
    }
}
