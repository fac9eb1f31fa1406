//! Backend abstraction for the rendering host
//!
//! The tutorials never talk to a graphics API directly. Everything they need
//! from the host goes through [`RenderBackend`], which mirrors the small slice
//! of OpenGL 3.3 the scenes use. Resources are referred to by opaque handles.

use crate::assets::mesh::{AttributeBinding, IndexType, PrimitiveType};
use crate::render::shader::ProgramInterface;
use crate::render::types::{
    BufferTarget, BufferUsage, Capability, ClearFlags, CullMode, DepthFunc, FrontFace, UniformValue,
};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a linked program stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// Handle to a buffer object stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Handle to a vertex array object stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(pub u64);

/// Location of a plain uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    /// Program the location belongs to
    pub program: ProgramHandle,
    /// Location assigned at link time
    pub location: u32,
}

/// Main rendering backend trait
///
/// Implemented by the host that owns the graphics context. The crate ships
/// [`RecordingBackend`](crate::render::RecordingBackend), which validates and
/// records every call instead of issuing it.
pub trait RenderBackend {
    /// Create a program object for an already linked interface
    fn create_program(&mut self, interface: &ProgramInterface) -> BackendResult<ProgramHandle>;

    /// Make `program` current, or unbind with `None`
    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()>;

    /// Set a plain uniform of the current program
    ///
    /// # Arguments
    /// * `location` - Location obtained from the program that is current
    /// * `value` - Value whose GLSL type must match the declaration
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) -> BackendResult<()>;

    /// Attach uniform block `block_index` of `program` to a binding point
    fn bind_uniform_block(&mut self, program: ProgramHandle, block_index: u32, binding: u32) -> BackendResult<()>;

    /// Create a buffer initialized with `data`
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> BackendResult<BufferHandle>;

    /// Overwrite part of a buffer starting at byte `offset`
    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> BackendResult<()>;

    /// Bind a byte range of a uniform buffer to a binding point
    fn bind_buffer_range(&mut self, binding: u32, buffer: BufferHandle, offset: usize, size: usize) -> BackendResult<()>;

    /// Create a vertex array reading `bindings` from `vertex_buffer`
    ///
    /// # Arguments
    /// * `vertex_buffer` - Array buffer holding every attribute
    /// * `bindings` - Attribute layouts, offsets relative to the buffer start
    /// * `index_buffer` - Element buffer attached to the vertex array, if any
    fn create_vertex_array(
        &mut self,
        vertex_buffer: BufferHandle,
        bindings: &[AttributeBinding],
        index_buffer: Option<BufferHandle>,
    ) -> BackendResult<VertexArrayHandle>;

    /// Make a vertex array current, or unbind with `None`
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) -> BackendResult<()>;

    /// Enable a capability
    fn enable(&mut self, capability: Capability);

    /// Disable a capability
    fn disable(&mut self, capability: Capability);

    /// Select faces removed by culling
    fn cull_face(&mut self, mode: CullMode);

    /// Select the winding of front faces
    fn front_face(&mut self, face: FrontFace);

    /// Depth comparison function
    fn depth_func(&mut self, func: DepthFunc);

    /// Map normalized depth to `[near, far]`
    fn depth_range(&mut self, near: f64, far: f64);

    /// Enable or disable depth writes
    fn depth_mask(&mut self, enabled: bool);

    /// Index value that restarts a primitive
    fn primitive_restart_index(&mut self, index: u32);

    /// Clear color
    fn clear_color(&mut self, rgba: [f32; 4]);

    /// Clear depth
    fn clear_depth(&mut self, depth: f64);

    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags);

    /// Viewport rectangle in pixels
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Draw `count` vertices starting at `first` with the bound vertex array
    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) -> BackendResult<()>;

    /// Draw `count` indices starting at byte `offset` of the element buffer
    fn draw_elements(
        &mut self,
        primitive: PrimitiveType,
        index_type: IndexType,
        count: u32,
        offset: usize,
    ) -> BackendResult<()> {
        self.draw_elements_base_vertex(primitive, index_type, count, offset, 0)
    }

    /// Same as [`draw_elements`](Self::draw_elements) with `base_vertex` added to each index
    fn draw_elements_base_vertex(
        &mut self,
        primitive: PrimitiveType,
        index_type: IndexType,
        count: u32,
        offset: usize,
        base_vertex: i32,
    ) -> BackendResult<()>;
}
