//! Validating backend that records calls instead of issuing them
//!
//! [`RecordingBackend`] keeps enough state to reject the mistakes a real
//! driver would silently accept or report through `glGetError`: uniforms set
//! without a program, type mismatches, draws without a vertex array and reads
//! past the end of a buffer. Every accepted call is appended to a log that
//! tests and the CLI inspect.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::assets::mesh::{AttributeBinding, IndexType, PrimitiveType};
use crate::render::backend::{
    BackendResult, BufferHandle, ProgramHandle, RenderBackend, UniformLocation, VertexArrayHandle,
};
use crate::render::shader::{GlslType, ProgramInterface};
use crate::render::types::{
    BufferTarget, BufferUsage, Capability, ClearFlags, CullMode, DepthFunc, FrontFace, UniformValue,
};
use crate::render::RenderError;

/// One accepted backend call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum BackendCall {
    CreateProgram { program: ProgramHandle, vertex_shader: String, fragment_shader: String },
    UseProgram(Option<ProgramHandle>),
    SetUniform { location: UniformLocation, value: UniformValue },
    BindUniformBlock { program: ProgramHandle, block_index: u32, binding: u32 },
    CreateBuffer { buffer: BufferHandle, target: BufferTarget, size: usize, usage: BufferUsage },
    UpdateBuffer { buffer: BufferHandle, offset: usize, size: usize },
    BindBufferRange { binding: u32, buffer: BufferHandle, offset: usize, size: usize },
    CreateVertexArray { vertex_array: VertexArrayHandle, attributes: Vec<u32>, indexed: bool },
    BindVertexArray(Option<VertexArrayHandle>),
    Enable(Capability),
    Disable(Capability),
    CullFace(CullMode),
    FrontFace(FrontFace),
    DepthFunc(DepthFunc),
    DepthRange(f64, f64),
    DepthMask(bool),
    PrimitiveRestartIndex(u32),
    ClearColor([f32; 4]),
    ClearDepth(f64),
    Clear(ClearFlags),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    DrawArrays { primitive: PrimitiveType, first: u32, count: u32 },
    DrawElements {
        primitive: PrimitiveType,
        index_type: IndexType,
        count: u32,
        offset: usize,
        base_vertex: i32,
        primitive_restart: Option<u32>,
    },
}

impl BackendCall {
    /// Whether the call is a draw
    #[must_use]
    pub const fn is_draw(&self) -> bool {
        matches!(self, Self::DrawArrays { .. } | Self::DrawElements { .. })
    }
}

/// Call counts for a recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSummary {
    /// Every recorded call
    pub total: usize,
    /// Programs created
    pub programs: usize,
    /// Buffers created
    pub buffers: usize,
    /// Buffer updates
    pub buffer_updates: usize,
    /// Vertex arrays created
    pub vertex_arrays: usize,
    /// Uniform writes
    pub uniforms: usize,
    /// Clears
    pub clears: usize,
    /// Draw calls
    pub draws: usize,
    /// Vertices or indices consumed by draws
    pub elements: u64,
    /// Everything else
    pub state_changes: usize,
}

impl fmt::Display for CallSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "calls:          {}", self.total)?;
        writeln!(f, "programs:       {}", self.programs)?;
        writeln!(f, "buffers:        {} ({} updates)", self.buffers, self.buffer_updates)?;
        writeln!(f, "vertex arrays:  {}", self.vertex_arrays)?;
        writeln!(f, "uniform writes: {}", self.uniforms)?;
        writeln!(f, "clears:         {}", self.clears)?;
        writeln!(f, "draws:          {} ({} elements)", self.draws, self.elements)?;
        write!(f, "state changes:  {}", self.state_changes)
    }
}

#[derive(Debug)]
struct BufferRecord {
    target: BufferTarget,
    data: Vec<u8>,
}

#[derive(Debug)]
struct VertexArrayRecord {
    vertex_buffer: BufferHandle,
    bindings: Vec<AttributeBinding>,
    index_buffer: Option<BufferHandle>,
}

/// Backend that validates and records every call
#[derive(Debug)]
pub struct RecordingBackend {
    programs: Vec<ProgramInterface>,
    buffers: Vec<BufferRecord>,
    vertex_arrays: Vec<VertexArrayRecord>,
    current_program: Option<ProgramHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
    uniform_values: HashMap<(ProgramHandle, u32), UniformValue>,
    block_bindings: HashMap<(ProgramHandle, u32), u32>,
    buffer_bindings: BTreeMap<u32, (BufferHandle, usize, usize)>,
    capabilities: BTreeSet<Capability>,
    cull_mode: CullMode,
    front_face: FrontFace,
    depth_func: DepthFunc,
    depth_range: (f64, f64),
    depth_mask: bool,
    restart_index: u32,
    clear_color: [f32; 4],
    clear_depth: f64,
    viewport: (i32, i32, u32, u32),
    calls: Vec<BackendCall>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Create a backend with OpenGL's initial state
    #[must_use]
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            buffers: Vec::new(),
            vertex_arrays: Vec::new(),
            current_program: None,
            current_vertex_array: None,
            uniform_values: HashMap::new(),
            block_bindings: HashMap::new(),
            buffer_bindings: BTreeMap::new(),
            capabilities: BTreeSet::new(),
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            depth_func: DepthFunc::Less,
            depth_range: (0.0, 1.0),
            depth_mask: true,
            restart_index: 0,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            viewport: (0, 0, 0, 0),
            calls: Vec::new(),
        }
    }

    /// Every accepted call, oldest first
    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Remove and return the recorded calls; state is kept
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Recorded draw calls
    pub fn draws(&self) -> impl Iterator<Item = &BackendCall> {
        self.calls.iter().filter(|c| c.is_draw())
    }

    /// Count recorded calls by kind
    #[must_use]
    pub fn summary(&self) -> CallSummary {
        let mut summary = CallSummary {
            total: self.calls.len(),
            ..CallSummary::default()
        };
        for call in &self.calls {
            match call {
                BackendCall::CreateProgram { .. } => summary.programs += 1,
                BackendCall::CreateBuffer { .. } => summary.buffers += 1,
                BackendCall::UpdateBuffer { .. } => summary.buffer_updates += 1,
                BackendCall::CreateVertexArray { .. } => summary.vertex_arrays += 1,
                BackendCall::SetUniform { .. } => summary.uniforms += 1,
                BackendCall::Clear(_) => summary.clears += 1,
                BackendCall::DrawArrays { count, .. } | BackendCall::DrawElements { count, .. } => {
                    summary.draws += 1;
                    summary.elements += u64::from(*count);
                }
                _ => summary.state_changes += 1,
            }
        }
        summary
    }

    /// Whether a capability is enabled
    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Current primitive restart index
    #[must_use]
    pub const fn restart_index(&self) -> u32 {
        self.restart_index
    }

    /// Current program
    #[must_use]
    pub const fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    /// Vertex array bound by the last `bind_vertex_array`
    #[must_use]
    pub const fn current_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.current_vertex_array
    }

    /// Interface a program was created from
    #[must_use]
    pub fn program_interface(&self, program: ProgramHandle) -> Option<&ProgramInterface> {
        handle_index(program.0).and_then(|i| self.programs.get(i))
    }

    /// Last value written to a uniform of `program`, looked up by name
    #[must_use]
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let location = self.program_interface(program)?.uniform(name)?.location;
        self.uniform_values.get(&(program, location)).copied()
    }

    /// Binding point a program's uniform block is attached to
    #[must_use]
    pub fn block_binding(&self, program: ProgramHandle, block_index: u32) -> Option<u32> {
        self.block_bindings.get(&(program, block_index)).copied()
    }

    /// Buffer range attached to a uniform binding point
    #[must_use]
    pub fn buffer_binding(&self, binding: u32) -> Option<(BufferHandle, usize, usize)> {
        self.buffer_bindings.get(&binding).copied()
    }

    /// Current contents of a buffer
    #[must_use]
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        handle_index(buffer.0)
            .and_then(|i| self.buffers.get(i))
            .map(|b| b.data.as_slice())
    }

    /// Current cull mode
    #[must_use]
    pub const fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    /// Current front face winding
    #[must_use]
    pub const fn front_face_winding(&self) -> FrontFace {
        self.front_face
    }

    /// Current depth function
    #[must_use]
    pub const fn current_depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    /// Current depth range
    #[must_use]
    pub const fn current_depth_range(&self) -> (f64, f64) {
        self.depth_range
    }

    /// Whether depth writes are enabled
    #[must_use]
    pub const fn depth_writes(&self) -> bool {
        self.depth_mask
    }

    /// Current clear color
    #[must_use]
    pub const fn current_clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Current clear depth
    #[must_use]
    pub const fn current_clear_depth(&self) -> f64 {
        self.clear_depth
    }

    /// Current viewport as `(x, y, width, height)`
    #[must_use]
    pub const fn current_viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    fn program(&self, program: ProgramHandle) -> BackendResult<&ProgramInterface> {
        self.program_interface(program)
            .ok_or_else(|| RenderError::UnknownHandle(format!("program {}", program.0)))
    }

    fn buffer(&self, buffer: BufferHandle) -> BackendResult<&BufferRecord> {
        handle_index(buffer.0)
            .and_then(|i| self.buffers.get(i))
            .ok_or_else(|| RenderError::UnknownHandle(format!("buffer {}", buffer.0)))
    }

    fn vertex_array(&self, vertex_array: VertexArrayHandle) -> BackendResult<&VertexArrayRecord> {
        handle_index(vertex_array.0)
            .and_then(|i| self.vertex_arrays.get(i))
            .ok_or_else(|| RenderError::UnknownHandle(format!("vertex array {}", vertex_array.0)))
    }

    /// Checks shared by every draw; returns the bound vertex array
    fn check_draw(&self) -> BackendResult<&VertexArrayRecord> {
        let program = self
            .current_program
            .ok_or_else(|| RenderError::InvalidDraw("no program in use".to_string()))?;
        let vertex_array = self
            .current_vertex_array
            .ok_or_else(|| RenderError::InvalidDraw("no vertex array bound".to_string()))?;
        let record = self
            .vertex_array(vertex_array)
            .map_err(|_| RenderError::InvalidDraw(format!("unknown vertex array {}", vertex_array.0)))?;

        let interface = self.program(program)?;
        for attribute in &interface.attributes {
            let enabled = attribute
                .location
                .is_some_and(|loc| record.bindings.iter().any(|b| b.index == loc));
            if !enabled {
                log::warn!(
                    "Attribute '{}' of {} is not enabled in vertex array {}",
                    attribute.name,
                    interface.vertex_shader,
                    vertex_array.0
                );
            }
        }
        Ok(record)
    }

    /// Upper bound on the vertices a vertex array can supply
    fn vertex_capacity(&self, record: &VertexArrayRecord) -> BackendResult<usize> {
        let len = self.buffer(record.vertex_buffer)?.data.len();
        Ok(record
            .bindings
            .iter()
            .map(|b| len.saturating_sub(b.offset) / b.stride().max(1))
            .min()
            .unwrap_or(0))
    }
}

/// Handles start at 1 so that 0 is never valid
fn handle_index(handle: u64) -> Option<usize> {
    usize::try_from(handle).ok()?.checked_sub(1)
}

fn next_handle(len: usize) -> u64 {
    len as u64 + 1
}

fn uniform_accepts(declared: GlslType, value: &UniformValue) -> bool {
    let given = value.glsl_type();
    declared == given || (declared == GlslType::Bool && matches!(given, GlslType::Int | GlslType::Uint))
}

fn read_index(data: &[u8], index_type: IndexType, position: usize) -> Option<u32> {
    let width = index_type.byte_width();
    let bytes = data.get(position * width..(position + 1) * width)?;
    Some(match index_type {
        IndexType::Ubyte => u32::from(bytes[0]),
        IndexType::Ushort => u32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
        IndexType::Uint => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    })
}

impl RenderBackend for RecordingBackend {
    fn create_program(&mut self, interface: &ProgramInterface) -> BackendResult<ProgramHandle> {
        let program = ProgramHandle(next_handle(self.programs.len()));
        self.programs.push(interface.clone());
        self.calls.push(BackendCall::CreateProgram {
            program,
            vertex_shader: interface.vertex_shader.clone(),
            fragment_shader: interface.fragment_shader.clone(),
        });
        Ok(program)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()> {
        if let Some(handle) = program {
            self.program(handle)?;
        }
        self.current_program = program;
        self.calls.push(BackendCall::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) -> BackendResult<()> {
        let current = self
            .current_program
            .ok_or_else(|| RenderError::InvalidUniform("no program in use".to_string()))?;
        if location.program != current {
            return Err(RenderError::InvalidUniform(format!(
                "location {} belongs to program {}, but program {} is in use",
                location.location, location.program.0, current.0
            )));
        }

        let interface = self.program(current)?;
        let uniform = interface.uniform_at(location.location).ok_or_else(|| {
            RenderError::InvalidUniform(format!(
                "no uniform at location {} in {} + {}",
                location.location, interface.vertex_shader, interface.fragment_shader
            ))
        })?;
        if !uniform_accepts(uniform.ty, &value) {
            return Err(RenderError::InvalidUniform(format!(
                "'{}' is {}, cannot set it to a {}",
                uniform.name,
                uniform.ty,
                value.glsl_type()
            )));
        }

        self.uniform_values.insert((current, location.location), value);
        self.calls.push(BackendCall::SetUniform { location, value });
        Ok(())
    }

    fn bind_uniform_block(&mut self, program: ProgramHandle, block_index: u32, binding: u32) -> BackendResult<()> {
        let interface = self.program(program)?;
        if !interface.blocks.iter().any(|b| b.index == block_index) {
            return Err(RenderError::InvalidUniform(format!(
                "no uniform block {block_index} in {} + {}",
                interface.vertex_shader, interface.fragment_shader
            )));
        }
        self.block_bindings.insert((program, block_index), binding);
        self.calls.push(BackendCall::BindUniformBlock {
            program,
            block_index,
            binding,
        });
        Ok(())
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> BackendResult<BufferHandle> {
        let buffer = BufferHandle(next_handle(self.buffers.len()));
        self.buffers.push(BufferRecord {
            target,
            data: data.to_vec(),
        });
        self.calls.push(BackendCall::CreateBuffer {
            buffer,
            target,
            size: data.len(),
            usage,
        });
        Ok(buffer)
    }

    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> BackendResult<()> {
        let record = handle_index(buffer.0)
            .and_then(|i| self.buffers.get_mut(i))
            .ok_or_else(|| RenderError::UnknownHandle(format!("buffer {}", buffer.0)))?;
        let end = offset.checked_add(data.len()).filter(|&end| end <= record.data.len());
        let Some(end) = end else {
            return Err(RenderError::BufferOverflow {
                buffer: buffer.0,
                offset,
                len: data.len(),
                size: record.data.len(),
            });
        };
        record.data[offset..end].copy_from_slice(data);
        self.calls.push(BackendCall::UpdateBuffer {
            buffer,
            offset,
            size: data.len(),
        });
        Ok(())
    }

    fn bind_buffer_range(&mut self, binding: u32, buffer: BufferHandle, offset: usize, size: usize) -> BackendResult<()> {
        let record = self.buffer(buffer)?;
        if record.target != BufferTarget::Uniform {
            return Err(RenderError::UnknownHandle(format!("buffer {} is not a uniform buffer", buffer.0)));
        }
        if offset.saturating_add(size) > record.data.len() {
            return Err(RenderError::BufferOverflow {
                buffer: buffer.0,
                offset,
                len: size,
                size: record.data.len(),
            });
        }
        self.buffer_bindings.insert(binding, (buffer, offset, size));
        self.calls.push(BackendCall::BindBufferRange {
            binding,
            buffer,
            offset,
            size,
        });
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        vertex_buffer: BufferHandle,
        bindings: &[AttributeBinding],
        index_buffer: Option<BufferHandle>,
    ) -> BackendResult<VertexArrayHandle> {
        if self.buffer(vertex_buffer)?.target != BufferTarget::Array {
            return Err(RenderError::UnknownHandle(format!(
                "buffer {} is not an array buffer",
                vertex_buffer.0
            )));
        }
        if let Some(indices) = index_buffer {
            if self.buffer(indices)?.target != BufferTarget::ElementArray {
                return Err(RenderError::UnknownHandle(format!(
                    "buffer {} is not an element buffer",
                    indices.0
                )));
            }
        }

        let vertex_array = VertexArrayHandle(next_handle(self.vertex_arrays.len()));
        self.vertex_arrays.push(VertexArrayRecord {
            vertex_buffer,
            bindings: bindings.to_vec(),
            index_buffer,
        });
        self.calls.push(BackendCall::CreateVertexArray {
            vertex_array,
            attributes: bindings.iter().map(|b| b.index).collect(),
            indexed: index_buffer.is_some(),
        });
        Ok(vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) -> BackendResult<()> {
        if let Some(handle) = vertex_array {
            self.vertex_array(handle)?;
        }
        self.current_vertex_array = vertex_array;
        self.calls.push(BackendCall::BindVertexArray(vertex_array));
        Ok(())
    }

    fn enable(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
        self.calls.push(BackendCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.capabilities.remove(&capability);
        self.calls.push(BackendCall::Disable(capability));
    }

    fn cull_face(&mut self, mode: CullMode) {
        self.cull_mode = mode;
        self.calls.push(BackendCall::CullFace(mode));
    }

    fn front_face(&mut self, face: FrontFace) {
        self.front_face = face;
        self.calls.push(BackendCall::FrontFace(face));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
        self.calls.push(BackendCall::DepthFunc(func));
    }

    fn depth_range(&mut self, near: f64, far: f64) {
        self.depth_range = (near.clamp(0.0, 1.0), far.clamp(0.0, 1.0));
        self.calls.push(BackendCall::DepthRange(near, far));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.depth_mask = enabled;
        self.calls.push(BackendCall::DepthMask(enabled));
    }

    fn primitive_restart_index(&mut self, index: u32) {
        self.restart_index = index;
        self.calls.push(BackendCall::PrimitiveRestartIndex(index));
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba;
        self.calls.push(BackendCall::ClearColor(rgba));
    }

    fn clear_depth(&mut self, depth: f64) {
        self.clear_depth = depth.clamp(0.0, 1.0);
        self.calls.push(BackendCall::ClearDepth(depth));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(BackendCall::Clear(flags));
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.calls.push(BackendCall::Viewport { x, y, width, height });
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) -> BackendResult<()> {
        let record = self.check_draw()?;
        let capacity = self.vertex_capacity(record)?;
        let end = u64::from(first) + u64::from(count);
        if end > capacity as u64 {
            return Err(RenderError::InvalidDraw(format!(
                "vertices {first}..{end} exceed the {capacity} the vertex buffer holds"
            )));
        }
        self.calls.push(BackendCall::DrawArrays { primitive, first, count });
        Ok(())
    }

    fn draw_elements_base_vertex(
        &mut self,
        primitive: PrimitiveType,
        index_type: IndexType,
        count: u32,
        offset: usize,
        base_vertex: i32,
    ) -> BackendResult<()> {
        let record = self.check_draw()?;
        let index_buffer = record
            .index_buffer
            .ok_or_else(|| RenderError::InvalidDraw("vertex array has no element buffer".to_string()))?;
        let data = &self.buffer(index_buffer)?.data;

        let width = index_type.byte_width();
        let end = (count as usize)
            .checked_mul(width)
            .and_then(|bytes| offset.checked_add(bytes));
        if offset % width != 0 || end.map_or(true, |end| end > data.len()) {
            return Err(RenderError::InvalidDraw(format!(
                "{count} {index_type} indices at byte {offset} exceed the {} byte element buffer",
                data.len()
            )));
        }

        let restart = self
            .capabilities
            .contains(&Capability::PrimitiveRestart)
            .then_some(self.restart_index);
        let capacity = self.vertex_capacity(record)? as i64;
        let first = offset / width;
        for position in first..first + count as usize {
            let Some(index) = read_index(data, index_type, position) else {
                break;
            };
            if Some(index) == restart {
                continue;
            }
            let vertex = i64::from(index) + i64::from(base_vertex);
            if vertex < 0 || vertex >= capacity {
                return Err(RenderError::InvalidDraw(format!(
                    "index {index} with base vertex {base_vertex} is outside the {capacity} vertices available"
                )));
            }
        }

        self.calls.push(BackendCall::DrawElements {
            primitive,
            index_type,
            count,
            offset,
            base_vertex,
            primitive_restart: restart,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh::AttributeType;
    use crate::render::shader::ShaderLibrary;

    fn color_program(backend: &mut RecordingBackend) -> ProgramHandle {
        let interface = ShaderLibrary::builtin()
            .link("pos_color_model_to_camera.vert", "vertex_colors.frag")
            .unwrap();
        backend.create_program(&interface).unwrap()
    }

    fn location(backend: &RecordingBackend, program: ProgramHandle, name: &str) -> UniformLocation {
        let location = backend.program_interface(program).unwrap().uniform(name).unwrap().location;
        UniformLocation { program, location }
    }

    fn triangle_vao(backend: &mut RecordingBackend, indices: Option<&[u16]>) -> VertexArrayHandle {
        let vertices: Vec<u8> = (0..9).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let buffer = backend
            .create_buffer(BufferTarget::Array, &vertices, BufferUsage::StaticDraw)
            .unwrap();
        let index_buffer = indices.map(|indices| {
            let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
            backend
                .create_buffer(BufferTarget::ElementArray, &bytes, BufferUsage::StaticDraw)
                .unwrap()
        });
        let binding = AttributeBinding {
            index: 0,
            size: 3,
            attr_type: AttributeType::Float,
            integral: false,
            offset: 0,
        };
        backend.create_vertex_array(buffer, &[binding], index_buffer).unwrap()
    }

    #[test]
    fn test_uniform_requires_current_program() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        let loc = location(&backend, program, "cameraToClip");

        let err = backend.set_uniform(loc, UniformValue::Mat4([[0.0; 4]; 4])).unwrap_err();
        assert!(matches!(err, RenderError::InvalidUniform(_)));

        backend.use_program(Some(program)).unwrap();
        backend.set_uniform(loc, UniformValue::Mat4([[0.0; 4]; 4])).unwrap();
        assert!(backend.uniform_value(program, "cameraToClip").is_some());
    }

    #[test]
    fn test_uniform_type_mismatch_is_rejected() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let loc = location(&backend, program, "modelToCamera");

        let err = backend.set_uniform(loc, UniformValue::Float(1.0)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidUniform(_)));
    }

    #[test]
    fn test_unknown_location_is_rejected() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let loc = UniformLocation { program, location: 99 };
        assert!(matches!(
            backend.set_uniform(loc, UniformValue::Float(1.0)),
            Err(RenderError::InvalidUniform(_))
        ));
    }

    #[test]
    fn test_draw_without_program_or_vao_fails() {
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            backend.draw_arrays(PrimitiveType::Triangles, 0, 3),
            Err(RenderError::InvalidDraw(_))
        ));

        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        assert!(matches!(
            backend.draw_arrays(PrimitiveType::Triangles, 0, 3),
            Err(RenderError::InvalidDraw(_))
        ));

        let vao = triangle_vao(&mut backend, None);
        backend.bind_vertex_array(Some(vao)).unwrap();
        backend.draw_arrays(PrimitiveType::Triangles, 0, 3).unwrap();
        assert_eq!(backend.draws().count(), 1);
    }

    #[test]
    fn test_draw_arrays_past_the_buffer_fails() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let vao = triangle_vao(&mut backend, None);
        backend.bind_vertex_array(Some(vao)).unwrap();
        assert!(matches!(
            backend.draw_arrays(PrimitiveType::Triangles, 1, 3),
            Err(RenderError::InvalidDraw(_))
        ));
    }

    #[test]
    fn test_draw_elements_checks_index_range() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let vao = triangle_vao(&mut backend, Some(&[0, 1, 2]));
        backend.bind_vertex_array(Some(vao)).unwrap();

        backend
            .draw_elements(PrimitiveType::Triangles, IndexType::Ushort, 3, 0)
            .unwrap();
        assert!(backend
            .draw_elements(PrimitiveType::Triangles, IndexType::Ushort, 4, 0)
            .is_err());
        assert!(backend
            .draw_elements_base_vertex(PrimitiveType::Triangles, IndexType::Ushort, 3, 0, 1)
            .is_err());
    }

    #[test]
    fn test_draw_elements_rejects_huge_offset() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let vao = triangle_vao(&mut backend, Some(&[0, 1, 2]));
        backend.bind_vertex_array(Some(vao)).unwrap();

        let offset = usize::MAX - 1;
        assert!(matches!(
            backend.draw_elements(PrimitiveType::Triangles, IndexType::Ushort, 3, offset),
            Err(RenderError::InvalidDraw(_))
        ));
    }

    #[test]
    fn test_restart_index_is_skipped_when_enabled() {
        let mut backend = RecordingBackend::new();
        let program = color_program(&mut backend);
        backend.use_program(Some(program)).unwrap();
        let vao = triangle_vao(&mut backend, Some(&[0, 1, 0xFFFF, 2]));
        backend.bind_vertex_array(Some(vao)).unwrap();

        assert!(backend
            .draw_elements(PrimitiveType::TriangleStrip, IndexType::Ushort, 4, 0)
            .is_err());

        backend.enable(Capability::PrimitiveRestart);
        backend.primitive_restart_index(0xFFFF);
        backend
            .draw_elements(PrimitiveType::TriangleStrip, IndexType::Ushort, 4, 0)
            .unwrap();
        assert!(matches!(
            backend.calls().last(),
            Some(BackendCall::DrawElements {
                primitive_restart: Some(0xFFFF),
                ..
            })
        ));
    }

    #[test]
    fn test_buffer_update_bounds() {
        let mut backend = RecordingBackend::new();
        let buffer = backend
            .create_buffer(BufferTarget::Uniform, &[0; 8], BufferUsage::StreamDraw)
            .unwrap();
        backend.update_buffer(buffer, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.buffer_data(buffer), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));

        let err = backend.update_buffer(buffer, 6, &[0; 4]).unwrap_err();
        assert!(matches!(err, RenderError::BufferOverflow { offset: 6, len: 4, size: 8, .. }));
    }

    #[test]
    fn test_capabilities_and_summary() {
        let mut backend = RecordingBackend::new();
        backend.enable(Capability::DepthTest);
        backend.enable(Capability::CullFace);
        backend.disable(Capability::CullFace);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        assert!(backend.is_enabled(Capability::DepthTest));
        assert!(!backend.is_enabled(Capability::CullFace));

        let summary = backend.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.clears, 1);
        assert_eq!(summary.state_changes, 3);
        assert!(summary.to_string().contains("clears:         1"));
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            backend.use_program(Some(ProgramHandle(7))),
            Err(RenderError::UnknownHandle(_))
        ));
        assert!(matches!(
            backend.bind_vertex_array(Some(VertexArrayHandle(0))),
            Err(RenderError::UnknownHandle(_))
        ));
    }
}
